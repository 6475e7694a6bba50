mod app;
mod config;
mod logging;
mod routes;

pub use app::run_app;
