use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracker_engine::EngineHandle;
use tracker_logging::{tracker_info, tracker_warn};

use super::config::{AppEnv, LoadFromEnv};
use super::logging::{self, LogDestination};
use super::routes::{router, AppState};

pub async fn run_app() -> anyhow::Result<()> {
    let env = AppEnv::load_from_env()?;
    env.validate()?;
    logging::initialize(LogDestination::Both, &env.log_file);

    if !env.has_mail_credentials() {
        tracker_warn!("SENDER_EMAIL / SENDER_PASSWORD not set; notifications will fail");
    }

    tracker_info!(
        "Mail goes through {}:{} ({:?})",
        env.smtp_host,
        env.smtp_port,
        env.smtp_security
    );

    let config = env.engine_config();
    tracker_info!(
        "Poll interval {}s, up to {} concurrent jobs, queue of {}",
        config.poll_interval.as_secs(),
        config.max_concurrent_jobs,
        config.queue_capacity
    );
    let engine = EngineHandle::with_defaults(config, env.mail_settings())
        .context("invalid showtime selectors")?;

    let state = AppState {
        engine: engine.clone(),
        log_file: Arc::new(env.log_file.clone()),
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], env.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracker_info!("Server started on port {}", env.port);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    engine.shutdown();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracker_warn!("Could not listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    tracker_info!("Shutdown signal received");
}
