//! Tracker engine: page fetching, show extraction, notification delivery and
//! the worker pool that drives tracking jobs.
mod config;
mod decode;
mod engine;
mod extract;
mod fetch;
mod job;
mod notify;
mod registry;
mod types;

pub use config::EngineConfig;
pub use decode::{decode_html, DecodedHtml};
pub use engine::{EngineHandle, SubmitError};
pub use extract::{SelectorError, SelectorShowExtractor, ShowExtractor, ShowSelectors};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher};
pub use job::{run_job, JobContext, ProgressSink};
pub use notify::{
    deliver_with_retry, DeliveryOutcome, MailSettings, NotifyError, NotifyPolicy, Notifier,
    SmtpNotifier, SmtpSecurity,
};
pub use registry::{JobRegistry, DEFAULT_RETAINED_FINISHED_JOBS};
pub use types::{EngineEvent, FailureKind, FetchError, JobId, RenderedContent};
