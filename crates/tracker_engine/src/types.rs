use std::fmt;

use tracker_core::JobView;

pub type JobId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Emitted after every state-machine step.
    JobUpdated { job_id: JobId, view: JobView },
    JobCompleted { job_id: JobId, view: JobView },
}

impl EngineEvent {
    pub fn job_id(&self) -> JobId {
        match self {
            EngineEvent::JobUpdated { job_id, .. } | EngineEvent::JobCompleted { job_id, .. } => {
                *job_id
            }
        }
    }

    pub fn view(&self) -> &JobView {
        match self {
            EngineEvent::JobUpdated { view, .. } | EngineEvent::JobCompleted { view, .. } => view,
        }
    }
}

/// Decoded page content as handed to the extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedContent {
    pub html: String,
    pub final_url: String,
    pub redirect_count: usize,
    pub content_type: Option<String>,
}

impl RenderedContent {
    pub fn from_html(html: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            final_url: url.into(),
            redirect_count: 0,
            content_type: Some("text/html".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    UnsupportedContentType { content_type: String },
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::UnsupportedContentType { content_type } => {
                write!(f, "unsupported content type {content_type}")
            }
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
