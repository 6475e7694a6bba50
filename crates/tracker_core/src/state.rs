use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::{CandidateEntry, JobView, MatchView, TimeWindow, TrackingRequest};

/// Default delay between poll cycles that found nothing.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(180);

/// Fixed delay after a failed fetch, independent of the poll interval.
pub const ERROR_BACKOFF: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Created,
    Polling,
    /// A match was handed to the notifier; no further polling happens.
    Notifying,
    Matched,
    MatchedButNotNotified,
    Failed,
    Cancelled,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobState::Matched
                | JobState::MatchedButNotNotified
                | JobState::Failed
                | JobState::Cancelled
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            JobState::Created => "created",
            JobState::Polling => "polling",
            JobState::Notifying => "notifying",
            JobState::Matched => "matched",
            JobState::MatchedButNotNotified => "matched but not notified",
            JobState::Failed => "failed",
            JobState::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub poll_interval: Duration,
    pub error_backoff: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            error_backoff: ERROR_BACKOFF,
        }
    }
}

impl Timing {
    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            ..Self::default()
        }
    }
}

/// One request's tracking job. Only [`crate::update`] mutates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingJob {
    request: TrackingRequest,
    timing: Timing,
    pub(crate) state: JobState,
    pub(crate) window: Option<TimeWindow>,
    pub(crate) cycles: u64,
    pub(crate) transient_failures: u64,
    pub(crate) notifications_sent: u32,
    pub(crate) matched: Option<CandidateEntry>,
    pub(crate) last_error: Option<String>,
}

impl TrackingJob {
    pub fn new(request: TrackingRequest, timing: Timing) -> Self {
        Self {
            request,
            timing,
            state: JobState::Created,
            window: None,
            cycles: 0,
            transient_failures: 0,
            notifications_sent: 0,
            matched: None,
            last_error: None,
        }
    }

    pub fn request(&self) -> &TrackingRequest {
        &self.request
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn transient_failures(&self) -> u64 {
        self.transient_failures
    }

    pub fn notifications_sent(&self) -> u32 {
        self.notifications_sent
    }

    pub fn matched(&self) -> Option<&CandidateEntry> {
        self.matched.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn view(&self) -> JobView {
        JobView {
            state: self.state,
            item_name: self.request.item_name().to_string(),
            page_url: self.request.page_url().to_string(),
            cycles: self.cycles,
            transient_failures: self.transient_failures,
            notifications_sent: self.notifications_sent,
            matched: self.matched.as_ref().map(|entry| MatchView {
                time: entry.time.to_string(),
                label: entry.label.clone(),
            }),
            last_error: self.last_error.clone(),
        }
    }
}
