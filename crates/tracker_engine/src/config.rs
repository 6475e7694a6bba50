use std::time::Duration;

use tracker_core::{Timing, DEFAULT_POLL_INTERVAL};

use crate::{FetchSettings, NotifyPolicy, ShowSelectors, DEFAULT_RETAINED_FINISHED_JOBS};

/// Process-wide settings, built once at startup and shared by every job.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub poll_interval: Duration,
    pub fetch_timeout: Duration,
    pub fetch: FetchSettings,
    pub selectors: ShowSelectors,
    pub notify: NotifyPolicy,
    /// Jobs polling at the same time.
    pub max_concurrent_jobs: usize,
    /// Accepted requests waiting for a free worker.
    pub queue_capacity: usize,
    /// Finished jobs whose status stays queryable.
    pub retained_finished_jobs: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            fetch_timeout: Duration::from_secs(60),
            fetch: FetchSettings::default(),
            selectors: ShowSelectors::default(),
            notify: NotifyPolicy::default(),
            max_concurrent_jobs: 16,
            queue_capacity: 64,
            retained_finished_jobs: DEFAULT_RETAINED_FINISHED_JOBS,
        }
    }
}

impl EngineConfig {
    pub fn timing(&self) -> Timing {
        Timing::with_poll_interval(self.poll_interval)
    }
}
