use std::time::Duration;

use crate::{JobState, Notification};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Fetch,
    Sleep {
        duration: Duration,
        reason: SleepReason,
    },
    Notify(Notification),
    Stop(JobState),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepReason {
    /// Nothing matched yet.
    Poll,
    /// The previous fetch failed.
    Backoff,
}
