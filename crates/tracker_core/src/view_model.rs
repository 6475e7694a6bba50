use serde::Serialize;

use crate::JobState;

/// Snapshot of a job for status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobView {
    pub state: JobState,
    pub item_name: String,
    pub page_url: String,
    pub cycles: u64,
    pub transient_failures: u64,
    pub notifications_sent: u32,
    pub matched: Option<MatchView>,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchView {
    pub time: String,
    pub label: String,
}
