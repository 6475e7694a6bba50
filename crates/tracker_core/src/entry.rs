use crate::TimeOfDay;

/// One (time, label) pair extracted during a single poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateEntry {
    pub time: TimeOfDay,
    pub label: String,
}

impl CandidateEntry {
    pub fn new(time: TimeOfDay, label: impl Into<String>) -> Self {
        Self {
            time,
            label: label.into(),
        }
    }
}
