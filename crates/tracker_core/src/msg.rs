use crate::CandidateEntry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobMsg {
    /// Launcher handed the job to a worker.
    Start,
    /// Page fetched but the item name does not appear in it.
    ItemAbsent,
    /// Page fetched and showtimes extracted, in document order.
    EntriesExtracted(Vec<CandidateEntry>),
    /// Fetch failed; always treated as transient.
    FetchFailed(String),
    /// Notifier confirmed delivery.
    NotificationDelivered,
    /// Notifier gave up after its retries.
    NotificationFailed(String),
    /// Operator or a superseding request asked the job to stop.
    CancelRequested,
}
