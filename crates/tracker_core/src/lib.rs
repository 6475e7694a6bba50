//! Tracker core: pure domain types and the tracking-job state machine.
mod effect;
mod entry;
mod matcher;
mod msg;
mod notification;
mod request;
mod state;
mod time;
mod update;
mod view_model;

pub use effect::{Effect, SleepReason};
pub use entry::CandidateEntry;
pub use matcher::{first_match, matches};
pub use msg::JobMsg;
pub use notification::Notification;
pub use request::{RequestError, TrackingRequest};
pub use state::{JobState, Timing, TrackingJob, DEFAULT_POLL_INTERVAL, ERROR_BACKOFF};
pub use time::{TimeOfDay, TimeParseError, TimeWindow};
pub use update::update;
pub use view_model::{JobView, MatchView};
