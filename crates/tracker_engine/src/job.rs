use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracker_core::{
    update, Effect, JobMsg, JobState, Notification, SleepReason, TrackingJob, TrackingRequest,
};
use tracker_logging::{job_tag, tracker_debug, tracker_error, tracker_info, tracker_warn};

use crate::{
    deliver_with_retry, DeliveryOutcome, EngineConfig, EngineEvent, Fetcher, JobId, Notifier,
    ShowExtractor,
};

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

/// Capabilities and settings a job runs against.
#[derive(Clone)]
pub struct JobContext {
    pub fetcher: Arc<dyn Fetcher>,
    pub extractor: Arc<dyn ShowExtractor>,
    pub notifier: Arc<dyn Notifier>,
    pub config: Arc<EngineConfig>,
}

/// Drives one tracking job to a terminal state, carrying out the effects the
/// state machine asks for.
///
/// `cancel` is checked before the request is validated, before every fetch and
/// raced against every sleep.
pub async fn run_job(
    job_id: JobId,
    request: TrackingRequest,
    ctx: &JobContext,
    sink: &dyn ProgressSink,
    cancel: CancellationToken,
) -> TrackingJob {
    let runner = Runner {
        tag: job_tag(job_id),
        ctx,
        cancel,
    };
    tracker_info!(
        "{} Tracker started for '{}' at {} ({}-{}, filter {:?}, notify {})",
        runner.tag,
        request.item_name(),
        request.page_url(),
        request.from_time.trim(),
        request.to_time.trim(),
        request.sub_filter(),
        request.recipient()
    );

    let mut job = TrackingJob::new(request, ctx.config.timing());
    // A job cancelled while queued ends Cancelled even if its request is invalid.
    let first = if runner.cancel.is_cancelled() {
        JobMsg::CancelRequested
    } else {
        JobMsg::Start
    };
    let mut pending = Some(first);
    while let Some(msg) = pending.take() {
        let (next, effects) = update(job, msg);
        job = next;
        sink.emit(EngineEvent::JobUpdated {
            job_id,
            view: job.view(),
        });

        let Some(effect) = effects.into_iter().next() else {
            tracker_warn!("{} No effect for state {}; stopping", runner.tag, job.state());
            break;
        };
        pending = runner.execute(&job, effect).await;
    }

    sink.emit(EngineEvent::JobCompleted {
        job_id,
        view: job.view(),
    });
    job
}

struct Runner<'a> {
    tag: String,
    ctx: &'a JobContext,
    cancel: CancellationToken,
}

impl Runner<'_> {
    async fn execute(&self, job: &TrackingJob, effect: Effect) -> Option<JobMsg> {
        match effect {
            Effect::Fetch => Some(self.poll_cycle(job.request()).await),
            Effect::Sleep { duration, reason } => {
                self.log_sleep(duration, reason);
                if self.sleep(duration).await {
                    Some(self.poll_cycle(job.request()).await)
                } else {
                    Some(JobMsg::CancelRequested)
                }
            }
            Effect::Notify(message) => Some(self.notify(&message).await),
            Effect::Stop(state) => {
                self.log_stop(job, state);
                None
            }
        }
    }

    async fn poll_cycle(&self, request: &TrackingRequest) -> JobMsg {
        if self.cancel.is_cancelled() {
            return JobMsg::CancelRequested;
        }

        let url = request.page_url();
        tracker_info!("{} Navigating to {}", self.tag, url);
        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return JobMsg::CancelRequested,
            result = self.ctx.fetcher.fetch(url, self.ctx.config.fetch_timeout) => result,
        };

        let content = match result {
            Ok(content) => content,
            Err(err) => {
                tracker_warn!("{} Error during tracking: {}", self.tag, err);
                return JobMsg::FetchFailed(err.to_string());
            }
        };

        if content.redirect_count > 0 {
            tracker_debug!(
                "{} Followed {} redirect(s) to {}",
                self.tag,
                content.redirect_count,
                content.final_url
            );
        }

        if !request.item_appears_in(&content.html) {
            tracker_warn!("{} '{}' not found on page", self.tag, request.item_name());
            return JobMsg::ItemAbsent;
        }

        let entries = self.ctx.extractor.extract(&content.html);
        tracker_info!("{} Found {} showtime entries on page", self.tag, entries.len());
        JobMsg::EntriesExtracted(entries)
    }

    /// Returns false when cancelled before the delay elapsed.
    async fn sleep(&self, duration: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }

    async fn notify(&self, message: &Notification) -> JobMsg {
        tracker_info!("{} Match found; {}", self.tag, message.subject);
        let outcome = deliver_with_retry(
            self.ctx.notifier.as_ref(),
            message,
            &self.ctx.config.notify,
        )
        .await;
        match outcome {
            DeliveryOutcome::Delivered { .. } => JobMsg::NotificationDelivered,
            DeliveryOutcome::DeliveryFailed { attempts, reason } => JobMsg::NotificationFailed(
                format!("delivery failed after {attempts} attempt(s): {reason}"),
            ),
        }
    }

    fn log_sleep(&self, duration: Duration, reason: SleepReason) {
        match reason {
            SleepReason::Poll => tracker_info!(
                "{} No matching shows yet. Sleeping {}s",
                self.tag,
                duration.as_secs()
            ),
            SleepReason::Backoff => tracker_info!(
                "{} Backing off {}s after a failed fetch",
                self.tag,
                duration.as_secs()
            ),
        }
    }

    fn log_stop(&self, job: &TrackingJob, state: JobState) {
        match state {
            JobState::Matched => {
                tracker_info!("{} Notification sent. Stopping tracker.", self.tag)
            }
            JobState::MatchedButNotNotified => tracker_error!(
                "{} Match found but the notification was not delivered: {}",
                self.tag,
                job.last_error().unwrap_or("unknown error")
            ),
            JobState::Failed => tracker_error!(
                "{} Invalid request, tracker exiting: {}",
                self.tag,
                job.last_error().unwrap_or("unknown error")
            ),
            JobState::Cancelled => tracker_info!("{} Tracker cancelled.", self.tag),
            other => tracker_warn!("{} Stopped in non-terminal state {}", self.tag, other),
        }
    }
}
