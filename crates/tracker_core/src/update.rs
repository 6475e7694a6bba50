use crate::{first_match, Effect, JobMsg, JobState, Notification, SleepReason, TrackingJob};

/// Pure update function: applies a message to a job and returns the effects
/// the runner must carry out next.
///
/// Messages that do not apply to the current state leave the job unchanged
/// and yield no effects. Terminal jobs ignore everything.
pub fn update(mut job: TrackingJob, msg: JobMsg) -> (TrackingJob, Vec<Effect>) {
    if job.state.is_terminal() {
        return (job, Vec::new());
    }

    let effects = match (job.state, msg) {
        (JobState::Created, JobMsg::Start) => match job.request().validate() {
            Ok(window) => {
                job.window = Some(window);
                job.state = JobState::Polling;
                vec![Effect::Fetch]
            }
            Err(err) => {
                job.last_error = Some(err.to_string());
                stop(&mut job, JobState::Failed)
            }
        },
        (JobState::Created | JobState::Polling, JobMsg::CancelRequested) => {
            stop(&mut job, JobState::Cancelled)
        }
        (JobState::Polling, JobMsg::ItemAbsent) => {
            job.cycles += 1;
            vec![poll_sleep(&job)]
        }
        (JobState::Polling, JobMsg::EntriesExtracted(entries)) => {
            job.cycles += 1;
            let Some(window) = job.window else {
                return (job, Vec::new());
            };
            let found = first_match(&entries, &window, job.request().sub_filter()).cloned();
            match found {
                Some(entry) => {
                    let notification = Notification::for_match(job.request(), &entry);
                    job.matched = Some(entry);
                    job.state = JobState::Notifying;
                    vec![Effect::Notify(notification)]
                }
                None => vec![poll_sleep(&job)],
            }
        }
        (JobState::Polling, JobMsg::FetchFailed(reason)) => {
            job.cycles += 1;
            job.transient_failures += 1;
            job.last_error = Some(reason);
            vec![Effect::Sleep {
                duration: job.timing().error_backoff,
                reason: SleepReason::Backoff,
            }]
        }
        (JobState::Notifying, JobMsg::NotificationDelivered) => {
            job.notifications_sent += 1;
            stop(&mut job, JobState::Matched)
        }
        (JobState::Notifying, JobMsg::NotificationFailed(reason)) => {
            job.last_error = Some(reason);
            stop(&mut job, JobState::MatchedButNotNotified)
        }
        _ => Vec::new(),
    };

    (job, effects)
}

fn poll_sleep(job: &TrackingJob) -> Effect {
    Effect::Sleep {
        duration: job.timing().poll_interval,
        reason: SleepReason::Poll,
    }
}

fn stop(job: &mut TrackingJob, state: JobState) -> Vec<Effect> {
    job.state = state;
    vec![Effect::Stop(state)]
}
