use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;
use tracker_core::{JobView, Timing, TrackingJob, TrackingRequest};
use tracker_logging::tracker_debug;

use crate::job::ProgressSink;
use crate::{EngineEvent, JobId};

/// Finished jobs kept for status queries before the oldest are dropped.
pub const DEFAULT_RETAINED_FINISHED_JOBS: usize = 256;

type SupersedeKey = (String, String, String);

struct JobRecord {
    view: JobView,
    key: SupersedeKey,
    cancel: CancellationToken,
}

/// Latest known status of every job, plus the handles to cancel them.
///
/// Running jobs are bounded by the admission queue and worker pool; finished
/// jobs are capped at `retained_finished`, oldest id first.
#[derive(Clone)]
pub struct JobRegistry {
    jobs: Arc<Mutex<BTreeMap<JobId, JobRecord>>>,
    retained_finished: usize,
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::with_retention(DEFAULT_RETAINED_FINISHED_JOBS)
    }
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retention(retained_finished: usize) -> Self {
        Self {
            jobs: Arc::default(),
            retained_finished,
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<JobId, JobRecord>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records a newly accepted job and cancels any still-running job it
    /// supersedes. Returns the ids of the superseded jobs.
    pub fn register(
        &self,
        job_id: JobId,
        request: &TrackingRequest,
        timing: Timing,
        cancel: CancellationToken,
    ) -> Vec<JobId> {
        let key = request.supersede_key();
        let mut jobs = self.lock();
        let superseded: Vec<JobId> = jobs
            .iter()
            .filter(|(_, record)| record.key == key && !record.view.state.is_terminal())
            .map(|(id, record)| {
                record.cancel.cancel();
                *id
            })
            .collect();

        let view = TrackingJob::new(request.clone(), timing).view();
        jobs.insert(job_id, JobRecord { view, key, cancel });
        superseded
    }

    pub fn status(&self, job_id: JobId) -> Option<JobView> {
        self.lock().get(&job_id).map(|record| record.view.clone())
    }

    pub fn snapshot(&self) -> Vec<(JobId, JobView)> {
        self.lock()
            .iter()
            .map(|(id, record)| (*id, record.view.clone()))
            .collect()
    }

    /// Requests cancellation. False when the job is unknown or already finished.
    pub fn cancel(&self, job_id: JobId) -> bool {
        match self.lock().get(&job_id) {
            Some(record) if !record.view.state.is_terminal() => {
                record.cancel.cancel();
                true
            }
            _ => false,
        }
    }

    pub fn active_count(&self) -> usize {
        self.lock()
            .values()
            .filter(|record| !record.view.state.is_terminal())
            .count()
    }

    fn prune_finished(&self, jobs: &mut BTreeMap<JobId, JobRecord>) {
        let finished: Vec<JobId> = jobs
            .iter()
            .filter(|(_, record)| record.view.state.is_terminal())
            .map(|(id, _)| *id)
            .collect();
        let excess = finished.len().saturating_sub(self.retained_finished);
        for id in &finished[..excess] {
            jobs.remove(id);
        }
        if excess > 0 {
            tracker_debug!("Dropped {} finished job record(s)", excess);
        }
    }
}

impl ProgressSink for JobRegistry {
    fn emit(&self, event: EngineEvent) {
        let mut jobs = self.lock();
        if let Some(record) = jobs.get_mut(&event.job_id()) {
            record.view = event.view().clone();
        }
        if matches!(event, EngineEvent::JobCompleted { .. }) {
            self.prune_finished(&mut jobs);
        }
    }
}
