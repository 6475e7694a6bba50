use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;
use tracker_core::{JobView, TrackingRequest};
use tracker_logging::{job_tag, tracker_info, tracker_warn};

use crate::extract::SelectorError;
use crate::{
    run_job, EngineConfig, JobContext, JobId, JobRegistry, MailSettings, ReqwestFetcher,
    SelectorShowExtractor, SmtpNotifier,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("too many pending tracking requests, try again later")]
    QueueFull,
    #[error("tracker is shutting down")]
    ShuttingDown,
}

struct QueuedJob {
    job_id: JobId,
    request: TrackingRequest,
    cancel: CancellationToken,
}

/// Accepts tracking requests and runs them on a bounded pool of workers.
///
/// Must be created inside a tokio runtime.
#[derive(Clone)]
pub struct EngineHandle {
    queue_tx: mpsc::Sender<QueuedJob>,
    registry: JobRegistry,
    next_id: Arc<AtomicU64>,
    root: CancellationToken,
    ctx: JobContext,
}

impl EngineHandle {
    /// Engine with the HTTP fetcher, selector extractor and SMTP notifier.
    pub fn with_defaults(config: EngineConfig, mail: MailSettings) -> Result<Self, SelectorError> {
        let extractor = SelectorShowExtractor::new(&config.selectors)?;
        let ctx = JobContext {
            fetcher: Arc::new(ReqwestFetcher::new(config.fetch.clone())),
            extractor: Arc::new(extractor),
            notifier: Arc::new(SmtpNotifier::new(mail)),
            config: Arc::new(config),
        };
        Ok(Self::new(ctx))
    }

    pub fn new(ctx: JobContext) -> Self {
        let (queue_tx, queue_rx) = mpsc::channel(ctx.config.queue_capacity.max(1));
        let registry = JobRegistry::with_retention(ctx.config.retained_finished_jobs);
        let root = CancellationToken::new();
        let workers = Arc::new(Semaphore::new(ctx.config.max_concurrent_jobs.max(1)));

        tokio::spawn(dispatch(queue_rx, ctx.clone(), registry.clone(), workers));

        Self {
            queue_tx,
            registry,
            next_id: Arc::new(AtomicU64::new(1)),
            root,
            ctx,
        }
    }

    /// Queues a request. Rejected when the admission queue is full.
    pub fn submit(&self, request: TrackingRequest) -> Result<JobId, SubmitError> {
        if self.root.is_cancelled() {
            return Err(SubmitError::ShuttingDown);
        }
        let slot = self.queue_tx.try_reserve().map_err(|err| match err {
            mpsc::error::TrySendError::Full(()) => SubmitError::QueueFull,
            mpsc::error::TrySendError::Closed(()) => SubmitError::ShuttingDown,
        })?;

        let job_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let cancel = self.root.child_token();
        let superseded = self
            .registry
            .register(job_id, &request, self.ctx.config.timing(), cancel.clone());
        tracker_info!(
            "{} Received request for '{}' at {}",
            job_tag(job_id),
            request.item_name(),
            request.page_url()
        );
        for old in superseded {
            tracker_info!("{} Superseded by job {}", job_tag(old), job_id);
        }
        slot.send(QueuedJob {
            job_id,
            request,
            cancel,
        });
        Ok(job_id)
    }

    pub fn status(&self, job_id: JobId) -> Option<JobView> {
        self.registry.status(job_id)
    }

    pub fn jobs(&self) -> Vec<(JobId, JobView)> {
        self.registry.snapshot()
    }

    pub fn cancel(&self, job_id: JobId) -> bool {
        self.registry.cancel(job_id)
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Cancels every job and refuses new submissions.
    pub fn shutdown(&self) {
        tracker_info!("Shutting down; cancelling {} active job(s)", self.registry.active_count());
        self.root.cancel();
    }
}

async fn dispatch(
    mut queue_rx: mpsc::Receiver<QueuedJob>,
    ctx: JobContext,
    registry: JobRegistry,
    workers: Arc<Semaphore>,
) {
    // Take a worker first so waiting requests stay in the bounded queue.
    loop {
        let Ok(permit) = workers.clone().acquire_owned().await else {
            tracker_warn!("Worker pool closed; dropping queued jobs");
            break;
        };
        let Some(queued) = queue_rx.recv().await else {
            break;
        };
        let ctx = ctx.clone();
        let registry = registry.clone();
        tokio::spawn(async move {
            let _permit = permit;
            run_job(
                queued.job_id,
                queued.request,
                &ctx,
                &registry,
                queued.cancel,
            )
            .await;
        });
    }
}
