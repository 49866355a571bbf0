//! Job queue and worker pool.
//!
//! Callers submit a job and poll for a terminal state instead of blocking a
//! request handler for the whole pipeline run. Each worker processes one
//! job at a time; a job either completes fully or fails as a whole.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{error, info};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Mutex, RwLock};
use uuid::Uuid;

use crate::error::{DubSyncError, Result};
use crate::pipeline::{DubRequest, DubSync};
use crate::progress::{DubProgress, PipelineStage};

pub type JobId = Uuid;

/// Where a job currently is
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum JobState {
    /// Accepted, waiting for a free worker
    Queued,
    /// A worker is executing the given pipeline stage
    Running(PipelineStage),
    /// Completed; the dubbed video is at `output`
    Done { output: String },
    /// Failed as a whole; exactly one error names the failing stage
    Failed { error: String },
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Failed { .. })
    }
}

/// Snapshot of one job, as returned to pollers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatus {
    pub id: JobId,
    pub state: JobState,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

struct QueuedJob {
    id: JobId,
    request: DubRequest,
}

/// Bounded worker pool draining a submission queue
pub struct JobQueue {
    tx: mpsc::Sender<QueuedJob>,
    statuses: Arc<RwLock<HashMap<JobId, JobStatus>>>,
}

impl JobQueue {
    /// Spawn `workers` worker tasks sharing the given pipeline
    pub fn new(pipeline: Arc<DubSync>, workers: usize) -> Self {
        let (tx, rx) = mpsc::channel::<QueuedJob>(64);
        let rx = Arc::new(Mutex::new(rx));
        let statuses: Arc<RwLock<HashMap<JobId, JobStatus>>> = Arc::new(RwLock::new(HashMap::new()));

        for worker_id in 0..workers.max(1) {
            let rx = rx.clone();
            let statuses = statuses.clone();
            let pipeline = pipeline.clone();

            tokio::spawn(async move {
                loop {
                    // Hold the lock only while receiving, so workers share
                    // the queue without starving each other
                    let job = { rx.lock().await.recv().await };
                    let Some(job) = job else {
                        info!("Worker {} shutting down, queue closed", worker_id);
                        break;
                    };

                    info!("Worker {} picked up job {}", worker_id, job.id);
                    run_job(&pipeline, &statuses, job).await;
                }
            });
        }

        Self { tx, statuses }
    }

    /// Enqueue a job and return its id immediately
    pub async fn submit(&self, request: DubRequest) -> Result<JobId> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        self.statuses.write().await.insert(
            id,
            JobStatus {
                id,
                state: JobState::Queued,
                submitted_at: now,
                updated_at: now,
            },
        );

        self.tx
            .send(QueuedJob { id, request })
            .await
            .map_err(|_| DubSyncError::Other("job queue is closed".to_string()))?;

        info!("Job {} queued", id);
        Ok(id)
    }

    /// Current status of a job, if it is known
    pub async fn status(&self, id: &JobId) -> Option<JobStatus> {
        self.statuses.read().await.get(id).cloned()
    }

    /// Poll until the job reaches `Done` or `Failed`
    pub async fn wait(&self, id: &JobId) -> Option<JobStatus> {
        loop {
            let status = self.status(id).await?;
            if status.state.is_terminal() {
                return Some(status);
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }
}

async fn set_state(
    statuses: &Arc<RwLock<HashMap<JobId, JobStatus>>>,
    id: JobId,
    state: JobState,
) {
    if let Some(status) = statuses.write().await.get_mut(&id) {
        status.state = state;
        status.updated_at = Utc::now();
    }
}

async fn run_job(
    pipeline: &DubSync,
    statuses: &Arc<RwLock<HashMap<JobId, JobStatus>>>,
    job: QueuedJob,
) {
    set_state(statuses, job.id, JobState::Running(PipelineStage::Extracting)).await;

    // Mirror pipeline progress into the status map for pollers
    let (progress_tx, mut progress_rx) = mpsc::channel::<DubProgress>(32);
    let progress_statuses = statuses.clone();
    let progress_id = job.id;
    let mirror = tokio::spawn(async move {
        while let Some(update) = progress_rx.recv().await {
            set_state(
                &progress_statuses,
                progress_id,
                JobState::Running(update.stage),
            )
            .await;
        }
    });

    let result = pipeline.process(&job.request, Some(progress_tx)).await;
    let _ = mirror.await;

    match result {
        Ok(output) => {
            info!("Job {} done: {}", job.id, output.display());
            set_state(
                statuses,
                job.id,
                JobState::Done {
                    output: output.to_string_lossy().to_string(),
                },
            )
            .await;
        }
        Err(e) => {
            error!("Job {} failed at {}: {}", job.id, e.stage(), e);
            set_state(
                statuses,
                job.id,
                JobState::Failed {
                    error: e.to_string(),
                },
            )
            .await;
        }
    }
}
