//! Job worker service for running recurring jobs.
//!
//! The `JobWorker` is a long-running service that:
//! - Polls the `JobStore` for due records of every registered job name
//! - Dispatches a claimed record to its handler via `JobRegistry`
//! - Marks the run succeeded or failed, which schedules the next occurrence
//!
//! # Architecture
//!
//! ```text
//! JobWorker
//!     │
//!     ├─► Poll store (claim_due per registered name)
//!     ├─► JobRegistry.execute(job)
//!     └─► Mark succeeded/failed via JobStore
//! ```
//!
//! Jobs run one at a time on the worker task. Together with the store's claim
//! rule this caps every job name at a single running instance.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::job::ScheduledJob;
use super::registry::JobRegistry;
use super::store::JobStore;

/// Configuration for the job worker.
#[derive(Debug, Clone)]
pub struct JobWorkerConfig {
    /// How long to wait between polls
    pub poll_interval: Duration,
    /// Age after which a lock is considered abandoned and reclaimable
    pub lock_lifetime: Duration,
    /// Worker ID for this instance
    pub worker_id: String,
}

impl Default for JobWorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            lock_lifetime: Duration::from_secs(10 * 60),
            worker_id: format!("worker-{}", Uuid::new_v4()),
        }
    }
}

impl JobWorkerConfig {
    /// Create a new config with a specific worker ID.
    pub fn with_worker_id(worker_id: impl Into<String>) -> Self {
        Self {
            worker_id: worker_id.into(),
            ..Default::default()
        }
    }
}

/// A job worker that runs due recurring jobs.
pub struct JobWorker {
    store: Arc<dyn JobStore>,
    registry: Arc<JobRegistry>,
    config: JobWorkerConfig,
}

impl JobWorker {
    pub fn new(store: Arc<dyn JobStore>, registry: Arc<JobRegistry>) -> Self {
        Self::with_config(store, registry, JobWorkerConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn JobStore>,
        registry: Arc<JobRegistry>,
        config: JobWorkerConfig,
    ) -> Self {
        Self {
            store,
            registry,
            config,
        }
    }

    pub fn config(&self) -> &JobWorkerConfig {
        &self.config
    }

    /// Claim and run every registered job that is due right now.
    ///
    /// Returns the number of runs executed.
    pub async fn poll_once(&self) -> Result<usize> {
        let mut executed = 0;

        for name in self.registry.names() {
            let Some(job) = self.store.claim_due(name, self.config.lock_lifetime).await? else {
                continue;
            };
            self.process_job(job).await;
            executed += 1;
        }

        Ok(executed)
    }

    /// Run a single claimed job and record its outcome.
    async fn process_job(&self, job: ScheduledJob) {
        let job_id = job.id;
        let job_name = job.name.clone();
        let started = Instant::now();

        info!(
            job_id = %job_id,
            job_name = %job_name,
            worker_id = %self.config.worker_id,
            "job started"
        );

        match self.registry.execute(job).await {
            Ok(()) => {
                info!(
                    job_id = %job_id,
                    job_name = %job_name,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "job succeeded"
                );
                if let Err(e) = self.store.mark_succeeded(job_id).await {
                    error!(job_id = %job_id, error = %e, "failed to mark job as succeeded");
                }
            }
            Err(e) => {
                let reason = format!("{:#}", e);
                warn!(
                    job_id = %job_id,
                    job_name = %job_name,
                    duration_ms = started.elapsed().as_millis() as u64,
                    error = %reason,
                    "job failed"
                );
                if let Err(e) = self.store.mark_failed(job_id, &reason).await {
                    error!(job_id = %job_id, error = %e, "failed to mark job as failed");
                }
            }
        }
    }

    /// Poll until `shutdown` is cancelled.
    ///
    /// A run in progress when shutdown is requested is allowed to finish.
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        info!(
            worker_id = %self.config.worker_id,
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            jobs = ?self.registry.names().collect::<Vec<_>>(),
            "job worker starting"
        );

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            match self.poll_once().await {
                Ok(0) => {}
                Ok(count) => debug!(count, "ran due jobs"),
                Err(e) => error!(error = %e, "failed to poll jobs"),
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }

        info!(worker_id = %self.config.worker_id, "job worker stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::kernel::jobs::MemoryJobStore;

    #[test]
    fn test_config_defaults() {
        let config = JobWorkerConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.lock_lifetime, Duration::from_secs(600));
        assert!(config.worker_id.starts_with("worker-"));
    }

    #[test]
    fn test_config_with_worker_id() {
        let config = JobWorkerConfig::with_worker_id("my-worker");
        assert_eq!(config.worker_id, "my-worker");
    }

    fn worker_with_handler(
        store: Arc<MemoryJobStore>,
        calls: Arc<AtomicUsize>,
        fail: bool,
    ) -> JobWorker {
        let mut registry = JobRegistry::new();
        registry.register("tick", move |_job| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                if fail {
                    anyhow::bail!("handler failed");
                }
                Ok(())
            }
        });
        JobWorker::new(store, Arc::new(registry))
    }

    #[tokio::test]
    async fn test_poll_once_runs_due_job_and_reschedules() {
        let store = Arc::new(MemoryJobStore::new());
        store
            .schedule_every("tick", Duration::from_secs(60), serde_json::json!({}))
            .await
            .unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let worker = worker_with_handler(store.clone(), calls.clone(), false);

        // Not due yet
        assert_eq!(worker.poll_once().await.unwrap(), 0);

        store.make_due("tick");
        assert_eq!(worker.poll_once().await.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let stats = store.stats("tick").await.unwrap();
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.running, 0);
        assert_eq!(stats.scheduled, 1);
    }

    #[tokio::test]
    async fn test_failed_run_is_recorded() {
        let store = Arc::new(MemoryJobStore::new());
        store
            .schedule_every("tick", Duration::from_secs(60), serde_json::json!({}))
            .await
            .unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let worker = worker_with_handler(store.clone(), calls, true);

        store.make_due("tick");
        worker.poll_once().await.unwrap();

        let jobs = store.find_by_name("tick").await.unwrap();
        assert_eq!(jobs[0].fail_count, 1);
        assert_eq!(jobs[0].fail_reason.as_deref(), Some("handler failed"));
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let store = Arc::new(MemoryJobStore::new());
        let worker = worker_with_handler(store, Arc::new(AtomicUsize::new(0)), false);

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(worker.run(shutdown.clone()));
        shutdown.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }
}
