//! Job store trait and the in-memory implementation.

use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::job::{chrono_duration, JobStats, ScheduledJob};

/// Persistence for named recurring jobs.
///
/// Claiming enforces a concurrency of one per job name: a due record is only
/// handed out while no record of the same name holds a live lock. Locks older
/// than the lock lifetime are treated as abandoned and can be reclaimed.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Replace any existing records of `name` with one recurring record.
    async fn schedule_every(
        &self,
        name: &str,
        interval: Duration,
        data: serde_json::Value,
    ) -> Result<ScheduledJob>;

    /// Remove every record of `name`, returning how many were removed.
    async fn cancel(&self, name: &str) -> Result<u64>;

    async fn find_by_name(&self, name: &str) -> Result<Vec<ScheduledJob>>;

    /// Lock and return a due record of `name`, if one can run now.
    async fn claim_due(&self, name: &str, lock_lifetime: Duration)
        -> Result<Option<ScheduledJob>>;

    async fn mark_succeeded(&self, id: Uuid) -> Result<()>;

    async fn mark_failed(&self, id: Uuid, reason: &str) -> Result<()>;

    async fn stats(&self, name: &str) -> Result<JobStats> {
        let jobs = self.find_by_name(name).await?;
        Ok(JobStats::from_jobs(&jobs, Utc::now()))
    }

    /// Earliest scheduled run of `name`.
    async fn next_run_at(&self, name: &str) -> Result<Option<DateTime<Utc>>> {
        let jobs = self.find_by_name(name).await?;
        Ok(jobs.iter().map(|job| job.next_run_at).min())
    }
}

// =============================================================================
// In-memory store
// =============================================================================

/// Job store backed by a mutex-guarded vector.
///
/// Used by tests and local runs without a database. Same claiming rules as
/// the Postgres store.
#[derive(Default)]
pub struct MemoryJobStore {
    jobs: Mutex<Vec<ScheduledJob>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every record of `name` due now. Returns how many were changed.
    pub fn make_due(&self, name: &str) -> usize {
        let now = Utc::now();
        let mut jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        let mut changed = 0;
        for job in jobs.iter_mut().filter(|job| job.name == name) {
            job.next_run_at = now;
            changed += 1;
        }
        changed
    }

    /// Move the lock of every record of `name` into the past by `age`.
    pub fn age_lock(&self, name: &str, age: Duration) {
        let age = chrono_duration(age);
        let mut jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        for job in jobs.iter_mut().filter(|job| job.name == name) {
            if let Some(locked_at) = job.locked_at {
                job.locked_at = Some(locked_at - age);
            }
        }
    }

    fn finish(&self, id: Uuid, failure: Option<&str>) {
        let now = Utc::now();
        let mut jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        match jobs.iter_mut().find(|job| job.id == id) {
            Some(job) => job.finish(now, failure),
            // Cancelled while the run was in progress
            None => tracing::debug!(job_id = %id, "finished job no longer exists"),
        }
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn schedule_every(
        &self,
        name: &str,
        interval: Duration,
        data: serde_json::Value,
    ) -> Result<ScheduledJob> {
        let job = ScheduledJob::recurring(name, interval, data, Utc::now());
        let mut jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        jobs.retain(|existing| existing.name != name);
        jobs.push(job.clone());
        Ok(job)
    }

    async fn cancel(&self, name: &str) -> Result<u64> {
        let mut jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        let before = jobs.len();
        jobs.retain(|job| job.name != name);
        Ok((before - jobs.len()) as u64)
    }

    async fn find_by_name(&self, name: &str) -> Result<Vec<ScheduledJob>> {
        let jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        Ok(jobs.iter().filter(|job| job.name == name).cloned().collect())
    }

    async fn claim_due(
        &self,
        name: &str,
        lock_lifetime: Duration,
    ) -> Result<Option<ScheduledJob>> {
        let now = Utc::now();
        let lock_lifetime = chrono_duration(lock_lifetime);
        let mut jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());

        let live_lock = jobs
            .iter()
            .any(|job| job.name == name && job.is_locked(now, lock_lifetime));
        if live_lock {
            return Ok(None);
        }

        let claimed = jobs
            .iter_mut()
            .filter(|job| job.name == name && job.is_due(now))
            .min_by_key(|job| job.next_run_at)
            .map(|job| {
                job.lock(now);
                job.clone()
            });

        Ok(claimed)
    }

    async fn mark_succeeded(&self, id: Uuid) -> Result<()> {
        self.finish(id, None);
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, reason: &str) -> Result<()> {
        self.finish(id, Some(reason));
        Ok(())
    }
}
