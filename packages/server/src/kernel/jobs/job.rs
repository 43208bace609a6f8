//! Scheduled job model for recurring background work.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use typed_builder::TypedBuilder;
use uuid::Uuid;

/// Convert a std duration to a chrono duration, saturating on overflow.
pub fn chrono_duration(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX)
}

// ============================================================================
// Enums
// ============================================================================

/// How the most recent finished run of a job ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Succeeded,
    Failed,
}

// ============================================================================
// ScheduledJob Model
// ============================================================================

/// A named recurring job.
///
/// One record per name. The record is locked while a run is in progress
/// (`locked_at`), and carries the bookkeeping of its last run.
#[derive(FromRow, Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct ScheduledJob {
    #[builder(default = Uuid::now_v7())]
    pub id: Uuid,

    pub name: String,
    #[builder(default = serde_json::json!({}))]
    pub data: serde_json::Value,

    // Scheduling
    pub repeat_interval_secs: i64,
    pub next_run_at: DateTime<Utc>,
    #[builder(default, setter(strip_option))]
    pub last_run_at: Option<DateTime<Utc>>,
    #[builder(default, setter(strip_option))]
    pub last_finished_at: Option<DateTime<Utc>>,

    // Locking
    #[builder(default, setter(strip_option))]
    pub locked_at: Option<DateTime<Utc>>,

    // Failure tracking
    #[builder(default, setter(strip_option))]
    pub failed_at: Option<DateTime<Utc>>,
    #[builder(default = 0)]
    pub fail_count: i32,
    #[builder(default, setter(strip_option))]
    pub fail_reason: Option<String>,

    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
    #[builder(default = Utc::now())]
    pub updated_at: DateTime<Utc>,
}

impl ScheduledJob {
    /// New recurring job whose first run is one interval after `now`.
    pub fn recurring(
        name: impl Into<String>,
        interval: Duration,
        data: serde_json::Value,
        now: DateTime<Utc>,
    ) -> Self {
        Self::builder()
            .name(name.into())
            .data(data)
            .repeat_interval_secs(interval.as_secs().max(1) as i64)
            .next_run_at(now + chrono_duration(interval))
            .created_at(now)
            .updated_at(now)
            .build()
    }

    pub fn interval(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.repeat_interval_secs)
    }

    /// Locked by a run that started less than `lock_lifetime` ago.
    pub fn is_locked(&self, now: DateTime<Utc>, lock_lifetime: chrono::Duration) -> bool {
        self.locked_at
            .is_some_and(|locked_at| now - locked_at < lock_lifetime)
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_run_at <= now
    }

    /// Outcome of the last finished run, `None` if it never finished one.
    pub fn last_outcome(&self) -> Option<RunOutcome> {
        let finished_at = self.last_finished_at?;
        match self.failed_at {
            Some(failed_at) if failed_at >= finished_at => Some(RunOutcome::Failed),
            _ => Some(RunOutcome::Succeeded),
        }
    }

    /// Take the lock for a run starting at `now`.
    pub fn lock(&mut self, now: DateTime<Utc>) {
        self.locked_at = Some(now);
        self.last_run_at = Some(now);
        self.updated_at = now;
    }

    /// Release the lock and schedule the next occurrence.
    ///
    /// A failed run is not retried early; the next occurrence is the retry.
    pub fn finish(&mut self, now: DateTime<Utc>, failure: Option<&str>) {
        self.locked_at = None;
        self.last_finished_at = Some(now);
        self.next_run_at = now + self.interval();
        self.updated_at = now;

        if let Some(reason) = failure {
            self.failed_at = Some(now);
            self.fail_count += 1;
            self.fail_reason = Some(reason.to_string());
        }
    }
}

// ============================================================================
// Stats
// ============================================================================

/// Run statistics derived from the job records of one name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStats {
    /// Records currently locked by a run
    pub running: i64,
    /// Records whose last run finished without failure
    pub completed: i64,
    /// Records whose last run failed
    pub failed: i64,
    /// Records with a future `next_run_at`
    pub scheduled: i64,
}

impl JobStats {
    pub fn from_jobs(jobs: &[ScheduledJob], now: DateTime<Utc>) -> Self {
        jobs.iter().fold(Self::default(), |mut stats, job| {
            if job.locked_at.is_some() {
                stats.running += 1;
            }
            match job.last_outcome() {
                Some(RunOutcome::Succeeded) => stats.completed += 1,
                Some(RunOutcome::Failed) => stats.failed += 1,
                None => {}
            }
            if job.next_run_at > now {
                stats.scheduled += 1;
            }
            stats
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job_at(now: DateTime<Utc>) -> ScheduledJob {
        ScheduledJob::recurring("test-job", Duration::from_secs(300), serde_json::json!({}), now)
    }

    #[test]
    fn test_recurring_first_run_is_one_interval_out() {
        let now = Utc::now();
        let job = job_at(now);

        assert_eq!(job.repeat_interval_secs, 300);
        assert_eq!(job.next_run_at, now + chrono::Duration::seconds(300));
        assert!(!job.is_due(now));
        assert!(job.is_due(now + chrono::Duration::seconds(300)));
        assert_eq!(job.last_outcome(), None);
    }

    #[test]
    fn test_lock_expires_after_lifetime() {
        let now = Utc::now();
        let mut job = job_at(now);
        job.lock(now);

        let lifetime = chrono::Duration::minutes(10);
        assert!(job.is_locked(now + chrono::Duration::minutes(9), lifetime));
        assert!(!job.is_locked(now + chrono::Duration::minutes(10), lifetime));
    }

    #[test]
    fn test_finish_failed_then_succeeded() {
        let now = Utc::now();
        let mut job = job_at(now);

        job.lock(now);
        job.finish(now, Some("provider returned 402"));
        assert_eq!(job.last_outcome(), Some(RunOutcome::Failed));
        assert_eq!(job.fail_count, 1);
        assert!(job.locked_at.is_none());
        assert_eq!(job.next_run_at, now + chrono::Duration::seconds(300));

        let later = now + chrono::Duration::seconds(300);
        job.lock(later);
        job.finish(later, None);
        assert_eq!(job.last_outcome(), Some(RunOutcome::Succeeded));
        assert_eq!(job.fail_count, 1);
    }

    #[test]
    fn test_stats_from_jobs() {
        let now = Utc::now();
        let mut failed = job_at(now);
        failed.lock(now);
        failed.finish(now, Some("boom"));

        let mut running = job_at(now);
        running.next_run_at = now;
        running.lock(now);

        let stats = JobStats::from_jobs(&[failed, running], now);
        assert_eq!(
            stats,
            JobStats {
                running: 1,
                completed: 0,
                failed: 1,
                scheduled: 1,
            }
        );
    }
}
