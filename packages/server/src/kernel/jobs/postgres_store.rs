//! PostgreSQL-backed job store.
//!
//! Claims use `FOR UPDATE SKIP LOCKED`, so concurrent workers (or several
//! server instances) never run the same job name at the same time.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::job::ScheduledJob;
use super::store::JobStore;

pub struct PostgresJobStore {
    pool: PgPool,
}

impl PostgresJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PostgresJobStore {
    async fn schedule_every(
        &self,
        name: &str,
        interval: Duration,
        data: serde_json::Value,
    ) -> Result<ScheduledJob> {
        let job = ScheduledJob::recurring(name, interval, data, Utc::now());
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM scheduled_jobs WHERE name = $1")
            .bind(name)
            .execute(&mut *tx)
            .await?;

        let job = sqlx::query_as::<_, ScheduledJob>(
            r#"
            INSERT INTO scheduled_jobs (
                id, name, data, repeat_interval_secs, next_run_at,
                fail_count, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, 0, $6, $6)
            RETURNING *
            "#,
        )
        .bind(job.id)
        .bind(&job.name)
        .bind(&job.data)
        .bind(job.repeat_interval_secs)
        .bind(job.next_run_at)
        .bind(job.created_at)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to insert scheduled job")?;

        tx.commit().await?;
        Ok(job)
    }

    async fn cancel(&self, name: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM scheduled_jobs WHERE name = $1")
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn find_by_name(&self, name: &str) -> Result<Vec<ScheduledJob>> {
        let jobs = sqlx::query_as::<_, ScheduledJob>(
            "SELECT * FROM scheduled_jobs WHERE name = $1 ORDER BY next_run_at",
        )
        .bind(name)
        .fetch_all(&self.pool)
        .await?;
        Ok(jobs)
    }

    async fn claim_due(
        &self,
        name: &str,
        lock_lifetime: Duration,
    ) -> Result<Option<ScheduledJob>> {
        let lifetime_ms = lock_lifetime.as_millis().to_string();

        let job = sqlx::query_as::<_, ScheduledJob>(
            r#"
            UPDATE scheduled_jobs
            SET locked_at = NOW(),
                last_run_at = NOW(),
                updated_at = NOW()
            WHERE id = (
                SELECT id
                FROM scheduled_jobs
                WHERE name = $1
                  AND next_run_at <= NOW()
                  AND (locked_at IS NULL
                       OR locked_at < NOW() - ($2 || ' milliseconds')::INTERVAL)
                  AND NOT EXISTS (
                      SELECT 1
                      FROM scheduled_jobs live
                      WHERE live.name = $1
                        AND live.locked_at >= NOW() - ($2 || ' milliseconds')::INTERVAL
                  )
                ORDER BY next_run_at
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(lifetime_ms)
        .fetch_optional(&self.pool)
        .await?;

        Ok(job)
    }

    async fn mark_succeeded(&self, id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE scheduled_jobs
            SET locked_at = NULL,
                last_finished_at = NOW(),
                next_run_at = NOW() + repeat_interval_secs * INTERVAL '1 second',
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, reason: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE scheduled_jobs
            SET locked_at = NULL,
                last_finished_at = NOW(),
                failed_at = NOW(),
                fail_count = fail_count + 1,
                fail_reason = $2,
                next_run_at = NOW() + repeat_interval_secs * INTERVAL '1 second',
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(reason)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
