//! Blog automation - the recurring job that drafts one post per tick.
//!
//! ```text
//! start()  ──► jobs.schedule_every(JOB_NAME)      (one record, replaces any)
//! stop()   ──► jobs.cancel(JOB_NAME)
//!
//! JobWorker tick / trigger_once()
//!     │
//!     └─► run_cycle()
//!             ├─► load rotation, pick next category
//!             ├─► generate_blog_post (LLM call + draft insert)
//!             └─► save advanced rotation (only after the draft exists)
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::categories::{build_prompt, default_categories};
use super::rotation::RotationState;
use crate::domains::blog::{generate_blog_post, BlogPost, GenerateRequest};
use crate::kernel::jobs::{JobRegistry, JobStats};
use crate::kernel::ServerDeps;

/// Name of the recurring job; also keys the rotation state.
pub const JOB_NAME: &str = "blog-automation-cycle";

#[derive(Debug, Clone)]
pub struct AutomationConfig {
    /// Time between ticks
    pub interval: Duration,
    /// Categories to rotate through; a persisted rotation only keeps its index
    pub categories: Vec<String>,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5 * 60),
            categories: default_categories(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Started {
        interval: Duration,
        next_run_at: DateTime<Utc>,
    },
    /// A schedule already exists; nothing was changed.
    AlreadyRunning,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RotationSnapshot {
    pub current_index: usize,
    pub last_run: Option<DateTime<Utc>>,
    pub next_category: Option<String>,
}

impl From<&RotationState> for RotationSnapshot {
    fn from(state: &RotationState) -> Self {
        Self {
            current_index: state.current_index,
            last_run: state.last_run,
            next_category: state.next_category().map(|(category, _)| category.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AutomationStatus {
    pub is_running: bool,
    pub next_run_time: Option<DateTime<Utc>>,
    pub job_stats: JobStats,
    pub rotation: RotationSnapshot,
}

/// Control surface and tick body of the blog automation.
#[derive(Clone)]
pub struct BlogAutomation {
    deps: Arc<ServerDeps>,
    config: AutomationConfig,
}

impl BlogAutomation {
    pub fn new(deps: Arc<ServerDeps>, config: AutomationConfig) -> Self {
        Self { deps, config }
    }

    pub fn config(&self) -> &AutomationConfig {
        &self.config
    }

    /// Schedule the recurring tick unless it is already scheduled.
    pub async fn start(&self, interval: Duration) -> Result<StartOutcome> {
        if interval < Duration::from_secs(1) {
            bail!("automation interval must be at least one second");
        }

        if self.status().await?.is_running {
            info!(job_name = JOB_NAME, "Blog automation already running");
            return Ok(StartOutcome::AlreadyRunning);
        }

        let jobs = &self.deps.jobs;
        jobs.cancel(JOB_NAME).await?;
        let job = jobs
            .schedule_every(JOB_NAME, interval, serde_json::json!({}))
            .await?;

        info!(
            job_name = JOB_NAME,
            interval_secs = interval.as_secs(),
            next_run_at = %job.next_run_at,
            "Blog automation started"
        );

        Ok(StartOutcome::Started {
            interval,
            next_run_at: job.next_run_at,
        })
    }

    /// Cancel every scheduled instance. Returns how many were cancelled.
    pub async fn stop(&self) -> Result<u64> {
        let cancelled = self.deps.jobs.cancel(JOB_NAME).await?;
        info!(job_name = JOB_NAME, cancelled, "Blog automation stopped");
        Ok(cancelled)
    }

    pub async fn status(&self) -> Result<AutomationStatus> {
        let now = Utc::now();
        let jobs = self.deps.jobs.find_by_name(JOB_NAME).await?;

        // An overdue record the worker has not claimed yet still counts
        let is_running = !jobs.is_empty();
        let next_run_time = jobs.iter().map(|job| job.next_run_at).min();
        let rotation = self.load_rotation().await?;

        Ok(AutomationStatus {
            is_running,
            next_run_time,
            job_stats: JobStats::from_jobs(&jobs, now),
            rotation: RotationSnapshot::from(&rotation),
        })
    }

    /// Run one cycle right now, outside the schedule.
    ///
    /// Leaves the job records untouched.
    pub async fn trigger_once(&self) -> Result<BlogPost> {
        info!(job_name = JOB_NAME, "Blog automation triggered manually");
        self.run_cycle().await
    }

    /// One tick: next category, generate, persist, then advance the rotation.
    ///
    /// Any failure leaves the rotation where it was and stores nothing.
    pub async fn run_cycle(&self) -> Result<BlogPost> {
        let rotation = self.load_rotation().await?;
        let (category, index) = rotation
            .next_category()
            .ok_or_else(|| anyhow!("No blog categories configured"))?;

        let request = GenerateRequest {
            prompt: build_prompt(category),
            category: Some(category.to_string()),
            custom_tags: Vec::new(),
        };

        let post = match generate_blog_post(&request, &self.deps).await {
            Ok(post) => post,
            Err(e) => {
                warn!(category = %category, error = %e, "Blog automation cycle failed");
                return Err(e.into());
            }
        };

        self.deps
            .rotation
            .save(JOB_NAME, &rotation.advanced_to(index, Utc::now()))
            .await?;

        info!(
            post_id = %post.id,
            slug = %post.slug,
            category = %category,
            rotation_index = index,
            "Blog automation cycle completed"
        );

        Ok(post)
    }

    /// Register `run_cycle` as the handler for the recurring job.
    pub fn register(&self, registry: &mut JobRegistry) {
        let automation = self.clone();
        registry.register(JOB_NAME, move |_job| {
            let automation = automation.clone();
            async move { automation.run_cycle().await.map(|_| ()) }
        });
    }

    /// Stored rotation position over the configured categories.
    async fn load_rotation(&self) -> Result<RotationState> {
        let categories = self.config.categories.clone();
        let state = match self.deps.rotation.load(JOB_NAME).await? {
            Some(stored) => RotationState {
                current_index: stored.current_index,
                last_run: stored.last_run,
                categories,
            },
            None => RotationState::initial(categories),
        };
        Ok(state)
    }
}
