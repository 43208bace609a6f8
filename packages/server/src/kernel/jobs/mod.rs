//! Job infrastructure for recurring background work.
//!
//! This module provides the kernel-level infrastructure for job execution:
//! - [`ScheduledJob`] - Named recurring job record
//! - [`JobStore`] - Persistence with single-instance claiming
//!   ([`PostgresJobStore`], [`MemoryJobStore`])
//! - [`JobRegistry`] - Maps job names to handlers
//! - [`JobWorker`] - Long-running service that polls and executes due jobs
//!
//! # Architecture
//!
//! ```text
//! Domain calls jobs.schedule_every(name, interval)
//!     │
//!     └─► One record per name (replaces any existing one)
//!
//! JobWorker
//!     │
//!     ├─► claim_due(name) for each registered name
//!     ├─► JobRegistry.execute(job)
//!     └─► Mark succeeded/failed (sets next_run_at)
//! ```
//!
//! Job bodies live in their respective domains. This module only provides
//! the infrastructure.

mod job;
mod postgres_store;
mod registry;
mod store;
mod worker;

pub use job::{chrono_duration, JobStats, RunOutcome, ScheduledJob};
pub use postgres_store::PostgresJobStore;
pub use registry::JobRegistry;
pub use store::{JobStore, MemoryJobStore};
pub use worker::{JobWorker, JobWorkerConfig};
