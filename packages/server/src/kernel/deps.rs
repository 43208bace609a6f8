//! Server dependencies for activities (using traits for testability)
//!
//! This module provides the central dependency container used by all domain
//! activities. All external services use trait abstractions to enable testing.

use std::sync::Arc;

use sqlx::PgPool;

use crate::domains::automation::{PostgresRotationStore, RotationStore};
use crate::domains::blog::{BlogPostStore, PostgresBlogPostStore};
use crate::kernel::jobs::{JobStore, PostgresJobStore};
use crate::kernel::BaseAI;

/// Server dependencies accessible to activities (using traits for testability)
#[derive(Clone)]
pub struct ServerDeps {
    /// Database pool; `None` when running on in-memory stores
    pub db_pool: Option<PgPool>,
    /// LLM used for blog generation
    pub ai: Arc<dyn BaseAI>,
    pub posts: Arc<dyn BlogPostStore>,
    pub rotation: Arc<dyn RotationStore>,
    pub jobs: Arc<dyn JobStore>,
}

impl ServerDeps {
    pub fn new(
        db_pool: Option<PgPool>,
        ai: Arc<dyn BaseAI>,
        posts: Arc<dyn BlogPostStore>,
        rotation: Arc<dyn RotationStore>,
        jobs: Arc<dyn JobStore>,
    ) -> Self {
        Self {
            db_pool,
            ai,
            posts,
            rotation,
            jobs,
        }
    }

    /// Production wiring: every store backed by the given pool.
    pub fn postgres(pool: PgPool, ai: Arc<dyn BaseAI>) -> Self {
        Self::new(
            Some(pool.clone()),
            ai,
            Arc::new(PostgresBlogPostStore::new(pool.clone())),
            Arc::new(PostgresRotationStore::new(pool.clone())),
            Arc::new(PostgresJobStore::new(pool)),
        )
    }
}
