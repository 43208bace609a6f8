//! Content repository for blog posts.

use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use super::models::{BlogPost, NewBlogPost};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("a blog post with slug '{0}' already exists")]
    DuplicateSlug(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Create and look up blog posts.
#[async_trait]
pub trait BlogPostStore: Send + Sync {
    /// Persist a new post. Slugs are unique.
    async fn create(&self, input: NewBlogPost) -> Result<BlogPost, StoreError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<BlogPost>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<BlogPost>>;
}

// =============================================================================
// Postgres
// =============================================================================

pub struct PostgresBlogPostStore {
    pool: PgPool,
}

impl PostgresBlogPostStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BlogPostStore for PostgresBlogPostStore {
    async fn create(&self, input: NewBlogPost) -> Result<BlogPost, StoreError> {
        let slug = input.slug.clone();
        match BlogPost::create(input, &self.pool).await {
            Ok(post) => Ok(post),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::DuplicateSlug(slug))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<BlogPost>> {
        BlogPost::find_by_slug(slug, &self.pool).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<BlogPost>> {
        BlogPost::find_by_id(id, &self.pool).await
    }
}

// =============================================================================
// In-memory
// =============================================================================

#[derive(Default)]
pub struct MemoryBlogPostStore {
    posts: RwLock<Vec<BlogPost>>,
}

impl MemoryBlogPostStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All stored posts, oldest first.
    pub fn all(&self) -> Vec<BlogPost> {
        self.posts
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.posts.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlogPostStore for MemoryBlogPostStore {
    async fn create(&self, input: NewBlogPost) -> Result<BlogPost, StoreError> {
        let mut posts = self.posts.write().unwrap_or_else(|e| e.into_inner());
        if posts.iter().any(|post| post.slug == input.slug) {
            return Err(StoreError::DuplicateSlug(input.slug));
        }

        let post = input.into_post(Utc::now());
        posts.push(post.clone());
        Ok(post)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<BlogPost>> {
        let posts = self.posts.read().unwrap_or_else(|e| e.into_inner());
        Ok(posts.iter().find(|post| post.slug == slug).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<BlogPost>> {
        let posts = self.posts.read().unwrap_or_else(|e| e.into_inner());
        Ok(posts.iter().find(|post| post.id == id).cloned())
    }
}
