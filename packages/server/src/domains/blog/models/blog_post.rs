use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

// =============================================================================
// Enums
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "blog_post_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BlogPostStatus {
    #[default]
    Draft,
    Published,
}

/// Who created the post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "blog_post_source", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BlogPostSource {
    Automation,
    #[default]
    Manual,
}

// =============================================================================
// Models
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BlogPost {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub status: BlogPostStatus,
    pub source: BlogPostSource,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a post.
#[derive(Debug, Clone)]
pub struct NewBlogPost {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub status: BlogPostStatus,
    pub source: BlogPostSource,
}

impl NewBlogPost {
    /// Build the stored record for this input at `now`.
    pub fn into_post(self, now: DateTime<Utc>) -> BlogPost {
        BlogPost {
            id: Uuid::now_v7(),
            title: self.title,
            slug: self.slug,
            content: self.content,
            excerpt: self.excerpt,
            tags: self.tags,
            category: self.category,
            status: self.status,
            source: self.source,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// BlogPost Queries
// =============================================================================

impl BlogPost {
    /// Insert a post. A slug collision surfaces as a unique violation.
    pub async fn create(input: NewBlogPost, pool: &PgPool) -> Result<Self, sqlx::Error> {
        let post = input.into_post(Utc::now());

        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO blog_posts (
                id, title, slug, content, excerpt, tags, category,
                status, source, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
            RETURNING *
            "#,
        )
        .bind(post.id)
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.content)
        .bind(&post.excerpt)
        .bind(&post.tags)
        .bind(&post.category)
        .bind(post.status)
        .bind(post.source)
        .bind(post.created_at)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_slug(slug: &str, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM blog_posts WHERE slug = $1")
            .bind(slug)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM blog_posts WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }
}
