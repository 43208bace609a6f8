use serde::{Deserialize, Serialize};

use crate::domains::blog::models::{BlogPost, BlogPostSource, BlogPostStatus};

/// Full post as returned by the public API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostData {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub status: BlogPostStatus,
    pub source: BlogPostSource,
    pub created_at: String,
    pub updated_at: String,
}

impl From<BlogPost> for BlogPostData {
    fn from(post: BlogPost) -> Self {
        Self {
            id: post.id.to_string(),
            title: post.title,
            slug: post.slug,
            content: post.content,
            excerpt: post.excerpt,
            tags: post.tags,
            category: post.category,
            status: post.status,
            source: post.source,
            created_at: post.created_at.to_rfc3339(),
            updated_at: post.updated_at.to_rfc3339(),
        }
    }
}

/// Identifiers of a created draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogPostSummary {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub status: BlogPostStatus,
}

impl From<&BlogPost> for BlogPostSummary {
    fn from(post: &BlogPost) -> Self {
        Self {
            id: post.id.to_string(),
            title: post.title.clone(),
            slug: post.slug.clone(),
            status: post.status,
        }
    }
}
