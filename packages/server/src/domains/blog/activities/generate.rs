//! Blog post generation - ask the LLM for a post, parse it, store it as a draft.

use completion_client::CompletionError;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::common::{generate_excerpt, slugify, strip_code_fence};
use crate::domains::blog::models::{BlogPost, BlogPostSource, BlogPostStatus, NewBlogPost};
use crate::domains::blog::store::StoreError;
use crate::kernel::ServerDeps;

/// Excerpt length used when the model does not provide one
const EXCERPT_CHARS: usize = 160;

const BLOG_SYSTEM_PROMPT: &str = r#"You are a content writer for a software studio's company blog.
Write one complete, original blog post in Markdown for the topic you are given.

Respond with a single JSON object and nothing else:
{
  "title": "Post title",
  "slug": "url-friendly-slug",
  "excerpt": "One or two sentence summary",
  "content": "Full post body in Markdown",
  "tags": ["tag-one", "tag-two"]
}

Rules:
- "title" and "content" are required
- Keep the excerpt under 160 characters
- Use 3 to 6 short lowercase tags
- Do not wrap the JSON in code fences"#;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("invalid generation request: {0}")]
    InvalidRequest(String),

    /// The provider call failed. `status` is the HTTP status when the
    /// provider answered; network failures and timeouts carry none.
    #[error("generation provider error{}: {message}", .status.map(|s| format!(" ({})", s)).unwrap_or_default())]
    Provider { status: Option<u16>, message: String },

    #[error("malformed generation response: {0}")]
    MalformedResponse(String),

    #[error("generated post is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("a blog post with slug '{0}' already exists")]
    DuplicateSlug(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl GenerationError {
    /// Classify an error returned by `BaseAI`.
    pub fn from_ai(error: anyhow::Error) -> Self {
        match error.downcast_ref::<CompletionError>() {
            Some(CompletionError::Api { status, message }) => Self::Provider {
                status: Some(*status),
                message: message.clone(),
            },
            Some(CompletionError::Parse(message)) => Self::MalformedResponse(message.clone()),
            Some(CompletionError::Network(message)) | Some(CompletionError::Config(message)) => {
                Self::Provider {
                    status: None,
                    message: message.clone(),
                }
            }
            None => Self::Provider {
                status: None,
                message: format!("{:#}", error),
            },
        }
    }

    pub fn provider_status(&self) -> Option<u16> {
        match self {
            Self::Provider { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<StoreError> for GenerationError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::DuplicateSlug(slug) => Self::DuplicateSlug(slug),
            StoreError::Database(e) => Self::Storage(e.into()),
        }
    }
}

/// Request for one generated post.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub prompt: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub custom_tags: Vec<String>,
}

/// A post as returned by the model, validated and normalised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPost {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawGeneratedPost {
    title: Option<String>,
    #[serde(alias = "body")]
    content: Option<String>,
    slug: Option<String>,
    excerpt: Option<String>,
    #[serde(default)]
    tags: Option<RawTags>,
}

/// Models return tags either as a list or a comma-separated string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTags {
    List(Vec<String>),
    Joined(String),
}

impl RawTags {
    fn into_vec(self) -> Vec<String> {
        let tags = match self {
            RawTags::List(tags) => tags,
            RawTags::Joined(joined) => joined.split(',').map(String::from).collect(),
        };
        tags.into_iter()
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse the model's raw response into a post.
///
/// Accepts the JSON object bare or wrapped in a Markdown code fence. `title`
/// and `content` (or `body`) are required. The slug is normalised through
/// [`slugify`], falling back to the title when absent.
pub fn parse_generated_post(raw: &str) -> Result<GeneratedPost, GenerationError> {
    let json = strip_code_fence(raw);
    let parsed: RawGeneratedPost = serde_json::from_str(json)
        .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

    let title = non_blank(parsed.title).ok_or(GenerationError::MissingField("title"))?;
    let content = non_blank(parsed.content).ok_or(GenerationError::MissingField("content"))?;

    let slug = match non_blank(parsed.slug) {
        Some(provided) => slugify(&provided),
        None => slugify(&title),
    };
    if slug.is_empty() {
        return Err(GenerationError::MissingField("slug"));
    }

    Ok(GeneratedPost {
        title,
        slug,
        content,
        excerpt: non_blank(parsed.excerpt),
        tags: parsed.tags.map(RawTags::into_vec).unwrap_or_default(),
    })
}

/// Merge tag lists in order, dropping case-insensitive duplicates.
pub fn merge_tags<'a>(lists: impl IntoIterator<Item = &'a [String]>) -> Vec<String> {
    let mut merged: Vec<String> = Vec::new();
    for tag in lists.into_iter().flatten() {
        let tag = tag.trim();
        if tag.is_empty() {
            continue;
        }
        if !merged.iter().any(|existing| existing.eq_ignore_ascii_case(tag)) {
            merged.push(tag.to_string());
        }
    }
    merged
}

/// Generate one post and store it as an automation draft.
pub async fn generate_blog_post(
    request: &GenerateRequest,
    deps: &ServerDeps,
) -> Result<BlogPost, GenerationError> {
    if request.prompt.trim().is_empty() {
        return Err(GenerationError::InvalidRequest(
            "prompt must not be empty".to_string(),
        ));
    }

    let raw = deps
        .ai
        .complete_json(BLOG_SYSTEM_PROMPT, &request.prompt)
        .await
        .map_err(GenerationError::from_ai)?;

    let generated = parse_generated_post(&raw)?;

    let category = non_blank(request.category.clone());
    let category_tags: Vec<String> = category.iter().cloned().collect();
    let tags = merge_tags([
        generated.tags.as_slice(),
        request.custom_tags.as_slice(),
        category_tags.as_slice(),
    ]);

    let excerpt = generated
        .excerpt
        .unwrap_or_else(|| generate_excerpt(&generated.content, EXCERPT_CHARS));

    let post = deps
        .posts
        .create(NewBlogPost {
            title: generated.title,
            slug: generated.slug,
            content: generated.content,
            excerpt: Some(excerpt),
            tags,
            category,
            status: BlogPostStatus::Draft,
            source: BlogPostSource::Automation,
        })
        .await?;

    info!(
        post_id = %post.id,
        slug = %post.slug,
        category = ?post.category,
        model = %deps.ai.model(),
        "Generated blog post draft"
    );

    Ok(post)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_derived_from_title() {
        let post = parse_generated_post(r#"{"title":"Foo Bar","content":"..."}"#).unwrap();
        assert_eq!(post.slug, "foo-bar");
        assert_eq!(post.content, "...");
        assert!(post.tags.is_empty());
    }

    #[test]
    fn test_provided_slug_is_normalised() {
        let post =
            parse_generated_post(r#"{"title":"T","content":"c","slug":"My Custom Slug!"}"#)
                .unwrap();
        assert_eq!(post.slug, "my-custom-slug");
    }

    #[test]
    fn test_code_fence_is_stripped() {
        let raw = "```json\n{\"title\":\"Fenced\",\"body\":\"Body text\",\"tags\":\"a, b\"}\n```";
        let post = parse_generated_post(raw).unwrap();
        assert_eq!(post.title, "Fenced");
        assert_eq!(post.content, "Body text");
        assert_eq!(post.tags, vec!["a", "b"]);
    }

    #[test]
    fn test_single_line_code_fence_is_stripped() {
        let raw = "```json{\"title\":\"One Line\",\"content\":\"Body\"}```";
        let post = parse_generated_post(raw).unwrap();
        assert_eq!(post.slug, "one-line");
    }

    #[test]
    fn test_missing_title() {
        let err = parse_generated_post(r#"{"content":"c"}"#).unwrap_err();
        assert!(matches!(err, GenerationError::MissingField("title")));
    }

    #[test]
    fn test_missing_body() {
        let err = parse_generated_post(r#"{"title":"t","content":"   "}"#).unwrap_err();
        assert!(matches!(err, GenerationError::MissingField("content")));
    }

    #[test]
    fn test_title_without_alphanumerics_has_no_slug() {
        let err = parse_generated_post(r#"{"title":"!!!","content":"c"}"#).unwrap_err();
        assert!(matches!(err, GenerationError::MissingField("slug")));
    }

    #[test]
    fn test_not_json_is_malformed() {
        let err = parse_generated_post("Here is your post: Foo").unwrap_err();
        assert!(matches!(err, GenerationError::MalformedResponse(_)));
    }

    #[test]
    fn test_merge_tags_dedupes_case_insensitively() {
        let generated = vec!["Rust".to_string(), "web".to_string()];
        let custom = vec!["rust".to_string(), " ".to_string(), "ai".to_string()];
        let category = vec!["Web".to_string()];

        let merged = merge_tags([
            generated.as_slice(),
            custom.as_slice(),
            category.as_slice(),
        ]);
        assert_eq!(merged, vec!["Rust", "web", "ai"]);
    }

    #[test]
    fn test_from_ai_keeps_provider_status() {
        let error = anyhow::Error::new(CompletionError::Api {
            status: 402,
            message: "Insufficient credits".to_string(),
        });
        let classified = GenerationError::from_ai(error);
        assert_eq!(classified.provider_status(), Some(402));
    }
}
