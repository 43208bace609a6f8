use axum::extract::{Extension, Path};
use axum::Json;

use crate::domains::blog::BlogPostData;
use crate::server::app::AppState;
use crate::server::error::AppError;

/// GET /blog/posts/:slug
pub async fn get_post_handler(
    Extension(state): Extension<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<BlogPostData>, AppError> {
    let post = state
        .deps
        .posts
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Blog post '{}' not found", slug)))?;

    Ok(Json(BlogPostData::from(post)))
}
