//! Admin control surface for the blog automation.

use axum::extract::rejection::JsonRejection;
use axum::extract::Extension;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domains::automation::{RotationSnapshot, StartOutcome};
use crate::domains::blog::{generate_blog_post, BlogPostSummary, GenerateRequest};
use crate::kernel::jobs::JobStats;
use crate::server::app::AppState;
use crate::server::error::AppError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartResponse {
    pub success: bool,
    pub message: String,
    pub is_running: bool,
    /// Interval in minutes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_run_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StopResponse {
    pub success: bool,
    pub message: String,
    pub is_running: bool,
    pub cancelled: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub success: bool,
    pub is_running: bool,
    pub next_run_time: Option<DateTime<Utc>>,
    pub job_stats: JobStats,
    pub rotation: RotationSnapshot,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostResponse {
    pub success: bool,
    pub message: String,
    pub blog_post: BlogPostSummary,
}

/// POST /automation/control - start the recurring schedule
pub async fn start_automation_handler(
    Extension(state): Extension<AppState>,
) -> Result<Json<StartResponse>, AppError> {
    let interval = state.automation.config().interval;

    let response = match state.automation.start(interval).await? {
        StartOutcome::Started {
            interval,
            next_run_at,
        } => StartResponse {
            success: true,
            message: "Blog automation started".to_string(),
            is_running: true,
            interval: Some(interval.as_secs() / 60),
            interval_seconds: Some(interval.as_secs()),
            next_run_time: Some(next_run_at),
        },
        StartOutcome::AlreadyRunning => StartResponse {
            success: false,
            message: "Blog automation is already running".to_string(),
            is_running: true,
            interval: None,
            interval_seconds: None,
            next_run_time: None,
        },
    };

    Ok(Json(response))
}

/// DELETE /automation/control - cancel the schedule
pub async fn stop_automation_handler(
    Extension(state): Extension<AppState>,
) -> Result<Json<StopResponse>, AppError> {
    let cancelled = state.automation.stop().await?;

    Ok(Json(StopResponse {
        success: true,
        message: "Blog automation stopped".to_string(),
        is_running: false,
        cancelled,
    }))
}

/// GET /automation/control - schedule status and run statistics
pub async fn automation_status_handler(
    Extension(state): Extension<AppState>,
) -> Result<Json<StatusResponse>, AppError> {
    let status = state.automation.status().await?;

    Ok(Json(StatusResponse {
        success: true,
        is_running: status.is_running,
        next_run_time: status.next_run_time,
        job_stats: status.job_stats,
        rotation: status.rotation,
    }))
}

/// PUT /automation/control - run one cycle now
pub async fn trigger_automation_handler(
    Extension(state): Extension<AppState>,
) -> Result<Json<BlogPostResponse>, AppError> {
    let post = state.automation.trigger_once().await?;

    Ok(Json(BlogPostResponse {
        success: true,
        message: "Blog post generated".to_string(),
        blog_post: BlogPostSummary::from(&post),
    }))
}

/// POST /automation/generate - generate one draft from an explicit prompt
pub async fn generate_post_handler(
    Extension(state): Extension<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<BlogPostResponse>, AppError> {
    let Json(request) = payload.map_err(|rejection| {
        AppError::bad_request(format!("Invalid request body: {}", rejection.body_text()))
    })?;
    let post = generate_blog_post(&request, &state.deps).await?;

    Ok(Json(BlogPostResponse {
        success: true,
        message: "Blog post generated".to_string(),
        blog_post: BlogPostSummary::from(&post),
    }))
}
