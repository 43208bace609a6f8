//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method, Request,
    },
    middleware::{self, Next},
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::domains::automation::BlogAutomation;
use crate::kernel::ServerDeps;
use crate::server::middleware::admin_auth_middleware;
use crate::server::routes::{
    automation_status_handler, generate_post_handler, get_post_handler, health_handler,
    start_automation_handler, stop_automation_handler, trigger_automation_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub deps: Arc<ServerDeps>,
    pub automation: BlogAutomation,
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}

/// Build the Axum application router
///
/// Admin routes (`/automation/*`) require the bearer admin token.
pub fn build_app(
    state: AppState,
    admin_token: impl Into<String>,
    allowed_origins: &[String],
) -> Router {
    let admin_token = Arc::new(admin_token.into());

    let admin_routes = Router::new()
        .route(
            "/automation/control",
            post(start_automation_handler)
                .delete(stop_automation_handler)
                .get(automation_status_handler)
                .put(trigger_automation_handler),
        )
        .route("/automation/generate", post(generate_post_handler))
        .layer(middleware::from_fn(move |req: Request<Body>, next: Next| {
            admin_auth_middleware(admin_token.clone(), req, next)
        }));

    let public_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/blog/posts/:slug", get(get_post_handler));

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .layer(Extension(state))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
}
