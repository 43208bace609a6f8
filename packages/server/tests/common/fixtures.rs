//! In-memory application fixtures.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use cms_core::domains::automation::{AutomationConfig, BlogAutomation};
use cms_core::kernel::jobs::{JobRegistry, JobWorker, JobWorkerConfig};
use cms_core::kernel::{MockAI, TestDependencies};
use cms_core::server::{build_app, AppState};

pub const ADMIN_TOKEN: &str = "test-admin-token";

pub const AUTOMATION_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// JSON the model would return for a post.
pub fn generated_post(title: &str, content: &str) -> String {
    serde_json::json!({ "title": title, "content": content }).to_string()
}

/// Automation, worker and router wired to in-memory dependencies.
pub struct TestApp {
    pub deps: TestDependencies,
    pub automation: BlogAutomation,
    pub router: Router,
}

impl TestApp {
    pub fn new(ai: MockAI) -> Self {
        Self::with_config(
            ai,
            AutomationConfig {
                interval: AUTOMATION_INTERVAL,
                ..Default::default()
            },
        )
    }

    /// Automation rotating over `categories` instead of the built-in list.
    pub fn with_categories(ai: MockAI, categories: &[&str]) -> Self {
        Self::with_config(
            ai,
            AutomationConfig {
                interval: AUTOMATION_INTERVAL,
                categories: categories.iter().map(|c| c.to_string()).collect(),
            },
        )
    }

    pub fn with_config(ai: MockAI, config: AutomationConfig) -> Self {
        let deps = TestDependencies::new().mock_ai(ai);
        let server_deps = deps.server_deps();

        let automation = BlogAutomation::new(server_deps.clone(), config);

        let router = build_app(
            AppState {
                deps: server_deps,
                automation: automation.clone(),
            },
            ADMIN_TOKEN,
            &[],
        );

        Self {
            deps,
            automation,
            router,
        }
    }

    /// Worker with the automation registered, for driving scheduled ticks.
    pub fn worker(&self) -> JobWorker {
        let mut registry = JobRegistry::new();
        self.automation.register(&mut registry);
        JobWorker::with_config(
            self.deps.jobs.clone(),
            Arc::new(registry),
            JobWorkerConfig::with_worker_id("test-worker"),
        )
    }

    /// Make the automation job due and run one worker poll.
    pub async fn run_scheduled_tick(&self) -> usize {
        self.deps.jobs.make_due(cms_core::domains::automation::JOB_NAME);
        self.worker()
            .poll_once()
            .await
            .expect("worker poll should succeed")
    }

    /// Send an admin-authenticated request.
    pub async fn admin(
        &self,
        method: Method,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        self.send(method, uri, body, Some(ADMIN_TOKEN)).await
    }

    /// Send a request and return (status, parsed JSON body).
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<serde_json::Value>,
        token: Option<&str>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }
}
