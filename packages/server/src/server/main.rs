// Main entry point for API server

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use cms_core::domains::automation::{AutomationConfig, BlogAutomation};
use cms_core::kernel::jobs::{JobRegistry, JobWorker, JobWorkerConfig};
use cms_core::kernel::{OpenAIClient, ServerDeps};
use cms_core::server::{build_app, AppState};
use cms_core::Config;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How long shutdown waits for an in-flight automation tick
const WORKER_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,cms_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting company site CMS API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    // AI client
    let mut ai = OpenAIClient::new(&config.openai_api_key, &config.generation_model)
        .with_timeout(config.generation_timeout)?;
    if let Some(base_url) = &config.openai_base_url {
        ai = ai.with_base_url(base_url);
    }

    let deps = Arc::new(ServerDeps::postgres(pool, Arc::new(ai)));

    // Automation + worker
    let worker_config = JobWorkerConfig::default();
    let automation = BlogAutomation::new(
        deps.clone(),
        AutomationConfig {
            interval: config.automation_interval,
            ..Default::default()
        },
    );

    let mut registry = JobRegistry::new();
    automation.register(&mut registry);
    let worker = JobWorker::with_config(deps.jobs.clone(), Arc::new(registry), worker_config);

    let shutdown = CancellationToken::new();
    let worker_handle = tokio::spawn(worker.run(shutdown.clone()));

    // Build application
    let app = build_app(
        AppState {
            deps: deps.clone(),
            automation,
        },
        config.admin_api_token.clone(),
        &config.allowed_origins,
    );

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Stop the worker; a tick in progress gets a bounded grace period
    shutdown.cancel();
    match tokio::time::timeout(WORKER_SHUTDOWN_TIMEOUT, worker_handle).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => tracing::error!(error = %e, "Job worker exited with error"),
        Ok(Err(e)) => tracing::error!(error = %e, "Job worker task panicked"),
        Err(_) => tracing::warn!("Timed out waiting for job worker to stop"),
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
