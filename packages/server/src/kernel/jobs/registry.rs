//! Job registry mapping job names to handlers.
//!
//! Each domain registers its recurring jobs at startup. The worker polls the
//! store for every registered name and dispatches a claimed record to the
//! handler registered under that name.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use anyhow::{anyhow, Result};

use super::job::ScheduledJob;

/// Type alias for the async handler function.
///
/// Handlers receive the claimed record; anything else they need is captured
/// in the closure when registering.
type BoxedHandler = Box<
    dyn Fn(ScheduledJob) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> + Send + Sync,
>;

/// Registry that maps job names to handlers.
///
/// # Example
///
/// ```ignore
/// let mut registry = JobRegistry::new();
///
/// let automation = automation.clone();
/// registry.register("blog-automation-cycle", move |_job| {
///     let automation = automation.clone();
///     async move { automation.run_cycle().await.map(|_| ()) }
/// });
/// ```
#[derive(Default)]
pub struct JobRegistry {
    handlers: BTreeMap<&'static str, BoxedHandler>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handler for `name`, replacing any previous one.
    pub fn register<F, Fut>(&mut self, name: &'static str, handler: F)
    where
        F: Fn(ScheduledJob) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let boxed: BoxedHandler = Box::new(move |job| Box::pin(handler(job)));
        self.handlers.insert(name, boxed);
    }

    /// Execute a claimed job with the handler registered for its name.
    pub async fn execute(&self, job: ScheduledJob) -> Result<()> {
        let handler = self
            .handlers
            .get(job.name.as_str())
            .ok_or_else(|| anyhow!("Unknown job name: {}", job.name))?;

        handler(job).await
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered job names, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handlers.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::Utc;

    use super::*;

    fn job(name: &str) -> ScheduledJob {
        ScheduledJob::recurring(name, Duration::from_secs(60), serde_json::json!({}), Utc::now())
    }

    #[tokio::test]
    async fn test_execute_dispatches_by_name() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = JobRegistry::new();

        let counter = calls.clone();
        registry.register("counting", move |_job| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<(), anyhow::Error>(())
            }
        });

        registry.execute(job("counting")).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(registry.is_registered("counting"));
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["counting"]);
    }

    #[tokio::test]
    async fn test_execute_unknown_name_fails() {
        let registry = JobRegistry::new();
        let err = registry.execute(job("missing")).await.unwrap_err();
        assert!(err.to_string().contains("Unknown job name"));
    }
}
