//! Background task offloading port.
//!
//! Plugins hand the host a named `'static` job and return without waiting.
//! Whether the job runs on a worker or in place is the host's choice.

use async_trait::async_trait;
use futures::future::BoxFuture;
use std::sync::Mutex;

pub type Job = BoxFuture<'static, ()>;

#[async_trait]
pub trait TaskOffloader: Send + Sync {
    async fn submit(&self, name: &str, job: Job);
}

/// Spawns each job on the ambient tokio runtime and returns immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioOffloader;

#[async_trait]
impl TaskOffloader for TokioOffloader {
    async fn submit(&self, name: &str, job: Job) {
        tracing::debug!(task = name, "offloading task");
        tokio::spawn(job);
    }
}

/// Runs each job to completion before `submit` returns.
///
/// Used by short-lived hosts (the CLI) and by tests that assert on the
/// state a job leaves behind.
#[derive(Debug, Default)]
pub struct InlineOffloader {
    submitted: Mutex<Vec<String>>,
}

impl InlineOffloader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the jobs run so far, in submission order.
    pub fn submitted(&self) -> Vec<String> {
        self.submitted
            .lock()
            .map(|names| names.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TaskOffloader for InlineOffloader {
    async fn submit(&self, name: &str, job: Job) {
        if let Ok(mut names) = self.submitted.lock() {
            names.push(name.to_string());
        }
        tracing::debug!(task = name, "running task inline");
        job.await;
    }
}
