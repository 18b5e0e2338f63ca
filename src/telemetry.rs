//! Fire-and-forget background work
//!
//! Usage logging, cache writes and memory refreshes run here after a
//! response is ready. Failures are logged and dropped.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::warn;

#[derive(Clone, Default)]
pub struct Telemetry {
    tasks: Arc<Mutex<JoinSet<()>>>,
}

impl Telemetry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` in the background; an `Err` is logged under `label`
    pub async fn spawn<F, E>(&self, label: &'static str, task: F)
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: std::fmt::Display + Send + 'static,
    {
        let mut tasks = self.tasks.lock().await;
        // reap finished tasks
        while let Some(done) = tasks.try_join_next() {
            if let Err(e) = done {
                warn!("Background task panicked: {}", e);
            }
        }
        tasks.spawn(async move {
            if let Err(e) = task.await {
                warn!("Background {} failed: {}", label, e);
            }
        });
    }

    /// Wait for every pending task; used at shutdown and in tests
    pub async fn flush(&self) {
        let mut tasks = self.tasks.lock().await;
        while let Some(done) = tasks.join_next().await {
            if let Err(e) = done {
                warn!("Background task panicked: {}", e);
            }
        }
    }

    pub async fn pending(&self) -> usize {
        self.tasks.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_failures_are_swallowed_and_flushed() {
        let telemetry = Telemetry::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let c = counter.clone();
        telemetry
            .spawn("ok", async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<(), String>(())
            })
            .await;
        telemetry
            .spawn("failing", async { Err::<(), String>("boom".to_string()) })
            .await;

        telemetry.flush().await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(telemetry.pending().await, 0);
    }
}
