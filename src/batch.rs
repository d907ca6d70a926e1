//! Bounded Batch Runner
//!
//! Applies a blocking per-item job across a list of items on tokio's blocking
//! pool, at most `workers` at a time. Every item yields exactly one output, in
//! input order. A job that panics is turned into that item's failure output
//! instead of taking the batch down.

use std::sync::Arc;
use tokio::sync::Semaphore;

#[derive(Debug, Clone, Copy)]
pub struct BatchRunner {
    workers: usize,
}

impl Default for BatchRunner {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}

impl BatchRunner {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `job` over every item.
    ///
    /// `on_failure` builds the output for an item whose job panicked or whose
    /// task could not be joined.
    pub async fn run<I, O, F, E>(&self, items: Vec<I>, job: F, on_failure: E) -> Vec<O>
    where
        I: Clone + Send + 'static,
        O: Send + 'static,
        F: Fn(I) -> O + Send + Sync + 'static,
        E: Fn(&I, String) -> O,
    {
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let job = Arc::new(job);
        let total = items.len();

        let mut handles = Vec::with_capacity(total);
        for item in items {
            let sem = Arc::clone(&semaphore);
            let job = Arc::clone(&job);
            let input = item.clone();

            let handle = tokio::spawn(async move {
                // The semaphore is never closed while tasks hold a clone of it
                let _permit = sem.acquire_owned().await.ok();
                tokio::task::spawn_blocking(move || (*job)(input)).await
            });
            handles.push((item, handle));
        }

        let mut outputs = Vec::with_capacity(total);
        for (item, handle) in handles {
            let output = match handle.await {
                Ok(Ok(output)) => output,
                Ok(Err(join_err)) | Err(join_err) => {
                    tracing::warn!(error = %join_err, "Task panicked");
                    on_failure(&item, format!("Task panicked: {}", join_err))
                }
            };
            outputs.push(output);
        }

        tracing::debug!("[BatchRunner] {} items processed with {} workers", total, self.workers);
        outputs
    }
}
