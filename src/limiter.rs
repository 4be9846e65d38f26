//! Serialized request queue with minimum spacing between jobs
//!
//! Provides a `RateLimiter` that runs submitted jobs one at a time on a
//! single background worker, enforcing a minimum interval between the start
//! of consecutive jobs. All callers share the worker's budget: no matter how
//! many tasks enqueue concurrently, at most one job is in flight and no two
//! jobs start less than `min_interval` apart.

use std::future::Future;
use std::time::Duration;

use futures::future::BoxFuture;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Instant};
use tracing::debug;

/// A queued unit of work, resolved exactly once by the worker
type Job = BoxFuture<'static, ()>;

/// The limiter's worker task has stopped and can no longer accept jobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("rate limiter worker is no longer running")]
pub struct LimiterClosed;

/// Handle to a serialized work queue
///
/// Clones share the queue and its budget. Dropping every handle closes the
/// queue; the worker drains what was already enqueued and then exits. Jobs
/// cannot be cancelled once submitted.
#[derive(Clone)]
pub struct RateLimiter {
    tx: mpsc::UnboundedSender<Job>,
}

impl RateLimiter {
    /// Spawns the worker task and returns a handle to its queue
    ///
    /// # Arguments
    /// * `min_interval` - Minimum time between the start of consecutive jobs
    pub fn new(min_interval: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_worker(rx, min_interval));
        Self { tx }
    }

    /// Submits `task` to the queue and waits for its output
    ///
    /// The task itself executes on the worker, after any pacing delay, so the
    /// caller is suspended for queue time + delay + task duration.
    pub async fn run<T, Fut>(&self, task: Fut) -> Result<T, LimiterClosed>
    where
        T: Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        let (done_tx, done_rx) = oneshot::channel();
        let job: Job = Box::pin(async move {
            let output = task.await;
            let _ = done_tx.send(output);
        });
        self.tx.send(job).map_err(|_| LimiterClosed)?;
        done_rx.await.map_err(|_| LimiterClosed)
    }
}

/// Worker loop: drain the queue one job at a time with pacing
///
/// The timestamp is taken after each job completes, success or failure, so a
/// slow upstream call pushes the next slot out rather than overlapping it.
async fn run_worker(mut rx: mpsc::UnboundedReceiver<Job>, min_interval: Duration) {
    let mut last_request: Option<Instant> = None;

    while let Some(job) = rx.recv().await {
        if let Some(last) = last_request {
            let ready_at = last + min_interval;
            let now = Instant::now();
            if ready_at > now {
                debug!(
                    wait_ms = (ready_at - now).as_millis() as u64,
                    "waiting before next upstream request"
                );
                sleep_until(ready_at).await;
            }
        }

        job.await;
        last_request = Some(Instant::now());
    }
}
