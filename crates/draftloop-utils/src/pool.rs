//! Bounded worker pool with structured shutdown.
//!
//! A [`WorkerPool`] caps how many submitted futures run at once. A slot is
//! acquired before the task is spawned and released when the task finishes,
//! so `submit` waits while the pool is full. [`WorkerPool::shutdown`] waits
//! for every in-flight task to release its slot and then closes the pool;
//! later submissions fail with [`PoolError::Closed`].
//!
//! The pool is an owned value. The orchestrator keeps one for the whole
//! session and the judge creates a fresh one per evaluation.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::PoolError;

/// Handle to a task running on a [`WorkerPool`].
///
/// Dropping the handle does not cancel the task.
#[derive(Debug)]
pub struct PoolTask<T> {
    pool: String,
    handle: JoinHandle<T>,
}

impl<T> PoolTask<T> {
    /// Wait for the task to finish.
    ///
    /// A panic inside the task surfaces as [`PoolError::TaskFailed`].
    pub async fn join(self) -> Result<T, PoolError> {
        self.handle.await.map_err(|e| PoolError::TaskFailed {
            pool: self.pool,
            reason: e.to_string(),
        })
    }
}

/// Fixed-capacity pool of task slots.
#[derive(Debug)]
pub struct WorkerPool {
    name: String,
    capacity: usize,
    semaphore: Arc<Semaphore>,
}

impl WorkerPool {
    /// Create a pool with `capacity` concurrent slots (at least one).
    #[must_use]
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            name: name.into(),
            capacity,
            semaphore: Arc::new(Semaphore::new(capacity)),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots currently held by running tasks.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        if self.semaphore.is_closed() {
            return 0;
        }
        self.capacity - self.semaphore.available_permits()
    }

    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.semaphore.is_closed()
    }

    /// Submit a future to the pool, waiting for a free slot first.
    pub async fn submit<F, T>(&self, task: F) -> Result<PoolTask<T>, PoolError>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| PoolError::Closed {
                pool: self.name.clone(),
            })?;

        let handle = tokio::spawn(async move {
            let output = task.await;
            drop(permit);
            output
        });

        Ok(PoolTask {
            pool: self.name.clone(),
            handle,
        })
    }

    /// Submit a future and wait for its result.
    pub async fn run<F, T>(&self, task: F) -> Result<T, PoolError>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        self.submit(task).await?.join().await
    }

    /// Wait for in-flight tasks to finish, then refuse further work.
    ///
    /// Idempotent.
    pub async fn shutdown(&self) {
        if self.semaphore.is_closed() {
            return;
        }
        // Holding every slot means nothing else is running.
        let all_slots = self.semaphore.acquire_many(self.capacity as u32).await;
        self.semaphore.close();
        drop(all_slots);
        debug!(pool = %self.name, "worker pool shut down");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.semaphore.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_run_returns_task_output() {
        let pool = WorkerPool::new("test", 3);
        let value = pool.run(async { 21 * 2 }).await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_capacity_is_never_exceeded() {
        let pool = WorkerPool::new("bounded", 3);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            let task = pool
                .submit(async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                })
                .await
                .unwrap();
            tasks.push(task);
        }
        for task in tasks {
            task.join().await.unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(pool.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_panicking_task_reports_task_failed() {
        let pool = WorkerPool::new("panicky", 1);
        let result: Result<u8, _> = pool.run(async { panic!("boom") }).await;
        assert!(matches!(result, Err(PoolError::TaskFailed { .. })));

        // The slot is released even though the task panicked.
        assert_eq!(pool.run(async { 1 }).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_in_flight_then_rejects() {
        let pool = WorkerPool::new("closing", 2);
        let finished = Arc::new(AtomicUsize::new(0));

        let flag = Arc::clone(&finished);
        let task = pool
            .submit(async move {
                tokio::time::sleep(Duration::from_millis(30)).await;
                flag.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap();

        pool.shutdown().await;
        assert_eq!(finished.load(Ordering::SeqCst), 1);
        assert!(pool.is_shut_down());
        task.join().await.unwrap();

        let rejected = pool.submit(async { 0 }).await;
        assert!(matches!(rejected, Err(PoolError::Closed { .. })));

        // Second shutdown is a no-op.
        pool.shutdown().await;
    }
}
