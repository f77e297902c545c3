//! Fixed-size pool for blocking page work

use crate::cancel::CancelToken;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::{Semaphore, watch};
use tokio::task::JoinHandle;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("Task was cancelled before it started")]
    Cancelled,
    #[error("Pool has been shut down")]
    ShutDown,
    #[error("Task panicked: {0}")]
    Panicked(String),
}

/// Result of one submitted task
pub struct TaskHandle<T> {
    inner: JoinHandle<Result<T, PoolError>>,
}

impl<T> Future for TaskHandle<T> {
    type Output = Result<T, PoolError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.inner).poll(cx).map(|joined| match joined {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(PoolError::Cancelled),
            Err(e) => Err(PoolError::Panicked(e.to_string())),
        })
    }
}

/// Decrements the outstanding-task counter when a task ends, however it ends
struct Outstanding(Arc<watch::Sender<usize>>);

impl Outstanding {
    fn enter(counter: &Arc<watch::Sender<usize>>) -> Self {
        counter.send_modify(|n| *n += 1);
        Self(counter.clone())
    }
}

impl Drop for Outstanding {
    fn drop(&mut self) {
        self.0.send_modify(|n| *n = n.saturating_sub(1));
    }
}

/// Runs at most `workers` blocking tasks at once on tokio's blocking threads.
///
/// Tasks that have not started when the pool is shut down with
/// `cancel_pending` resolve to [`PoolError::Cancelled`]. Tasks already running
/// are never interrupted.
pub struct WorkerPool {
    workers: usize,
    permits: Arc<Semaphore>,
    pending: CancelToken,
    closed: AtomicBool,
    outstanding: Arc<watch::Sender<usize>>,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        let (outstanding, _rx) = watch::channel(0);
        Self {
            workers,
            permits: Arc::new(Semaphore::new(workers)),
            pending: CancelToken::new(),
            closed: AtomicBool::new(false),
            outstanding: Arc::new(outstanding),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Tasks submitted but not yet finished
    pub fn outstanding(&self) -> usize {
        *self.outstanding.borrow()
    }

    pub fn submit<F, T>(&self, task: F) -> TaskHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        if self.closed.load(Ordering::SeqCst) {
            return TaskHandle {
                inner: tokio::spawn(async { Err(PoolError::ShutDown) }),
            };
        }

        let permits = self.permits.clone();
        let pending = self.pending.clone();
        let guard = Outstanding::enter(&self.outstanding);

        let inner = tokio::spawn(async move {
            let _guard = guard;
            let permit = tokio::select! {
                biased;
                _ = pending.cancelled() => return Err(PoolError::Cancelled),
                permit = permits.acquire_owned() => permit.map_err(|_| PoolError::ShutDown)?,
            };
            if pending.is_cancelled() {
                return Err(PoolError::Cancelled);
            }
            tokio::task::spawn_blocking(move || {
                let _permit = permit;
                task()
            })
            .await
            .map_err(|e| PoolError::Panicked(e.to_string()))
        });

        TaskHandle { inner }
    }

    /// Stop accepting work. `cancel_pending` drops tasks that have not started;
    /// `wait_for_pending` waits until every remaining task has finished.
    pub async fn shutdown(&self, wait_for_pending: bool, cancel_pending: bool) {
        self.closed.store(true, Ordering::SeqCst);
        if cancel_pending {
            self.pending.cancel();
        }
        if wait_for_pending {
            let mut rx = self.outstanding.subscribe();
            let _ = rx.wait_for(|n| *n == 0).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_runs_tasks_and_returns_results() {
        let pool = WorkerPool::new(3);
        let handles: Vec<_> = (0..6).map(|i| pool.submit(move || i * 2)).collect();
        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }
        assert_eq!(results, vec![0, 2, 4, 6, 8, 10]);
        pool.shutdown(true, false).await;
        assert_eq!(pool.outstanding(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrency_is_bounded() {
        let pool = WorkerPool::new(2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let running = running.clone();
                let peak = peak.clone();
                pool.submit(move || {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(20));
                    running.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_shutdown_cancels_queued_tasks() {
        let pool = WorkerPool::new(1);
        let started = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..5)
            .map(|_| {
                let started = started.clone();
                pool.submit(move || {
                    started.fetch_add(1, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(100));
                })
            })
            .collect();

        tokio::time::sleep(Duration::from_millis(30)).await;
        pool.shutdown(false, true).await;

        let mut cancelled = 0;
        for handle in handles {
            if handle.await == Err(PoolError::Cancelled) {
                cancelled += 1;
            }
        }
        assert_eq!(started.load(Ordering::SeqCst), 1);
        assert_eq!(cancelled, 4);
    }

    #[tokio::test]
    async fn test_submit_after_shutdown() {
        let pool = WorkerPool::new(1);
        pool.shutdown(true, false).await;
        assert_eq!(pool.submit(|| 1).await, Err(PoolError::ShutDown));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_panic_is_reported() {
        let pool = WorkerPool::new(1);
        let result = pool.submit(|| -> u32 { panic!("boom") }).await;
        assert!(matches!(result, Err(PoolError::Panicked(_))));
    }
}
