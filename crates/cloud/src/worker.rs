//! Fixed-size worker pool for storage jobs.
//!
//! Jobs go onto a shared queue; `workers` tasks pull from it concurrently and
//! report each job's outcome, tagged with the job's index, on a result
//! channel. [`WorkerPool::run`] returns once every job has succeeded, or as
//! soon as the first failure arrives (remaining workers are aborted).

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;

use crate::error::StorageError;

#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    /// A pool with `workers` concurrent workers (at least one).
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `handler` over every job. Results come back in job order.
    pub async fn run<J, T, F, Fut>(&self, jobs: Vec<J>, handler: F) -> Result<Vec<T>, StorageError>
    where
        J: Send + 'static,
        T: Send + 'static,
        F: Fn(J) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, StorageError>> + Send + 'static,
    {
        let total = jobs.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        let (job_tx, job_rx) = mpsc::channel::<(usize, J)>(total);
        for (index, job) in jobs.into_iter().enumerate() {
            job_tx
                .send((index, job))
                .await
                .map_err(|_| StorageError::Worker("job queue closed".into()))?;
        }
        drop(job_tx);

        let queue = Arc::new(Mutex::new(job_rx));
        let handler = Arc::new(handler);
        let (result_tx, mut result_rx) = mpsc::channel::<(usize, Result<T, StorageError>)>(total);

        let mut set = JoinSet::new();
        for _ in 0..self.workers.min(total) {
            let queue = Arc::clone(&queue);
            let handler = Arc::clone(&handler);
            let result_tx = result_tx.clone();
            set.spawn(async move {
                loop {
                    let next = queue.lock().await.recv().await;
                    let Some((index, job)) = next else { break };
                    let outcome = handler(job).await;
                    if result_tx.send((index, outcome)).await.is_err() {
                        break;
                    }
                }
            });
        }
        drop(result_tx);

        let mut slots: Vec<Option<T>> = (0..total).map(|_| None).collect();
        let mut received = 0;
        while let Some((index, outcome)) = result_rx.recv().await {
            match outcome {
                Ok(value) => {
                    slots[index] = Some(value);
                    received += 1;
                }
                Err(e) => {
                    tracing::warn!(job = index, error = %e, "Storage job failed; stopping pool");
                    set.abort_all();
                    return Err(e);
                }
            }
        }

        while let Some(joined) = set.join_next().await {
            if let Err(e) = joined {
                return Err(StorageError::Worker(e.to_string()));
            }
        }

        if received != total {
            return Err(StorageError::Worker(format!(
                "{received} of {total} jobs reported a result"
            )));
        }
        Ok(slots.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use assert_matches::assert_matches;

    #[tokio::test]
    async fn results_keep_job_order() {
        let pool = WorkerPool::new(3);
        let results = pool
            .run((0..10u64).collect(), |n| async move {
                tokio::time::sleep(Duration::from_millis(10 - n)).await;
                Ok(n * 2)
            })
            .await
            .unwrap();
        assert_eq!(results, (0..10u64).map(|n| n * 2).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn empty_job_list_returns_immediately() {
        let results = WorkerPool::new(2)
            .run(Vec::<u8>::new(), |n| async move { Ok(n) })
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn first_error_is_returned() {
        let result = WorkerPool::new(2)
            .run(vec![1, 2, 3, 4], |n| async move {
                if n == 3 {
                    Err(StorageError::Worker(format!("job {n} broke")))
                } else {
                    Ok(n)
                }
            })
            .await;
        assert_matches!(result, Err(StorageError::Worker(msg)) if msg == "job 3 broke");
    }

    #[tokio::test]
    async fn never_exceeds_worker_count() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let (a, p) = (Arc::clone(&active), Arc::clone(&peak));
        WorkerPool::new(2)
            .run((0..8).collect::<Vec<u32>>(), move |_| {
                let (active, peak) = (Arc::clone(&a), Arc::clone(&p));
                async move {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .await
            .unwrap();

        assert!(peak.load(Ordering::SeqCst) <= 2);
    }
}
