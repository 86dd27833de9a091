//! Shared worker pool.
//!
//! A fixed set of threads pulling jobs from a crossbeam channel. The pool is
//! created by the host and handed to nodes as a borrowed [`WorkerPool`]
//! handle for the duration of one run; nodes use it to fan out per-row work.

use crossbeam_channel::{unbounded, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;

type Job = Box<dyn FnOnce() + Send + 'static>;

struct PoolInner {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl Drop for PoolInner {
    fn drop(&mut self) {
        // Closing the channel ends every worker loop
        self.sender.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

/// Clonable handle to a fixed-size thread pool.
#[derive(Clone)]
pub struct WorkerPool {
    inner: Arc<PoolInner>,
    size: usize,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool").field("size", &self.size).finish()
    }
}

impl WorkerPool {
    /// Spawn `size` worker threads (at least one).
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        let (sender, receiver) = unbounded::<Job>();

        let workers = (0..size)
            .map(|i| {
                let receiver = receiver.clone();
                std::thread::Builder::new()
                    .name(format!("subflow-worker-{}", i))
                    .spawn(move || {
                        while let Ok(job) = receiver.recv() {
                            job();
                        }
                    })
            })
            .filter_map(|spawned| match spawned {
                Ok(handle) => Some(handle),
                Err(e) => {
                    tracing::warn!("Failed to spawn worker thread: {}", e);
                    None
                }
            })
            .collect::<Vec<_>>();

        tracing::debug!("Worker pool started with {} threads", workers.len());

        Self {
            size: workers.len(),
            inner: Arc::new(PoolInner {
                sender: Some(sender),
                workers,
            }),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Apply `f` to every item on the pool and collect results in input order.
    ///
    /// Falls back to running on the calling thread if the pool has no workers.
    pub fn map<T, R, F>(&self, items: Vec<T>, f: F) -> Vec<R>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + 'static,
    {
        let sender = match &self.inner.sender {
            Some(sender) if self.size > 0 => sender,
            _ => return items.into_iter().map(f).collect(),
        };

        let count = items.len();
        let f = Arc::new(f);
        let (result_tx, result_rx) = unbounded::<(usize, R)>();

        let mut inline = Vec::new();
        for (index, item) in items.into_iter().enumerate() {
            let f = f.clone();
            let result_tx = result_tx.clone();
            let job: Job = Box::new(move || {
                let _ = result_tx.send((index, f(item)));
            });
            if let Err(rejected) = sender.send(job) {
                inline.push(rejected.into_inner());
            }
        }
        drop(result_tx);
        for job in inline {
            job();
        }

        let mut slots: Vec<Option<R>> = (0..count).map(|_| None).collect();
        for (index, result) in result_rx.iter() {
            slots[index] = Some(result);
        }
        slots.into_iter().flatten().collect()
    }
}
