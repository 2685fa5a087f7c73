//! Worker pool with bounded per-worker queues
//!
//! Each worker slot owns one bounded FIFO queue and one long-running task
//! that drains it, waits out its sleep policy, and replies on the task's
//! private channel. The queues are the only shared mutable surface; their
//! depth and capacity are observable for state encoding.

use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use qrouter_core::Task;

use crate::sleep::SleepPolicy;

/// Fixed pool of worker slots, one bounded queue per slot.
pub struct WorkerPool {
    queues: RwLock<Vec<mpsc::Sender<Task>>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    worker_count: usize,
    capacity: usize,
}

impl WorkerPool {
    /// Launch one worker per policy, each owning a queue of `queue_capacity`.
    pub fn start(policies: Vec<SleepPolicy>, queue_capacity: usize) -> Self {
        let worker_count = policies.len();
        let mut queues = Vec::with_capacity(worker_count);
        let mut handles = Vec::with_capacity(worker_count);

        for (index, policy) in policies.into_iter().enumerate() {
            let (tx, rx) = mpsc::channel(queue_capacity);
            queues.push(tx);
            handles.push(tokio::spawn(worker_loop(index, rx, policy)));
        }

        info!(workers = worker_count, queue_capacity, "worker pool started");
        Self {
            queues: RwLock::new(queues),
            handles: Mutex::new(handles),
            worker_count,
            capacity: queue_capacity,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn queue_capacity(&self) -> usize {
        self.capacity
    }

    /// Non-blocking push onto a worker's queue; `false` when it is full
    /// (or the pool has shut down).
    pub fn enqueue(&self, worker: usize, task: Task) -> bool {
        match self.queues.read().get(worker) {
            Some(queue) => queue.try_send(task).is_ok(),
            None => false,
        }
    }

    /// Instantaneous depth of each queue
    pub fn queue_lengths(&self) -> Vec<usize> {
        self.queues
            .read()
            .iter()
            .map(|q| q.max_capacity() - q.capacity())
            .collect()
    }

    /// Which workers currently have queue headroom. Best-effort snapshot,
    /// not a reservation: the race with `enqueue` is handled by the caller.
    pub fn availability(&self) -> Vec<bool> {
        self.queues.read().iter().map(|q| q.capacity() > 0).collect()
    }

    /// Close all queues and wait for every worker to drain and exit.
    pub async fn shutdown(&self) {
        self.queues.write().clear();

        let handles: Vec<JoinHandle<()>> = self.handles.lock().drain(..).collect();
        for (index, handle) in handles.into_iter().enumerate() {
            if let Err(e) = handle.await {
                error!(worker = index, "worker terminated abnormally: {e}");
            }
        }
        info!("worker pool stopped");
    }
}

/// Long-running execution task for one worker slot.
async fn worker_loop(index: usize, mut queue: mpsc::Receiver<Task>, policy: SleepPolicy) {
    while let Some(task) = queue.recv().await {
        let started = Instant::now();
        debug!(worker = index, payload = %task.payload, "processing task");

        // The policy draw is the only user-supplied code here; if it panics,
        // unblock the waiting dispatcher with a sentinel before this worker dies.
        let drawn = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| policy.sample()));
        match drawn {
            Ok(delay) => {
                tokio::time::sleep(delay).await;
                let reply = format!("Processed by worker {index}: {}", task.payload);
                if task.reply.send(reply).is_err() {
                    debug!(worker = index, "submitter gone before reply");
                }
                debug!(
                    worker = index,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "task finished"
                );
            }
            Err(panic) => {
                let _ = task.reply.send(format!("Worker {index} failed"));
                error!(worker = index, "sleep policy panicked, worker terminating");
                std::panic::resume_unwind(panic);
            }
        }
    }

    debug!(worker = index, "queue closed, worker exiting");
}
