//! Routing statistics aggregation
//!
//! Consumes the stream of routing events, keeps live counters, and publishes
//! a snapshot on every throughput refresh. Publication uses a latest-value
//! channel: subscribers that fall behind simply see the freshest snapshot,
//! never a queue of stale ones.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, watch, RwLock};
use tokio::task::JoinHandle;
use tracing::debug;

use qrouter_core::{RoutingEvent, StatisticsSnapshot};

struct Counters {
    total_processed: i64,
    per_worker_counts: Vec<i64>,
    dismissed_count: i64,
    throughput: f64,
}

impl Counters {
    fn new(worker_count: usize) -> Self {
        Self {
            total_processed: 0,
            per_worker_counts: vec![0; worker_count],
            dismissed_count: 0,
            throughput: 0.0,
        }
    }

    fn snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            total_processed: self.total_processed,
            throughput_tasks_per_sec: self.throughput,
            per_worker_counts: self.per_worker_counts.clone(),
            dismissed_count: self.dismissed_count,
        }
    }
}

/// Live counters plus the snapshot stream for subscribers.
pub struct StatisticsAggregator {
    counters: Arc<RwLock<Counters>>,
    snapshot_rx: watch::Receiver<StatisticsSnapshot>,
}

impl StatisticsAggregator {
    /// Create the aggregator and spawn the task draining `events`.
    ///
    /// The task exits when the event channel closes.
    pub fn spawn(
        worker_count: usize,
        period: Duration,
        mut events: mpsc::Receiver<RoutingEvent>,
    ) -> (Self, JoinHandle<()>) {
        let (snapshot_tx, snapshot_rx) = watch::channel(StatisticsSnapshot::empty(worker_count));
        let counters = Arc::new(RwLock::new(Counters::new(worker_count)));

        let task_counters = counters.clone();
        let task = tokio::spawn(async move {
            let mut window_started = Instant::now();
            let mut window_total: i64 = 0;

            while let Some(event) = events.recv().await {
                let mut counters = task_counters.write().await;
                counters.total_processed += 1;
                match event {
                    RoutingEvent::Completed(worker) => {
                        debug!(worker, "task assigned");
                        if let Some(count) = counters.per_worker_counts.get_mut(worker) {
                            *count += 1;
                        }
                    }
                    RoutingEvent::Dismissed => counters.dismissed_count += 1,
                }

                let elapsed = window_started.elapsed();
                if elapsed >= period {
                    counters.throughput =
                        (counters.total_processed - window_total) as f64 / elapsed.as_secs_f64();
                    window_total = counters.total_processed;
                    window_started = Instant::now();

                    debug!(
                        total = counters.total_processed,
                        throughput = counters.throughput,
                        dismissed = counters.dismissed_count,
                        "statistics refreshed"
                    );
                    // Latest-value publish: laggards miss intermediate snapshots
                    snapshot_tx.send_replace(counters.snapshot());
                }
            }

            debug!("event channel closed, statistics task exiting");
        });

        (
            Self {
                counters,
                snapshot_rx,
            },
            task,
        )
    }

    /// Latest live counters; does not wait for a throughput refresh
    pub async fn current(&self) -> StatisticsSnapshot {
        self.counters.read().await.snapshot()
    }

    /// Snapshot stream, refreshed on every throughput recomputation
    pub fn subscribe(&self) -> watch::Receiver<StatisticsSnapshot> {
        self.snapshot_rx.clone()
    }
}
