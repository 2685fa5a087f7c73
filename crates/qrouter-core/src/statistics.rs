//! Statistics snapshot published to subscribers

use serde::{Deserialize, Serialize};

/// Point-in-time view of the aggregator's counters.
///
/// Per-worker counts are a fixed-length vector indexed by worker; dismissed
/// tasks are tracked in their own counter, not a sentinel slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    /// Total routing events observed, dismissals included
    pub total_processed: i64,
    /// Tasks per second over the last throughput window
    pub throughput_tasks_per_sec: f64,
    /// Completed-task count per worker index
    pub per_worker_counts: Vec<i64>,
    /// Tasks for which no worker could be chosen or the chosen queue was full
    pub dismissed_count: i64,
}

impl StatisticsSnapshot {
    /// Empty snapshot sized for a pool of `worker_count` workers
    pub fn empty(worker_count: usize) -> Self {
        Self {
            total_processed: 0,
            throughput_tasks_per_sec: 0.0,
            per_worker_counts: vec![0; worker_count],
            dismissed_count: 0,
        }
    }
}
