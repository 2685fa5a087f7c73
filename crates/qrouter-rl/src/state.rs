//! Queue-occupancy state encoding
//!
//! The agent never sees raw queue depths. Each queue is discretized into a
//! four-letter load alphabet, keeping the Q-table tractable while preserving
//! the qualitative load signal that drives routing decisions.

use std::fmt::Write;

/// Queue depths above this count as medium traffic
pub const MEDIUM_TRAFFIC_THRESHOLD: usize = 1;

/// Fraction of capacity above which a queue counts as high traffic
pub const HIGH_TRAFFIC_FRACTION: f64 = 0.5;

/// Discretized load level of a single worker queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadLabel {
    Low,
    Med,
    High,
    Full,
}

impl LoadLabel {
    /// Classify a queue depth against its capacity. First match wins.
    pub fn classify(len: usize, capacity: usize) -> Self {
        if len >= capacity {
            LoadLabel::Full
        } else if len as f64 > capacity as f64 * HIGH_TRAFFIC_FRACTION {
            LoadLabel::High
        } else if len > MEDIUM_TRAFFIC_THRESHOLD {
            LoadLabel::Med
        } else {
            LoadLabel::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LoadLabel::Low => "LOW",
            LoadLabel::Med => "MED",
            LoadLabel::High => "HIGH",
            LoadLabel::Full => "FULL",
        }
    }
}

/// Encode the current queue-length vector plus the payload tag into a
/// canonical state key: `"W0:<s0>_W1:<s1>_..._P:<payload>"`.
///
/// Pure function: equal inputs always yield equal keys, and distinct length
/// vectors mapping to the same label vector collapse into the same key.
pub fn encode_state(queue_lengths: &[usize], capacity: usize, payload: &str) -> String {
    let mut key = String::new();

    for (i, &len) in queue_lengths.iter().enumerate() {
        let label = LoadLabel::classify(len, capacity);
        let _ = write!(key, "W{i}:{}_", label.as_str());
    }

    let _ = write!(key, "P:{payload}");
    key
}

/// Whether every worker label in a state key is `FULL`.
///
/// Parses the worker-label section (everything before the `_P:` payload
/// delimiter) so payload text can never masquerade as a load label. A key
/// with no workers is never saturated.
pub fn is_saturated(state_key: &str, worker_count: usize) -> bool {
    if worker_count == 0 {
        return false;
    }

    let Some(payload_at) = state_key.find("_P:") else {
        return false;
    };

    let mut labels = 0usize;
    let mut full = 0usize;
    for segment in state_key[..payload_at + 1].split_terminator('_') {
        if let Some((_, label)) = segment.split_once(':') {
            labels += 1;
            if label == "FULL" {
                full += 1;
            }
        }
    }

    labels == worker_count && full == worker_count
}
