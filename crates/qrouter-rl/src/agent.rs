//! Tabular Q-learning routing agent
//!
//! Maps discrete state keys to one Q-value per worker index. Action selection
//! is ε-greedy with round-robin exploration; the update rule is standard
//! one-step Q-learning with a pessimistic backup when the successor state has
//! every queue full.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use rand::Rng;
use tracing::warn;

use crate::state::is_saturated;

/// Q-values stored per state key, one slot per worker index
pub type ActionValues = Vec<f64>;

/// Starting Q-value for every slot of a freshly inserted state.
///
/// Set above any plausible learned value so each untried worker is selected
/// at least once before exploitation takes over.
pub const INITIAL_OPTIMISM: f64 = 25.0;

/// Backup value assumed for a successor state with every queue full
const SATURATION_PESSIMISM: f64 = -100.0;

/// Q-values within this distance of the maximum collapse into one tied set
const TIE_TOLERANCE: f64 = 1e-9;

/// Concurrency-safe Q-learning agent over a fixed worker action space.
///
/// The table is shared-mutable behind a read-write lock: `choose` reads
/// except for the double-checked insertion of unseen states, `learn` writes.
/// The round-robin exploration cursor is an atomic, never mutated under a
/// read guard.
pub struct RoutingAgent {
    table: RwLock<HashMap<String, ActionValues>>,
    alpha: f64,
    gamma: f64,
    epsilon: f64,
    worker_count: usize,
    next_worker: AtomicUsize,
}

impl RoutingAgent {
    pub fn new(alpha: f64, gamma: f64, epsilon: f64, worker_count: usize) -> Self {
        Self {
            table: RwLock::new(HashMap::new()),
            alpha,
            gamma,
            epsilon,
            worker_count,
            next_worker: AtomicUsize::new(0),
        }
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Insert `state` with optimistic initial values if absent.
    ///
    /// Returns whether the state was already present.
    pub fn ensure_state(&self, state: &str) -> bool {
        let mut table = self.table.write();
        Self::ensure_in(&mut table, state, self.worker_count)
    }

    fn ensure_in(table: &mut HashMap<String, ActionValues>, state: &str, worker_count: usize) -> bool {
        if table.contains_key(state) {
            true
        } else {
            table.insert(state.to_owned(), vec![INITIAL_OPTIMISM; worker_count]);
            false
        }
    }

    /// Choose a worker for `state` among those marked available.
    ///
    /// Unseen states are inserted first and force the exploration branch, so
    /// optimistic initialization gets every worker tried before Q-values
    /// dominate. Returns `None` when no available worker can be selected.
    pub fn choose(&self, state: &str, available: &[bool]) -> Option<usize> {
        if self.worker_count == 0 || !available.iter().any(|&a| a) {
            return None;
        }

        let existed = self.table.read().contains_key(state);
        if !existed {
            // Double-checked insert: ensure_state re-checks under the write lock
            self.ensure_state(state);
        }

        let explore = rand::thread_rng().gen::<f64>() < self.epsilon || !existed;
        if explore {
            return self.next_round_robin(available);
        }

        let table = self.table.read();
        let q_values = table.get(state)?;

        // Collect the max-Q tied set over available workers
        let mut best: Vec<usize> = Vec::new();
        let mut max_q = f64::NEG_INFINITY;
        for (i, &q) in q_values.iter().enumerate() {
            if !available.get(i).copied().unwrap_or(false) {
                continue;
            }
            if q > max_q + TIE_TOLERANCE {
                max_q = q;
                best.clear();
                best.push(i);
            } else if (q - max_q).abs() <= TIE_TOLERANCE {
                best.push(i);
            }
        }

        if best.is_empty() {
            None
        } else {
            Some(best[rand::thread_rng().gen_range(0..best.len())])
        }
    }

    /// Exploration: the first available worker at or after the cursor; the
    /// cursor is left one past the returned index so successive explorations
    /// spread across the pool. Caller guarantees a non-empty mask.
    fn next_round_robin(&self, available: &[bool]) -> Option<usize> {
        let start = self.next_worker.load(Ordering::Relaxed);
        for offset in 0..self.worker_count {
            let candidate = (start + offset) % self.worker_count;
            if available.get(candidate).copied().unwrap_or(false) {
                self.next_worker
                    .store((candidate + 1) % self.worker_count, Ordering::Relaxed);
                return Some(candidate);
            }
        }
        None
    }

    /// Apply the Q-learning update for taking `worker` in `state` and
    /// landing in `next_state` with the observed `reward`:
    ///
    /// ```text
    /// Q(s, a) ← (1 − α) · Q(s, a) + α · (r + γ · max_a' Q(s', a'))
    /// ```
    ///
    /// When every queue label in `next_state` is FULL the successor maximum
    /// is replaced by a pessimistic sentinel, teaching the agent to avoid
    /// routing into states with no visible escape.
    pub fn learn(&self, state: &str, next_state: &str, worker: usize, reward: f64) {
        if worker >= self.worker_count {
            warn!(worker, "learn called with out-of-range worker index");
            return;
        }

        let mut table = self.table.write();
        Self::ensure_in(&mut table, state, self.worker_count);
        Self::ensure_in(&mut table, next_state, self.worker_count);

        let max_next = if is_saturated(next_state, self.worker_count) {
            SATURATION_PESSIMISM
        } else {
            table[next_state]
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max)
        };

        let current = table[state][worker];
        let updated = (1.0 - self.alpha) * current + self.alpha * (reward + self.gamma * max_next);
        if let Some(values) = table.get_mut(state) {
            values[worker] = updated;
        }
    }

    /// Q-values currently stored for a state key
    pub fn q_values(&self, state: &str) -> Option<ActionValues> {
        self.table.read().get(state).cloned()
    }

    /// Overwrite a single Q-value, inserting the state if absent.
    ///
    /// Used to seed priors and by tests that need a known table shape.
    pub fn set_q(&self, state: &str, worker: usize, value: f64) {
        let mut table = self.table.write();
        Self::ensure_in(&mut table, state, self.worker_count);
        if let Some(q) = table.get_mut(state).and_then(|v| v.get_mut(worker)) {
            *q = value;
        }
    }

    /// Ordered dump of the whole table, for logging and inspection
    pub fn table_snapshot(&self) -> BTreeMap<String, ActionValues> {
        self.table
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Number of distinct states seen so far
    pub fn state_count(&self) -> usize {
        self.table.read().len()
    }
}
