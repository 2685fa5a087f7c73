//! Synthetic service-time policy
//!
//! Models a worker with a baseline service-time band and an occasional long
//! "lock" stall. The draw is synchronous; the worker awaits the drawn
//! duration with the runtime timer.

use std::time::Duration;

use rand::Rng;
use serde::Deserialize;

/// Upper bound (exclusive) of the uniform jitter added to every draw, in ms
const JITTER_MS: u64 = 10;

/// Parameters of one worker's synthetic service-time distribution
#[derive(Debug, Clone, Deserialize)]
pub struct SleepPolicy {
    pub sleep_min_ms: u64,
    pub sleep_max_ms: u64,
    pub lock_ms: u64,
    pub lock_probability: f64,
}

impl SleepPolicy {
    pub fn new(sleep_min_ms: u64, sleep_max_ms: u64, lock_ms: u64, lock_probability: f64) -> Self {
        Self {
            sleep_min_ms,
            sleep_max_ms,
            lock_ms,
            lock_probability,
        }
    }

    /// Constant service time (plus jitter), no lock stalls
    pub fn fixed(ms: u64) -> Self {
        Self::new(ms, ms, 0, 0.0)
    }

    /// Draw one service time
    pub fn sample(&self) -> Duration {
        let mut rng = rand::thread_rng();
        let jitter = rng.gen_range(0..JITTER_MS);

        let ms = if rng.gen::<f64>() < self.lock_probability {
            self.lock_ms + jitter
        } else if self.sleep_max_ms > self.sleep_min_ms {
            rng.gen_range(0..self.sleep_max_ms - self.sleep_min_ms) + self.sleep_min_ms + jitter
        } else {
            self.sleep_min_ms + jitter
        };

        Duration::from_millis(ms)
    }
}

impl Default for SleepPolicy {
    fn default() -> Self {
        Self::new(40, 60, 0, 0.0)
    }
}
