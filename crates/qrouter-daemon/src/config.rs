//! Configuration loading for the q-router daemon

use std::cmp::Ordering;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{ConfigBuilder, Environment, File};
use serde::Deserialize;
use tracing::warn;

use qrouter_engine::{RouterSettings, SleepPolicy};

/// Configuration for the daemon
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub daemon: DaemonConfig,
    pub router: RouterConfig,
    pub learning: LearningConfig,
    pub workers: WorkersConfig,
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Default log filter when RUST_LOG is unset
    pub log_level: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Number of worker slots; sizes the queues and the agent's action space
    pub worker_count: usize,
    /// Bounded depth of each worker queue
    pub queue_capacity: usize,
    /// Minimum interval between throughput recomputations
    pub statistics_period_ms: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            worker_count: 4,
            queue_capacity: 10,
            statistics_period_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    pub alpha: f64,
    pub gamma: f64,
    pub epsilon: f64,
    /// Reward applied when an enqueue races a stale availability snapshot
    pub dismiss_penalty: f64,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            gamma: 0.5,
            epsilon: 0.1,
            dismiss_penalty: -50.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkersConfig {
    /// One service-time policy per worker, in worker-index order.
    /// Missing entries fall back to the default band, extras are dropped.
    pub sleep_policies: Vec<SleepPolicy>,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        // Heterogeneous defaults: a slow steady worker, two fast ones, and
        // one that occasionally stalls on a long lock
        Self {
            sleep_policies: vec![
                SleepPolicy::new(500, 500, 0, 0.0),
                SleepPolicy::new(40, 60, 0, 0.0),
                SleepPolicy::new(0, 100, 0, 0.0),
                SleepPolicy::new(50, 50, 800, 0.1),
            ],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of payloads to submit
    pub task_count: usize,
    /// Interval between submissions
    pub submit_interval_ms: u64,
    /// Payload tag sent with every task
    pub payload: String,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            task_count: 1000,
            submit_interval_ms: 20,
            payload: "TASK".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        let config_path = Self::find_config_file();

        let mut builder = ConfigBuilder::<config::builder::DefaultState>::default();

        if let Some(path) = &config_path {
            tracing::info!("Loading config from: {:?}", path);
            builder = builder.add_source(File::from(path.clone()).required(false));
        } else {
            tracing::info!("No config file found, using defaults");
        }

        // Environment variables with QROUTER_ prefix, e.g.
        // QROUTER__LEARNING__EPSILON=0.2
        builder = builder.add_source(
            Environment::with_prefix("QROUTER")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let config: Config = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        Ok(config)
    }

    /// Find the configuration file
    fn find_config_file() -> Option<PathBuf> {
        // Check in order: QROUTER_CONFIG env, ./qrouter.toml, ~/.config/qrouter/qrouter.toml
        if let Ok(path) = std::env::var("QROUTER_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let local = PathBuf::from("qrouter.toml");
        if local.exists() {
            return Some(local);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".config").join("qrouter").join("qrouter.toml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        None
    }

    /// Assemble engine settings, reconciling the policy list with the
    /// configured worker count
    pub fn router_settings(&self) -> RouterSettings {
        let mut policies = self.workers.sleep_policies.clone();
        match policies.len().cmp(&self.router.worker_count) {
            Ordering::Less => {
                warn!(
                    configured = policies.len(),
                    workers = self.router.worker_count,
                    "fewer sleep policies than workers, padding with the default band"
                );
                policies.resize(self.router.worker_count, SleepPolicy::default());
            }
            Ordering::Greater => {
                warn!(
                    configured = policies.len(),
                    workers = self.router.worker_count,
                    "more sleep policies than workers, dropping the extras"
                );
                policies.truncate(self.router.worker_count);
            }
            Ordering::Equal => {}
        }

        RouterSettings {
            queue_capacity: self.router.queue_capacity,
            alpha: self.learning.alpha,
            gamma: self.learning.gamma,
            epsilon: self.learning.epsilon,
            dismiss_penalty: self.learning.dismiss_penalty,
            statistics_period: Duration::from_millis(self.router.statistics_period_ms),
            sleep_policies: policies,
        }
    }
}
