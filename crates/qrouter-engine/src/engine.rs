//! Engine facade
//!
//! Owns the worker pool, the routing agent, the dispatcher, and the
//! statistics aggregator, and exposes the three surfaces collaborators get:
//! submit, poll statistics, subscribe to the snapshot stream.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info};

use qrouter_core::{Result, RouterError, StatisticsSnapshot, SubmitOutcome};
use qrouter_rl::RoutingAgent;

use crate::dispatcher::Dispatcher;
use crate::pool::WorkerPool;
use crate::sleep::SleepPolicy;
use crate::statistics::StatisticsAggregator;

/// Buffered routing events between dispatchers and the aggregator
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Engine construction parameters. One sleep policy per worker slot; the
/// policy list fixes the pool size and the agent's action space.
#[derive(Debug, Clone)]
pub struct RouterSettings {
    pub queue_capacity: usize,
    pub alpha: f64,
    pub gamma: f64,
    pub epsilon: f64,
    pub dismiss_penalty: f64,
    pub statistics_period: Duration,
    pub sleep_policies: Vec<SleepPolicy>,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            queue_capacity: 10,
            alpha: 0.5,
            gamma: 0.5,
            epsilon: 0.1,
            dismiss_penalty: -50.0,
            statistics_period: Duration::from_secs(1),
            sleep_policies: vec![SleepPolicy::default(); 4],
        }
    }
}

impl RouterSettings {
    pub fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            return Err(RouterError::Config("queue_capacity must be positive".into()));
        }
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(RouterError::Config(format!(
                "alpha must be in (0, 1], got {}",
                self.alpha
            )));
        }
        if !(self.gamma >= 0.0 && self.gamma < 1.0) {
            return Err(RouterError::Config(format!(
                "gamma must be in [0, 1), got {}",
                self.gamma
            )));
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(RouterError::Config(format!(
                "epsilon must be in [0, 1], got {}",
                self.epsilon
            )));
        }
        for (i, policy) in self.sleep_policies.iter().enumerate() {
            if !(0.0..=1.0).contains(&policy.lock_probability) {
                return Err(RouterError::Config(format!(
                    "sleep_policies[{i}].lock_probability must be in [0, 1], got {}",
                    policy.lock_probability
                )));
            }
        }
        Ok(())
    }
}

/// The dispatch-and-learning engine handed to ingress layers.
pub struct RouterEngine {
    pool: Arc<WorkerPool>,
    agent: Arc<RoutingAgent>,
    dispatcher: Arc<Dispatcher>,
    statistics: StatisticsAggregator,
    statistics_task: JoinHandle<()>,
    shutdown: broadcast::Sender<()>,
}

impl RouterEngine {
    /// Validate the settings, launch the pool and the aggregator, and wire
    /// the dispatcher.
    pub fn start(settings: RouterSettings) -> Result<Self> {
        settings.validate()?;

        let worker_count = settings.sleep_policies.len();
        let agent = Arc::new(RoutingAgent::new(
            settings.alpha,
            settings.gamma,
            settings.epsilon,
            worker_count,
        ));
        let pool = Arc::new(WorkerPool::start(
            settings.sleep_policies,
            settings.queue_capacity,
        ));

        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (statistics, statistics_task) =
            StatisticsAggregator::spawn(worker_count, settings.statistics_period, events_rx);

        let (shutdown_tx, _) = broadcast::channel(1);
        let dispatcher = Arc::new(Dispatcher::new(
            pool.clone(),
            agent.clone(),
            events_tx,
            shutdown_tx.clone(),
            settings.dismiss_penalty,
        ));

        info!(workers = worker_count, "router engine started");
        Ok(Self {
            pool,
            agent,
            dispatcher,
            statistics,
            statistics_task,
            shutdown: shutdown_tx,
        })
    }

    /// Run one dispatch transaction
    pub async fn submit(&self, payload: &str) -> SubmitOutcome {
        self.dispatcher.submit(payload).await
    }

    /// Shared dispatcher handle, for callers that spawn their own
    /// submission tasks
    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        self.dispatcher.clone()
    }

    /// The routing agent, for Q-table inspection and seeding
    pub fn agent(&self) -> Arc<RoutingAgent> {
        self.agent.clone()
    }

    pub fn worker_count(&self) -> usize {
        self.pool.worker_count()
    }

    /// Latest aggregator counters; never waits for a refresh
    pub async fn current_statistics(&self) -> StatisticsSnapshot {
        self.statistics.current().await
    }

    /// Snapshot stream refreshed roughly once per statistics period
    pub fn subscribe_statistics(&self) -> watch::Receiver<StatisticsSnapshot> {
        self.statistics.subscribe()
    }

    /// Cooperative teardown: wake in-flight reply waits, close the queues
    /// and join the workers, then let the aggregator drain the remaining
    /// events and exit.
    pub async fn shutdown(self) {
        info!("router engine shutting down");
        let _ = self.shutdown.send(());
        self.pool.shutdown().await;

        // Dropping the dispatcher closes the event stream once outstanding
        // submission tasks finish
        drop(self.dispatcher);
        if let Err(e) = self.statistics_task.await {
            error!("statistics task failed: {e}");
        }
        info!("router engine stopped");
    }
}
