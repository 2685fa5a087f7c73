//! Single-submission dispatch pipeline
//!
//! One transaction per submitted payload: observe the queue state, ask the
//! agent for a worker, attempt the non-blocking enqueue, await the reply,
//! then feed the observed reward back into the agent. Transactions are
//! independent; any number may run concurrently.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, warn};

use qrouter_core::{RoutingEvent, SubmitOutcome, Task};
use qrouter_rl::{encode_state, RoutingAgent};

use crate::pool::WorkerPool;

/// Orchestrates dispatch transactions against a pool and an agent.
pub struct Dispatcher {
    pool: Arc<WorkerPool>,
    agent: Arc<RoutingAgent>,
    events: mpsc::Sender<RoutingEvent>,
    shutdown: broadcast::Sender<()>,
    dismiss_penalty: f64,
}

impl Dispatcher {
    pub fn new(
        pool: Arc<WorkerPool>,
        agent: Arc<RoutingAgent>,
        events: mpsc::Sender<RoutingEvent>,
        shutdown: broadcast::Sender<()>,
        dismiss_penalty: f64,
    ) -> Self {
        Self {
            pool,
            agent,
            events,
            shutdown,
            dismiss_penalty,
        }
    }

    /// Run one dispatch transaction for `payload`.
    ///
    /// Returns `Dispatched` once the worker has replied, `Dismissed` when no
    /// worker could be chosen or the chosen queue turned out to be full.
    pub async fn submit(&self, payload: &str) -> SubmitOutcome {
        let started = Instant::now();
        let state = self.observe(payload);

        let available = self.pool.availability();
        if !available.iter().any(|&a| a) {
            debug!(payload = %payload, "all worker queues full, dismissing");
            self.emit(RoutingEvent::Dismissed).await;
            return SubmitOutcome::Dismissed;
        }

        let Some(worker) = self.agent.choose(&state, &available) else {
            // The mask was non-empty, so the selector refusing is a breach of
            // its contract; degrade to the no-worker path
            warn!(state = %state, "agent returned no choice for a non-empty mask");
            self.emit(RoutingEvent::Dismissed).await;
            return SubmitOutcome::Dismissed;
        };

        debug!(worker, payload = %payload, "worker selected");
        self.dispatch_to(worker, &state, payload, started).await
    }

    /// Enqueue onto the chosen worker and settle the transaction.
    ///
    /// Split from `submit` so the enqueue-failure branch is directly
    /// exercisable: the availability snapshot taken in `submit` may be stale
    /// by the time the push happens.
    async fn dispatch_to(
        &self,
        worker: usize,
        state: &str,
        payload: &str,
        started: Instant,
    ) -> SubmitOutcome {
        let (task, reply_rx) = Task::new(payload);

        if !self.pool.enqueue(worker, task) {
            // Stale availability: the queue filled between snapshot and push.
            // The penalty must still reach the agent, it is the signal that
            // teaches it to avoid saturated targets.
            debug!(worker, "queue filled before enqueue, applying penalty");
            self.emit(RoutingEvent::Dismissed).await;
            self.settle(state, payload, worker, self.dismiss_penalty);
            return SubmitOutcome::Dismissed;
        }

        if self.await_reply(reply_rx).await {
            let reward = 1.0 / started.elapsed().as_secs_f64();
            self.emit(RoutingEvent::Completed(worker)).await;
            self.settle(state, payload, worker, reward);
            return SubmitOutcome::Dispatched { worker };
        }

        // Shutdown fired or the worker died before replying; dismissed for
        // learning purposes
        debug!(worker, "reply abandoned, dismissing");
        self.emit(RoutingEvent::Dismissed).await;
        self.settle(state, payload, worker, self.dismiss_penalty);
        SubmitOutcome::Dismissed
    }

    /// Encode the current queue profile plus the payload tag
    fn observe(&self, payload: &str) -> String {
        encode_state(
            &self.pool.queue_lengths(),
            self.pool.queue_capacity(),
            payload,
        )
    }

    /// Re-observe after the outcome and apply the learning update
    fn settle(&self, state: &str, payload: &str, worker: usize, reward: f64) {
        let next_state = self.observe(payload);
        self.agent.learn(state, &next_state, worker, reward);
    }

    /// Wait for the worker's reply, racing the engine shutdown signal.
    /// Returns whether a reply actually arrived.
    async fn await_reply(&self, reply_rx: oneshot::Receiver<String>) -> bool {
        let mut shutdown = self.shutdown.subscribe();
        tokio::select! {
            reply = reply_rx => reply.is_ok(),
            _ = shutdown.recv() => false,
        }
    }

    async fn emit(&self, event: RoutingEvent) {
        if self.events.send(event).await.is_err() {
            debug!("statistics channel closed, dropping event");
        }
    }
}
