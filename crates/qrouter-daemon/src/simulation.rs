//! In-process synthetic load driver
//!
//! Submits a stream of identical payloads at a steady interval, each as its
//! own spawned dispatch transaction, so the agent learns the workers'
//! service-time profiles under realistic concurrency.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio::task::JoinSet;
use tracing::{debug, info};

use qrouter_engine::RouterEngine;

use crate::config::SimulationConfig;

/// Drive the configured load through the engine and wait for every
/// submission to settle.
pub async fn run(engine: &RouterEngine, sim: &SimulationConfig) -> Result<()> {
    info!(
        tasks = sim.task_count,
        interval_ms = sim.submit_interval_ms,
        payload = %sim.payload,
        "starting simulation"
    );

    let dispatcher = engine.dispatcher();
    let mut submissions = JoinSet::new();
    let mut ticker = tokio::time::interval(Duration::from_millis(sim.submit_interval_ms));
    let started = Instant::now();

    for _ in 0..sim.task_count {
        ticker.tick().await;
        let dispatcher = dispatcher.clone();
        let payload = sim.payload.clone();
        submissions.spawn(async move { dispatcher.submit(&payload).await });
    }

    info!("all tasks submitted, waiting for completion");

    let mut completed = 0u64;
    let mut dismissed = 0u64;
    while let Some(outcome) = submissions.join_next().await {
        let outcome = outcome.context("submission task panicked")?;
        if outcome.is_dismissed() {
            dismissed += 1;
        } else {
            completed += 1;
        }
    }

    info!(
        completed,
        dismissed,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "simulation finished"
    );
    Ok(())
}

/// Log the per-worker selection shares, the final counters, and the learned
/// Q-table.
pub async fn report(engine: &RouterEngine) {
    let stats = engine.current_statistics().await;
    let total = stats.total_processed.max(1) as f64;

    for (worker, count) in stats.per_worker_counts.iter().enumerate() {
        let share_pct = *count as f64 / total * 100.0;
        info!(worker, count, share_pct, "selection share");
    }
    info!(
        total = stats.total_processed,
        dismissed = stats.dismissed_count,
        throughput = stats.throughput_tasks_per_sec,
        "final statistics"
    );

    let agent = engine.agent();
    for (state, values) in agent.table_snapshot() {
        debug!(state = %state, values = ?values, "q-table entry");
    }
    info!(states = agent.state_count(), "q-table size");
}
