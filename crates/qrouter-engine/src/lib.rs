//! Q-Router Engine - Dispatch-and-learning core
//!
//! Ties the worker pool, the routing agent, the per-submission dispatch
//! pipeline, and the statistics aggregator into one engine. Ingress layers
//! interact with [`RouterEngine`] only: submit a payload, poll or subscribe
//! to statistics, shut down.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::module_name_repetitions)]

pub mod dispatcher;
pub mod engine;
pub mod pool;
pub mod sleep;
pub mod statistics;

pub use dispatcher::Dispatcher;
pub use engine::{RouterEngine, RouterSettings};
pub use pool::WorkerPool;
pub use sleep::SleepPolicy;
pub use statistics::StatisticsAggregator;
