//! Q-Router Core - Shared types for the adaptive task router
//!
//! This crate provides the foundational types used across all q-router
//! components: the task record handed to workers, routing outcomes and
//! events, and the statistics snapshot published to subscribers.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod statistics;
pub mod task;

pub use error::{Result, RouterError};
pub use statistics::StatisticsSnapshot;
pub use task::{RoutingEvent, SubmitOutcome, Task};
