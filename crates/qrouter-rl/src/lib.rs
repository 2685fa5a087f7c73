//! Q-Router RL - Tabular Q-learning for adaptive worker routing
//!
//! This crate provides the routing agent (Q-table, ε-greedy action selection,
//! and the learning update) together with the pure encoder that turns a
//! queue-occupancy profile and a payload tag into a discrete state key.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::float_cmp)]

pub mod agent;
pub mod state;

pub use agent::{ActionValues, RoutingAgent, INITIAL_OPTIMISM};
pub use state::{encode_state, is_saturated, LoadLabel};
