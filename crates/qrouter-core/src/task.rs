//! Task record and routing outcome types

use tokio::sync::oneshot;

/// A single unit of work handed to a worker slot.
///
/// The payload tag is the only feature the routing agent ever sees; the reply
/// channel is consumed by exactly one worker.
#[derive(Debug)]
pub struct Task {
    /// Opaque payload tag discriminating task kinds
    pub payload: String,
    /// One-shot reply channel the worker delivers its result on
    pub reply: oneshot::Sender<String>,
}

impl Task {
    /// Create a task together with the receiving half of its reply channel
    pub fn new(payload: impl Into<String>) -> (Self, oneshot::Receiver<String>) {
        let (reply, reply_rx) = oneshot::channel();
        (
            Self {
                payload: payload.into(),
                reply,
            },
            reply_rx,
        )
    }
}

/// Outcome of a single dispatch transaction.
///
/// These are the only two outcomes the core ever surfaces to a submitter;
/// ingress maps `Dispatched` to 200 and `Dismissed` to 429.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The task ran to completion on the given worker
    Dispatched { worker: usize },
    /// No task was delivered for execution
    Dismissed,
}

impl SubmitOutcome {
    /// Worker index for a dispatched outcome
    pub fn worker(&self) -> Option<usize> {
        match self {
            SubmitOutcome::Dispatched { worker } => Some(*worker),
            SubmitOutcome::Dismissed => None,
        }
    }

    pub fn is_dismissed(&self) -> bool {
        matches!(self, SubmitOutcome::Dismissed)
    }
}

/// Event consumed by the statistics aggregator, one per dispatch transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingEvent {
    /// A worker was chosen and the task completed
    Completed(usize),
    /// No worker could be chosen, or the chosen queue was full
    Dismissed,
}
