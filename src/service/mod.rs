//! Service Module
//!
//! The trainer service that coordinates both tiers.
//!
//! ## Responsibilities
//! - Validate requests before any I/O
//! - Route reads through the reconciliation reader
//! - Route mutations through the uniqueness guard
//! - Treat the durable store as best-effort wherever the mirror can answer

mod cancel;
mod sink;
mod trainer_service;

use serde::{Deserialize, Serialize};

use crate::model::Trainer;

pub use cancel::CancelToken;
pub use sink::TrainerSink;
pub use trainer_service::TrainerService;

/// Aggregate answer to a create stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSummary {
    /// Number of accepted trainers
    pub success_count: usize,

    /// The accepted trainers, in the order they arrived
    pub trainers: Vec<Trainer>,
}

/// How a name listing ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListSummary {
    /// Items handed to the sink
    pub sent: usize,

    /// Stopped early by cancellation or a closed sink
    pub cancelled: bool,
}
