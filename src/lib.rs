//! # Roster
//!
//! A streaming trainer record service with a resilient dual-tier store:
//! - Durable document store consulted first, treated as best-effort
//! - In-memory mirror that keeps every created record and answers when the
//!   durable store cannot
//! - Case-insensitive name uniqueness checked across both tiers
//! - TCP protocol with unary calls, a client-streaming create and a
//!   server-streaming listing
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │          (Acceptor + worker pool, framed protocol)           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  TrainerService                              │
//! │    (get / delete / update / streaming create & list)         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌──────────────────┐
//!   │ Reconciler  │          │ UniquenessGuard  │
//!   └──────┬──────┘          └────────┬─────────┘
//!          └────────────┬─────────────┘
//!          ┌────────────┴────────────┐
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │ StoreClient │          │   Mirror    │
//!   │ (durable)   │          │  (Mutex)    │
//!   └─────────────┘          └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod model;
pub mod store;
pub mod mirror;
pub mod reconcile;
pub mod service;
pub mod protocol;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, RosterError};
pub use config::{Config, StoreBackend};
pub use model::{Medal, MedalTier, NewTrainer, Trainer, TrainerId, UpdateTrainer};
pub use service::{CancelToken, CreateSummary, TrainerService};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of Roster
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
