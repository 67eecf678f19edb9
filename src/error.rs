//! Error types for Roster
//!
//! Provides a unified error type for all service operations.

use thiserror::Error;

use crate::store::StoreError;

/// Result type alias using RosterError
pub type Result<T> = std::result::Result<T, RosterError>;

/// Unified error type for Roster operations
#[derive(Debug, Error)]
pub enum RosterError {
    // -------------------------------------------------------------------------
    // Caller-visible outcomes
    // -------------------------------------------------------------------------
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    // -------------------------------------------------------------------------
    // Durable Store Errors (internal, normally absorbed by a fallback)
    // -------------------------------------------------------------------------
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RosterError {
    /// Absent from both tiers
    pub fn trainer_not_found(id: &str) -> Self {
        RosterError::NotFound(format!("Trainer with ID {} not found", id))
    }

    /// Another live trainer already uses this name
    pub fn name_taken(name: &str) -> Self {
        RosterError::AlreadyExists(format!("Trainer with name '{}' already exists", name))
    }

    /// Message without the category prefix, for sending over the wire
    pub fn detail(&self) -> String {
        match self {
            RosterError::InvalidArgument(msg)
            | RosterError::NotFound(msg)
            | RosterError::AlreadyExists(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl From<StoreError> for RosterError {
    fn from(err: StoreError) -> Self {
        RosterError::StoreUnavailable(err.to_string())
    }
}

impl From<bincode::Error> for RosterError {
    fn from(err: bincode::Error) -> Self {
        RosterError::Serialization(err.to_string())
    }
}
