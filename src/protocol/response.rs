//! Response definitions
//!
//! Represents frames sent back to clients.

use serde::{Deserialize, Serialize};

use crate::error::RosterError;
use crate::model::Trainer;
use crate::service::CreateSummary;

/// Response frame kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ResponseKind {
    Ok = 0x00,
    Item = 0x10,
    EndOfStream = 0x11,
    Error = 0x20,
}

/// Error categories visible to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    InvalidArgument,
    NotFound,
    AlreadyExists,
    Internal,
}

impl From<&RosterError> for ErrorCode {
    fn from(err: &RosterError) -> Self {
        match err {
            RosterError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            RosterError::NotFound(_) => ErrorCode::NotFound,
            RosterError::AlreadyExists(_) => ErrorCode::AlreadyExists,
            _ => ErrorCode::Internal,
        }
    }
}

/// Body of a successful unary answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Reply {
    /// A single trainer (get, update, delete)
    Trainer(Trainer),

    /// Result of a create stream
    Created(CreateSummary),

    /// Answer to ping
    Pong,
}

/// A response frame
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Unary success
    Ok(Reply),

    /// One item of a list stream
    Item(Trainer),

    /// End of a list stream
    EndOfStream,

    /// Failed call
    Error { code: ErrorCode, message: String },
}

impl Response {
    /// Get the frame kind
    pub fn kind(&self) -> ResponseKind {
        match self {
            Response::Ok(_) => ResponseKind::Ok,
            Response::Item(_) => ResponseKind::Item,
            Response::EndOfStream => ResponseKind::EndOfStream,
            Response::Error { .. } => ResponseKind::Error,
        }
    }

    /// Create an ERROR response from a service error
    pub fn error(err: &RosterError) -> Self {
        Response::Error {
            code: ErrorCode::from(err),
            message: err.detail(),
        }
    }

    /// Turn an ERROR frame back into the matching service error
    pub fn into_error(code: ErrorCode, message: String) -> RosterError {
        match code {
            ErrorCode::InvalidArgument => RosterError::InvalidArgument(message),
            ErrorCode::NotFound => RosterError::NotFound(message),
            ErrorCode::AlreadyExists => RosterError::AlreadyExists(message),
            ErrorCode::Internal => RosterError::Protocol(message),
        }
    }
}
