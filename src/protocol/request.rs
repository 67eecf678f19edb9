//! Request definitions
//!
//! Represents frames sent by clients.

use crate::model::{NewTrainer, UpdateTrainer};

/// Request frame kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RequestKind {
    GetTrainer = 0x01,
    DeleteTrainer = 0x02,
    UpdateTrainer = 0x03,
    CreateTrainer = 0x04,
    CreateEnd = 0x05,
    ListTrainers = 0x06,
    Ping = 0x07,
}

/// A parsed request frame
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Get a trainer by id
    GetTrainer { id: String },

    /// Delete a trainer by id
    DeleteTrainer { id: String },

    /// Overwrite a trainer
    UpdateTrainer(UpdateTrainer),

    /// One item of a create stream
    CreateTrainer(NewTrainer),

    /// End of a create stream
    CreateEnd,

    /// Stream trainers whose name contains the fragment
    ListTrainers { name: String },

    /// Ping (health check)
    Ping,
}

impl Request {
    /// Get the frame kind
    pub fn kind(&self) -> RequestKind {
        match self {
            Request::GetTrainer { .. } => RequestKind::GetTrainer,
            Request::DeleteTrainer { .. } => RequestKind::DeleteTrainer,
            Request::UpdateTrainer(_) => RequestKind::UpdateTrainer,
            Request::CreateTrainer(_) => RequestKind::CreateTrainer,
            Request::CreateEnd => RequestKind::CreateEnd,
            Request::ListTrainers { .. } => RequestKind::ListTrainers,
            Request::Ping => RequestKind::Ping,
        }
    }
}
