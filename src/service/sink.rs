//! Streaming output
//!
//! Destinations for the trainers a listing streams out.

use std::io;

use crossbeam::channel::Sender;

use crate::error::{Result, RosterError};
use crate::model::Trainer;

/// Receives the items of a server-streaming listing, one at a time
///
/// An error means the receiving side is gone; the listing stops there.
pub trait TrainerSink {
    fn send(&mut self, trainer: Trainer) -> Result<()>;
}

impl TrainerSink for Vec<Trainer> {
    fn send(&mut self, trainer: Trainer) -> Result<()> {
        self.push(trainer);
        Ok(())
    }
}

impl TrainerSink for Sender<Trainer> {
    fn send(&mut self, trainer: Trainer) -> Result<()> {
        Sender::send(self, trainer).map_err(|_| {
            RosterError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "listing receiver dropped",
            ))
        })
    }
}
