//! TCP Client
//!
//! Blocking client for the Roster wire protocol.

use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};

use crate::error::{Result, RosterError};
use crate::model::{NewTrainer, Trainer, UpdateTrainer};
use crate::protocol::{read_response, write_request, Reply, Request, Response};
use crate::service::CreateSummary;

/// A connection to a Roster server
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Client {
    /// Connect to a server
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        let read_stream = stream.try_clone()?;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
        })
    }

    /// Health check
    pub fn ping(&mut self) -> Result<()> {
        match self.call(&Request::Ping)? {
            Reply::Pong => Ok(()),
            other => Err(unexpected(&other)),
        }
    }

    /// Get a trainer by id
    pub fn get(&mut self, id: &str) -> Result<Trainer> {
        self.call_for_trainer(&Request::GetTrainer { id: id.to_string() })
    }

    /// Delete a trainer by id, returning the removed record
    pub fn delete(&mut self, id: &str) -> Result<Trainer> {
        self.call_for_trainer(&Request::DeleteTrainer { id: id.to_string() })
    }

    /// Overwrite a trainer, returning it as it now stands
    pub fn update(&mut self, update: &UpdateTrainer) -> Result<Trainer> {
        self.call_for_trainer(&Request::UpdateTrainer(update.clone()))
    }

    /// Send every input as one create stream
    pub fn create<I>(&mut self, inputs: I) -> Result<CreateSummary>
    where
        I: IntoIterator<Item = NewTrainer>,
    {
        for input in inputs {
            write_request(&mut self.writer, &Request::CreateTrainer(input))?;
        }

        match self.call(&Request::CreateEnd)? {
            Reply::Created(summary) => Ok(summary),
            other => Err(unexpected(&other)),
        }
    }

    /// Collect every trainer whose name contains `name`, ignoring case
    pub fn list_by_name(&mut self, name: &str) -> Result<Vec<Trainer>> {
        write_request(
            &mut self.writer,
            &Request::ListTrainers {
                name: name.to_string(),
            },
        )?;

        let mut trainers = Vec::new();
        loop {
            match read_response(&mut self.reader)? {
                Response::Item(trainer) => trainers.push(trainer),
                Response::EndOfStream => return Ok(trainers),
                Response::Error { code, message } => return Err(Response::into_error(code, message)),
                Response::Ok(reply) => return Err(unexpected(&reply)),
            }
        }
    }

    /// Send one request and wait for its unary answer
    fn call(&mut self, request: &Request) -> Result<Reply> {
        write_request(&mut self.writer, request)?;

        match read_response(&mut self.reader)? {
            Response::Ok(reply) => Ok(reply),
            Response::Error { code, message } => Err(Response::into_error(code, message)),
            other => Err(RosterError::Protocol(format!(
                "expected a unary answer, got {:?}",
                other.kind()
            ))),
        }
    }

    fn call_for_trainer(&mut self, request: &Request) -> Result<Trainer> {
        match self.call(request)? {
            Reply::Trainer(trainer) => Ok(trainer),
            other => Err(unexpected(&other)),
        }
    }
}

fn unexpected(reply: &Reply) -> RosterError {
    RosterError::Protocol(format!("unexpected reply: {:?}", reply))
}
