//! Connection Handler
//!
//! Handles individual client connections.

use std::io::{BufReader, BufWriter};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Result, RosterError};
use crate::model::{NewTrainer, Trainer};
use crate::protocol::{read_request, write_response, Reply, Request, Response};
use crate::service::{CancelToken, TrainerService, TrainerSink};

/// Handles a single client connection
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Reference to the trainer service
    service: Arc<TrainerService>,

    /// Server-wide shutdown token, polled by streaming calls
    shutdown: CancelToken,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    ///
    /// Sets up buffered I/O
    pub fn new(stream: TcpStream, service: Arc<TrainerService>, shutdown: CancelToken) -> Result<Self> {
        // Get peer address for logging before we split the stream
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        // Clone stream for separate read/write handles
        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            service,
            shutdown,
            peer_addr,
        })
    }

    /// Configure connection timeouts
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        if read_ms > 0 {
            self.reader
                .get_ref()
                .set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            self.writer
                .get_ref()
                .set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }

        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Reads requests in a loop and answers them.
    /// Returns when the client disconnects or an error occurs.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        loop {
            let request = match read_request(&mut self.reader) {
                Ok(request) => request,
                Err(e) if is_disconnect(&e) => {
                    tracing::debug!("Client {} went away: {}", self.peer_addr, e);
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                    // Send error response if possible
                    let _ = write_response(&mut self.writer, &Response::error(&e));
                    return Err(e);
                }
            };

            tracing::trace!("Received {:?} from {}", request.kind(), self.peer_addr);

            let outcome = match request {
                Request::CreateTrainer(first) => self.serve_create(Some(first)),
                Request::CreateEnd => self.serve_create(None),
                Request::ListTrainers { name } => self.serve_list(&name),
                unary => {
                    let response = self.execute_unary(unary);
                    write_response(&mut self.writer, &response).map(|()| true)
                }
            };

            match outcome {
                Ok(true) => {}
                // Stream ended by the client leaving mid-call
                Ok(false) => return Ok(()),
                Err(e) if is_disconnect(&e) => {
                    tracing::debug!(
                        "Client {} disconnected before response could be sent: {}",
                        self.peer_addr,
                        e
                    );
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("Error serving {}: {}", self.peer_addr, e);
                    return Err(e);
                }
            }
        }
    }

    /// Execute a unary request and build its response
    fn execute_unary(&self, request: Request) -> Response {
        let result = match request {
            Request::GetTrainer { id } => self.service.get(&id).map(Reply::Trainer),
            Request::DeleteTrainer { id } => self.service.delete(&id).map(Reply::Trainer),
            Request::UpdateTrainer(update) => self.service.update(&update).map(Reply::Trainer),
            Request::Ping => Ok(Reply::Pong),
            other => Err(RosterError::Protocol(format!(
                "{:?} is not a unary request",
                other.kind()
            ))),
        };

        match result {
            Ok(reply) => Response::Ok(reply),
            Err(e) => {
                tracing::debug!("Request from {} failed: {}", self.peer_addr, e);
                Response::error(&e)
            }
        }
    }

    /// Drive a client-streaming create
    ///
    /// Returns `Ok(false)` if the client left before closing the stream; the
    /// trainers accepted up to then are kept and no answer is sent.
    fn serve_create(&mut self, first: Option<NewTrainer>) -> Result<bool> {
        let cancel = self.shutdown.clone();
        let service = Arc::clone(&self.service);

        // A stream opened by CREATE_END alone is empty and already closed
        let ended = first.is_none();
        let mut stream = CreateStream {
            first,
            reader: &mut self.reader,
            cancel: &cancel,
            ended,
            failure: None,
        };

        let summary = service.create(&mut stream, &cancel);
        let ended = stream.ended;
        let failure = stream.failure.take();

        if let Some(e) = failure {
            if is_disconnect(&e) {
                tracing::debug!(
                    "Client {} left mid-create, {} trainers kept",
                    self.peer_addr,
                    summary.success_count
                );
                return Ok(false);
            }
            write_response(&mut self.writer, &Response::error(&e))?;
            return Err(e);
        }

        if !ended {
            // Shutdown cut the stream short
            return Ok(false);
        }

        write_response(&mut self.writer, &Response::Ok(Reply::Created(summary)))?;
        Ok(true)
    }

    /// Drive a server-streaming listing
    ///
    /// Returns `Ok(false)` if the listing was cut short.
    fn serve_list(&mut self, fragment: &str) -> Result<bool> {
        let cancel = self.shutdown.clone();
        let service = Arc::clone(&self.service);

        let mut sink = FrameSink {
            writer: &mut self.writer,
        };
        let summary = service.list_by_name(fragment, &mut sink, &cancel);

        if summary.cancelled {
            tracing::debug!(
                "Listing for {} stopped after {} items",
                self.peer_addr,
                summary.sent
            );
            return Ok(false);
        }

        write_response(&mut self.writer, &Response::EndOfStream)?;
        Ok(true)
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

/// Pulls create items off the socket until CREATE_END
struct CreateStream<'a> {
    first: Option<NewTrainer>,
    reader: &'a mut BufReader<TcpStream>,
    cancel: &'a CancelToken,
    ended: bool,
    failure: Option<RosterError>,
}

impl Iterator for CreateStream<'_> {
    type Item = NewTrainer;

    fn next(&mut self) -> Option<NewTrainer> {
        if let Some(first) = self.first.take() {
            return Some(first);
        }
        if self.ended || self.failure.is_some() || self.cancel.is_cancelled() {
            return None;
        }

        match read_request(&mut *self.reader) {
            Ok(Request::CreateTrainer(input)) => Some(input),
            Ok(Request::CreateEnd) => {
                self.ended = true;
                None
            }
            Ok(other) => {
                self.failure = Some(RosterError::Protocol(format!(
                    "{:?} received inside a create stream",
                    other.kind()
                )));
                None
            }
            Err(e) => {
                self.failure = Some(e);
                None
            }
        }
    }
}

/// Writes listing items straight to the socket
struct FrameSink<'a> {
    writer: &'a mut BufWriter<TcpStream>,
}

impl TrainerSink for FrameSink<'_> {
    fn send(&mut self, trainer: Trainer) -> Result<()> {
        write_response(&mut *self.writer, &Response::Item(trainer))
    }
}

/// Whether an error just means the peer is gone or idle
fn is_disconnect(err: &RosterError) -> bool {
    match err {
        RosterError::Io(e) => matches!(
            e.kind(),
            std::io::ErrorKind::UnexpectedEof
                | std::io::ErrorKind::ConnectionReset
                | std::io::ErrorKind::ConnectionAborted
                | std::io::ErrorKind::BrokenPipe
                | std::io::ErrorKind::WouldBlock
                | std::io::ErrorKind::TimedOut
        ),
        _ => false,
    }
}
