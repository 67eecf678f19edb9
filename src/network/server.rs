//! TCP Server
//!
//! Accepts connections and dispatches them to worker threads.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, TrySendError};

use crate::config::Config;
use crate::error::{Result, RosterError};
use crate::service::{CancelToken, TrainerService};

use super::Connection;

/// How long the acceptor sleeps when no connection is waiting
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// TCP server for Roster
pub struct Server {
    config: Config,
    service: Arc<TrainerService>,
    listener: TcpListener,
    local_addr: SocketAddr,
    shutdown: CancelToken,
}

impl Server {
    /// Bind the listen address from the config
    ///
    /// Binding happens here so callers can learn the real port (e.g. when
    /// listening on port 0) before `run` blocks.
    pub fn bind(config: Config, service: Arc<TrainerService>) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(&config.listen_addr).map_err(|e| {
            RosterError::Config(format!("cannot listen on {}: {}", config.listen_addr, e))
        })?;
        // Non-blocking accept so the loop can notice shutdown
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        Ok(Self {
            config,
            service,
            listener,
            local_addr,
            shutdown: CancelToken::new(),
        })
    }

    /// The address actually bound
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Token that stops the server when cancelled
    pub fn shutdown_handle(&self) -> CancelToken {
        self.shutdown.clone()
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Run the accept loop (blocking until shutdown)
    ///
    /// One acceptor thread (the caller's) hands sockets to a fixed pool of
    /// workers through a bounded channel. When the backlog is full new
    /// connections are dropped.
    pub fn run(self) -> Result<()> {
        tracing::info!(
            "Listening on {} with {} workers",
            self.local_addr,
            self.config.worker_threads
        );

        let (sender, receiver) = channel::bounded::<TcpStream>(self.config.max_pending_connections);
        let workers: Vec<JoinHandle<()>> = (0..self.config.worker_threads)
            .map(|index| self.spawn_worker(index, receiver.clone()))
            .collect::<io::Result<_>>()?;
        drop(receiver);

        while !self.shutdown.is_cancelled() {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    // Accepted sockets inherit non-blocking mode on some platforms
                    if let Err(e) = stream.set_nonblocking(false) {
                        tracing::warn!("Dropping connection from {}: {}", peer, e);
                        continue;
                    }
                    match sender.try_send(stream) {
                        Ok(()) => {}
                        Err(TrySendError::Full(_)) => {
                            tracing::warn!("Connection backlog full, dropping {}", peer);
                        }
                        Err(TrySendError::Disconnected(_)) => break,
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                }
            }
        }

        tracing::info!("Shutting down, waiting for workers");
        drop(sender);
        for worker in workers {
            let name = worker.thread().name().unwrap_or("worker").to_string();
            if worker.join().is_err() {
                tracing::warn!("Worker {} panicked", name);
            }
        }

        Ok(())
    }

    fn spawn_worker(&self, index: usize, receiver: Receiver<TcpStream>) -> io::Result<JoinHandle<()>> {
        let service = Arc::clone(&self.service);
        let shutdown = self.shutdown.clone();
        let read_timeout_ms = self.config.read_timeout_ms;
        let write_timeout_ms = self.config.write_timeout_ms;

        thread::Builder::new()
            .name(format!("roster-worker-{}", index))
            .spawn(move || {
                for stream in receiver.iter() {
                    let mut connection =
                        match Connection::new(stream, Arc::clone(&service), shutdown.clone()) {
                            Ok(connection) => connection,
                            Err(e) => {
                                tracing::warn!("Failed to set up connection: {}", e);
                                continue;
                            }
                        };

                    if let Err(e) = connection.set_timeouts(read_timeout_ms, write_timeout_ms) {
                        tracing::warn!("Failed to set timeouts for {}: {}", connection.peer_addr(), e);
                        continue;
                    }

                    if let Err(e) = connection.handle() {
                        tracing::warn!("Connection {} closed with error: {}", connection.peer_addr(), e);
                    }
                }
            })
    }
}
