//! Network Module
//!
//! TCP server, connection handling and client.
//!
//! ## Architecture
//! - Single acceptor thread
//! - Worker thread pool for connections, fed through a bounded channel
//! - Requests routed through the TrainerService
//! - Streaming calls poll the server's shutdown token

mod client;
mod connection;
mod server;

pub use client::Client;
pub use connection::Connection;
pub use server::Server;
