//! Configuration for Roster
//!
//! Centralized configuration with sensible defaults.

use std::str::FromStr;

use crate::error::RosterError;

/// Main configuration for a Roster instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Durable Store Configuration
    // -------------------------------------------------------------------------
    /// Which durable store backend the service talks to
    pub store_backend: StoreBackend,

    /// Artificial latency added to every durable store call (milliseconds).
    /// Zero disables it.
    pub store_latency_ms: u64,

    /// Insert one sample trainer when the durable store starts out empty
    pub seed_store: bool,

    // -------------------------------------------------------------------------
    // Service Configuration
    // -------------------------------------------------------------------------
    /// Reject creates whose name clashes (case-insensitively) with a live
    /// trainer. Off by default: only updates are checked.
    pub unique_names_on_create: bool,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Number of worker threads serving connections
    pub worker_threads: usize,

    /// Max accepted connections waiting for a free worker
    pub max_pending_connections: usize,

    /// Connection read timeout (milliseconds)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds)
    pub write_timeout_ms: u64,
}

/// Durable store backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// In-process document store standing in for the external one
    Memory,

    /// No durable store wired up; every call fails and the mirror serves alone
    Detached,
}

impl FromStr for StoreBackend {
    type Err = RosterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "detached" | "none" => Ok(StoreBackend::Detached),
            other => Err(RosterError::Config(format!(
                "unknown store backend '{}' (expected 'memory' or 'detached')",
                other
            ))),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_backend: StoreBackend::Memory,
            store_latency_ms: 0,
            seed_store: false,
            unique_names_on_create: false,
            listen_addr: "127.0.0.1:50051".to_string(),
            worker_threads: 16,
            max_pending_connections: 256,
            read_timeout_ms: 30_000,
            write_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check that the values can actually run a server
    pub fn validate(&self) -> Result<(), RosterError> {
        if self.worker_threads == 0 {
            return Err(RosterError::Config(
                "worker_threads must be at least 1".to_string(),
            ));
        }
        if self.max_pending_connections == 0 {
            return Err(RosterError::Config(
                "max_pending_connections must be at least 1".to_string(),
            ));
        }
        if self.listen_addr.trim().is_empty() {
            return Err(RosterError::Config("listen_addr is empty".to_string()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the durable store backend
    pub fn store_backend(mut self, backend: StoreBackend) -> Self {
        self.config.store_backend = backend;
        self
    }

    /// Set the artificial durable store latency (in milliseconds)
    pub fn store_latency_ms(mut self, ms: u64) -> Self {
        self.config.store_latency_ms = ms;
        self
    }

    /// Seed a sample trainer into an empty durable store
    pub fn seed_store(mut self, seed: bool) -> Self {
        self.config.seed_store = seed;
        self
    }

    /// Enforce name uniqueness on create as well as update
    pub fn unique_names_on_create(mut self, enabled: bool) -> Self {
        self.config.unique_names_on_create = enabled;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the number of worker threads
    pub fn worker_threads(mut self, count: usize) -> Self {
        self.config.worker_threads = count;
        self
    }

    /// Set the backlog of accepted connections waiting for a worker
    pub fn max_pending_connections(mut self, count: usize) -> Self {
        self.config.max_pending_connections = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
