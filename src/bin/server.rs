//! Roster Server Binary
//!
//! Starts the TCP server for Roster.

use std::sync::Arc;

use clap::Parser;
use roster::network::Server;
use roster::{Config, StoreBackend, TrainerService};
use tracing_subscriber::{fmt, EnvFilter};

/// Roster Server
#[derive(Parser, Debug)]
#[command(name = "roster-server")]
#[command(about = "Streaming trainer record service with a resilient dual-tier store")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:50051")]
    listen: String,

    /// Durable store backend: memory or detached
    #[arg(short, long, default_value = "memory")]
    store: StoreBackend,

    /// Artificial latency added to every durable store call, in milliseconds
    #[arg(long, default_value = "0")]
    store_latency_ms: u64,

    /// Seed one sample trainer into an empty durable store
    #[arg(long)]
    seed: bool,

    /// Reject creates whose name is already taken
    #[arg(long)]
    unique_names_on_create: bool,

    /// Worker threads serving connections
    #[arg(short, long, default_value = "16")]
    workers: usize,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,roster=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("Roster Server v{}", roster::VERSION);
    tracing::info!("Durable store: {:?}", args.store);
    tracing::info!("Listen address: {}", args.listen);

    // Build config from args
    let config = Config::builder()
        .listen_addr(&args.listen)
        .store_backend(args.store)
        .store_latency_ms(args.store_latency_ms)
        .seed_store(args.seed)
        .unique_names_on_create(args.unique_names_on_create)
        .worker_threads(args.workers)
        .build();

    // Open service
    let service = match TrainerService::open(&config) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            tracing::error!("Failed to open service: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Service initialized successfully");

    // Start server
    let server = match Server::bind(config, service) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to bind: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
