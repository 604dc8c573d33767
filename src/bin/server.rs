//! kvport reference store server
//!
//! Serves an in-memory revisioned store over the kvport wire protocol.
//! Handy for trying export/import locally and for end-to-end tests.

use std::sync::Arc;

use clap::Parser;
use kvport::network::Server;
use kvport::{MemoryStore, ServerConfig};
use tracing_subscriber::{fmt, EnvFilter};

/// kvport reference store server
#[derive(Parser, Debug)]
#[command(name = "kvport-server")]
#[command(about = "In-memory key-value store speaking the kvport wire protocol")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:2379")]
    listen: String,

    /// Worker threads
    #[arg(short, long, default_value = "4")]
    workers: usize,

    /// Max records per range read, 0 for no cap
    #[arg(short, long, default_value = "0")]
    page_cap: u64,

    /// Member id reported by status
    #[arg(long, default_value = "1")]
    member_id: u64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,kvport=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("kvport-server v{}", kvport::VERSION);
    tracing::info!("Listen address: {}", args.listen);

    let config = ServerConfig {
        listen_addr: args.listen,
        workers: args.workers,
        page_cap: args.page_cap,
        member_id: args.member_id,
        ..ServerConfig::default()
    };

    let store = Arc::new(MemoryStore::with_page_cap(config.page_cap).with_member_id(config.member_id));

    let server = match Server::bind(config, store) {
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
}
