//! coedit daemon (coeditd)
//!
//! The relay server for collaborative document editing.
//!
//! # Usage
//!
//! ```bash
//! # Start with defaults (WebSocket on 5000, in-memory storage)
//! coeditd
//!
//! # Custom port
//! coeditd --port 7000
//!
//! # With persistence
//! coeditd --db /var/lib/coedit/documents.db
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use coedit_core::SessionRegistry;
use coedit_storage::{DocumentStore, MemoryStore, SqliteStore};
use coedit_transport::WebSocketServer;

/// coedit daemon - collaborative document editing relay
#[derive(Parser, Debug)]
#[command(name = "coeditd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// WebSocket port to listen on
    #[arg(long, env = "COEDIT_PORT", default_value = "5000")]
    port: u16,

    /// Bind address
    #[arg(long, env = "COEDIT_BIND", default_value = "0.0.0.0")]
    bind: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "COEDIT_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// SQLite database path for persistence (default: in-memory only)
    #[arg(long, env = "COEDIT_DB")]
    db: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .init();

    // Session registry: the only mutable shared state in the core,
    // constructed once per process and torn down with it
    let registry = Arc::new(SessionRegistry::new());

    // Storage: SQLite if a path was given, in-memory otherwise
    let store: Arc<dyn DocumentStore> = match &args.db {
        Some(db_path) => {
            info!(path = %db_path.display(), "Initializing SQLite persistence");
            match SqliteStore::new(db_path) {
                Ok(store) => {
                    info!("SQLite persistence enabled");
                    Arc::new(store)
                }
                Err(e) => {
                    warn!(error = %e, "Failed to initialize SQLite, running in-memory only");
                    Arc::new(MemoryStore::new())
                }
            }
        }
        None => {
            info!("Running in-memory only (no --db specified)");
            Arc::new(MemoryStore::new())
        }
    };

    let addr: SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;
    info!(addr = %addr, "Starting coedit daemon");

    let server = WebSocketServer::new(registry, store, addr);
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.run().await {
            tracing::error!(error = %e, "WebSocket server error");
        }
    });

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutting down...");
    server_handle.abort();

    Ok(())
}
