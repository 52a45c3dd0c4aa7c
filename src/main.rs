//! Matchboard Daemon
//!
//! Serves the team matching API: projects with role vacancies, join
//! applications, invitations, friend requests, and the notification log.
//!
//! ## Usage
//!
//! ```bash
//! # Start with defaults
//! matchboard
//!
//! # Start with custom config
//! matchboard --config /path/to/config.toml
//!
//! # Start with custom HTTP port
//! matchboard --http-port 9000
//!
//! # Start with custom data directory
//! matchboard --data-dir /data/matchboard
//! ```

use clap::Parser;
use matchboard::services::events::spawn_logging_listener;
use matchboard::{Config, Db, HttpServer, Services};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "matchboard")]
#[command(about = "Team matching service for student collaboration projects")]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Data directory for the SQLite database
    #[arg(long, env = "MATCHBOARD_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// HTTP API port
    #[arg(long, env = "MATCHBOARD_HTTP_PORT")]
    http_port: Option<u16>,

    /// Bind address for the HTTP API
    #[arg(long, env = "MATCHBOARD_BIND_ADDR")]
    bind_addr: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("matchboard=info".parse()?),
        )
        .init();

    let args = Args::parse();

    // Load config
    let mut config = if let Some(config_path) = &args.config {
        Config::load(config_path)?
    } else {
        Config::default()
    };

    // Apply CLI overrides
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    if let Some(port) = args.http_port {
        config.http_port = port;
    }
    if let Some(addr) = args.bind_addr {
        config.bind_addr = addr;
    }

    info!(data_dir = ?config.data_dir, "Starting matchboard");

    // Open database
    let db = Arc::new(Db::open(&config.data_dir)?);

    // Wire services and the audit listener
    let services = Arc::new(Services::new(db.clone(), &config));
    spawn_logging_listener(services.events.clone());

    // Run HTTP server
    let bind_addr: SocketAddr = format!("{}:{}", config.bind_addr, config.http_port).parse()?;
    let server = Arc::new(HttpServer::new(services, db, bind_addr));
    server.run().await?;

    Ok(())
}
