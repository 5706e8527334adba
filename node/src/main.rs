// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # LinkChain Node
//!
//! Entry point for the `linkchain-node` binary. Parses CLI arguments,
//! initializes logging and metrics, creates the in-memory chain, and serves
//! the HTTP API until a shutdown signal arrives or the chain is found
//! corrupt.
//!
//! Subcommands:
//!
//! - `run`     start the node
//! - `version` print build version information

mod api;
mod cli;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::Notify;

use linkchain_protocol::ChainStore;

use cli::{Commands, LinkChainCli};
use logging::LogFormat;
use metrics::NodeMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = LinkChainCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the node: API server and metrics endpoint over one shared chain.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(
        logging::DEFAULT_FILTER,
        LogFormat::from_str_lossy(&args.log_format),
    )
    .context("failed to initialize logging")?;

    tracing::info!(
        addr = %args.addr,
        port = args.port,
        metrics_port = args.metrics_port,
        request_timeout_secs = args.request_timeout_secs,
        "starting linkchain-node"
    );

    // --- Chain ---
    let chain = Arc::new(ChainStore::new());
    let genesis = chain.genesis();
    tracing::info!(hash = %genesis.hash, timestamp = %genesis.timestamp, "genesis block created");

    // --- Metrics ---
    let node_metrics = Arc::new(NodeMetrics::new());

    // --- Application state ---
    let fatal = Arc::new(Notify::new());
    let app_state = api::AppState {
        version: format!(
            "{} (protocol {})",
            env!("CARGO_PKG_VERSION"),
            linkchain_protocol::config::PROTOCOL_VERSION,
        ),
        chain,
        metrics: Arc::clone(&node_metrics),
        fatal: Arc::clone(&fatal),
        request_timeout: Duration::from_secs(args.request_timeout_secs),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = SocketAddr::new(args.addr, args.port);
    let api_listener = tokio::net::TcpListener::bind(api_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", api_addr))?;
    tracing::info!("API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&node_metrics));
    let metrics_addr = SocketAddr::new(args.addr, args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            res.context("API server error")?;
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            res.context("metrics server error")?;
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, draining connections");
        }
        _ = fatal.notified() => {
            tracing::error!("stored chain is corrupt, stopping");
            anyhow::bail!("chain integrity check failed");
        }
    }

    tracing::info!("linkchain-node stopped");
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("linkchain-node {}", env!("CARGO_PKG_VERSION"));
    println!("protocol       {}", linkchain_protocol::config::PROTOCOL_VERSION);
    println!("hash           {}", linkchain_protocol::config::HASH_ALGORITHM);
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
