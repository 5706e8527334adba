//! # CLI Interface
//!
//! Defines the command-line argument structure for `linkchain-node` using
//! `clap` derive. Every `run` flag can also come from a `LINKCHAIN_*`
//! environment variable.

use clap::{Parser, Subcommand};
use std::net::IpAddr;

use linkchain_protocol::config::{DEFAULT_API_PORT, DEFAULT_METRICS_PORT, REQUEST_TIMEOUT_SECS};

/// LinkChain ledger node.
///
/// Holds an in-memory hash chain and serves it over HTTP. Blocks are
/// appended with `POST /` and the chain is read back with `GET /`.
#[derive(Parser, Debug)]
#[command(
    name = "linkchain-node",
    about = "LinkChain in-memory ledger node",
    version,
    propagate_version = true
)]
pub struct LinkChainCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the node and serve the HTTP API.
    Run(RunArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Interface to bind the API and metrics listeners on.
    #[arg(long, env = "LINKCHAIN_ADDR", default_value = "0.0.0.0")]
    pub addr: IpAddr,

    /// Port for the HTTP API.
    #[arg(long, short = 'p', env = "LINKCHAIN_PORT", default_value_t = DEFAULT_API_PORT)]
    pub port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "LINKCHAIN_METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// Maximum time a single API request may take, in seconds.
    #[arg(long, env = "LINKCHAIN_REQUEST_TIMEOUT_SECS", default_value_t = REQUEST_TIMEOUT_SECS)]
    pub request_timeout_secs: u64,

    /// Log output format: `pretty` or `json`.
    #[arg(long, env = "LINKCHAIN_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,
}
