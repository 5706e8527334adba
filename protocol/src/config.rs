//! # Protocol Configuration & Constants
//!
//! Every fixed value the ledger depends on lives here. The node's CLI
//! defaults are derived from these so the two never drift apart.

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// Version of the block format and hashing scheme. Bump when the hash
/// preimage layout changes, since old chains stop validating.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Chain Parameters
// ---------------------------------------------------------------------------

/// Index of the genesis block.
pub const GENESIS_INDEX: u64 = 0;

/// Placeholder payload carried by the genesis block.
pub const GENESIS_PAYLOAD: i64 = 0;

/// `prev_hash` of the genesis block. Genesis has no predecessor.
pub const GENESIS_PREV_HASH: &str = "";

/// Name of the block digest algorithm, reported by the status endpoint.
pub const HASH_ALGORITHM: &str = "SHA-256";

/// Digest length in bytes.
pub const HASH_OUTPUT_LENGTH: usize = 32;

/// Digest length once hex-encoded.
pub const HASH_HEX_LENGTH: usize = HASH_OUTPUT_LENGTH * 2;

// ---------------------------------------------------------------------------
// Transport Defaults
// ---------------------------------------------------------------------------

/// Default HTTP API port.
pub const DEFAULT_API_PORT: u16 = 8080;

/// Default Prometheus metrics port.
pub const DEFAULT_METRICS_PORT: u16 = 9090;

/// Upper bound, in seconds, on how long a single request may take end to
/// end. Requests that run longer get 408.
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Maximum accepted request body. A replacement candidate is the largest
/// thing anyone posts; 1 MiB holds several thousand blocks.
pub const MAX_REQUEST_BODY_BYTES: usize = 1 << 20;
