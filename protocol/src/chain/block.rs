//! # Block Structure
//!
//! A block is one immutable record in the ledger. It carries an integer
//! payload and is linked to its predecessor by hash.
//!
//! ## Block Layout
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  Block                                       │
//! │  ├── index: u64        (genesis = 0)         │
//! │  ├── timestamp: String (RFC 3339, advisory)  │
//! │  ├── payload: i64                            │
//! │  ├── hash: String      (SHA-256 hex)         │
//! │  └── prevHash: String  ("" for genesis)      │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! The JSON form keeps exactly this field order.
//!
//! ## Hash Computation
//!
//! The hash covers `index || timestamp || payload || prev_hash`, framed by
//! [`PreimageBuilder`]. The hash field itself is obviously not included.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{GENESIS_INDEX, GENESIS_PAYLOAD, GENESIS_PREV_HASH};
use crate::crypto::PreimageBuilder;

// ---------------------------------------------------------------------------
// Block
// ---------------------------------------------------------------------------

/// One record in the chain.
///
/// Blocks are never modified after construction. The store hands out
/// clones, so editing a returned block cannot reach the canonical chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Position in the chain. Genesis is 0.
    pub index: u64,
    /// Creation time in RFC 3339. Not validated against ordering.
    pub timestamp: String,
    /// Opaque application data.
    pub payload: i64,
    /// Hex SHA-256 over the four linkage fields.
    pub hash: String,
    /// Hash of the predecessor. Empty for genesis.
    #[serde(rename = "prevHash")]
    pub prev_hash: String,
}

impl Block {
    /// Construct the genesis block.
    ///
    /// Index 0, placeholder payload, empty `prev_hash`, stamped with the
    /// current time. Genesis is trusted by construction and never checked
    /// against a predecessor.
    pub fn genesis() -> Self {
        Self::with_timestamp(
            GENESIS_INDEX,
            now_rfc3339(),
            GENESIS_PAYLOAD,
            GENESIS_PREV_HASH.to_string(),
        )
    }

    /// Build the successor of `self` carrying `payload`.
    ///
    /// Does not re-validate `self`; the caller hands in a block it already
    /// trusts (normally the store's tail).
    pub fn next(&self, payload: i64) -> Self {
        Self::with_timestamp(self.index + 1, now_rfc3339(), payload, self.hash.clone())
    }

    /// Build a block from explicit fields and stamp its hash.
    ///
    /// Used by [`Block::genesis`] and [`Block::next`], and directly by tests
    /// that need byte-for-byte reproducible blocks.
    pub fn with_timestamp(index: u64, timestamp: String, payload: i64, prev_hash: String) -> Self {
        let hash = hash_fields(index, &timestamp, payload, &prev_hash);
        Block {
            index,
            timestamp,
            payload,
            hash,
            prev_hash,
        }
    }

    /// Recompute the hash from this block's fields.
    pub fn compute_hash(&self) -> String {
        compute_hash(self)
    }

    /// `true` if the stored hash matches the recomputed one.
    pub fn is_self_consistent(&self) -> bool {
        self.hash == self.compute_hash()
    }

    /// `true` for a block shaped like genesis (index 0, no predecessor).
    pub fn is_genesis(&self) -> bool {
        self.index == GENESIS_INDEX && self.prev_hash == GENESIS_PREV_HASH
    }
}

/// Build the successor of `predecessor` carrying `payload`.
///
/// Free-function form of [`Block::next`].
pub fn create_block(predecessor: &Block, payload: i64) -> Block {
    predecessor.next(payload)
}

// ---------------------------------------------------------------------------
// Hash Computation
// ---------------------------------------------------------------------------

/// Compute the digest of a block from its linkage fields.
///
/// Pure and deterministic: the stored `hash` field is ignored, so this is
/// safe to use both for stamping new blocks and for re-verifying old ones.
pub fn compute_hash(block: &Block) -> String {
    hash_fields(
        block.index,
        &block.timestamp,
        block.payload,
        &block.prev_hash,
    )
}

fn hash_fields(index: u64, timestamp: &str, payload: i64, prev_hash: &str) -> String {
    PreimageBuilder::with_capacity(32 + timestamp.len() + prev_hash.len())
        .u64(index)
        .str(timestamp)
        .i64(payload)
        .str(prev_hash)
        .finish_hex()
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
