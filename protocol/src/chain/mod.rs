//! # Chain Module
//!
//! The chain-integrity core: how blocks are hashed, built, checked, and
//! held.
//!
//! ## Architecture
//!
//! ```text
//! block.rs    : Block structure, genesis, factory, hash computation
//! validator.rs: Successor checks and whole-chain validation
//! store.rs    : ChainStore: the locked, canonical sequence of blocks
//! payload.rs  : Write-request decoding into block payloads
//! ```
//!
//! ## Data Flow
//!
//! ```text
//! request body → decode_payload → Block::next(tail) → ChainStore::append
//!                                                        │
//!                                              check_successor(tail, candidate)
//! ```
//!
//! Nothing outside `ChainStore` can mutate the canonical chain. Readers get
//! clones.

pub mod block;
pub mod payload;
pub mod store;
pub mod validator;

pub use block::{compute_hash, create_block, Block};
pub use payload::{decode_payload, WriteRequest};
pub use store::{ChainStore, ChainSummary};
pub use validator::{check_successor, is_valid_successor, validate_chain};
