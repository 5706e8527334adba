// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # LinkChain Protocol: Core Library
//!
//! An in-memory, append-only hash chain. Each block commits to its
//! predecessor's hash, so editing any stored block breaks every link after
//! it.
//!
//! ## Architecture
//!
//! - **crypto**: SHA-256 and unambiguous preimage framing.
//! - **chain**: Blocks, the successor validator, and the `ChainStore` that
//!   owns the canonical chain and applies the longest-chain rule.
//! - **error**: `ChainError` and `LinkError`.
//! - **config**: Protocol constants and transport defaults.
//!
//! ## Example
//!
//! ```
//! use linkchain_protocol::chain::{is_valid_successor, ChainStore};
//!
//! let store = ChainStore::new();
//! let genesis = store.tail();
//! let block = genesis.next(100);
//!
//! assert!(is_valid_successor(&genesis, &block));
//! assert!(store.try_append(block));
//! assert_eq!(store.len(), 2);
//! ```

pub mod chain;
pub mod config;
pub mod crypto;
pub mod error;

pub use chain::{Block, ChainStore};
pub use error::{ChainError, ChainResult, LinkError};
