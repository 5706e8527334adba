//! # Cryptographic Primitives
//!
//! Thin wrappers around the `sha2` crate. Block hashing only needs a
//! deterministic, fixed-length digest.

pub mod hash;

pub use hash::{sha256, sha256_hex, PreimageBuilder};
