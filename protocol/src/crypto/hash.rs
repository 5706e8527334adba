//! # Hashing Utilities
//!
//! SHA-256 is the only digest the ledger uses. Block hashes are carried
//! around as lowercase hex strings because that is how they appear on the
//! wire and in the chain's JSON form; the raw-array helpers exist for
//! building preimages and for benchmarks.
//!
//! ## Preimage framing
//!
//! [`PreimageBuilder`] writes fixed-width integers as little-endian bytes and
//! prefixes every variable-length field with its length. Without the prefix,
//! `("ab", "c")` and `("a", "bc")` would hash identically.

use sha2::{Digest, Sha256};

use crate::config::HASH_OUTPUT_LENGTH;

/// Compute the SHA-256 hash of the input data as a fixed-size array.
///
/// # Example
///
/// ```
/// use linkchain_protocol::crypto::sha256;
///
/// let hash = sha256(b"linkchain");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> [u8; HASH_OUTPUT_LENGTH] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; HASH_OUTPUT_LENGTH];
    output.copy_from_slice(&result);
    output
}

/// Compute the SHA-256 hash and return it as lowercase hex.
///
/// # Example
///
/// ```
/// use linkchain_protocol::crypto::sha256_hex;
///
/// let hex = sha256_hex(b"");
/// assert_eq!(
///     hex,
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// ```
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Incremental builder for unambiguous hash preimages.
#[derive(Debug, Default)]
pub struct PreimageBuilder {
    buf: Vec<u8>,
}

impl PreimageBuilder {
    /// Create a builder with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Append an unsigned integer (8 bytes, little-endian).
    pub fn u64(mut self, value: u64) -> Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// Append a signed integer (8 bytes, little-endian, two's complement).
    pub fn i64(mut self, value: i64) -> Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// Append a length-prefixed string.
    pub fn str(mut self, value: &str) -> Self {
        self.buf
            .extend_from_slice(&(value.len() as u64).to_le_bytes());
        self.buf.extend_from_slice(value.as_bytes());
        self
    }

    /// Hash everything written so far and return the hex digest.
    pub fn finish_hex(self) -> String {
        sha256_hex(&self.buf)
    }
}
