//! Error types for the chain-integrity core.
//!
//! Rejections (`InvalidSuccessor`, `ShorterOrEqualChain`, `InvalidGenesis`,
//! `InvalidPayload`) are expected outcomes and are reported to the caller.
//! `CorruptChain` is different: it means a chain the store already accepted
//! no longer validates, and the node treats it as fatal.

use thiserror::Error;

/// Which successor check a candidate block failed.
///
/// The variants are listed in the order the checks run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    /// `candidate.index != predecessor.index + 1`.
    #[error("index gap: expected {expected}, got {got}")]
    IndexGap { expected: u64, got: u64 },

    /// `candidate.prev_hash != predecessor.hash`.
    #[error("prev_hash mismatch: expected {expected}, got {got}")]
    PrevHashMismatch { expected: String, got: String },

    /// The stored hash does not match the hash recomputed from the fields.
    #[error("hash mismatch: stored {stored}, computed {computed}")]
    HashMismatch { stored: String, computed: String },
}

/// Errors produced by chain operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// The candidate does not extend the block it was checked against.
    #[error("block {index} is not a valid successor: {reason}")]
    InvalidSuccessor { index: u64, reason: LinkError },

    /// A replacement candidate is not strictly longer than the current chain.
    #[error("candidate chain has {candidate} blocks, current chain has {current}")]
    ShorterOrEqualChain { candidate: usize, current: usize },

    /// A replacement candidate is empty or starts from a different genesis.
    #[error("invalid genesis: {0}")]
    InvalidGenesis(String),

    /// The request payload could not be decoded into an integer.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// The stored chain has a broken link.
    #[error("stored chain is corrupt at block {index}: {reason}")]
    CorruptChain { index: u64, reason: String },
}

impl ChainError {
    /// `true` for errors that indicate broken in-memory state rather than a
    /// rejected input.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::CorruptChain { .. })
    }
}

pub type ChainResult<T> = Result<T, ChainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_corruption_is_fatal() {
        let rejected = ChainError::InvalidSuccessor {
            index: 3,
            reason: LinkError::IndexGap {
                expected: 3,
                got: 5,
            },
        };
        assert!(!rejected.is_fatal());
        assert!(!ChainError::InvalidPayload("x".into()).is_fatal());
        assert!(ChainError::CorruptChain {
            index: 1,
            reason: "x".into()
        }
        .is_fatal());
    }

    #[test]
    fn display_includes_nested_reason() {
        let err = ChainError::InvalidSuccessor {
            index: 2,
            reason: LinkError::IndexGap {
                expected: 2,
                got: 9,
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("block 2"));
        assert!(msg.contains("expected 2, got 9"));
    }
}
