//! # Chain Validation
//!
//! Successor checks run in a fixed order and stop at the first failure:
//!
//! ```text
//! 1. CONTINUITY : candidate.index == predecessor.index + 1
//! 2. LINKAGE    : candidate.prev_hash == predecessor.hash
//! 3. INTEGRITY  : compute_hash(candidate) == candidate.hash
//! ```
//!
//! None of these functions mutate their arguments. Genesis is never checked
//! against a predecessor; [`validate_chain`] only checks its shape.

use super::block::{compute_hash, Block};
use crate::error::{ChainError, ChainResult, LinkError};

/// Check that `candidate` directly extends `predecessor`, reporting which
/// check failed.
pub fn check_successor(predecessor: &Block, candidate: &Block) -> Result<(), LinkError> {
    let expected = predecessor.index + 1;
    if candidate.index != expected {
        return Err(LinkError::IndexGap {
            expected,
            got: candidate.index,
        });
    }

    if candidate.prev_hash != predecessor.hash {
        return Err(LinkError::PrevHashMismatch {
            expected: predecessor.hash.clone(),
            got: candidate.prev_hash.clone(),
        });
    }

    let computed = compute_hash(candidate);
    if computed != candidate.hash {
        return Err(LinkError::HashMismatch {
            stored: candidate.hash.clone(),
            computed,
        });
    }

    Ok(())
}

/// `true` only if `candidate` passes all three successor checks.
pub fn is_valid_successor(predecessor: &Block, candidate: &Block) -> bool {
    check_successor(predecessor, candidate).is_ok()
}

/// Validate a whole sequence: genesis shape first, then every adjacent pair.
///
/// Returns `InvalidGenesis` for an empty sequence or a malformed first
/// block, and `InvalidSuccessor` naming the first block that breaks the
/// chain.
pub fn validate_chain(blocks: &[Block]) -> ChainResult<()> {
    let genesis = blocks
        .first()
        .ok_or_else(|| ChainError::InvalidGenesis("chain is empty".to_string()))?;

    if !genesis.is_genesis() {
        return Err(ChainError::InvalidGenesis(format!(
            "first block has index {} and prev_hash {:?}",
            genesis.index, genesis.prev_hash
        )));
    }
    if !genesis.is_self_consistent() {
        return Err(ChainError::InvalidGenesis(
            "genesis hash does not match its fields".to_string(),
        ));
    }

    for pair in blocks.windows(2) {
        check_successor(&pair[0], &pair[1]).map_err(|reason| ChainError::InvalidSuccessor {
            index: pair[1].index,
            reason,
        })?;
    }

    Ok(())
}
