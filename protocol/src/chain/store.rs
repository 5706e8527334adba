//! # Chain Store
//!
//! The single owner of the canonical chain. Everything else reads and
//! extends the chain through this type.
//!
//! ## Locking
//!
//! The block vector sits behind a `parking_lot::RwLock`:
//!
//! - **Mutations** (`append`, `append_payload`, `replace_with`) hold the
//!   write guard across "read tail, validate, mutate". Two writers racing on
//!   the same tail are serialized; the second one re-validates against the
//!   new tail and is rejected.
//! - **Reads** hold the read guard just long enough to clone out what they
//!   need, so a reader sees the chain either before or after a mutation,
//!   never halfway.
//!
//! Every operation takes the lock exactly once, so there is no lock
//! ordering to get wrong.
//!
//! ## Replacement
//!
//! Longest chain wins, but only a chain that validates end to end and
//! starts from this store's genesis.

use parking_lot::RwLock;
use tracing::{debug, warn};

use super::block::Block;
use super::validator::{check_successor, validate_chain};
use crate::error::{ChainError, ChainResult};

/// Length and tail read under a single lock acquisition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainSummary {
    /// Number of blocks, genesis included.
    pub length: usize,
    /// The last block.
    pub tail: Block,
}

/// Thread-safe owner of the canonical chain.
///
/// Always holds at least the genesis block. Share it as `Arc<ChainStore>`.
#[derive(Debug)]
pub struct ChainStore {
    blocks: RwLock<Vec<Block>>,
}

impl Default for ChainStore {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(clippy::len_without_is_empty)]
impl ChainStore {
    /// Create a store holding a freshly minted genesis block.
    pub fn new() -> Self {
        Self::with_genesis(Block::genesis())
    }

    /// Create a store rooted at the given genesis block.
    ///
    /// Genesis is trusted as-is; this is the only place a block enters the
    /// store without validation.
    pub fn with_genesis(genesis: Block) -> Self {
        debug!(hash = %genesis.hash, "chain initialized with genesis block");
        Self {
            blocks: RwLock::new(vec![genesis]),
        }
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// The current last block.
    pub fn tail(&self) -> Block {
        let blocks = self.blocks.read();
        last(&blocks).clone()
    }

    /// The genesis block.
    pub fn genesis(&self) -> Block {
        self.blocks.read()[0].clone()
    }

    /// Number of blocks, genesis included. Never zero.
    pub fn len(&self) -> usize {
        self.blocks.read().len()
    }

    /// Block at `index`, if the chain is that long.
    pub fn get(&self, index: u64) -> Option<Block> {
        let i = usize::try_from(index).ok()?;
        self.blocks.read().get(i).cloned()
    }

    /// Snapshot of the full ordered sequence.
    pub fn blocks(&self) -> Vec<Block> {
        self.blocks.read().clone()
    }

    /// Length and tail from the same instant.
    pub fn summary(&self) -> ChainSummary {
        let blocks = self.blocks.read();
        ChainSummary {
            length: blocks.len(),
            tail: last(&blocks).clone(),
        }
    }

    /// Re-validate the stored chain.
    ///
    /// Only blocks that passed validation are ever stored, so a failure here
    /// means the in-memory state is damaged. Reported as
    /// [`ChainError::CorruptChain`].
    pub fn audit(&self) -> ChainResult<()> {
        let blocks = self.blocks.read();
        validate_chain(&blocks).map_err(corruption)
    }

    /// Snapshot of the full sequence, validated before it is returned.
    ///
    /// Use this when serving the chain so a damaged chain is never sent out
    /// as if it were sound.
    pub fn audited_blocks(&self) -> ChainResult<Vec<Block>> {
        let blocks = self.blocks();
        validate_chain(&blocks).map_err(corruption)?;
        Ok(blocks)
    }

    // -----------------------------------------------------------------------
    // Append
    // -----------------------------------------------------------------------

    /// Append `candidate` if it is a valid successor of the current tail.
    ///
    /// Returns the appended block. On rejection the chain is untouched.
    pub fn append(&self, candidate: Block) -> ChainResult<Block> {
        let mut blocks = self.blocks.write();
        if let Err(reason) = check_successor(last(&blocks), &candidate) {
            warn!(index = candidate.index, %reason, "block rejected");
            return Err(ChainError::InvalidSuccessor {
                index: candidate.index,
                reason,
            });
        }

        debug!(index = candidate.index, hash = %candidate.hash, "block appended");
        blocks.push(candidate.clone());
        Ok(candidate)
    }

    /// Boolean form of [`ChainStore::append`].
    pub fn try_append(&self, candidate: Block) -> bool {
        self.append(candidate).is_ok()
    }

    /// Build the successor of the current tail and append it, all under one
    /// write lock. Cannot lose a race to another writer.
    pub fn append_payload(&self, payload: i64) -> ChainResult<Block> {
        let mut blocks = self.blocks.write();
        let tail = last(&blocks);
        let block = tail.next(payload);
        check_successor(tail, &block).map_err(|reason| ChainError::InvalidSuccessor {
            index: block.index,
            reason,
        })?;

        debug!(index = block.index, hash = %block.hash, payload, "block appended");
        blocks.push(block.clone());
        Ok(block)
    }

    // -----------------------------------------------------------------------
    // Replace
    // -----------------------------------------------------------------------

    /// Swap in `candidate` if it is strictly longer than the current chain,
    /// validates link by link, and shares this store's genesis.
    ///
    /// Returns the new length.
    pub fn replace_with(&self, candidate: Vec<Block>) -> ChainResult<usize> {
        // Validation is pure; do it before taking the write lock.
        if let Err(e) = validate_chain(&candidate) {
            warn!(candidate_len = candidate.len(), reason = %e, "replacement rejected");
            return Err(e);
        }

        let mut blocks = self.blocks.write();
        if candidate.len() <= blocks.len() {
            debug!(
                candidate_len = candidate.len(),
                current_len = blocks.len(),
                "replacement ignored, candidate not longer"
            );
            return Err(ChainError::ShorterOrEqualChain {
                candidate: candidate.len(),
                current: blocks.len(),
            });
        }
        if candidate[0] != blocks[0] {
            warn!(
                candidate_genesis = %candidate[0].hash,
                genesis = %blocks[0].hash,
                "replacement rejected, foreign genesis"
            );
            return Err(ChainError::InvalidGenesis(
                "candidate genesis differs from local genesis".to_string(),
            ));
        }

        let length = candidate.len();
        debug!(old_len = blocks.len(), new_len = length, "chain replaced");
        *blocks = candidate;
        Ok(length)
    }

    /// Boolean form of [`ChainStore::replace_with`].
    pub fn replace(&self, candidate: Vec<Block>) -> bool {
        self.replace_with(candidate).is_ok()
    }
}

fn corruption(e: ChainError) -> ChainError {
    let index = match &e {
        ChainError::InvalidSuccessor { index, .. } => *index,
        _ => 0,
    };
    ChainError::CorruptChain {
        index,
        reason: e.to_string(),
    }
}

fn last(blocks: &[Block]) -> &Block {
    blocks.last().expect("chain always holds the genesis block")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
