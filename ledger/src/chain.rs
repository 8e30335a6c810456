//! Generic hash-linked chain over any [`BlockLink`] block type.

use crate::block::{BlockLink, MembershipBlock, TransactionBlock};
use crate::error::ChainError;

/// An append-only chain of hash-linked blocks, starting from a genesis block.
///
/// Appends are checked: the new block must link to the current head and its
/// stored hash must match a recomputation from its own fields. Consensus
/// decides *when* to append; the chain only enforces *that* the append is
/// well-formed.
#[derive(Clone, Debug)]
pub struct Chain<B: BlockLink> {
    blocks: Vec<B>,
}

impl<B: BlockLink> Chain<B> {
    pub fn with_genesis(genesis: B) -> Self {
        Self {
            blocks: vec![genesis],
        }
    }

    /// Append a block after checking linkage and hash integrity.
    pub fn append(&mut self, block: B) -> Result<(), ChainError> {
        let head = self.last();
        if block.prev_hash() != head.hash() {
            return Err(ChainError::PrevHashMismatch {
                index: block.index(),
            });
        }
        if block.recompute_hash() != block.hash() {
            return Err(ChainError::HashMismatch {
                index: block.index(),
            });
        }
        self.blocks.push(block);
        Ok(())
    }

    /// Walk the whole chain and report the first offending block, if any.
    pub fn validate(&self) -> Result<(), ChainError> {
        for pair in self.blocks.windows(2) {
            let (prev, current) = (&pair[0], &pair[1]);
            if current.prev_hash() != prev.hash() {
                return Err(ChainError::PrevHashMismatch {
                    index: current.index(),
                });
            }
            if current.recompute_hash() != current.hash() {
                return Err(ChainError::HashMismatch {
                    index: current.index(),
                });
            }
        }
        Ok(())
    }

    pub fn last(&self) -> &B {
        // Invariant: the chain always holds at least the genesis block.
        self.blocks.last().unwrap()
    }

    pub fn get(&self, index: u64) -> Option<&B> {
        self.blocks.iter().find(|b| b.index() == index)
    }

    pub fn blocks(&self) -> &[B] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Index the next block should carry.
    pub fn next_index(&self) -> u64 {
        self.last().index() + 1
    }
}

/// Chain of membership blocks, seeded with the shared genesis block.
pub type MembershipChain = Chain<MembershipBlock>;

/// Chain of file transaction blocks, seeded with the shared genesis block.
pub type TransactionChain = Chain<TransactionBlock>;

impl Default for MembershipChain {
    fn default() -> Self {
        Self::with_genesis(MembershipBlock::genesis())
    }
}

impl Default for TransactionChain {
    fn default() -> Self {
        Self::with_genesis(TransactionBlock::genesis())
    }
}
