//! Round state held by the proposing leader.

use crate::ConsensusError;
use peershare_ledger::BlockLink;
use std::collections::BTreeSet;
use tracing::debug;

/// Lifecycle of a proposal, in order. A round never moves backwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Block built, nothing sent yet.
    Proposed,
    /// PrePrepare broadcast to the scope.
    PrePrepared,
    /// At least one commit received.
    Prepared,
    /// Quorum reached and block appended.
    Committed,
}

/// Commits required for a scope of `scope_size` participants: `ceil(2S/3)`.
pub fn quorum(scope_size: usize) -> usize {
    (2 * scope_size + 2) / 3
}

/// One in-flight proposal, held by the leader that made it.
///
/// The scope is fixed at creation: the full leader set for membership
/// blocks, one leader-headed group for transaction blocks. The round is
/// destroyed on finalization or when the next election resets state; a
/// round that never reaches quorum simply dies with the cycle.
#[derive(Clone, Debug)]
pub struct ConsensusRound<B: BlockLink + Clone> {
    phase: Phase,
    block: B,
    proposer_id: String,
    scope: BTreeSet<String>,
    commit_count: usize,
}

impl<B: BlockLink + Clone> ConsensusRound<B> {
    pub fn new(block: B, proposer_id: impl Into<String>, scope: BTreeSet<String>) -> Self {
        Self {
            phase: Phase::Proposed,
            block,
            proposer_id: proposer_id.into(),
            scope,
            commit_count: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn block(&self) -> &B {
        &self.block
    }

    pub fn proposer_id(&self) -> &str {
        &self.proposer_id
    }

    pub fn scope_size(&self) -> usize {
        self.scope.len()
    }

    pub fn commit_count(&self) -> usize {
        self.commit_count
    }

    /// Whether a peer participates in this round.
    pub fn contains(&self, peer_id: &str) -> bool {
        self.scope.contains(peer_id)
    }

    /// Mark the PrePrepare as broadcast.
    pub fn mark_pre_prepared(&mut self) {
        if self.phase == Phase::Proposed {
            self.phase = Phase::PrePrepared;
        }
    }

    /// Record one commit for the proposed block. Returns true once the
    /// round has reached quorum.
    pub fn record_commit(&mut self, block_hash: &str) -> Result<bool, ConsensusError> {
        if block_hash != self.block.hash() {
            return Err(ConsensusError::BlockMismatch {
                expected: self.block.hash().to_string(),
                got: block_hash.to_string(),
            });
        }
        self.commit_count += 1;
        if self.phase == Phase::PrePrepared || self.phase == Phase::Proposed {
            self.phase = Phase::Prepared;
        }
        debug!(
            commits = self.commit_count,
            required = quorum(self.scope.len()),
            "commit recorded"
        );
        Ok(self.has_quorum())
    }

    /// Quorum rule: a single-participant scope finalizes unconditionally,
    /// otherwise `commit_count >= ceil(2S/3)`.
    pub fn has_quorum(&self) -> bool {
        self.scope.len() <= 1 || self.commit_count >= quorum(self.scope.len())
    }

    /// Consume the round, yielding the block for appending.
    pub fn finalize(mut self) -> Result<B, ConsensusError> {
        if !self.has_quorum() {
            return Err(ConsensusError::QuorumNotReached {
                commits: self.commit_count,
                required: quorum(self.scope.len()),
            });
        }
        self.phase = Phase::Committed;
        Ok(self.block)
    }
}
