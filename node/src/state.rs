//! All mutable node state, behind one lock.

use peershare_consensus::ConsensusRound;
use peershare_election::VoteBox;
use peershare_ledger::{MembershipBlock, MembershipChain, TransactionBlock, TransactionChain};
use peershare_network::PeerRegistry;
use peershare_types::PeerInfo;

/// Everything a node mutates while running.
///
/// The whole struct lives behind a single `tokio::sync::Mutex`; that mutex
/// is the only serialization point in the node. Handlers take the lock,
/// update state, collect the peers they need to contact, and release the
/// lock before touching the network.
#[derive(Default)]
pub struct NodeState {
    /// Peers discovered this cycle, self included.
    pub registry: PeerRegistry,
    /// Votes collected for the current election.
    pub vote_box: VoteBox,
    /// Elected leader set.
    pub leaders: Vec<PeerInfo>,
    /// The leader the rotation currently points at.
    pub current_leader: Option<PeerInfo>,
    /// Completed rotations since the last election.
    pub rotation_count: u64,
    /// Leader-headed groups from the latest partition, leader first.
    pub groups: Vec<Vec<PeerInfo>>,
    /// Membership chain (elections, groupings, votes).
    pub membership_chain: MembershipChain,
    /// Transaction chain (file uploads and shares).
    pub transaction_chain: TransactionChain,
    /// In-flight membership round, held only while we are the proposer.
    pub membership_round: Option<ConsensusRound<MembershipBlock>>,
    /// In-flight transaction round, held only while we are the group leader.
    pub transaction_round: Option<ConsensusRound<TransactionBlock>>,
    /// Hash of the last membership block we sent a commit for, so flooded
    /// Prepare messages produce at most one commit.
    pub last_membership_commit: Option<String>,
    /// Same guard for the transaction scope.
    pub last_transaction_commit: Option<String>,
}

impl NodeState {
    pub fn new() -> Self {
        Self {
            membership_chain: MembershipChain::default(),
            transaction_chain: TransactionChain::default(),
            ..Default::default()
        }
    }

    /// Whether this node currently holds the leader role.
    pub fn is_current_leader(&self, self_id: &str) -> bool {
        self.current_leader
            .as_ref()
            .is_some_and(|l| l.id == self_id)
    }

    /// Whether this node is in the elected leader set.
    pub fn is_leader(&self, self_id: &str) -> bool {
        self.leaders.iter().any(|l| l.id == self_id)
    }

    /// The group headed by `leader_id`, if any.
    pub fn group_of_leader(&self, leader_id: &str) -> Option<&Vec<PeerInfo>> {
        self.groups
            .iter()
            .find(|g| g.first().is_some_and(|head| head.id == leader_id))
    }

    /// Clear every piece of leadership state ahead of a fresh election.
    /// Stale consensus rounds die here; the chains are untouched.
    pub fn reset_leadership(&mut self) {
        self.leaders.clear();
        self.current_leader = None;
        self.rotation_count = 0;
        self.groups.clear();
        self.vote_box.clear();
        self.membership_round = None;
        self.transaction_round = None;
        self.last_membership_commit = None;
        self.last_transaction_commit = None;
    }

    /// Adopt the leader set and groups carried by a finalized membership
    /// block. Non-leaders learn their group leader this way.
    pub fn adopt_groups(&mut self, block: &MembershipBlock) {
        self.groups = block.grouped_peers.clone();
        self.leaders = block
            .grouped_peers
            .iter()
            .filter_map(|g| g.first().cloned())
            .collect();
    }

    /// Append a finalized transaction block, ignoring one we already hold.
    pub fn append_transaction_block(
        &mut self,
        block: TransactionBlock,
    ) -> Result<bool, peershare_ledger::ChainError> {
        if self.transaction_chain.get(block.index).is_some() {
            return Ok(false);
        }
        self.transaction_chain.append(block)?;
        Ok(true)
    }
}
