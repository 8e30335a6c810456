//! Block types for the membership and transaction chains.

use crate::hash::{block_hash, sha256_hex};
use crate::merkle::merkle_root;
use peershare_types::{FileRecord, FileTransaction, ParticipantRecord, PeerInfo, Timestamp, Vote};
use serde::{Deserialize, Serialize};

/// Sentinel previous-hash of every genesis block.
pub const GENESIS_PREV_HASH: &str = "0";

/// Common linkage surface of both block types, letting [`crate::Chain`]
/// validate either chain with the same code.
pub trait BlockLink {
    fn index(&self) -> u64;
    fn hash(&self) -> &str;
    fn prev_hash(&self) -> &str;
    /// Recompute the hash from the block's own fields.
    fn recompute_hash(&self) -> String;
}

fn canonical_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).expect("ledger records are always serializable")
}

/// One election cycle's outcome: the leader-headed groups and the votes that
/// produced them. Immutable once constructed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MembershipBlock {
    pub index: u64,
    pub timestamp: Timestamp,
    /// Each inner list is one group, its leader first.
    pub grouped_peers: Vec<Vec<PeerInfo>>,
    pub votes: Vec<Vote>,
    pub prev_hash: String,
    pub merkle_root: String,
    pub hash: String,
}

impl MembershipBlock {
    /// Build a block, deriving the merkle root and hash from the payload.
    pub fn new(
        index: u64,
        timestamp: Timestamp,
        grouped_peers: Vec<Vec<PeerInfo>>,
        votes: Vec<Vote>,
        prev_hash: impl Into<String>,
    ) -> Self {
        let prev_hash = prev_hash.into();
        let merkle_root = Self::payload_root(&grouped_peers, &votes);
        let hash = block_hash(index, timestamp.as_millis(), &prev_hash, &merkle_root);
        Self {
            index,
            timestamp,
            grouped_peers,
            votes,
            prev_hash,
            merkle_root,
            hash,
        }
    }

    /// Fixed genesis block shared by every node.
    pub fn genesis() -> Self {
        let group = vec![
            PeerInfo::new("genesis-a", "0.0.0.0:0", 1.0, 1.0),
            PeerInfo::new("genesis-b", "0.0.0.0:0", 1.0, 1.0),
        ];
        let votes = vec![Vote::new("genesis-voter", vec!["genesis-a".into()], 0.0)];
        Self::new(0, Timestamp::EPOCH, vec![group], votes, GENESIS_PREV_HASH)
    }

    /// Merkle root over the canonical serialization of every grouped peer
    /// followed by every vote, in order.
    fn payload_root(grouped_peers: &[Vec<PeerInfo>], votes: &[Vote]) -> String {
        let mut records: Vec<String> = grouped_peers
            .iter()
            .flatten()
            .map(canonical_json)
            .collect();
        records.extend(votes.iter().map(canonical_json));
        merkle_root(&records)
    }
}

impl BlockLink for MembershipBlock {
    fn index(&self) -> u64 {
        self.index
    }

    fn hash(&self) -> &str {
        &self.hash
    }

    fn prev_hash(&self) -> &str {
        &self.prev_hash
    }

    fn recompute_hash(&self) -> String {
        let root = Self::payload_root(&self.grouped_peers, &self.votes);
        block_hash(self.index, self.timestamp.as_millis(), &self.prev_hash, &root)
    }
}

/// One file upload or share, with the opaque crypto references it produced.
/// Immutable once constructed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionBlock {
    pub index: u64,
    pub timestamp: Timestamp,
    pub file: FileRecord,
    pub participants: Vec<ParticipantRecord>,
    pub transaction: FileTransaction,
    pub prev_hash: String,
    pub hash: String,
}

impl TransactionBlock {
    pub fn new(
        index: u64,
        timestamp: Timestamp,
        file: FileRecord,
        participants: Vec<ParticipantRecord>,
        transaction: FileTransaction,
        prev_hash: impl Into<String>,
    ) -> Self {
        let prev_hash = prev_hash.into();
        let hash = Self::payload_hash(
            index,
            timestamp,
            &file,
            &participants,
            &transaction,
            &prev_hash,
        );
        Self {
            index,
            timestamp,
            file,
            participants,
            transaction,
            prev_hash,
            hash,
        }
    }

    /// Fixed genesis block shared by every node.
    ///
    /// The timestamp is pinned to the epoch so all nodes agree on the genesis
    /// hash.
    pub fn genesis() -> Self {
        let file = FileRecord {
            name: "genesis".into(),
            content_id: "genesis-cid".into(),
            encrypted_key: "genesis-key".into(),
        };
        let participants = vec![ParticipantRecord {
            public_key: "genesis-pub".into(),
            encrypted_key: "genesis-key".into(),
        }];
        let transaction = FileTransaction::upload(
            PeerInfo::new("genesis", "0.0.0.0:0", 0.0, 0.0),
            "genesis",
            "genesis-cid",
            "genesis-pub",
            "genesis-key",
        );
        Self::new(
            0,
            Timestamp::EPOCH,
            file,
            participants,
            transaction,
            GENESIS_PREV_HASH,
        )
    }

    fn payload_hash(
        index: u64,
        timestamp: Timestamp,
        file: &FileRecord,
        participants: &[ParticipantRecord],
        transaction: &FileTransaction,
        prev_hash: &str,
    ) -> String {
        sha256_hex(&format!(
            "{index}|{}|{}|{}|{}|{prev_hash}",
            timestamp.as_millis(),
            canonical_json(file),
            canonical_json(&participants),
            canonical_json(transaction),
        ))
    }
}

impl BlockLink for TransactionBlock {
    fn index(&self) -> u64 {
        self.index
    }

    fn hash(&self) -> &str {
        &self.hash
    }

    fn prev_hash(&self) -> &str {
        &self.prev_hash
    }

    fn recompute_hash(&self) -> String {
        Self::payload_hash(
            self.index,
            self.timestamp,
            &self.file,
            &self.participants,
            &self.transaction,
            &self.prev_hash,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(id: &str, port: u16) -> PeerInfo {
        PeerInfo::new(id, format!("127.0.0.1:{port}"), 0.9, 0.8)
    }

    #[test]
    fn membership_genesis_is_fixed() {
        let a = MembershipBlock::genesis();
        let b = MembershipBlock::genesis();
        assert_eq!(a.index, 0);
        assert_eq!(a.prev_hash, GENESIS_PREV_HASH);
        assert_eq!(a.hash, b.hash);
        assert_eq!(a.hash, a.recompute_hash());
    }

    #[test]
    fn transaction_genesis_is_fixed() {
        let a = TransactionBlock::genesis();
        let b = TransactionBlock::genesis();
        assert_eq!(a.index, 0);
        assert_eq!(a.prev_hash, GENESIS_PREV_HASH);
        assert_eq!(a.hash, b.hash);
        assert_eq!(a.hash, a.recompute_hash());
    }

    #[test]
    fn membership_hash_covers_payload() {
        let genesis = MembershipBlock::genesis();
        let mut block = MembershipBlock::new(
            1,
            Timestamp::new(1_000),
            vec![vec![peer("l1", 8000), peer("m1", 8001)]],
            vec![Vote::new("m1", vec!["l1".into()], 0.85)],
            genesis.hash.clone(),
        );
        assert_eq!(block.hash, block.recompute_hash());

        // Tampering with the payload breaks recomputation.
        block.votes[0].weight = 0.86;
        assert_ne!(block.hash, block.recompute_hash());
    }

    #[test]
    fn transaction_hash_covers_payload() {
        let genesis = TransactionBlock::genesis();
        let tx = FileTransaction::upload(peer("alice", 8000), "a.txt", "cid", "pk", "sealed");
        let mut block = TransactionBlock::new(
            1,
            Timestamp::new(2_000),
            FileRecord {
                name: "a.txt".into(),
                content_id: "cid".into(),
                encrypted_key: "sealed".into(),
            },
            vec![],
            tx,
            genesis.hash.clone(),
        );
        assert_eq!(block.hash, block.recompute_hash());

        block.file.content_id = "cid2".into();
        assert_ne!(block.hash, block.recompute_hash());
    }

    #[test]
    fn membership_blocks_with_same_payload_hash_equal() {
        let groups = vec![vec![peer("l1", 8000)]];
        let votes = vec![Vote::new("v", vec!["l1".into()], 0.5)];
        let a = MembershipBlock::new(1, Timestamp::new(5), groups.clone(), votes.clone(), "p");
        let b = MembershipBlock::new(1, Timestamp::new(5), groups, votes, "p");
        assert_eq!(a.hash, b.hash);
    }
}
