//! Network message types for node-to-node communication.
//!
//! Every message sent between nodes is one variant of [`Message`]. The
//! server read loop deserializes incoming frames as `Message` and hands
//! them to the dispatcher; unknown or malformed frames are dropped at the
//! codec layer.

pub mod codec;

pub use codec::{read_message, write_message, WireError, MAX_FRAME_LEN};

use peershare_ledger::{MembershipBlock, TransactionBlock};
use peershare_types::{FileTransaction, PeerInfo, Vote};
use serde::{Deserialize, Serialize};

/// Top-level wire message.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Message {
    // Discovery
    /// Ask a peer for its identity and scores; answered on the same
    /// connection with `NodeInfo`.
    GetNodeInfo,
    /// Reply to `GetNodeInfo`.
    NodeInfo(PeerInfo),

    // Election and rotation
    /// A node's weighted ballot for the current election.
    VotingResult(Vote),
    /// The elected (or rotated-to) leader for this cycle.
    CurrentLeader(PeerInfo),
    /// Rotation counter broadcast after a completed leader cycle.
    RotationCount(u64),
    /// Clear all leadership state before a fresh election.
    Reset,

    // Membership consensus
    /// Leader proposes a membership block to its co-leaders.
    PrePrepare(MembershipBlock),
    /// Co-leader echoes a proposal it accepted.
    Prepare(MembershipBlock),
    /// Co-leader commits to a proposal.
    Commit(MembershipBlock),
    /// Finalized membership block, flooded to everyone.
    NewBlock(MembershipBlock),

    // Transaction consensus
    /// Group leader proposes a transaction block to its group.
    UploadPrePrepare(TransactionBlock),
    /// Group member echoes a transaction proposal.
    UploadPrepare(TransactionBlock),
    /// Group member commits to a transaction proposal.
    UploadCommit(TransactionBlock),
    /// Finalized transaction block, flooded to everyone.
    UploadNewBlock(TransactionBlock),

    // File sharing
    /// Grant another peer access to an already-uploaded file.
    Share(FileTransaction),
}

impl Message {
    /// Short label for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::GetNodeInfo => "get_node_info",
            Message::NodeInfo(_) => "node_info",
            Message::VotingResult(_) => "voting_result",
            Message::CurrentLeader(_) => "current_leader",
            Message::RotationCount(_) => "rotation_count",
            Message::Reset => "reset",
            Message::PrePrepare(_) => "pre_prepare",
            Message::Prepare(_) => "prepare",
            Message::Commit(_) => "commit",
            Message::NewBlock(_) => "new_block",
            Message::UploadPrePrepare(_) => "upload_pre_prepare",
            Message::UploadPrepare(_) => "upload_prepare",
            Message::UploadCommit(_) => "upload_commit",
            Message::UploadNewBlock(_) => "upload_new_block",
            Message::Share(_) => "share",
        }
    }
}
