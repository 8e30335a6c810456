//! File transfer records embedded in transaction blocks.
//!
//! The core never performs cryptography or blob I/O itself: content ids,
//! sealed file keys and signatures are opaque strings produced by the
//! Signer / Encryptor / BlobStore collaborators.

use crate::peer::PeerInfo;
use serde::{Deserialize, Serialize};

/// What a file transaction does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Upload,
    Share,
}

/// The file a transaction block is about.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub name: String,
    /// Content id in the blob store (the ciphertext's address).
    pub content_id: String,
    /// File key sealed to the owning peer's public key.
    pub encrypted_key: String,
}

/// A participant's handle on the file: their public key plus the file key
/// sealed to it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParticipantRecord {
    pub public_key: String,
    pub encrypted_key: String,
}

/// A signed upload or share action, as recorded on the transaction chain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FileTransaction {
    pub sender: PeerInfo,
    /// Set for shares; uploads have no receiver.
    pub receiver: Option<PeerInfo>,
    pub file_name: String,
    pub content_id: String,
    pub sender_public_key: String,
    pub receiver_public_key: Option<String>,
    pub encrypted_file_key: String,
    pub kind: TransactionKind,
    pub creator_signature: Option<String>,
    pub validator_signature: Option<String>,
}

impl FileTransaction {
    /// Build an unsigned upload transaction.
    pub fn upload(
        sender: PeerInfo,
        file_name: impl Into<String>,
        content_id: impl Into<String>,
        sender_public_key: impl Into<String>,
        encrypted_file_key: impl Into<String>,
    ) -> Self {
        Self {
            sender,
            receiver: None,
            file_name: file_name.into(),
            content_id: content_id.into(),
            sender_public_key: sender_public_key.into(),
            receiver_public_key: None,
            encrypted_file_key: encrypted_file_key.into(),
            kind: TransactionKind::Upload,
            creator_signature: None,
            validator_signature: None,
        }
    }

    /// Build an unsigned share transaction addressed to `receiver`.
    #[allow(clippy::too_many_arguments)]
    pub fn share(
        sender: PeerInfo,
        receiver: PeerInfo,
        file_name: impl Into<String>,
        content_id: impl Into<String>,
        sender_public_key: impl Into<String>,
        receiver_public_key: impl Into<String>,
        encrypted_file_key: impl Into<String>,
    ) -> Self {
        Self {
            sender,
            receiver: Some(receiver),
            file_name: file_name.into(),
            content_id: content_id.into(),
            sender_public_key: sender_public_key.into(),
            receiver_public_key: Some(receiver_public_key.into()),
            encrypted_file_key: encrypted_file_key.into(),
            kind: TransactionKind::Share,
            creator_signature: None,
            validator_signature: None,
        }
    }

    /// The canonical byte representation signed by the creator.
    ///
    /// Signatures are computed over the transaction with both signature
    /// fields unset, so signing never invalidates itself.
    pub fn signing_bytes(&self) -> Vec<u8> {
        let mut unsigned = self.clone();
        unsigned.creator_signature = None;
        unsigned.validator_signature = None;
        serde_json::to_string(&unsigned)
            .expect("FileTransaction is always serializable")
            .into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(id: &str) -> PeerInfo {
        PeerInfo::new(id, format!("127.0.0.1:{}", 8000), 0.5, 0.5)
    }

    #[test]
    fn upload_has_no_receiver() {
        let tx = FileTransaction::upload(peer("alice"), "a.txt", "cid-1", "pk-alice", "sealed");
        assert_eq!(tx.kind, TransactionKind::Upload);
        assert!(tx.receiver.is_none());
        assert!(tx.receiver_public_key.is_none());
    }

    #[test]
    fn share_carries_receiver_key() {
        let tx = FileTransaction::share(
            peer("alice"),
            peer("bob"),
            "a.txt",
            "cid-1",
            "pk-alice",
            "pk-bob",
            "sealed-for-bob",
        );
        assert_eq!(tx.kind, TransactionKind::Share);
        assert_eq!(tx.receiver.as_ref().unwrap().id, "bob");
    }

    #[test]
    fn signing_bytes_ignore_existing_signatures() {
        let mut tx = FileTransaction::upload(peer("alice"), "a.txt", "cid-1", "pk", "sealed");
        let unsigned = tx.signing_bytes();
        tx.creator_signature = Some("sig".into());
        assert_eq!(tx.signing_bytes(), unsigned);
    }

    #[test]
    fn kind_serializes_lowercase() {
        let json = serde_json::to_string(&TransactionKind::Upload).unwrap();
        assert_eq!(json, "\"upload\"");
    }
}
