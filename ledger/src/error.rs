use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    /// The candidate block does not link to the current chain head.
    #[error("previous hash mismatch at block {index}")]
    PrevHashMismatch { index: u64 },

    /// Recomputing the block's hash from its own fields gave a different
    /// digest. The block was tampered with or built incorrectly.
    #[error("hash mismatch at block {index}")]
    HashMismatch { index: u64 },
}

impl ChainError {
    /// The index of the offending block.
    pub fn index(&self) -> u64 {
        match self {
            Self::PrevHashMismatch { index } | Self::HashMismatch { index } => *index,
        }
    }
}
