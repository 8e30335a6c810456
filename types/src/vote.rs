//! Election votes.

use serde::{Deserialize, Serialize};

/// One node's vote for its preferred leader candidates.
///
/// `weight` is the voter's own score, `α·efficiency + β·reputation` with
/// α = β = 0.5. Votes are created during an election cycle, consumed by the
/// tally and discarded when the next cycle starts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub voter_id: String,
    /// Candidate peer ids, in the voter's ranking order.
    pub candidates: Vec<String>,
    pub weight: f64,
}

impl Vote {
    pub fn new(voter_id: impl Into<String>, candidates: Vec<String>, weight: f64) -> Self {
        Self {
            voter_id: voter_id.into(),
            candidates,
            weight,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_roundtrip() {
        let vote = Vote::new("alice", vec!["bob".into(), "carol".into()], 0.75);
        let json = serde_json::to_string(&vote).unwrap();
        let back: Vote = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vote);
    }
}
