//! Candidate ranking, vote collection and the weighted tally.

use peershare_types::{PeerInfo, Vote};
use std::collections::HashMap;
use tracing::debug;

/// How many leaders a network of `peer_count` nodes elects.
pub fn candidate_count(peer_count: usize) -> usize {
    (peer_count / 5).max(1)
}

/// Rank peers for candidacy: efficiency first, reputation breaks ties.
/// Returns the top `candidate_count(peers.len())` peers.
pub fn rank_candidates(peers: &[PeerInfo]) -> Vec<PeerInfo> {
    let mut ranked = peers.to_vec();
    ranked.sort_by(|a, b| {
        b.efficiency_score
            .total_cmp(&a.efficiency_score)
            .then_with(|| b.reputation_score.total_cmp(&a.reputation_score))
    });
    ranked.truncate(candidate_count(peers.len()));
    ranked
}

/// Collected votes for the current election cycle.
///
/// A vote whose `(voter_id, weight)` pair was already recorded is a
/// duplicate and is dropped. The box is emptied when a new cycle starts.
#[derive(Debug, Default)]
pub struct VoteBox {
    votes: Vec<Vote>,
}

impl VoteBox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a vote. Returns false if it was a duplicate.
    pub fn insert(&mut self, vote: Vote) -> bool {
        let duplicate = self
            .votes
            .iter()
            .any(|v| v.voter_id == vote.voter_id && v.weight == vote.weight);
        if duplicate {
            debug!(voter = %vote.voter_id, weight = vote.weight, "dropping duplicate vote");
            return false;
        }
        self.votes.push(vote);
        true
    }

    pub fn votes(&self) -> &[Vote] {
        &self.votes
    }

    pub fn len(&self) -> usize {
        self.votes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }

    pub fn clear(&mut self) {
        self.votes.clear();
    }

    /// Drain the box, yielding the votes for inclusion in a block.
    pub fn take(&mut self) -> Vec<Vote> {
        std::mem::take(&mut self.votes)
    }
}

/// Tally votes into a leader set of at most `count` peers.
///
/// Each vote contributes its full weight to every candidate it lists.
/// Candidates are ordered by descending summed weight, ascending id on equal
/// weight, then resolved back to `PeerInfo` through the registry. Ids absent
/// from the registry are skipped.
pub fn tally(votes: &[Vote], registry: &[PeerInfo], count: usize) -> Vec<PeerInfo> {
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for vote in votes {
        for candidate in &vote.candidates {
            *totals.entry(candidate.as_str()).or_insert(0.0) += vote.weight;
        }
    }

    let mut ranked: Vec<(&str, f64)> = totals.into_iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    ranked
        .into_iter()
        .filter_map(|(id, _)| registry.iter().find(|p| p.id == id).cloned())
        .take(count)
        .collect()
}
