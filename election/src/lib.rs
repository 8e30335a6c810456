//! Leader election, deterministic rotation and group partitioning.
//!
//! Every cycle the node re-discovers its peers, ranks them by score, votes,
//! and tallies the weighted votes into a leader set. Between elections the
//! leader role rotates deterministically through the set, and the current
//! leader partitions the remaining peers into leader-headed groups.

pub mod election;
pub mod partition;
pub mod rotation;
pub mod scoring;

pub use election::{candidate_count, rank_candidates, tally, VoteBox};
pub use partition::partition_groups;
pub use rotation::{select_current_leader, should_adopt_rotation, sorted_by_id};
pub use scoring::{peer_weight, ScoreWeights};
