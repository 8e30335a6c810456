//! Deterministic leader rotation.
//!
//! Every node derives the same current leader from the same leader set and
//! rotation count, so the role moves through the set without any extra
//! coordination beyond the broadcast counter.

use peershare_types::PeerInfo;

/// The leader set in rotation order: ascending by id.
pub fn sorted_by_id(leaders: &[PeerInfo]) -> Vec<PeerInfo> {
    let mut sorted = leaders.to_vec();
    sorted.sort_by(|a, b| a.id.cmp(&b.id));
    sorted
}

/// The leader the rotation count points at, over the id-sorted set.
pub fn select_current_leader(leaders: &[PeerInfo], rotation_count: u64) -> Option<PeerInfo> {
    if leaders.is_empty() {
        return None;
    }
    let sorted = sorted_by_id(leaders);
    let idx = (rotation_count % sorted.len() as u64) as usize;
    Some(sorted[idx].clone())
}

/// Whether a received rotation count supersedes the local one.
///
/// The current leader itself never adopts: it owns the counter for this
/// cycle. Nodes with no leader state yet also ignore the broadcast.
pub fn should_adopt_rotation(
    received: u64,
    local: u64,
    current_leader: Option<&PeerInfo>,
    self_id: &str,
) -> bool {
    let Some(leader) = current_leader else {
        return false;
    };
    received > local && leader.id != self_id
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(id: &str) -> PeerInfo {
        PeerInfo::new(id, "127.0.0.1:8000", 0.5, 0.5)
    }

    #[test]
    fn rotation_walks_leaders_in_id_order() {
        let leaders = vec![peer("c"), peer("a"), peer("b")];
        let order: Vec<String> = (0..3)
            .map(|n| select_current_leader(&leaders, n).unwrap().id)
            .collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn rotation_wraps_around() {
        let leaders = vec![peer("a"), peer("b")];
        assert_eq!(select_current_leader(&leaders, 2).unwrap().id, "a");
        assert_eq!(select_current_leader(&leaders, 5).unwrap().id, "b");
    }

    #[test]
    fn empty_leader_set_selects_nobody() {
        assert!(select_current_leader(&[], 0).is_none());
    }

    #[test]
    fn full_cycle_selects_each_leader_exactly_once() {
        let leaders = vec![peer("b"), peer("d"), peer("a"), peer("c")];
        let mut seen: Vec<String> = (0..leaders.len() as u64)
            .map(|n| select_current_leader(&leaders, n).unwrap().id)
            .collect();
        assert_eq!(seen, vec!["a", "b", "c", "d"]);
        seen.dedup();
        assert_eq!(seen.len(), leaders.len());
    }

    #[test]
    fn adopt_only_greater_counts() {
        let leader = peer("other");
        assert!(should_adopt_rotation(3, 2, Some(&leader), "me"));
        assert!(!should_adopt_rotation(2, 2, Some(&leader), "me"));
        assert!(!should_adopt_rotation(1, 2, Some(&leader), "me"));
    }

    #[test]
    fn current_leader_never_adopts() {
        let leader = peer("me");
        assert!(!should_adopt_rotation(5, 0, Some(&leader), "me"));
    }

    #[test]
    fn no_leader_state_ignores_broadcast() {
        assert!(!should_adopt_rotation(5, 0, None, "me"));
    }
}
