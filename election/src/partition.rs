//! Leader-headed group partitioning.

use peershare_types::PeerInfo;

/// Split the network into one group per leader, each group headed by its
/// leader.
///
/// Non-leaders are dealt out `n / g` per group, with the first `n % g`
/// groups taking one extra, so group sizes differ by at most one. Peers
/// whose id matches a leader are excluded from the member pool.
pub fn partition_groups(leaders: &[PeerInfo], peers: &[PeerInfo]) -> Vec<Vec<PeerInfo>> {
    if leaders.is_empty() {
        return Vec::new();
    }

    let members: Vec<&PeerInfo> = peers
        .iter()
        .filter(|p| !leaders.iter().any(|l| l.id == p.id))
        .collect();

    let num_groups = leaders.len();
    let base = members.len() / num_groups;
    let rem = members.len() % num_groups;

    let mut groups = Vec::with_capacity(num_groups);
    let mut cursor = 0;
    for (i, leader) in leaders.iter().enumerate() {
        let size = base + usize::from(i < rem);
        let mut group = Vec::with_capacity(1 + size);
        group.push(leader.clone());
        group.extend(members[cursor..cursor + size].iter().map(|p| (*p).clone()));
        cursor += size;
        groups.push(group);
    }
    groups
}
