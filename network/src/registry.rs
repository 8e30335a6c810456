//! The set of peers discovered in the current cycle.

use peershare_types::PeerInfo;

/// Peers known this cycle, self included.
///
/// The registry is cleared and rebuilt by every discovery round, so its
/// contents are never older than one cycle. Insertion dedupes by id,
/// keeping the most recent sighting.
#[derive(Clone, Debug, Default)]
pub struct PeerRegistry {
    peers: Vec<PeerInfo>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything; the next discovery round starts fresh.
    pub fn reset(&mut self) {
        self.peers.clear();
    }

    /// Insert or refresh a peer by id.
    pub fn insert(&mut self, peer: PeerInfo) {
        match self.peers.iter_mut().find(|p| p.id == peer.id) {
            Some(existing) => *existing = peer,
            None => self.peers.push(peer),
        }
    }

    pub fn get(&self, id: &str) -> Option<&PeerInfo> {
        self.peers.iter().find(|p| p.id == id)
    }

    pub fn peers(&self) -> &[PeerInfo] {
        &self.peers
    }

    /// Every peer except the one with `self_id`.
    pub fn others(&self, self_id: &str) -> Vec<PeerInfo> {
        self.peers
            .iter()
            .filter(|p| p.id != self_id)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
