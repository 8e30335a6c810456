//! Peer identity and scores as exchanged during discovery.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A peer as seen by the discovery round.
///
/// Instances are ephemeral: the registry is cleared and rebuilt at the start
/// of every election cycle, so nothing here is authoritative beyond the
/// current cycle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeerInfo {
    /// Unique identifier (e.g. a username). Also the key for vote tallies.
    pub id: String,
    /// Reachable network address, `"host:port"`.
    pub addr: String,
    /// Primary ranking key for leader candidacy.
    pub efficiency_score: f64,
    /// Secondary ranking key, breaks efficiency ties.
    pub reputation_score: f64,
}

impl PeerInfo {
    pub fn new(
        id: impl Into<String>,
        addr: impl Into<String>,
        efficiency_score: f64,
        reputation_score: f64,
    ) -> Self {
        Self {
            id: id.into(),
            addr: addr.into(),
            efficiency_score,
            reputation_score,
        }
    }
}

impl fmt::Display for PeerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.addr)
    }
}
