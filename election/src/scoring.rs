//! Vote weight from peer scores.

use peershare_types::PeerInfo;

/// Coefficients of the weight formula `α·efficiency + β·reputation`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoreWeights {
    pub alpha: f64,
    pub beta: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            beta: 0.5,
        }
    }
}

/// A peer's vote weight under the given coefficients.
pub fn peer_weight(peer: &PeerInfo, weights: ScoreWeights) -> f64 {
    weights.alpha * peer.efficiency_score + weights.beta * peer.reputation_score
}
