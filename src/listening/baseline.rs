//! Listener baseline estimation
//!
//! The baseline is the listener's own norm: every per-session metric averaged
//! over all sessions of the supplied history. Signals score sessions by how
//! far they deviate from it.

use crate::listening::session::{circular_mean_hour, ListeningSession};
use crate::listening::types::BehaviorBaseline;

/// Smallest baseline replay rate used as a denominator
pub const MIN_REPLAY_BASE: f64 = 0.05;

/// Average every per-session metric over `sessions`.
///
/// Zero sessions produce an all-zero baseline.
pub fn estimate_baseline(sessions: &[ListeningSession]) -> BehaviorBaseline {
    if sessions.is_empty() {
        return BehaviorBaseline::default();
    }

    let n = sessions.len() as f64;
    let mean = |metric: fn(&ListeningSession) -> f64| sessions.iter().map(metric).sum::<f64>() / n;

    BehaviorBaseline {
        avg_session_length_minutes: mean(|s| s.duration_minutes),
        avg_replay_rate: mean(|s| s.replay_rate),
        avg_listening_hour: circular_mean_hour(sessions.iter().map(|s| s.avg_hour)),
        avg_context_switches: mean(|s| s.context_switches as f64),
        typical_session_tracks: mean(|s| s.track_count as f64),
        sessions_in_baseline: sessions.len() as u32,
    }
}

/// Relative deviation `(value - base) / base`.
///
/// `None` when there is nothing to compare against.
pub fn relative_deviation(value: f64, base: f64) -> Option<f64> {
    if base <= 0.0 {
        None
    } else {
        Some((value - base) / base)
    }
}

impl BehaviorBaseline {
    /// Relative replay-rate deviation, `None` only when the baseline has no sessions.
    ///
    /// A replay-free baseline still has a norm: the rate is measured against
    /// `max(avg_replay_rate, MIN_REPLAY_BASE)`, so any replay above it counts.
    pub fn replay_deviation(&self, replay_rate: f64) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        let base = self.avg_replay_rate;
        Some((replay_rate - base) / base.max(MIN_REPLAY_BASE))
    }

    /// Load a baseline from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Export baseline to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
