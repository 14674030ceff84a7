//! Context switching signal

use super::BehaviorSignal;
use crate::listening::session::{ListeningSession, PlayHistory};
use crate::listening::types::{BehaviorBaseline, BehaviorLabel, LabelScore};

const SEARCHING_FLOOR: f64 = 0.6;
const SEARCHING_MULTIPLIER: f64 = 0.3;

/// Flags sessions that hop between playlists and albums far more than usual.
///
/// threshold = max(baseline_switches * multiplier, floor)
/// searching = 0.6 + 0.3 * min((switches - threshold) / threshold, 1)
pub struct ContextSwitchSignal {
    multiplier: f64,
    floor: f64,
}

impl ContextSwitchSignal {
    pub fn new(multiplier: f64, floor: f64) -> Self {
        Self { multiplier, floor }
    }

    fn threshold(&self, baseline: &BehaviorBaseline) -> f64 {
        (baseline.avg_context_switches * self.multiplier).max(self.floor)
    }
}

impl BehaviorSignal for ContextSwitchSignal {
    fn name(&self) -> &'static str {
        "context_switch"
    }

    fn evaluate(
        &self,
        session: &ListeningSession,
        baseline: &BehaviorBaseline,
        _history: &PlayHistory,
    ) -> Vec<LabelScore> {
        if baseline.is_empty() {
            return Vec::new();
        }

        let threshold = self.threshold(baseline);
        let switches = session.context_switches as f64;
        if switches <= threshold {
            return Vec::new();
        }

        let deviation = ((switches - threshold) / threshold).min(1.0);
        vec![LabelScore::new(
            BehaviorLabel::Searching,
            SEARCHING_FLOOR + deviation * SEARCHING_MULTIPLIER,
            vec![format!(
                "{} context switches vs baseline {:.1} (threshold {:.1})",
                session.context_switches, baseline.avg_context_switches, threshold
            )],
        )]
    }
}
