//! Late-night listening signal

use super::{clock, percent, BehaviorSignal};
use crate::config::NightWindow;
use crate::listening::session::{ListeningSession, PlayHistory};
use crate::listening::types::{BehaviorBaseline, BehaviorLabel, LabelScore};

/// Ruminating score when replay sits at or below the baseline
const RUMINATING_BASE: f64 = 0.9;

/// Flags sessions centred inside the night window as `ruminating`.
///
/// score = 0.9 * (0.5 + 0.5 * clamp((r - b) / max(b, 0.05), 0, 1))
///
/// so a late session with no replay excess still scores 0.45 and one replaying
/// at twice the baseline rate scores 0.9.
pub struct LateNightSignal {
    window: NightWindow,
}

impl LateNightSignal {
    pub fn new(window: NightWindow) -> Self {
        Self { window }
    }
}

impl BehaviorSignal for LateNightSignal {
    fn name(&self) -> &'static str {
        "late_night"
    }

    fn evaluate(
        &self,
        session: &ListeningSession,
        baseline: &BehaviorBaseline,
        _history: &PlayHistory,
    ) -> Vec<LabelScore> {
        if !self.window.contains(session.avg_hour) {
            return Vec::new();
        }

        let excess = baseline
            .replay_deviation(session.replay_rate)
            .map_or(0.0, |d| d.clamp(0.0, 1.0));
        let score = RUMINATING_BASE * (0.5 + 0.5 * excess);

        vec![LabelScore::new(
            BehaviorLabel::Ruminating,
            score,
            vec![
                format!(
                    "late-night session centred on {} local time",
                    clock(session.avg_hour)
                ),
                format!(
                    "replay rate {} vs baseline {}",
                    percent(session.replay_rate),
                    percent(baseline.avg_replay_rate)
                ),
            ],
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listening::signals::fixtures;

    fn signal() -> LateNightSignal {
        LateNightSignal::new(NightWindow::default())
    }

    #[test]
    fn test_daytime_session_is_ignored() {
        let session = fixtures::session(45.0, 0.8, 0, 14.0);
        let baseline = fixtures::baseline(40.0, 0.2, 1.0);
        assert!(signal()
            .evaluate(&session, &baseline, &PlayHistory::default())
            .is_empty());
    }

    #[test]
    fn test_double_replay_rate_scores_full() {
        let session = fixtures::session(150.0, 0.4, 0, 23.75);
        let baseline = fixtures::baseline(40.0, 0.2, 1.0);

        let scores = signal().evaluate(&session, &baseline, &PlayHistory::default());
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].label, BehaviorLabel::Ruminating);
        assert!((scores[0].score - 0.9).abs() < 0.001);
        assert_eq!(scores[0].evidence[1], "replay rate 40% vs baseline 20%");
        assert!(scores[0].evidence[0].contains("23:45"));
    }

    #[test]
    fn test_no_excess_scores_half() {
        let session = fixtures::session(30.0, 0.1, 0, 1.5);
        let baseline = fixtures::baseline(40.0, 0.2, 1.0);

        let scores = signal().evaluate(&session, &baseline, &PlayHistory::default());
        assert!((scores[0].score - 0.45).abs() < 0.001);
    }

    #[test]
    fn test_replay_free_baseline_counts_excess() {
        let session = fixtures::session(30.0, 0.5, 0, 23.0);
        let baseline = fixtures::baseline(40.0, 0.0, 1.0);

        let scores = signal().evaluate(&session, &baseline, &PlayHistory::default());
        assert!((scores[0].score - 0.9).abs() < 0.001);
    }

    #[test]
    fn test_empty_baseline_has_no_excess() {
        let session = fixtures::session(30.0, 1.0, 0, 22.5);
        let scores = signal().evaluate(&session, &BehaviorBaseline::default(), &PlayHistory::default());
        assert!((scores[0].score - 0.45).abs() < 0.001);
    }
}
