//! Replay-rate signal

use super::{percent, BehaviorSignal};
use crate::listening::session::{ListeningSession, PlayHistory};
use crate::listening::types::{BehaviorBaseline, BehaviorLabel, LabelScore};

const COMFORT_FLOOR: f64 = 0.45;
const COMFORT_MULTIPLIER: f64 = 0.35;
const ROUTINE_FLOOR: f64 = 0.35;
const ROUTINE_MULTIPLIER: f64 = 0.2;
/// Below this normalized deviation, replay may just be habit
const MODEST_DEVIATION: f64 = 0.5;

/// Scores sessions replaying more than the listener usually does.
///
/// The deviation is normalized by the baseline rate (floored at 0.05) and
/// capped at 1:
///
/// n = min((r - b) / max(b, 0.05), 1)
/// comfort_seeking = 0.45 + 0.35 * n
/// routine_driven  = 0.35 + 0.2 * n   (only while n < 0.5)
pub struct ReplaySignal;

impl BehaviorSignal for ReplaySignal {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn evaluate(
        &self,
        session: &ListeningSession,
        baseline: &BehaviorBaseline,
        _history: &PlayHistory,
    ) -> Vec<LabelScore> {
        let Some(deviation) = baseline.replay_deviation(session.replay_rate) else {
            return Vec::new();
        };
        if deviation <= 0.0 {
            return Vec::new();
        }

        let normalized = deviation.min(1.0);
        let rates = format!(
            "replay rate {} vs baseline {}",
            percent(session.replay_rate),
            percent(baseline.avg_replay_rate)
        );

        let mut scores = vec![LabelScore::new(
            BehaviorLabel::ComfortSeeking,
            COMFORT_FLOOR + normalized * COMFORT_MULTIPLIER,
            vec![
                rates.clone(),
                format!("{} of {} plays were repeats", session.replay_count, session.track_count),
            ],
        )];

        if normalized < MODEST_DEVIATION {
            scores.push(LabelScore::new(
                BehaviorLabel::RoutineDriven,
                ROUTINE_FLOOR + normalized * ROUTINE_MULTIPLIER,
                vec![format!("{rates}, only modestly above the usual")],
            ));
        }

        scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listening::signals::fixtures;

    fn comfort_score(replay_rate: f64, baseline_rate: f64) -> Option<f64> {
        let session = fixtures::session(30.0, replay_rate, 0, 14.0);
        let baseline = fixtures::baseline(30.0, baseline_rate, 1.0);
        ReplaySignal
            .evaluate(&session, &baseline, &PlayHistory::default())
            .into_iter()
            .find(|s| s.label == BehaviorLabel::ComfortSeeking)
            .map(|s| s.score)
    }

    #[test]
    fn test_doubled_replay_rate() {
        let session = fixtures::session(30.0, 0.4, 0, 14.0);
        let baseline = fixtures::baseline(30.0, 0.2, 1.0);
        let scores = ReplaySignal.evaluate(&session, &baseline, &PlayHistory::default());

        assert_eq!(scores.len(), 1);
        assert!((scores[0].score - 0.8).abs() < 0.001);
        assert_eq!(scores[0].evidence[0], "replay rate 40% vs baseline 20%");
    }

    #[test]
    fn test_modest_excess_also_scores_routine() {
        let session = fixtures::session(30.0, 0.25, 0, 14.0);
        let baseline = fixtures::baseline(30.0, 0.2, 1.0);
        let scores = ReplaySignal.evaluate(&session, &baseline, &PlayHistory::default());

        assert_eq!(scores.len(), 2);
        assert!((scores[0].score - 0.5375).abs() < 0.001);
        assert_eq!(scores[1].label, BehaviorLabel::RoutineDriven);
        assert!((scores[1].score - 0.4).abs() < 0.001);
        assert!(scores[1].score < scores[0].score);
    }

    #[test]
    fn test_no_opinion_at_or_below_baseline() {
        assert_eq!(comfort_score(0.2, 0.2), None);
        assert_eq!(comfort_score(0.1, 0.2), None);
        assert_eq!(comfort_score(0.0, 0.0), None);
    }

    #[test]
    fn test_replay_free_baseline_still_triggers() {
        // Baseline of sessions that never repeated a track
        let session = fixtures::session(30.0, 1.0, 0, 14.0);
        let baseline = fixtures::baseline(30.0, 0.0, 1.0);
        let scores = ReplaySignal.evaluate(&session, &baseline, &PlayHistory::default());

        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].label, BehaviorLabel::ComfortSeeking);
        assert!((scores[0].score - 0.8).abs() < 0.001);
        assert_eq!(scores[0].evidence[0], "replay rate 100% vs baseline 0%");

        // One repeat in twenty plays already saturates the deviation
        let light = comfort_score(0.05, 0.0).unwrap();
        assert!((light - 0.8).abs() < 0.001);
        assert!(comfort_score(0.02, 0.0).unwrap() < light);
    }

    #[test]
    fn test_empty_baseline_gives_no_opinion() {
        let session = fixtures::session(30.0, 0.9, 0, 14.0);
        assert!(ReplaySignal
            .evaluate(&session, &BehaviorBaseline::default(), &PlayHistory::default())
            .is_empty());
    }

    #[test]
    fn test_comfort_score_is_monotonic() {
        let mut previous = 0.0;
        for step in 0..=20 {
            let rate = 0.2 + step as f64 * 0.04;
            let score = comfort_score(rate, 0.2).unwrap_or(0.0);
            assert!(score >= previous, "score dropped at replay rate {rate}");
            assert!((0.0..=1.0).contains(&score));
            previous = score;
        }
    }
}
