//! Shuffle/repeat signal
//!
//! Only plays that report a flag count. A session where the provider never
//! reported shuffle or repeat gets no opinion at all.

use super::BehaviorSignal;
use crate::listening::session::{ListeningSession, PlayHistory};
use crate::listening::types::{BehaviorBaseline, BehaviorLabel, LabelScore};

const REPEAT_TRACK_FLOOR: f64 = 0.5;
const REPEAT_TRACK_RAMP: f64 = 0.3;
const ORDERED_FLOOR: f64 = 0.4;
const ORDERED_RAMP: f64 = 0.2;

/// Reads the optional playback flags.
///
/// - repeat-track plays: `comfort_seeking`, 0.5 + 0.3 * share of plays
/// - shuffle never on and repeat-context plays: `routine_driven`,
///   0.4 + 0.2 * share of plays
pub struct PlaybackModeSignal;

impl BehaviorSignal for PlaybackModeSignal {
    fn name(&self) -> &'static str {
        "playback_mode"
    }

    fn evaluate(
        &self,
        session: &ListeningSession,
        _baseline: &BehaviorBaseline,
        _history: &PlayHistory,
    ) -> Vec<LabelScore> {
        let playback = &session.playback;
        if !playback.has_flags() || session.track_count == 0 {
            return Vec::new();
        }

        let plays = session.track_count as f64;
        let mut scores = Vec::new();

        if playback.repeat_track > 0 {
            let share = playback.repeat_track as f64 / plays;
            scores.push(LabelScore::new(
                BehaviorLabel::ComfortSeeking,
                REPEAT_TRACK_FLOOR + REPEAT_TRACK_RAMP * share,
                vec![format!(
                    "repeat-track on for {} of {} plays",
                    playback.repeat_track, session.track_count
                )],
            ));
        }

        if playback.shuffle_always_off() && playback.repeat_context > 0 {
            let share = playback.repeat_context as f64 / plays;
            scores.push(LabelScore::new(
                BehaviorLabel::RoutineDriven,
                ORDERED_FLOOR + ORDERED_RAMP * share,
                vec![format!(
                    "shuffle off with the context on repeat for {} of {} plays",
                    playback.repeat_context, session.track_count
                )],
            ));
        }

        scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listening::session::PlaybackProfile;
    use crate::listening::signals::fixtures;

    fn with_profile(profile: PlaybackProfile) -> ListeningSession {
        let mut session = fixtures::session(30.0, 0.0, 0, 14.0);
        session.playback = profile;
        session
    }

    fn evaluate(session: &ListeningSession) -> Vec<LabelScore> {
        PlaybackModeSignal.evaluate(
            session,
            &BehaviorBaseline::default(),
            &PlayHistory::default(),
        )
    }

    #[test]
    fn test_missing_flags_have_no_opinion() {
        assert!(evaluate(&with_profile(PlaybackProfile::default())).is_empty());
    }

    #[test]
    fn test_repeat_track_is_comfort() {
        let session = with_profile(PlaybackProfile {
            repeat_track: 5,
            ..Default::default()
        });
        let scores = evaluate(&session);

        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].label, BehaviorLabel::ComfortSeeking);
        assert!((scores[0].score - 0.65).abs() < 0.001);
    }

    #[test]
    fn test_ordered_repeat_is_routine() {
        let session = with_profile(PlaybackProfile {
            shuffle_off: 10,
            repeat_context: 10,
            ..Default::default()
        });
        let scores = evaluate(&session);

        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].label, BehaviorLabel::RoutineDriven);
        assert!((scores[0].score - 0.6).abs() < 0.001);
    }

    #[test]
    fn test_shuffle_alone_has_no_opinion() {
        let session = with_profile(PlaybackProfile {
            shuffle_on: 10,
            repeat_off: 10,
            ..Default::default()
        });
        assert!(evaluate(&session).is_empty());
    }
}
