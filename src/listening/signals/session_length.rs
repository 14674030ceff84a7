//! Session length signal

use super::{percent, BehaviorSignal};
use crate::listening::session::{ListeningSession, PlayHistory};
use crate::listening::types::{BehaviorBaseline, BehaviorLabel, LabelScore};

const FOCUSED_FLOOR: f64 = 0.5;
const FOCUSED_RAMP: f64 = 0.15;
const FOCUSED_CALM_BONUS: f64 = 0.1;
const FOCUSED_CAP: f64 = 0.85;

const ZONING_FLOOR: f64 = 0.45;
const ZONING_RAMP: f64 = 0.3;
const ZONING_CAP: f64 = 0.75;

const ROUTINE_SHORT_FLOOR: f64 = 0.4;
const ROUTINE_SHORT_RAMP: f64 = 0.15;
const ROUTINE_FALLBACK: f64 = 0.3;
const ROUTINE_UNMET_BONUS: f64 = 0.1;

/// Most context switches a focused session may have
const CALM_MAX_SWITCHES: u32 = 1;
/// Replay may sit this far above baseline and still count as calm
const CALM_REPLAY_TOLERANCE: f64 = 0.2;

/// Scores a session by how long it ran.
///
/// - shorter than `focused_minutes`: `routine_driven`
/// - `focused_minutes` up to `zoning_out_minutes`: `focused`, raised by few
///   context switches and unremarkable replay; `routine_driven` takes the
///   bonus for each condition that is missing
/// - `zoning_out_minutes` and longer: `zoning_out`
pub struct SessionLengthSignal {
    focused_minutes: f64,
    zoning_out_minutes: f64,
}

impl SessionLengthSignal {
    pub fn new(focused_minutes: f64, zoning_out_minutes: f64) -> Self {
        Self {
            focused_minutes,
            zoning_out_minutes,
        }
    }
}

impl BehaviorSignal for SessionLengthSignal {
    fn name(&self) -> &'static str {
        "session_length"
    }

    fn evaluate(
        &self,
        session: &ListeningSession,
        baseline: &BehaviorBaseline,
        _history: &PlayHistory,
    ) -> Vec<LabelScore> {
        let duration = session.duration_minutes;
        let length = format!(
            "{:.0}-minute session vs baseline {:.0} minutes",
            duration, baseline.avg_session_length_minutes
        );

        if duration < self.focused_minutes {
            let score =
                ROUTINE_SHORT_FLOOR + ROUTINE_SHORT_RAMP * (duration / self.focused_minutes);
            return vec![LabelScore::new(
                BehaviorLabel::RoutineDriven,
                score,
                vec![length],
            )];
        }

        if duration >= self.zoning_out_minutes {
            let overrun = ((duration - self.zoning_out_minutes) / self.zoning_out_minutes).min(1.0);
            let score = (ZONING_FLOOR + ZONING_RAMP * overrun).min(ZONING_CAP);
            return vec![LabelScore::new(
                BehaviorLabel::ZoningOut,
                score,
                vec![length, format!("{} tracks without a break", session.track_count)],
            )];
        }

        let few_switches = session.context_switches <= CALM_MAX_SWITCHES;
        let calm_replay = baseline
            .replay_deviation(session.replay_rate)
            .map_or(true, |d| d <= CALM_REPLAY_TOLERANCE);

        let span = self.zoning_out_minutes - self.focused_minutes;
        let mut focused = FOCUSED_FLOOR + FOCUSED_RAMP * ((duration - self.focused_minutes) / span);
        let mut routine = ROUTINE_FALLBACK;
        for met in [few_switches, calm_replay] {
            if met {
                focused += FOCUSED_CALM_BONUS;
            } else {
                routine += ROUTINE_UNMET_BONUS;
            }
        }

        let detail = format!(
            "{} context switches, replay rate {} vs baseline {}",
            session.context_switches,
            percent(session.replay_rate),
            percent(baseline.avg_replay_rate)
        );

        vec![
            LabelScore::new(
                BehaviorLabel::Focused,
                focused.min(FOCUSED_CAP),
                vec![length.clone(), detail.clone()],
            ),
            LabelScore::new(BehaviorLabel::RoutineDriven, routine, vec![length, detail]),
        ]
    }
}
