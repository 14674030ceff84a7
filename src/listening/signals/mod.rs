//! Behavior signals
//!
//! Each signal looks at one session against the listener's baseline and the
//! full play history, and emits a score for every label it has an opinion on.
//! Signals never pick a winner; the classifier merges their opinions.

mod context_switch;
mod late_night;
mod playback_mode;
mod replay;
mod session_length;

pub use context_switch::ContextSwitchSignal;
pub use late_night::LateNightSignal;
pub use playback_mode::PlaybackModeSignal;
pub use replay::ReplaySignal;
pub use session_length::SessionLengthSignal;

use crate::config::SignalConfig;
use crate::listening::session::{ListeningSession, PlayHistory};
use crate::listening::types::{BehaviorBaseline, LabelScore};

/// Trait for scoring signals
pub trait BehaviorSignal: Send + Sync {
    /// Short name used in diagnostics
    fn name(&self) -> &'static str;

    /// Score a session; an empty vector means no opinion
    fn evaluate(
        &self,
        session: &ListeningSession,
        baseline: &BehaviorBaseline,
        history: &PlayHistory,
    ) -> Vec<LabelScore>;
}

/// The built-in signal set, in evaluation order
pub fn default_signals(config: &SignalConfig) -> Vec<Box<dyn BehaviorSignal>> {
    vec![
        Box::new(LateNightSignal::new(config.night_window)),
        Box::new(ReplaySignal),
        Box::new(SessionLengthSignal::new(
            config.focused_minutes,
            config.zoning_out_minutes,
        )),
        Box::new(ContextSwitchSignal::new(
            config.context_switch_multiplier,
            config.context_switch_floor,
        )),
        Box::new(PlaybackModeSignal),
    ]
}

/// Format a rate as a whole percentage, e.g. 0.4 -> "40%"
pub(crate) fn percent(rate: f64) -> String {
    format!("{:.0}%", rate * 100.0)
}

/// Format a fractional hour as a clock time, e.g. 23.5 -> "23:30"
pub(crate) fn clock(hour: f64) -> String {
    let total = (hour * 60.0).round() as i64;
    let total = total.rem_euclid(24 * 60);
    format!("{:02}:{:02}", total / 60, total % 60)
}
