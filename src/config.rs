//! Configuration for the listening inference engine.
//!
//! Every threshold the engine uses lives here with its default value, so a
//! host application can tune the engine without touching scoring code.

use crate::error::InferenceError;
use serde::{Deserialize, Serialize};

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Session grouping
    pub sessions: SessionConfig,
    /// Signal thresholds
    pub signals: SignalConfig,
    /// How ranked labels become a behavior state
    pub ranking: RankingConfig,
    /// History-wide classification
    pub aggregate: AggregateConfig,
    /// Event detector thresholds
    pub events: EventConfig,
}

impl InferenceConfig {
    /// Load configuration from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, InferenceError> {
        let config: InferenceConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Export configuration as pretty JSON
    pub fn to_json(&self) -> Result<String, InferenceError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values that would make the engine meaningless.
    pub fn validate(&self) -> Result<(), InferenceError> {
        if self.sessions.gap_minutes == 0 {
            return Err(invalid("sessions.gap_minutes must be greater than zero"));
        }

        self.signals.night_window.validate()?;

        let signals = &self.signals;
        if signals.focused_minutes <= 0.0 {
            return Err(invalid("signals.focused_minutes must be positive"));
        }
        if signals.zoning_out_minutes <= signals.focused_minutes {
            return Err(invalid(
                "signals.zoning_out_minutes must be greater than signals.focused_minutes",
            ));
        }
        if signals.context_switch_multiplier <= 0.0 {
            return Err(invalid("signals.context_switch_multiplier must be positive"));
        }
        if signals.context_switch_floor <= 0.0 {
            return Err(invalid("signals.context_switch_floor must be positive"));
        }

        let ranking = &self.ranking;
        for (name, value) in [
            ("ranking.secondary_min_score", ranking.secondary_min_score),
            ("ranking.secondary_max_gap", ranking.secondary_max_gap),
            ("ranking.fallback_confidence", ranking.fallback_confidence),
            ("aggregate.rumination_share", self.aggregate.rumination_share),
            ("aggregate.replay_share", self.aggregate.replay_share),
            ("aggregate.routine_max_daily_cv", self.aggregate.routine_max_daily_cv),
            (
                "aggregate.eclectic_max_dominant_share",
                self.aggregate.eclectic_max_dominant_share,
            ),
            ("events.artist_concentration_share", self.events.artist_concentration_share),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(&format!("{name} must be within [0, 1], got {value}")));
            }
        }

        if self.aggregate.routine_max_start_spread_hours <= 0.0 {
            return Err(invalid("aggregate.routine_max_start_spread_hours must be positive"));
        }
        if self.aggregate.routine_min_days < 2 {
            return Err(invalid("aggregate.routine_min_days must be at least 2"));
        }

        let events = &self.events;
        if events.binge_session_minutes <= 0.0 {
            return Err(invalid("events.binge_session_minutes must be positive"));
        }
        if events.late_night_min_tracks == 0 || events.comfort_loop_min_tracks == 0 {
            return Err(invalid("event track-count thresholds must be greater than zero"));
        }

        Ok(())
    }
}

fn invalid(message: &str) -> InferenceError {
    InferenceError::InvalidConfig(message.to_string())
}

/// Session grouping configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Largest gap (minutes) between two plays of the same session
    pub gap_minutes: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { gap_minutes: 30 }
    }
}

/// Local-time window that wraps midnight when `start_hour > end_hour`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NightWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl Default for NightWindow {
    fn default() -> Self {
        Self {
            start_hour: 22,
            end_hour: 3,
        }
    }
}

impl NightWindow {
    /// Whether a fractional local hour falls inside the window
    pub fn contains(&self, hour: f64) -> bool {
        let start = self.start_hour as f64;
        let end = self.end_hour as f64;
        if self.start_hour <= self.end_hour {
            hour >= start && hour < end
        } else {
            hour >= start || hour < end
        }
    }

    fn validate(&self) -> Result<(), InferenceError> {
        if self.start_hour > 23 || self.end_hour > 23 {
            return Err(invalid("signals.night_window hours must be within 0-23"));
        }
        if self.start_hour == self.end_hour {
            return Err(invalid("signals.night_window must not be empty"));
        }
        Ok(())
    }
}

/// Signal thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    pub night_window: NightWindow,
    /// Sessions at least this long (minutes) can be focused
    pub focused_minutes: f64,
    /// Sessions at least this long (minutes) are zoning out
    pub zoning_out_minutes: f64,
    /// Context switches must exceed baseline times this multiplier
    pub context_switch_multiplier: f64,
    /// ...and never fewer than this many switches
    pub context_switch_floor: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            night_window: NightWindow::default(),
            focused_minutes: 60.0,
            zoning_out_minutes: 90.0,
            context_switch_multiplier: 2.0,
            context_switch_floor: 3.0,
        }
    }
}

/// Ranking rules for turning label scores into a behavior state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// A runner-up must score strictly above this to be reported
    pub secondary_min_score: f64,
    /// ...and sit strictly closer than this to the primary score
    pub secondary_max_gap: f64,
    /// Confidence of the `casual` fallback when no signal fires
    pub fallback_confidence: f64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            secondary_min_score: 0.30,
            secondary_max_gap: 0.20,
            fallback_confidence: 0.30,
        }
    }
}

/// History-wide classification thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateConfig {
    /// Share of ruminating sessions that makes a chronic ruminator
    pub rumination_share: f64,
    /// Combined ruminating + comfort-seeking share that makes comfort oriented
    pub replay_share: f64,
    /// Minimum calendar days spanned before routine can be detected
    pub routine_min_days: u32,
    /// Maximum coefficient of variation of sessions per day
    pub routine_max_daily_cv: f64,
    /// Maximum circular spread of session start hours
    pub routine_max_start_spread_hours: f64,
    /// Distinct winning labels at which the history is eclectic
    pub eclectic_min_labels: usize,
    /// Dominant label share below which the history is eclectic
    pub eclectic_max_dominant_share: f64,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            rumination_share: 0.4,
            replay_share: 0.5,
            routine_min_days: 3,
            routine_max_daily_cv: 0.35,
            routine_max_start_spread_hours: 2.0,
            eclectic_min_labels: 4,
            eclectic_max_dominant_share: 0.4,
        }
    }
}

/// Event detector thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    /// Late-night sessions need at least this many plays to be scanned
    pub late_night_min_tracks: usize,
    /// A track needs at least this many plays in history to count as replayed
    pub late_night_replay_min_plays: usize,
    /// Sessions at least this long (minutes) are binges
    pub binge_session_minutes: f64,
    /// Artist share of total plays that flags a concentration
    pub artist_concentration_share: f64,
    /// Concentration is only checked once history has this many plays
    pub artist_min_plays: usize,
    /// Context switches above this flag a spree
    pub context_switch_spree: u32,
    /// Shuffle-off repeat-on sessions need at least this many plays
    pub comfort_loop_min_tracks: usize,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            late_night_min_tracks: 6,
            late_night_replay_min_plays: 4,
            binge_session_minutes: 240.0,
            artist_concentration_share: 0.3,
            artist_min_plays: 10,
            context_switch_spree: 5,
            comfort_loop_min_tracks: 9,
        }
    }
}
