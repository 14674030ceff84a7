//! Listening inference data types
//!
//! Labels, scores and the values the classifier hands back to callers.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Behavioral label, either per session or history-wide.
///
/// Declaration order is the deterministic tie-break when two labels score
/// exactly the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorLabel {
    // Per-session labels
    Ruminating,
    ComfortSeeking,
    Searching,
    Focused,
    ZoningOut,
    RoutineDriven,
    Casual,
    // History-wide labels
    ChronicRuminator,
    ComfortOriented,
    RestlessSearcher,
    FocusedListener,
    PassiveListener,
    Eclectic,
}

impl BehaviorLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            BehaviorLabel::Ruminating => "ruminating",
            BehaviorLabel::ComfortSeeking => "comfort_seeking",
            BehaviorLabel::Searching => "searching",
            BehaviorLabel::Focused => "focused",
            BehaviorLabel::ZoningOut => "zoning_out",
            BehaviorLabel::RoutineDriven => "routine_driven",
            BehaviorLabel::Casual => "casual",
            BehaviorLabel::ChronicRuminator => "chronic_ruminator",
            BehaviorLabel::ComfortOriented => "comfort_oriented",
            BehaviorLabel::RestlessSearcher => "restless_searcher",
            BehaviorLabel::FocusedListener => "focused_listener",
            BehaviorLabel::PassiveListener => "passive_listener",
            BehaviorLabel::Eclectic => "eclectic",
        }
    }

    /// History-wide name for a per-session winner
    pub fn aggregate(self) -> BehaviorLabel {
        match self {
            BehaviorLabel::Ruminating => BehaviorLabel::ChronicRuminator,
            BehaviorLabel::ComfortSeeking => BehaviorLabel::ComfortOriented,
            BehaviorLabel::Searching => BehaviorLabel::RestlessSearcher,
            BehaviorLabel::Focused => BehaviorLabel::FocusedListener,
            BehaviorLabel::ZoningOut => BehaviorLabel::PassiveListener,
            BehaviorLabel::RoutineDriven | BehaviorLabel::Casual => BehaviorLabel::RoutineDriven,
            other => other,
        }
    }
}

impl fmt::Display for BehaviorLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One opinion emitted by a signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: BehaviorLabel,
    /// Score in [0, 1]
    pub score: f64,
    pub evidence: Vec<String>,
}

impl LabelScore {
    pub fn new(label: BehaviorLabel, score: f64, evidence: Vec<String>) -> Self {
        LabelScore {
            label,
            score: score.clamp(0.0, 1.0),
            evidence,
        }
    }
}

/// A runner-up label reported next to the primary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondaryBehavior {
    pub label: BehaviorLabel,
    pub score: f64,
}

/// Classification result for a session or a whole history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorState {
    /// Winning label
    pub state: BehaviorLabel,
    /// Winning label's accumulated score (0-1)
    pub confidence: f64,
    /// Up to two runner-up labels close to the winner
    pub secondary_behaviors: Vec<SecondaryBehavior>,
    /// How far the defining metric sits beyond the listener's baseline (0-1)
    pub intensity: f64,
    /// Evidence from every signal behind the reported labels
    pub evidence: Vec<String>,
}

/// Per-listener norms averaged over every session of the history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BehaviorBaseline {
    pub avg_session_length_minutes: f64,
    pub avg_replay_rate: f64,
    /// Circular mean of session hours (0-24)
    pub avg_listening_hour: f64,
    pub avg_context_switches: f64,
    pub typical_session_tracks: f64,
    pub sessions_in_baseline: u32,
}

impl BehaviorBaseline {
    /// No sessions contributed, so no deviation can be measured
    pub fn is_empty(&self) -> bool {
        self.sessions_in_baseline == 0
    }
}

/// Discrete anomaly category
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    LateNightReplay,
    BingeSession,
    ArtistConcentration,
    ContextSwitchSpree,
    ComfortLoop,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::LateNightReplay => "late_night_replay",
            EventKind::BingeSession => "binge_session",
            EventKind::ArtistConcentration => "artist_concentration",
            EventKind::ContextSwitchSpree => "context_switch_spree",
            EventKind::ComfortLoop => "comfort_loop",
        }
    }
}

/// A timestamped anomaly found in the history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehavioralEvent {
    /// Name-based id, stable for identical input
    pub event_id: Uuid,
    pub kind: EventKind,
    pub timestamp: DateTime<FixedOffset>,
    /// Index of the session the event belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    /// Kind-specific size: play count, hours, share or switch count
    pub magnitude: f64,
}
