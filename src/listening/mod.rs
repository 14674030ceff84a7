//! Listening behavior inference
//!
//! Turns an ordered play history into per-session and history-wide behavior
//! states, plus discrete anomaly events.
//!
//! Flow: TrackRecords → Sessions + PlayHistory → Baseline → Signals → Classifier → BehaviorState

pub mod baseline;
pub mod classifier;
pub mod events;
pub mod habits;
pub mod session;
pub mod signals;
pub mod types;

pub use baseline::{estimate_baseline, relative_deviation};
pub use classifier::BehaviorClassifier;
pub use events::EventDetector;
pub use habits::HabitsSummary;
pub use session::{group_sessions, split_sessions, ListeningSession, PlayHistory, PlaybackProfile};
pub use signals::{default_signals, BehaviorSignal};
pub use types::{
    BehaviorBaseline, BehaviorLabel, BehaviorState, BehavioralEvent, EventKind, LabelScore,
    SecondaryBehavior,
};
