//! Listen Flux - Offline engine that infers listening behavior from play history
//!
//! Flux reads how someone listens (timing, repetition, session shape and
//! context switching) rather than what they listen to, through a deterministic
//! pipeline: history validation → session grouping → baseline → competing
//! signals → ranked behavior state.
//!
//! ## Modules
//!
//! - **Schema**: Track play records and validation at the ingestion boundary
//! - **Listening**: Sessions, baseline, signals, classifier, events and habits
//! - **Pipeline**: One-shot analysis of a whole history

pub mod config;
pub mod error;
pub mod listening;
pub mod pipeline;
pub mod schema;

pub use config::InferenceConfig;
pub use error::InferenceError;
pub use pipeline::{analyze, analyze_json, AnalysisReport};

// Schema exports
pub use schema::{HistoryAdapter, RawPlayRecord, TrackRecord, ValidationError};

// Inference exports
pub use listening::{
    BehaviorBaseline, BehaviorClassifier, BehaviorLabel, BehaviorSignal, BehaviorState,
    BehavioralEvent, EventKind, ListeningSession,
};

/// Engine version embedded in every analysis report
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
