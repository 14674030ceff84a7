//! Pipeline orchestration
//!
//! One-shot analysis of a complete listening history: sessions, baseline,
//! per-session states, the overall verdict, events and habits.

use crate::config::InferenceConfig;
use crate::error::InferenceError;
use crate::listening::{
    BehaviorBaseline, BehaviorClassifier, BehaviorState, BehavioralEvent, HabitsSummary,
    ListeningSession,
};
use crate::schema::{HistoryAdapter, TrackRecord};
use crate::ENGINE_VERSION;
use serde::{Deserialize, Serialize};

/// Number of artists listed in the habits summary
pub const TOP_ARTIST_LIMIT: usize = 10;

/// One session with its classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub index: usize,
    pub session: ListeningSession,
    pub state: BehaviorState,
}

/// Everything the engine infers from a history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub engine_version: String,
    pub baseline: BehaviorBaseline,
    pub sessions: Vec<SessionReport>,
    pub overall: BehaviorState,
    pub events: Vec<BehavioralEvent>,
    pub listening_intensity: f64,
    pub habits: HabitsSummary,
}

impl AnalysisReport {
    /// Export the report as pretty JSON
    pub fn to_json(&self) -> Result<String, InferenceError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Analyze a validated, time-ordered history.
///
/// # Example
/// ```ignore
/// let report = analyze(history, InferenceConfig::default())?;
/// println!("{}", report.overall.state);
/// ```
pub fn analyze(
    records: Vec<TrackRecord>,
    config: InferenceConfig,
) -> Result<AnalysisReport, InferenceError> {
    // Stage 1: Sessions, play statistics and baseline
    let classifier = BehaviorClassifier::new(records, config)?;

    // Stage 2: Per-session states
    let sessions = classifier
        .sessions()
        .iter()
        .enumerate()
        .map(|(index, session)| SessionReport {
            index,
            session: session.clone(),
            state: classifier.classify(session),
        })
        .collect();

    // Stage 3: History-wide views
    let overall = classifier.classify_overall();
    let events = classifier.detect_events();
    let habits = HabitsSummary::compute(
        classifier.history(),
        classifier.sessions(),
        TOP_ARTIST_LIMIT,
    );

    log::info!(
        "analyzed {} plays: overall {} ({:.3}), {} events",
        classifier.history().len(),
        overall.state,
        overall.confidence,
        events.len()
    );

    Ok(AnalysisReport {
        engine_version: ENGINE_VERSION.to_string(),
        baseline: classifier.baseline().clone(),
        sessions,
        overall,
        events,
        listening_intensity: classifier.listening_intensity(),
        habits,
    })
}

/// Parse a JSON array of raw play records, validate it and analyze it
pub fn analyze_json(json: &str, config: InferenceConfig) -> Result<AnalysisReport, InferenceError> {
    let history = HistoryAdapter::history_from_json(json)?;
    analyze(history, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listening::BehaviorLabel;

    #[test]
    fn test_analyze_empty_history() {
        let report = analyze(Vec::new(), InferenceConfig::default()).unwrap();

        assert!(report.sessions.is_empty());
        assert!(report.events.is_empty());
        assert_eq!(report.overall.state, BehaviorLabel::Casual);
        assert_eq!(report.baseline.sessions_in_baseline, 0);
        assert_eq!(report.engine_version, ENGINE_VERSION);
    }

    #[test]
    fn test_analyze_json() {
        let json = r#"[
            {"played_at": "2024-03-01T10:00:00Z", "track_id": "a", "artist": "Low"},
            {"played_at": "2024-03-01T10:04:00Z", "track_id": "b", "artist": "Low"},
            {"played_at": "2024-03-01T15:00:00Z", "track_id": "a", "artist": "Low"}
        ]"#;

        let report = analyze_json(json, InferenceConfig::default()).unwrap();
        assert_eq!(report.sessions.len(), 2);
        assert_eq!(report.sessions[1].index, 1);
        assert_eq!(report.habits.total_plays, 3);

        let serialized = report.to_json().unwrap();
        assert!(serialized.contains("\"engine_version\""));
    }

    #[test]
    fn test_analyze_json_rejects_missing_track() {
        let json = r#"[{"played_at": "2024-03-01T10:00:00Z"}]"#;
        assert!(matches!(
            analyze_json(json, InferenceConfig::default()),
            Err(InferenceError::InvalidRecord(_))
        ));
    }
}
