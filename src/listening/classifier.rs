//! Behavior classifier
//!
//! Builds sessions, play statistics and the baseline once at construction,
//! then answers classification queries from that read-only state.

use crate::config::InferenceConfig;
use crate::error::InferenceError;
use crate::listening::baseline::{estimate_baseline, MIN_REPLAY_BASE};
use crate::listening::events::EventDetector;
use crate::listening::session::{
    circular_hour_distance, circular_mean_hour, circular_spread_hours, group_sessions,
    ListeningSession, PlayHistory,
};
use crate::listening::signals::{clock, default_signals, percent, BehaviorSignal};
use crate::listening::types::{
    BehaviorBaseline, BehaviorLabel, BehaviorState, BehavioralEvent, LabelScore,
    SecondaryBehavior,
};
use crate::schema::{validate_history, TrackRecord};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;

/// Intensity reaches 1.0 when a metric sits this many baselines above the baseline
const INTENSITY_SPAN: f64 = 2.0;

/// `deviation_score` needs at least this many recent plays
const MIN_RECENT_PLAYS: usize = 5;
/// ...and at least this much history
const MIN_HISTORY_PLAYS: usize = 20;

/// Classifies listening sessions against the listener's own history
pub struct BehaviorClassifier {
    config: InferenceConfig,
    history: Vec<TrackRecord>,
    play_history: PlayHistory,
    session_ranges: Vec<Range<usize>>,
    sessions: Vec<ListeningSession>,
    baseline: BehaviorBaseline,
    signals: Vec<Box<dyn BehaviorSignal>>,
}

impl BehaviorClassifier {
    /// Build a classifier over a complete, time-ordered history.
    ///
    /// Fails if the configuration is invalid or the history breaks the record
    /// contract. An empty history is valid.
    pub fn new(history: Vec<TrackRecord>, config: InferenceConfig) -> Result<Self, InferenceError> {
        config.validate()?;
        validate_history(&history)?;

        let play_history = PlayHistory::from_records(&history);
        let session_ranges = group_sessions(&history, config.sessions.gap_minutes);
        let sessions: Vec<ListeningSession> = session_ranges
            .iter()
            .filter_map(|range| ListeningSession::from_tracks(&history[range.clone()], &play_history))
            .collect();
        let baseline = estimate_baseline(&sessions);
        let signals = default_signals(&config.signals);

        log::debug!(
            "classifier built: {} plays, {} sessions, baseline length {:.1} min, replay {:.3}, switches {:.2}",
            history.len(),
            sessions.len(),
            baseline.avg_session_length_minutes,
            baseline.avg_replay_rate,
            baseline.avg_context_switches
        );

        Ok(Self {
            config,
            history,
            play_history,
            session_ranges,
            sessions,
            baseline,
            signals,
        })
    }

    /// Build a classifier with the default configuration
    pub fn with_defaults(history: Vec<TrackRecord>) -> Result<Self, InferenceError> {
        Self::new(history, InferenceConfig::default())
    }

    /// Register an additional signal after the built-in ones
    pub fn with_signal(mut self, signal: Box<dyn BehaviorSignal>) -> Self {
        self.signals.push(signal);
        self
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    pub fn baseline(&self) -> &BehaviorBaseline {
        &self.baseline
    }

    pub fn sessions(&self) -> &[ListeningSession] {
        &self.sessions
    }

    pub fn history(&self) -> &[TrackRecord] {
        &self.history
    }

    pub fn play_history(&self) -> &PlayHistory {
        &self.play_history
    }

    /// Plays belonging to the session at `index`
    pub fn session_tracks(&self, index: usize) -> Option<&[TrackRecord]> {
        self.session_ranges
            .get(index)
            .map(|range| &self.history[range.clone()])
    }

    /// Classify an arbitrary slice of plays as one session.
    ///
    /// Replay is judged against the full history the classifier was built
    /// with. An empty slice classifies as `casual`; a slice with an empty
    /// track id or timestamps going backwards is rejected.
    pub fn classify_session(&self, tracks: &[TrackRecord]) -> Result<BehaviorState, InferenceError> {
        validate_history(tracks)?;
        Ok(match ListeningSession::from_tracks(tracks, &self.play_history) {
            Some(session) => self.classify(&session),
            None => self.fallback(vec!["no plays to classify".to_string()]),
        })
    }

    /// Classify every session of the history, in order
    pub fn classify_all(&self) -> Vec<BehaviorState> {
        self.sessions.iter().map(|s| self.classify(s)).collect()
    }

    /// Run every signal and merge their opinions, best label first.
    ///
    /// Colliding labels are averaged. Ties keep label declaration order.
    pub fn ranked_scores(&self, session: &ListeningSession) -> Vec<LabelScore> {
        let mut merged: BTreeMap<BehaviorLabel, (f64, usize, Vec<String>)> = BTreeMap::new();

        for signal in &self.signals {
            let scores = signal.evaluate(session, &self.baseline, &self.play_history);
            log::trace!("signal {} -> {:?}", signal.name(), scores);
            for entry in scores {
                let slot = merged.entry(entry.label).or_insert((0.0, 0, Vec::new()));
                slot.0 += entry.score.clamp(0.0, 1.0);
                slot.1 += 1;
                slot.2.extend(entry.evidence);
            }
        }

        let mut ranked: Vec<LabelScore> = merged
            .into_iter()
            .map(|(label, (sum, count, evidence))| LabelScore {
                label,
                score: (sum / count as f64).clamp(0.0, 1.0),
                evidence,
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.label.cmp(&b.label))
        });
        ranked
    }

    /// Classify a prepared session
    pub fn classify(&self, session: &ListeningSession) -> BehaviorState {
        let ranked = self.ranked_scores(session);
        let Some((primary, runners_up)) = ranked.split_first() else {
            return self.fallback(vec![format!(
                "no behavioral signal fired for {} plays over {:.0} minutes (replay rate {}, {} context switches)",
                session.track_count,
                session.duration_minutes,
                percent(session.replay_rate),
                session.context_switches
            )]);
        };

        let ranking = &self.config.ranking;
        let secondaries: Vec<&LabelScore> = runners_up
            .iter()
            .take(2)
            .filter(|c| {
                c.score > ranking.secondary_min_score
                    && primary.score - c.score < ranking.secondary_max_gap
            })
            .collect();

        let mut evidence = Vec::new();
        for line in primary
            .evidence
            .iter()
            .chain(secondaries.iter().flat_map(|s| s.evidence.iter()))
        {
            if !evidence.contains(line) {
                evidence.push(line.clone());
            }
        }

        log::debug!(
            "session at {} classified {} ({:.3}), {} secondary",
            session.start_time,
            primary.label,
            primary.score,
            secondaries.len()
        );

        BehaviorState {
            state: primary.label,
            confidence: primary.score,
            secondary_behaviors: secondaries
                .iter()
                .map(|s| SecondaryBehavior {
                    label: s.label,
                    score: s.score,
                })
                .collect(),
            intensity: session_intensity(primary.label, session, &self.baseline),
            evidence,
        }
    }

    fn fallback(&self, evidence: Vec<String>) -> BehaviorState {
        BehaviorState {
            state: BehaviorLabel::Casual,
            confidence: self.config.ranking.fallback_confidence,
            secondary_behaviors: Vec::new(),
            intensity: 0.0,
            evidence,
        }
    }

    /// Classify the whole history
    pub fn classify_overall(&self) -> BehaviorState {
        self.classify_sessions_overall(&self.sessions)
    }

    /// Aggregate the per-session winners of `sessions` into one verdict
    pub fn classify_sessions_overall(&self, sessions: &[ListeningSession]) -> BehaviorState {
        if sessions.is_empty() {
            return self.fallback(vec!["no listening sessions in history".to_string()]);
        }

        let mut counts: BTreeMap<BehaviorLabel, usize> = BTreeMap::new();
        for session in sessions {
            *counts.entry(self.classify(session).state).or_insert(0) += 1;
        }

        let total = sessions.len() as f64;
        let share = |label: BehaviorLabel| counts.get(&label).copied().unwrap_or(0) as f64 / total;

        // BTreeMap order makes the earliest-declared label win count ties
        let mut dominant = BehaviorLabel::Casual;
        let mut dominant_count = 0;
        for (label, count) in &counts {
            if *count > dominant_count {
                dominant = *label;
                dominant_count = *count;
            }
        }
        let dominant_share = dominant_count as f64 / total;
        let aggregate = &self.config.aggregate;

        let rumination = share(BehaviorLabel::Ruminating);
        let comfort = share(BehaviorLabel::ComfortSeeking);
        let summary = format!(
            "{} won {} of {} sessions ({})",
            dominant,
            dominant_count,
            sessions.len(),
            percent(dominant_share)
        );

        let (state, confidence, folded, mut evidence) =
            if dominant == BehaviorLabel::Ruminating && rumination >= aggregate.rumination_share {
                (
                    BehaviorLabel::ChronicRuminator,
                    rumination,
                    vec![BehaviorLabel::Ruminating],
                    vec![summary],
                )
            } else if rumination + comfort >= aggregate.replay_share {
                (
                    BehaviorLabel::ComfortOriented,
                    rumination + comfort,
                    vec![BehaviorLabel::Ruminating, BehaviorLabel::ComfortSeeking],
                    vec![format!(
                        "replay-driven sessions (ruminating or comfort seeking) make up {}",
                        percent(rumination + comfort)
                    )],
                )
            } else if let Some(regularity) = self.regularity(sessions) {
                (
                    BehaviorLabel::RoutineDriven,
                    (1.0 - regularity.daily_cv).clamp(0.0, 1.0),
                    vec![BehaviorLabel::RoutineDriven, BehaviorLabel::Casual],
                    vec![
                        format!(
                            "{:.1} sessions per day over {} days (variation {:.2})",
                            regularity.sessions_per_day, regularity.days, regularity.daily_cv
                        ),
                        format!(
                            "sessions start within {:.1} hours of {}",
                            regularity.start_spread_hours,
                            clock(regularity.typical_start_hour)
                        ),
                    ],
                )
            } else if counts.len() >= aggregate.eclectic_min_labels
                || dominant_share < aggregate.eclectic_max_dominant_share
            {
                (
                    BehaviorLabel::Eclectic,
                    1.0 - dominant_share,
                    Vec::new(),
                    vec![format!(
                        "{} distinct session behaviors; {}",
                        counts.len(),
                        summary
                    )],
                )
            } else {
                (dominant.aggregate(), dominant_share, vec![dominant], vec![summary])
            };

        let mut others: Vec<(BehaviorLabel, f64)> = counts
            .keys()
            .filter(|label| !folded.contains(*label))
            .map(|label| (*label, share(*label)))
            .collect();
        others.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let secondary_behaviors: Vec<SecondaryBehavior> = others
            .into_iter()
            .take(2)
            .filter(|(_, s)| *s > 0.0 && *s <= confidence)
            .map(|(label, score)| SecondaryBehavior { label, score })
            .collect();

        let intensity = self.listening_intensity();
        evidence.push(format!("listening intensity {intensity:.3}"));

        log::debug!("overall classification {} ({:.3})", state, confidence);

        BehaviorState {
            state,
            confidence: confidence.clamp(0.0, 1.0),
            secondary_behaviors,
            intensity,
            evidence,
        }
    }

    fn regularity(&self, sessions: &[ListeningSession]) -> Option<Regularity> {
        let aggregate = &self.config.aggregate;
        let first = sessions.first()?.start_time.date_naive();
        let last = sessions.last()?.start_time.date_naive();
        let days = (last - first).num_days() + 1;
        if days < i64::from(aggregate.routine_min_days) {
            return None;
        }

        let mut per_day = vec![0usize; days as usize];
        for session in sessions {
            let offset = (session.start_time.date_naive() - first).num_days();
            if let Some(slot) = usize::try_from(offset).ok().and_then(|i| per_day.get_mut(i)) {
                *slot += 1;
            }
        }

        let mean = sessions.len() as f64 / days as f64;
        let variance = per_day
            .iter()
            .map(|&c| (c as f64 - mean).powi(2))
            .sum::<f64>()
            / days as f64;
        let daily_cv = variance.sqrt() / mean;

        let start_hours: Vec<f64> = sessions.iter().map(ListeningSession::start_hour).collect();
        let start_spread_hours = circular_spread_hours(start_hours.iter().copied());

        if daily_cv > aggregate.routine_max_daily_cv
            || start_spread_hours > aggregate.routine_max_start_spread_hours
        {
            return None;
        }

        Some(Regularity {
            days,
            sessions_per_day: mean,
            daily_cv,
            start_spread_hours,
            typical_start_hour: circular_mean_hour(start_hours),
        })
    }

    /// Overall listening intensity in [0, 1].
    ///
    /// 0.4 * min(plays per listening day / 50, 1)
    /// + 0.3 * min(plays per session / 30, 1)
    /// + 0.3 * share of distinct tracks played more than once
    pub fn listening_intensity(&self) -> f64 {
        if self.history.is_empty() || self.sessions.is_empty() {
            return 0.0;
        }

        let days: BTreeSet<_> = self
            .history
            .iter()
            .map(|r| r.played_at.date_naive())
            .collect();
        let plays = self.history.len() as f64;

        let daily = (plays / days.len() as f64 / 50.0).min(1.0);
        let per_session = (plays / self.sessions.len() as f64 / 30.0).min(1.0);
        let repeated = self.play_history.repeated_tracks() as f64
            / self.play_history.distinct_tracks().max(1) as f64;

        round3(0.4 * daily + 0.3 * per_session + 0.3 * repeated)
    }

    /// How far a recent slice of plays departs from the whole history.
    ///
    /// 0.5 * circular hour distance / 12 + 0.5 * |replay share difference|,
    /// where replay share is the fraction of plays whose track appears more
    /// than once in the history. 0 when either side is too small to judge.
    pub fn deviation_score(&self, recent: &[TrackRecord]) -> f64 {
        if recent.len() < MIN_RECENT_PLAYS || self.history.len() < MIN_HISTORY_PLAYS {
            return 0.0;
        }

        let history_hour = circular_mean_hour(self.history.iter().map(TrackRecord::local_hour));
        let recent_hour = circular_mean_hour(recent.iter().map(TrackRecord::local_hour));
        let hour_deviation = circular_hour_distance(history_hour, recent_hour) / 12.0;

        let replay_deviation =
            (self.repeated_share(&self.history) - self.repeated_share(recent)).abs();

        round3((0.5 * hour_deviation + 0.5 * replay_deviation).clamp(0.0, 1.0))
    }

    fn repeated_share(&self, records: &[TrackRecord]) -> f64 {
        if records.is_empty() {
            return 0.0;
        }
        let repeated = records
            .iter()
            .filter(|r| self.play_history.play_count(&r.track_id) > 1)
            .count();
        repeated as f64 / records.len() as f64
    }

    /// Scan the history for discrete anomalies
    pub fn detect_events(&self) -> Vec<BehavioralEvent> {
        let detector = EventDetector::new(self.config.events.clone(), self.config.signals.night_window);
        let views = self
            .sessions
            .iter()
            .zip(self.session_ranges.iter())
            .map(|(session, range)| (session, &self.history[range.clone()]));
        detector.detect(views, &self.play_history)
    }
}

struct Regularity {
    days: i64,
    sessions_per_day: f64,
    daily_cv: f64,
    start_spread_hours: f64,
    typical_start_hour: f64,
}

/// How far the winning label's defining metric sits beyond the baseline
fn session_intensity(
    label: BehaviorLabel,
    session: &ListeningSession,
    baseline: &BehaviorBaseline,
) -> f64 {
    if baseline.is_empty() {
        return 0.0;
    }

    let excess = |value: f64, base: f64, min_base: f64| {
        ((value - base) / (base.max(min_base) * INTENSITY_SPAN)).clamp(0.0, 1.0)
    };

    match label {
        BehaviorLabel::Ruminating | BehaviorLabel::ComfortSeeking => excess(
            session.replay_rate,
            baseline.avg_replay_rate,
            MIN_REPLAY_BASE,
        ),
        BehaviorLabel::Searching => excess(
            session.context_switches as f64,
            baseline.avg_context_switches,
            1.0,
        ),
        // A routine session at its usual length has nothing extreme about it
        BehaviorLabel::Focused | BehaviorLabel::ZoningOut | BehaviorLabel::RoutineDriven => excess(
            session.duration_minutes,
            baseline.avg_session_length_minutes,
            1.0,
        ),
        _ => 0.0,
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listening::signals::fixtures;
    use crate::schema::ValidationError;
    use chrono::{DateTime, Duration, FixedOffset};

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    /// `count` plays of distinct tracks, `spacing` minutes apart
    fn run(start: &str, count: usize, spacing: i64, prefix: &str) -> Vec<TrackRecord> {
        let start = at(start);
        (0..count)
            .map(|i| {
                TrackRecord::new(
                    start + Duration::minutes(spacing * i as i64),
                    format!("{prefix}-{i}"),
                    "artist",
                )
            })
            .collect()
    }

    #[test]
    fn test_empty_history() {
        let classifier = BehaviorClassifier::with_defaults(Vec::new()).unwrap();
        assert_eq!(classifier.baseline(), &BehaviorBaseline::default());
        assert!(classifier.sessions().is_empty());

        let state = classifier.classify_session(&[]).unwrap();
        assert_eq!(state.state, BehaviorLabel::Casual);
        assert!((state.confidence - 0.3).abs() < 0.001);
        assert_eq!(state.intensity, 0.0);

        let overall = classifier.classify_overall();
        assert_eq!(overall.state, BehaviorLabel::Casual);
        assert_eq!(classifier.listening_intensity(), 0.0);
        assert!(classifier.detect_events().is_empty());
    }

    #[test]
    fn test_zero_history_still_classifies() {
        let classifier = BehaviorClassifier::with_defaults(Vec::new()).unwrap();
        let tracks = run("2024-03-01T10:00:00Z", 10, 5, "t");
        let state = classifier.classify_session(&tracks).unwrap();

        // Only the session-length signal can judge without a baseline
        assert_eq!(state.state, BehaviorLabel::RoutineDriven);
        assert_eq!(state.intensity, 0.0);
    }

    #[test]
    fn test_rejects_out_of_order_history() {
        let mut tracks = run("2024-03-01T10:00:00Z", 3, 5, "t");
        tracks.swap(0, 2);
        assert!(matches!(
            BehaviorClassifier::with_defaults(tracks),
            Err(InferenceError::InvalidRecord(_))
        ));
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = InferenceConfig::default();
        config.sessions.gap_minutes = 0;
        assert!(matches!(
            BehaviorClassifier::new(Vec::new(), config),
            Err(InferenceError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_sessions_cover_history() {
        let mut tracks = run("2024-03-01T10:00:00Z", 4, 5, "a");
        tracks.extend(run("2024-03-01T18:00:00Z", 3, 5, "b"));
        let classifier = BehaviorClassifier::with_defaults(tracks).unwrap();

        assert_eq!(classifier.sessions().len(), 2);
        assert_eq!(classifier.session_tracks(0).unwrap().len(), 4);
        assert_eq!(classifier.session_tracks(1).unwrap()[0].track_id, "b-0");
        assert!(classifier.session_tracks(2).is_none());
        assert_eq!(classifier.baseline().sessions_in_baseline, 2);
    }

    #[test]
    fn test_classify_session_rejects_broken_slices() {
        let classifier = BehaviorClassifier::with_defaults(run("2024-03-01T10:00:00Z", 5, 5, "h"))
            .unwrap();

        let mut reversed = run("2024-03-02T10:00:00Z", 10, 10, "t");
        reversed.reverse();
        assert!(matches!(
            classifier.classify_session(&reversed),
            Err(InferenceError::InvalidRecord(ValidationError::OutOfOrder { index: 1, .. }))
        ));

        let mut blank = run("2024-03-02T10:00:00Z", 3, 5, "t");
        blank[2].track_id = "  ".to_string();
        assert!(matches!(
            classifier.classify_session(&blank),
            Err(InferenceError::InvalidRecord(ValidationError::EmptyTrackId { index: 2 }))
        ));

        let state = classifier.classify_session(&[]).unwrap();
        assert_eq!(state.state, BehaviorLabel::Casual);
    }

    #[test]
    fn test_replays_against_replay_free_history() {
        let mut history = run("2024-03-01T10:00:00Z", 10, 4, "a");
        history.extend(run("2024-03-02T10:00:00Z", 10, 4, "b"));
        let classifier = BehaviorClassifier::with_defaults(history).unwrap();
        assert_eq!(classifier.baseline().avg_replay_rate, 0.0);

        // Every track of the first day heard again
        let again = run("2024-03-03T10:00:00Z", 10, 4, "a");
        let state = classifier.classify_session(&again).unwrap();

        assert_eq!(state.state, BehaviorLabel::ComfortSeeking);
        assert!((state.confidence - 0.8).abs() < 0.001);
        assert_eq!(state.intensity, 1.0);
        assert!(state
            .evidence
            .contains(&"replay rate 100% vs baseline 0%".to_string()));
    }

    #[test]
    fn test_usual_sessions_are_not_intense() {
        let mut history = Vec::new();
        for day in 1..=3 {
            history.extend(run(&format!("2024-03-0{day}T10:00:00Z"), 10, 4, &format!("d{day}")));
        }
        let classifier = BehaviorClassifier::with_defaults(history).unwrap();

        for state in classifier.classify_all() {
            assert_eq!(state.state, BehaviorLabel::RoutineDriven);
            assert_eq!(state.intensity, 0.0);
        }
    }

    #[test]
    fn test_session_intensity_per_label() {
        let baseline = fixtures::baseline(40.0, 0.2, 2.0);
        let replay_free = fixtures::baseline(40.0, 0.0, 0.0);

        // (label, duration, replay rate, switches, baseline, expected)
        let cases = [
            (BehaviorLabel::Ruminating, 30.0, 0.4, 0, &baseline, 0.5),
            (BehaviorLabel::Ruminating, 30.0, 0.9, 0, &baseline, 1.0),
            (BehaviorLabel::ComfortSeeking, 30.0, 0.3, 0, &baseline, 0.25),
            (BehaviorLabel::ComfortSeeking, 30.0, 0.1, 0, &baseline, 0.0),
            (BehaviorLabel::ComfortSeeking, 30.0, 0.05, 0, &replay_free, 0.5),
            (BehaviorLabel::Searching, 30.0, 0.0, 4, &baseline, 0.5),
            (BehaviorLabel::Searching, 30.0, 0.0, 0, &baseline, 0.0),
            (BehaviorLabel::Searching, 30.0, 0.0, 1, &replay_free, 0.5),
            (BehaviorLabel::Focused, 60.0, 0.0, 0, &baseline, 0.25),
            (BehaviorLabel::ZoningOut, 200.0, 0.0, 0, &baseline, 1.0),
            (BehaviorLabel::RoutineDriven, 40.0, 0.0, 0, &baseline, 0.0),
            (BehaviorLabel::RoutineDriven, 20.0, 0.0, 0, &baseline, 0.0),
            (BehaviorLabel::RoutineDriven, 60.0, 0.0, 0, &baseline, 0.25),
            (BehaviorLabel::Casual, 300.0, 1.0, 9, &baseline, 0.0),
        ];

        for (label, duration, replay, switches, base, expected) in cases {
            let session = fixtures::session(duration, replay, switches, 14.0);
            let intensity = session_intensity(label, &session, base);
            assert!(
                (intensity - expected).abs() < 1e-9,
                "{label}: expected {expected}, got {intensity}"
            );
            assert!((0.0..=1.0).contains(&intensity));
        }

        let session = fixtures::session(200.0, 1.0, 9, 23.0);
        assert_eq!(
            session_intensity(BehaviorLabel::ZoningOut, &session, &BehaviorBaseline::default()),
            0.0
        );
    }

    #[test]
    fn test_collisions_are_averaged() {
        // 75-minute session with replay far above baseline and many switches:
        // the replay signal and the length signal both score routine_driven
        let classifier = BehaviorClassifier::with_defaults(run("2024-03-01T10:00:00Z", 5, 5, "t"))
            .unwrap();
        let mut session = fixtures::session(75.0, 0.25, 4, 14.0);
        session.track_count = 20;

        // Replay-free baseline: the excess saturates, so replay scores only comfort
        let ranked = classifier.ranked_scores(&session);
        let routine: Vec<_> = ranked
            .iter()
            .filter(|s| s.label == BehaviorLabel::RoutineDriven)
            .collect();
        assert_eq!(routine.len(), 1);

        let baseline = fixtures::baseline(40.0, 0.2, 1.0);
        let mut with_baseline = classifier;
        with_baseline.baseline = baseline;
        let ranked = with_baseline.ranked_scores(&session);
        let routine = ranked
            .iter()
            .find(|s| s.label == BehaviorLabel::RoutineDriven)
            .unwrap();
        // length signal: 0.3 + 0.1 + 0.1; replay signal: 0.35 + 0.2 * 0.25
        assert!((routine.score - 0.45).abs() < 0.001);
    }

    #[test]
    fn test_confidence_is_top_score() {
        let mut tracks = Vec::new();
        for day in 1..=5 {
            tracks.extend(run(&format!("2024-03-0{day}T10:00:00Z"), 8, 6, &format!("d{day}")));
        }
        let classifier = BehaviorClassifier::with_defaults(tracks).unwrap();

        for session in classifier.sessions() {
            let ranked = classifier.ranked_scores(session);
            let state = classifier.classify(session);
            assert_eq!(state.confidence, ranked[0].score);
            for secondary in &state.secondary_behaviors {
                assert!(secondary.score <= state.confidence);
            }
            for entry in &ranked {
                assert!((0.0..=1.0).contains(&entry.score));
            }
        }
    }

    struct FixedSignal(BehaviorLabel, f64);

    impl BehaviorSignal for FixedSignal {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn evaluate(
            &self,
            _session: &ListeningSession,
            _baseline: &BehaviorBaseline,
            _history: &PlayHistory,
        ) -> Vec<LabelScore> {
            vec![LabelScore::new(self.0, self.1, vec![format!("fixed {}", self.0)])]
        }
    }

    #[test]
    fn test_secondary_window() {
        // 75-minute restless session without a baseline: focused 0.675, routine 0.4
        let session = fixtures::session(75.0, 0.0, 3, 14.0);

        let plain = BehaviorClassifier::with_defaults(Vec::new()).unwrap();
        let state = plain.classify(&session);
        assert_eq!(state.state, BehaviorLabel::Focused);
        assert!((state.confidence - 0.675).abs() < 0.001);
        assert!(state.secondary_behaviors.is_empty());

        let extended = BehaviorClassifier::with_defaults(Vec::new())
            .unwrap()
            .with_signal(Box::new(FixedSignal(BehaviorLabel::Searching, 0.55)));
        let state = extended.classify(&session);
        assert_eq!(state.state, BehaviorLabel::Focused);
        assert_eq!(state.secondary_behaviors.len(), 1);
        assert_eq!(state.secondary_behaviors[0].label, BehaviorLabel::Searching);
        assert_eq!(state.evidence.last().unwrap(), "fixed searching");
    }

    #[test]
    fn test_deviation_score() {
        let mut history = Vec::new();
        for day in 1..=4 {
            history.extend(run(&format!("2024-03-0{day}T10:00:00Z"), 6, 5, &format!("d{day}")));
        }
        let classifier = BehaviorClassifier::with_defaults(history).unwrap();

        // Fewer than five recent plays
        assert_eq!(classifier.deviation_score(&classifier.history()[..4]), 0.0);

        // Same time of day, same replay share
        assert_eq!(classifier.deviation_score(&classifier.history()[..6]), 0.0);

        // Twelve hours later
        let night = run("2024-03-05T22:00:00Z", 6, 5, "n");
        let score = classifier.deviation_score(&night);
        assert!((score - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_listening_intensity() {
        let mut tracks = Vec::new();
        for day in 1..=2 {
            tracks.extend(run(&format!("2024-03-0{day}T10:00:00Z"), 10, 3, "s"));
        }
        let classifier = BehaviorClassifier::with_defaults(tracks).unwrap();

        // 10 plays/day, 10 plays/session, every track repeated
        let expected = 0.4 * (10.0 / 50.0) + 0.3 * (10.0 / 30.0) + 0.3;
        assert!((classifier.listening_intensity() - round3(expected)).abs() < 1e-9);
    }

    #[test]
    fn test_overall_is_deterministic() {
        let mut tracks = Vec::new();
        for day in 1..=6 {
            tracks.extend(run(&format!("2024-03-0{day}T09:00:00Z"), 8, 5, &format!("d{day}")));
        }
        let a = BehaviorClassifier::with_defaults(tracks.clone()).unwrap();
        let b = BehaviorClassifier::with_defaults(tracks).unwrap();

        assert_eq!(a.classify_overall(), b.classify_overall());
        assert_eq!(a.classify_all(), b.classify_all());
    }

    #[test]
    fn test_regular_history_is_routine() {
        let mut tracks = Vec::new();
        for day in 1..=6 {
            tracks.extend(run(&format!("2024-03-0{day}T09:00:00Z"), 8, 5, &format!("d{day}")));
        }
        let classifier = BehaviorClassifier::with_defaults(tracks).unwrap();
        let overall = classifier.classify_overall();

        assert_eq!(overall.state, BehaviorLabel::RoutineDriven);
        assert!((overall.confidence - 1.0).abs() < 0.001);
        assert!(overall.evidence[0].contains("6 days"));
    }
}
