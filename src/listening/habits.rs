//! Descriptive listening habits
//!
//! Plain counts and shares over the whole history. Nothing here is scored
//! against the baseline.

use crate::listening::session::ListeningSession;
use crate::schema::{ContextType, TrackRecord};
use chrono::{NaiveDate, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Number of peak hours reported
const PEAK_HOURS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourCount {
    pub hour: u32,
    pub plays: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistShare {
    pub artist: String,
    pub plays: usize,
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextTypeCount {
    pub context_type: ContextType,
    pub plays: usize,
}

/// Shuffle flag counts; `unknown` holds plays that never reported it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShuffleUsage {
    pub on: usize,
    pub off: usize,
    pub unknown: usize,
}

/// History-wide habit figures
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HabitsSummary {
    pub total_plays: usize,
    pub distinct_tracks: usize,
    /// distinct tracks / total plays
    pub diversity_score: f64,
    /// Share of distinct tracks played more than once
    pub repeated_track_share: f64,
    pub peak_hours: Vec<HourCount>,
    pub top_artists: Vec<ArtistShare>,
    pub shuffle_usage: ShuffleUsage,
    pub context_types: Vec<ContextTypeCount>,
    pub session_count: usize,
    pub avg_tracks_per_session: f64,
    pub avg_session_minutes: f64,
    pub longest_session_minutes: f64,
    pub listening_days: usize,
    /// Longest run of consecutive calendar days with at least one play
    pub longest_streak_days: usize,
}

impl HabitsSummary {
    /// Summarize `history`; lists are ordered by count desc, then key asc.
    pub fn compute(
        history: &[TrackRecord],
        sessions: &[ListeningSession],
        top_artist_limit: usize,
    ) -> Self {
        if history.is_empty() {
            return HabitsSummary::default();
        }

        let total = history.len();
        let mut track_counts: BTreeMap<&str, usize> = BTreeMap::new();
        let mut artist_counts: BTreeMap<&str, usize> = BTreeMap::new();
        let mut hour_counts: BTreeMap<u32, usize> = BTreeMap::new();
        let mut context_counts: BTreeMap<&ContextType, usize> = BTreeMap::new();
        let mut shuffle_usage = ShuffleUsage::default();
        let mut days: BTreeSet<NaiveDate> = BTreeSet::new();

        for record in history {
            *track_counts.entry(record.track_id.as_str()).or_insert(0) += 1;
            if !record.artist.is_empty() {
                *artist_counts.entry(record.artist.as_str()).or_insert(0) += 1;
            }
            *hour_counts.entry(record.played_at.hour()).or_insert(0) += 1;
            *context_counts.entry(&record.context_type).or_insert(0) += 1;
            match record.shuffle {
                Some(true) => shuffle_usage.on += 1,
                Some(false) => shuffle_usage.off += 1,
                None => shuffle_usage.unknown += 1,
            }
            days.insert(record.played_at.date_naive());
        }

        let distinct_tracks = track_counts.len();
        let repeated = track_counts.values().filter(|&&c| c > 1).count();

        let peak_hours = ranked(hour_counts)
            .into_iter()
            .take(PEAK_HOURS)
            .map(|(hour, plays)| HourCount { hour, plays })
            .collect();

        let top_artists = ranked(artist_counts)
            .into_iter()
            .take(top_artist_limit)
            .map(|(artist, plays)| ArtistShare {
                artist: artist.to_string(),
                plays,
                share: round3(plays as f64 / total as f64),
            })
            .collect();

        let context_types = ranked(context_counts)
            .into_iter()
            .map(|(context_type, plays)| ContextTypeCount {
                context_type: context_type.clone(),
                plays,
            })
            .collect();

        let session_count = sessions.len();
        let (avg_tracks_per_session, avg_session_minutes) = if session_count == 0 {
            (0.0, 0.0)
        } else {
            let n = session_count as f64;
            (
                round3(sessions.iter().map(|s| s.track_count as f64).sum::<f64>() / n),
                round3(sessions.iter().map(|s| s.duration_minutes).sum::<f64>() / n),
            )
        };
        let longest_session_minutes = sessions
            .iter()
            .map(|s| s.duration_minutes)
            .fold(0.0, f64::max);

        HabitsSummary {
            total_plays: total,
            distinct_tracks,
            diversity_score: round3(distinct_tracks as f64 / total as f64),
            repeated_track_share: round3(repeated as f64 / distinct_tracks as f64),
            peak_hours,
            top_artists,
            shuffle_usage,
            context_types,
            session_count,
            avg_tracks_per_session,
            avg_session_minutes,
            longest_session_minutes,
            listening_days: days.len(),
            longest_streak_days: longest_streak(&days),
        }
    }
}

/// Entries by count desc; the map's key order breaks ties
fn ranked<K: Ord>(counts: BTreeMap<K, usize>) -> Vec<(K, usize)> {
    let mut entries: Vec<(K, usize)> = counts.into_iter().collect();
    // stable sort keeps ascending key order among equal counts
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries
}

fn longest_streak(days: &BTreeSet<NaiveDate>) -> usize {
    let mut longest = 0;
    let mut current = 0;
    let mut previous: Option<NaiveDate> = None;
    for day in days {
        current = match previous {
            Some(prev) if (*day - prev).num_days() == 1 => current + 1,
            _ => 1,
        };
        longest = longest.max(current);
        previous = Some(*day);
    }
    longest
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
