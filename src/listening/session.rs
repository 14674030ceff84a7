//! Session grouping and per-session metrics
//!
//! A session is a maximal run of plays with no inactivity gap above the
//! configured threshold. Metrics are computed once when the session is built
//! and never change afterwards.

use crate::schema::{RepeatMode, TrackRecord};
use chrono::{DateTime, Duration, FixedOffset, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::f64::consts::TAU;
use std::ops::Range;

/// Partition time-ordered records into session index ranges.
///
/// Two consecutive records share a session iff the elapsed time between them
/// is at most `gap_minutes`. Records are never re-sorted.
pub fn group_sessions(records: &[TrackRecord], gap_minutes: u32) -> Vec<Range<usize>> {
    let gap = Duration::minutes(i64::from(gap_minutes));
    let mut ranges = Vec::new();
    if records.is_empty() {
        return ranges;
    }

    let mut start = 0;
    for i in 1..records.len() {
        if records[i].played_at - records[i - 1].played_at > gap {
            ranges.push(start..i);
            start = i;
        }
    }
    ranges.push(start..records.len());
    ranges
}

/// Same as [`group_sessions`] but yields the record slices
pub fn split_sessions(records: &[TrackRecord], gap_minutes: u32) -> Vec<&[TrackRecord]> {
    group_sessions(records, gap_minutes)
        .into_iter()
        .map(|range| &records[range])
        .collect()
}

/// Play statistics over the entire supplied history
#[derive(Debug, Clone, Default)]
pub struct PlayHistory {
    first_played: HashMap<String, DateTime<FixedOffset>>,
    play_counts: HashMap<String, usize>,
    artist_counts: HashMap<String, usize>,
    total_plays: usize,
}

impl PlayHistory {
    pub fn from_records(records: &[TrackRecord]) -> Self {
        let mut history = PlayHistory::default();
        for record in records {
            history
                .first_played
                .entry(record.track_id.clone())
                .and_modify(|first| {
                    if record.played_at < *first {
                        *first = record.played_at;
                    }
                })
                .or_insert(record.played_at);
            *history.play_counts.entry(record.track_id.clone()).or_insert(0) += 1;
            if !record.artist.is_empty() {
                *history.artist_counts.entry(record.artist.clone()).or_insert(0) += 1;
            }
            history.total_plays += 1;
        }
        history
    }

    /// Whether the track had already been played before this record
    pub fn played_before(&self, record: &TrackRecord) -> bool {
        self.first_played
            .get(&record.track_id)
            .map_or(false, |first| *first < record.played_at)
    }

    pub fn play_count(&self, track_id: &str) -> usize {
        self.play_counts.get(track_id).copied().unwrap_or(0)
    }

    pub fn artist_play_count(&self, artist: &str) -> usize {
        self.artist_counts.get(artist).copied().unwrap_or(0)
    }

    pub fn total_plays(&self) -> usize {
        self.total_plays
    }

    pub fn distinct_tracks(&self) -> usize {
        self.play_counts.len()
    }

    /// Distinct tracks played more than once
    pub fn repeated_tracks(&self) -> usize {
        self.play_counts.values().filter(|&&count| count > 1).count()
    }

    /// Artists with their play counts, most played first, ties by name
    pub fn artists_by_plays(&self) -> Vec<(&str, usize)> {
        let mut artists: Vec<(&str, usize)> = self
            .artist_counts
            .iter()
            .map(|(artist, count)| (artist.as_str(), *count))
            .collect();
        artists.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        artists
    }
}

/// Counts of the optional shuffle/repeat flags inside a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackProfile {
    pub shuffle_on: usize,
    pub shuffle_off: usize,
    pub repeat_off: usize,
    pub repeat_track: usize,
    pub repeat_context: usize,
}

impl PlaybackProfile {
    pub fn from_tracks(tracks: &[TrackRecord]) -> Self {
        let mut profile = PlaybackProfile::default();
        for track in tracks {
            match track.shuffle {
                Some(true) => profile.shuffle_on += 1,
                Some(false) => profile.shuffle_off += 1,
                None => {}
            }
            match track.repeat {
                Some(RepeatMode::Off) => profile.repeat_off += 1,
                Some(RepeatMode::Track) => profile.repeat_track += 1,
                Some(RepeatMode::Context) => profile.repeat_context += 1,
                None => {}
            }
        }
        profile
    }

    /// Whether any record reported a shuffle or repeat flag
    pub fn has_flags(&self) -> bool {
        self.shuffle_on + self.shuffle_off + self.repeat_off + self.repeat_track + self.repeat_context
            > 0
    }

    /// Shuffle was reported at least once and never on
    pub fn shuffle_always_off(&self) -> bool {
        self.shuffle_off > 0 && self.shuffle_on == 0
    }

    pub fn repeat_on(&self) -> usize {
        self.repeat_track + self.repeat_context
    }
}

/// A run of plays without a long inactivity gap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListeningSession {
    pub start_time: DateTime<FixedOffset>,
    pub end_time: DateTime<FixedOffset>,
    pub track_count: usize,
    pub duration_minutes: f64,
    /// Circular mean of local play hours (0-24)
    pub avg_hour: f64,
    pub replay_count: usize,
    /// Fraction of plays whose track had already been heard
    pub replay_rate: f64,
    pub context_switches: u32,
    pub playback: PlaybackProfile,
}

impl ListeningSession {
    /// Build a session from a non-empty slice of time-ordered plays.
    ///
    /// A play counts as a replay when the same track was played earlier
    /// anywhere in `history` or earlier in this slice. Returns `None` for an
    /// empty slice.
    pub fn from_tracks(tracks: &[TrackRecord], history: &PlayHistory) -> Option<Self> {
        let first = tracks.first()?;
        let last = tracks.last()?;

        let mut seen: HashSet<&str> = HashSet::with_capacity(tracks.len());
        let mut replay_count = 0;
        for track in tracks {
            let repeated_here = !seen.insert(track.track_id.as_str());
            if repeated_here || history.played_before(track) {
                replay_count += 1;
            }
        }

        let duration_minutes =
            (last.played_at - first.played_at).num_milliseconds() as f64 / 60_000.0;

        Some(ListeningSession {
            start_time: first.played_at,
            end_time: last.played_at,
            track_count: tracks.len(),
            duration_minutes,
            avg_hour: circular_mean_hour(tracks.iter().map(TrackRecord::local_hour)),
            replay_count,
            replay_rate: replay_count as f64 / tracks.len() as f64,
            context_switches: count_context_switches(tracks),
            playback: PlaybackProfile::from_tracks(tracks),
        })
    }

    /// Local start hour as a fraction
    pub fn start_hour(&self) -> f64 {
        let t = self.start_time.time();
        t.hour() as f64 + t.minute() as f64 / 60.0 + t.second() as f64 / 3600.0
    }
}

/// Transitions between two different known contexts.
///
/// Plays without a context id are skipped, so playlist A, no context,
/// playlist B is one switch.
fn count_context_switches(tracks: &[TrackRecord]) -> u32 {
    let mut switches = 0;
    let mut current: Option<&str> = None;
    for id in tracks.iter().filter_map(|t| t.context_id.as_deref()) {
        if let Some(prev) = current {
            if prev != id {
                switches += 1;
            }
        }
        current = Some(id);
    }
    switches
}

/// Mean hour of day on the 24h circle, so 23:00 and 01:00 average to 00:00.
///
/// Falls back to the arithmetic mean when the hours cancel out. Rounded to
/// 1e-6 to keep window checks stable against trig noise.
pub fn circular_mean_hour(hours: impl IntoIterator<Item = f64>) -> f64 {
    let (mut sin_sum, mut cos_sum, mut plain_sum, mut n) = (0.0, 0.0, 0.0, 0usize);
    for hour in hours {
        let angle = hour / 24.0 * TAU;
        sin_sum += angle.sin();
        cos_sum += angle.cos();
        plain_sum += hour;
        n += 1;
    }
    if n == 0 {
        return 0.0;
    }

    let resultant = (sin_sum * sin_sum + cos_sum * cos_sum).sqrt() / n as f64;
    let mean = if resultant < 1e-9 {
        plain_sum / n as f64
    } else {
        sin_sum.atan2(cos_sum).rem_euclid(TAU) / TAU * 24.0
    };

    let rounded = (mean * 1e6).round() / 1e6;
    if rounded >= 24.0 {
        rounded - 24.0
    } else {
        rounded
    }
}

/// Circular standard deviation of hours, in hours
pub fn circular_spread_hours(hours: impl IntoIterator<Item = f64>) -> f64 {
    let (mut sin_sum, mut cos_sum, mut n) = (0.0, 0.0, 0usize);
    for hour in hours {
        let angle = hour / 24.0 * TAU;
        sin_sum += angle.sin();
        cos_sum += angle.cos();
        n += 1;
    }
    if n == 0 {
        return 0.0;
    }

    let resultant = ((sin_sum * sin_sum + cos_sum * cos_sum).sqrt() / n as f64).min(1.0);
    if resultant <= 0.0 {
        return 12.0;
    }
    let radians = (-2.0 * resultant.ln()).sqrt();
    (radians / TAU * 24.0).min(12.0)
}

/// Shortest distance between two hours on the 24h circle (0-12)
pub fn circular_hour_distance(a: f64, b: f64) -> f64 {
    let diff = (a - b).rem_euclid(24.0);
    diff.min(24.0 - diff)
}
