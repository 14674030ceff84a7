//! Behavioral event detection
//!
//! Events are discrete anomalies found by re-scanning the sessions. Each one
//! is independent; detection never feeds back into classification.

use crate::config::{EventConfig, NightWindow};
use crate::listening::session::{ListeningSession, PlayHistory};
use crate::listening::types::{BehavioralEvent, EventKind};
use crate::schema::TrackRecord;
use chrono::{DateTime, FixedOffset};
use uuid::Uuid;

/// Scans sessions for late-night replays, binges, artist concentration,
/// context-switch sprees and comfort loops
pub struct EventDetector {
    config: EventConfig,
    night_window: NightWindow,
}

impl EventDetector {
    pub fn new(config: EventConfig, night_window: NightWindow) -> Self {
        Self {
            config,
            night_window,
        }
    }

    /// Detect events over `(session, plays)` pairs in history order.
    ///
    /// Output is sorted by timestamp, then event kind.
    pub fn detect<'a>(
        &self,
        sessions: impl IntoIterator<Item = (&'a ListeningSession, &'a [TrackRecord])>,
        history: &PlayHistory,
    ) -> Vec<BehavioralEvent> {
        let sessions: Vec<(&ListeningSession, &[TrackRecord])> = sessions.into_iter().collect();
        let mut events = Vec::new();

        for (index, (session, tracks)) in sessions.iter().enumerate() {
            if let Some(event) = self.late_night_replay(index, session, tracks, history) {
                events.push(event);
            }

            if session.duration_minutes >= self.config.binge_session_minutes {
                events.push(make_event(
                    EventKind::BingeSession,
                    session.start_time,
                    Some(index),
                    None,
                    None,
                    session.duration_minutes / 60.0,
                ));
            }

            if session.context_switches > self.config.context_switch_spree {
                events.push(make_event(
                    EventKind::ContextSwitchSpree,
                    session.start_time,
                    Some(index),
                    None,
                    None,
                    session.context_switches as f64,
                ));
            }

            let playback = &session.playback;
            if session.track_count >= self.config.comfort_loop_min_tracks
                && playback.shuffle_always_off()
                && playback.repeat_on() > 0
            {
                events.push(make_event(
                    EventKind::ComfortLoop,
                    session.start_time,
                    Some(index),
                    None,
                    None,
                    session.duration_minutes,
                ));
            }
        }

        events.extend(self.artist_concentration(&sessions, history));

        events.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.kind.cmp(&b.kind))
                .then_with(|| a.session_index.cmp(&b.session_index))
        });
        log::debug!("detected {} behavioral events", events.len());
        events
    }

    /// Most-replayed track of a late-night session, if replayed often enough
    fn late_night_replay(
        &self,
        index: usize,
        session: &ListeningSession,
        tracks: &[TrackRecord],
        history: &PlayHistory,
    ) -> Option<BehavioralEvent> {
        if !self.night_window.contains(session.avg_hour)
            || session.track_count < self.config.late_night_min_tracks
        {
            return None;
        }

        let mut best: Option<(&TrackRecord, usize)> = None;
        for track in tracks {
            let count = history.play_count(&track.track_id);
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((track, count));
            }
        }

        let (track, count) = best?;
        if count < self.config.late_night_replay_min_plays {
            return None;
        }

        Some(make_event(
            EventKind::LateNightReplay,
            track.played_at,
            Some(index),
            Some(track.track_id.clone()),
            non_empty(&track.artist),
            count as f64,
        ))
    }

    /// Artists above the concentration share, stamped at their last play
    fn artist_concentration(
        &self,
        sessions: &[(&ListeningSession, &[TrackRecord])],
        history: &PlayHistory,
    ) -> Vec<BehavioralEvent> {
        let total = history.total_plays();
        if total < self.config.artist_min_plays {
            return Vec::new();
        }

        let mut events = Vec::new();
        for (artist, count) in history.artists_by_plays() {
            let share = count as f64 / total as f64;
            if share <= self.config.artist_concentration_share {
                break;
            }

            let last_play = sessions.iter().enumerate().rev().find_map(|(index, (_, tracks))| {
                tracks
                    .iter()
                    .rev()
                    .find(|t| t.artist == artist)
                    .map(|t| (index, t.played_at))
            });
            if let Some((index, played_at)) = last_play {
                events.push(make_event(
                    EventKind::ArtistConcentration,
                    played_at,
                    Some(index),
                    None,
                    Some(artist.to_string()),
                    share,
                ));
            }
        }
        events
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn make_event(
    kind: EventKind,
    timestamp: DateTime<FixedOffset>,
    session_index: Option<usize>,
    track_id: Option<String>,
    artist: Option<String>,
    magnitude: f64,
) -> BehavioralEvent {
    let name = format!(
        "{}|{}|{}|{}|{}",
        kind.as_str(),
        timestamp.to_rfc3339(),
        session_index.map_or(String::new(), |i| i.to_string()),
        track_id.as_deref().unwrap_or(""),
        artist.as_deref().unwrap_or("")
    );

    BehavioralEvent {
        event_id: Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()),
        kind,
        timestamp,
        session_index,
        track_id,
        artist,
        magnitude,
    }
}
