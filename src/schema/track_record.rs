//! Track play record definitions
//!
//! A track record is one playback observation delivered by the ingestion
//! collaborator. Records arrive either already typed (`TrackRecord`) or in the
//! loosely-typed wire form (`RawPlayRecord`) that is validated here before the
//! engine ever sees it.

use chrono::{DateTime, FixedOffset, Timelike};
use serde::{Deserialize, Serialize};

/// Kind of playback context a track was started from
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextType {
    Playlist,
    Album,
    Artist,
    Collection,
    /// No context reported by the provider
    #[default]
    #[serde(alias = "none")]
    Unknown,
    /// For provider-specific context kinds
    #[serde(untagged)]
    Other(String),
}

impl ContextType {
    pub fn as_str(&self) -> &str {
        match self {
            ContextType::Playlist => "playlist",
            ContextType::Album => "album",
            ContextType::Artist => "artist",
            ContextType::Collection => "collection",
            ContextType::Unknown => "unknown",
            ContextType::Other(name) => name.as_str(),
        }
    }
}

/// Repeat mode reported by the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatMode {
    Off,
    Track,
    Context,
}

impl RepeatMode {
    /// Whether any form of repeat was active
    pub fn is_on(self) -> bool {
        !matches!(self, RepeatMode::Off)
    }
}

/// A single validated playback observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRecord {
    /// When the play happened, in the listener's local offset
    pub played_at: DateTime<FixedOffset>,
    /// Stable track identifier (never empty)
    pub track_id: String,
    /// Primary artist name
    #[serde(default)]
    pub artist: String,
    /// Kind of context the play started from
    #[serde(default)]
    pub context_type: ContextType,
    /// Identifier of the playlist/album/artist context, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
    /// Shuffle flag; `None` means the provider did not report it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shuffle: Option<bool>,
    /// Repeat mode; `None` means the provider did not report it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat: Option<RepeatMode>,
}

impl TrackRecord {
    /// Create a record without context or playback flags
    pub fn new(
        played_at: DateTime<FixedOffset>,
        track_id: impl Into<String>,
        artist: impl Into<String>,
    ) -> Self {
        TrackRecord {
            played_at,
            track_id: track_id.into(),
            artist: artist.into(),
            context_type: ContextType::Unknown,
            context_id: None,
            shuffle: None,
            repeat: None,
        }
    }

    /// Attach the playback context
    pub fn with_context(mut self, context_type: ContextType, context_id: impl Into<String>) -> Self {
        self.context_type = context_type;
        self.context_id = Some(context_id.into());
        self
    }

    /// Attach shuffle/repeat flags
    pub fn with_playback(mut self, shuffle: Option<bool>, repeat: Option<RepeatMode>) -> Self {
        self.shuffle = shuffle;
        self.repeat = repeat;
        self
    }

    /// Local hour of day as a fraction (e.g. 22:30 -> 22.5)
    pub fn local_hour(&self) -> f64 {
        let t = self.played_at.time();
        t.hour() as f64 + t.minute() as f64 / 60.0 + t.second() as f64 / 3600.0
    }
}

/// Loosely-typed play record as delivered on the wire.
///
/// Every field is optional so that missing required data surfaces as a
/// descriptive `ValidationError` instead of a generic parse failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPlayRecord {
    #[serde(default, alias = "timestamp")]
    pub played_at: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub track_id: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub context_type: Option<ContextType>,
    #[serde(default, alias = "context_uri")]
    pub context_id: Option<String>,
    #[serde(default, alias = "shuffle_state")]
    pub shuffle: Option<bool>,
    #[serde(default, alias = "repeat_state")]
    pub repeat: Option<RepeatMode>,
}

impl RawPlayRecord {
    /// Validate required fields and convert into a `TrackRecord`.
    ///
    /// `index` is the record's position in its batch and is carried into the
    /// error for diagnostics.
    pub fn into_record(self, index: usize) -> Result<TrackRecord, ValidationError> {
        let played_at = self
            .played_at
            .ok_or(ValidationError::MissingPlayedAt { index })?;
        let track_id = self.track_id.ok_or(ValidationError::MissingTrackId { index })?;
        if track_id.trim().is_empty() {
            return Err(ValidationError::EmptyTrackId { index });
        }

        Ok(TrackRecord {
            played_at,
            track_id,
            artist: self.artist.unwrap_or_default(),
            context_type: self.context_type.unwrap_or_default(),
            context_id: self.context_id.filter(|id| !id.is_empty()),
            shuffle: self.shuffle,
            repeat: self.repeat,
        })
    }
}

/// Convert a single record outside any batch.
///
/// Errors report `index` 0; use [`RawPlayRecord::into_record`] to carry the
/// record's position in a batch.
impl TryFrom<RawPlayRecord> for TrackRecord {
    type Error = ValidationError;

    fn try_from(raw: RawPlayRecord) -> Result<Self, Self::Error> {
        raw.into_record(0)
    }
}

/// Caller contract violations detected at the ingestion boundary
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("record {index}: missing played_at timestamp")]
    MissingPlayedAt { index: usize },

    #[error("record {index}: missing track_id")]
    MissingTrackId { index: usize },

    #[error("record {index}: track_id is empty")]
    EmptyTrackId { index: usize },

    #[error("record {index}: played_at {current} is earlier than the previous record ({previous})")]
    OutOfOrder {
        index: usize,
        previous: DateTime<FixedOffset>,
        current: DateTime<FixedOffset>,
    },
}

/// Check that an already-typed history honours the record contract:
/// non-empty track ids and non-decreasing timestamps.
pub fn validate_history(records: &[TrackRecord]) -> Result<(), ValidationError> {
    for (index, record) in records.iter().enumerate() {
        if record.track_id.trim().is_empty() {
            return Err(ValidationError::EmptyTrackId { index });
        }
    }
    check_order(records)
}

/// Check that timestamps never go backwards
pub fn check_order(records: &[TrackRecord]) -> Result<(), ValidationError> {
    for (offset, pair) in records.windows(2).enumerate() {
        if pair[1].played_at < pair[0].played_at {
            return Err(ValidationError::OutOfOrder {
                index: offset + 1,
                previous: pair[0].played_at,
                current: pair[1].played_at,
            });
        }
    }
    Ok(())
}
