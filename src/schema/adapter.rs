//! Adapter for turning raw play records into a validated listening history
//!
//! Parsing and validation are separate steps: `parse_array`/`parse_ndjson` only
//! deserialize, `into_history` enforces the record contract and ordering.

use crate::error::InferenceError;
use crate::schema::track_record::{check_order, RawPlayRecord, TrackRecord, ValidationError};

/// Adapter for converting raw play records to track records
pub struct HistoryAdapter;

impl HistoryAdapter {
    /// Deserialize a JSON array of raw play records; no validation yet
    pub fn parse_array(json: &str) -> Result<Vec<RawPlayRecord>, InferenceError> {
        serde_json::from_str(json).map_err(InferenceError::from)
    }

    /// Deserialize one raw play record per line, ignoring blank lines.
    ///
    /// Errors name the 1-based line that failed.
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<RawPlayRecord>, InferenceError> {
        ndjson
            .lines()
            .enumerate()
            .map(|(offset, line)| (offset + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty())
            .map(|(line_no, line)| {
                serde_json::from_str(line).map_err(|e| {
                    InferenceError::ParseError(format!("play record on line {line_no}: {e}"))
                })
            })
            .collect()
    }

    /// Validate every record and the ordering, returning the typed history.
    ///
    /// Stops at the first violation.
    pub fn into_history(records: Vec<RawPlayRecord>) -> Result<Vec<TrackRecord>, ValidationError> {
        let history = records
            .into_iter()
            .enumerate()
            .map(|(index, raw)| raw.into_record(index))
            .collect::<Result<Vec<_>, _>>()?;

        check_order(&history)?;
        log::debug!("accepted {} play records", history.len());
        Ok(history)
    }

    /// Parse and validate a JSON array in one step
    pub fn history_from_json(json: &str) -> Result<Vec<TrackRecord>, InferenceError> {
        let raw = Self::parse_array(json)?;
        Ok(Self::into_history(raw)?)
    }

    /// Validate a batch of records, reporting every problem instead of the first
    pub fn validate_records(records: &[RawPlayRecord]) -> Vec<ValidationResult> {
        let mut results = Vec::new();
        let mut previous = None;

        for (index, raw) in records.iter().enumerate() {
            let track_id = raw.track_id.clone();
            match raw.clone().into_record(index) {
                Ok(record) => {
                    if let Some(prev) = previous {
                        if record.played_at < prev {
                            results.push(ValidationResult {
                                index,
                                track_id,
                                error: ValidationError::OutOfOrder {
                                    index,
                                    previous: prev,
                                    current: record.played_at,
                                },
                            });
                        }
                    }
                    previous = Some(record.played_at);
                }
                Err(error) => results.push(ValidationResult {
                    index,
                    track_id,
                    error,
                }),
            }
        }

        results
    }
}

/// A single failed record from `validate_records`
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub index: usize,
    pub track_id: Option<String>,
    pub error: ValidationError,
}
