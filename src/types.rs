//! Core types for SEI extraction results.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One media sample in decode order, reconstructed from a track fragment.
///
/// Timestamps are in media-timescale units. All timestamp arithmetic is
/// performed in `i64` so that fragments deep into a long timeline do not
/// overflow or lose precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    /// Track the sample belongs to.
    pub track_id: u32,
    /// Sample size in bytes within the paired `mdat` payload.
    pub size: u32,
    /// Sample duration in timescale units.
    pub duration: u32,
    /// Composition time offset (signed, timescale units).
    pub composition_time_offset: i64,
    /// Absolute decode timestamp.
    pub dts: i64,
    /// Absolute presentation timestamp (`dts + composition_time_offset`).
    pub pts: i64,
}

/// Severity of a log record surfaced alongside extraction results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// User-observable data loss or a skipped element.
    Warn,
    /// Informational notice.
    Info,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Info => write!(f, "info"),
        }
    }
}

/// A log record describing a recoverable anomaly encountered during parsing.
///
/// The extractor never raises errors across its façade; anomalies that lose
/// user-observable data are reported here instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Record severity.
    pub level: LogLevel,
    /// Human-readable description.
    pub message: String,
}

impl LogRecord {
    /// Create a warn-level record.
    pub fn warn(message: impl Into<String>) -> Self {
        Self {
            level: LogLevel::Warn,
            message: message.into(),
        }
    }
}

/// A decoded SEI message with its presentation time in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeiEvent {
    /// Presentation time in seconds (sample `pts` divided by the track
    /// timescale).
    pub pts: f64,
    /// SEI payload type (e.g. 4 for `user_data_registered_itu_t_t35`).
    pub payload_type: u32,
    /// Length of `payload` in bytes.
    pub payload_size: u32,
    /// Raw payload bytes; interpretation is left to downstream consumers.
    pub payload: Vec<u8>,
}

/// The result of parsing one segment (plus any cached segments drained in
/// the same call): timestamped SEI events and log records, in emission
/// order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedSei {
    /// SEI events in segment order, then NAL-scan order, then SEI-message
    /// order. No reordering by `pts` is performed.
    pub sei: Vec<SeiEvent>,
    /// Log records collected alongside the events.
    pub logs: Vec<LogRecord>,
}

impl ParsedSei {
    /// True when neither events nor logs were produced.
    pub fn is_empty(&self) -> bool {
        self.sei.is_empty() && self.logs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_display() {
        assert_eq!(format!("{}", LogLevel::Warn), "warn");
        assert_eq!(format!("{}", LogLevel::Info), "info");
    }

    #[test]
    fn test_parsed_sei_is_empty() {
        let mut result = ParsedSei::default();
        assert!(result.is_empty());

        result.logs.push(LogRecord::warn("dropped a NAL"));
        assert!(!result.is_empty());
    }
}
