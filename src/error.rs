//! Error types for fmp4-sei.

use thiserror::Error;

/// Result type for fmp4-sei operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for fmp4-sei operations.
///
/// These errors never cross the [`SeiExtractor`](crate::SeiExtractor)
/// façade: a fragment that fails to decode is skipped and reported as a
/// log record in the parse result.
#[derive(Debug, Error)]
pub enum Error {
    /// A box ended before its mandatory fields.
    #[error("truncated {box_type} box: need {need} bytes, have {have}")]
    Truncated {
        box_type: &'static str,
        need: usize,
        have: usize,
    },
}
