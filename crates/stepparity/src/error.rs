//! Library error type.
//!
//! Only hard failures live here. Recoverable conditions (a dropped override, a re-entrant
//! analysis request, an unknown weight key) are reported through return values and logs.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ParityError>;

#[derive(Error, Debug)]
pub enum ParityError {
    /// Pad type not present in the layout catalog.
    #[error("unknown stage layout: {0}")]
    UnknownLayout(String),

    /// The chart has no judged notes, so there is nothing to analyze.
    #[error("chart contains no judged notes")]
    EmptyChart,

    /// JSON payload could not be parsed.
    #[error("malformed payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    #[error("row count mismatch: expected {expected}, found {found}")]
    RowCountMismatch { expected: usize, found: usize },

    #[error("row {row}: expected {expected} columns, found {found}")]
    ColumnCountMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("invalid foot ordinal {0}")]
    InvalidFoot(u8),

    /// Chart generator parameters out of range.
    #[error("invalid generator params: {0}")]
    InvalidParams(String),

    /// Graph export whose node and state lists disagree.
    #[error("inconsistent graph export: {0}")]
    InvalidGraph(String),
}
