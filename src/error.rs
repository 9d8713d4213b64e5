//! Error types for ferro-mave
//!
//! This module provides error handling with:
//! - Error codes for categorization
//! - Structured fields for the offending identifier, position or experiment
//!
//! Parse anomalies are not errors: unparsable identifiers become
//! [`VariantRecord::Invalid`](crate::variant::VariantRecord::Invalid). The variants
//! here cover conditions that make a table, an experiment or a run unusable.

use std::fmt;
use thiserror::Error;

/// Error codes for categorizing errors
///
/// These codes can be used for programmatic error handling
/// and for documentation lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    // Parse errors (E1xxx)
    /// Range notation without a recognised edit keyword
    MissingRangeKeyword = 1001,
    /// Position wider than the parser accepts
    InvalidPosition = 1002,

    // Reference errors (E2xxx)
    /// Reference protein sequence not found
    SequenceNotFound = 2001,

    // Offset errors (E3xxx)
    /// No candidate offset cleared the hit-rate floor
    OffsetIrreconcilable = 3001,
    /// Two variants declare different wild-type residues at one position
    ConflictingWildType = 3002,

    // Aggregation and scaling errors (E4xxx)
    /// No usable scores
    EmptyDistribution = 4001,
    /// Experiment not found
    ExperimentNotFound = 4002,

    // IO errors (E9xxx)
    /// File IO error
    IoError = 9001,
    /// JSON parsing error
    JsonError = 9002,
    /// Configuration error
    ConfigError = 9003,
}

impl ErrorCode {
    /// Get the error code as a string (e.g., "E1001")
    pub fn as_str(&self) -> String {
        format!("E{:04}", *self as u16)
    }

    /// Get a brief description of this error code
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::MissingRangeKeyword => "range without del/ins/delins/dup keyword",
            ErrorCode::InvalidPosition => "position out of range",
            ErrorCode::SequenceNotFound => "sequence not available",
            ErrorCode::OffsetIrreconcilable => "offset could not be reconciled",
            ErrorCode::ConflictingWildType => "conflicting wild-type residues",
            ErrorCode::EmptyDistribution => "no scores to work with",
            ErrorCode::ExperimentNotFound => "experiment not found",
            ErrorCode::IoError => "file I/O error",
            ErrorCode::JsonError => "JSON parsing error",
            ErrorCode::ConfigError => "configuration error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for ferro-mave operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FerroError {
    /// Parse error with position and message
    #[error("Parse error at position {pos} in '{input}': {msg}")]
    Parse {
        input: String,
        pos: usize,
        msg: String,
        code: ErrorCode,
    },

    /// Reference protein sequence is not available
    #[error("Protein sequence not available for {accession}")]
    SequenceNotFound { accession: String },

    /// Two variants disagree on the wild-type residue at the same position
    #[error(
        "Conflicting wild-type residues at position {position}: {first} vs {second}"
    )]
    ConflictingWildType {
        position: i64,
        first: char,
        second: char,
    },

    /// No candidate offset cleared the hit-rate floor
    #[error("Offset {declared} could not be reconciled (best hit rate {hit_rate:.3})")]
    OffsetIrreconcilable { declared: i64, hit_rate: f64 },

    /// A distribution had nothing to work with
    #[error("No scores available for {what}")]
    EmptyDistribution { what: String },

    /// Experiment lookup failed
    #[error("Experiment not found: {urn}")]
    ExperimentNotFound { urn: String },

    /// IO error (for file operations)
    #[error("IO error: {msg}")]
    Io { msg: String },

    /// JSON parsing error
    #[error("JSON error: {msg}")]
    Json { msg: String },

    /// Configuration error
    #[error("Config error: {msg}")]
    Config { msg: String },
}

impl FerroError {
    /// Create a parse error
    pub fn parse(input: impl Into<String>, pos: usize, msg: impl Into<String>, code: ErrorCode) -> Self {
        FerroError::Parse {
            input: input.into(),
            pos,
            msg: msg.into(),
            code,
        }
    }

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            FerroError::Parse { code, .. } => *code,
            FerroError::SequenceNotFound { .. } => ErrorCode::SequenceNotFound,
            FerroError::ConflictingWildType { .. } => ErrorCode::ConflictingWildType,
            FerroError::OffsetIrreconcilable { .. } => ErrorCode::OffsetIrreconcilable,
            FerroError::EmptyDistribution { .. } => ErrorCode::EmptyDistribution,
            FerroError::ExperimentNotFound { .. } => ErrorCode::ExperimentNotFound,
            FerroError::Io { .. } => ErrorCode::IoError,
            FerroError::Json { .. } => ErrorCode::JsonError,
            FerroError::Config { .. } => ErrorCode::ConfigError,
        }
    }

    /// Error message prefixed with its code, e.g. `[E3002] Conflicting ...`
    pub fn detailed_message(&self) -> String {
        format!("[{}] {}", self.code(), self)
    }
}

impl From<std::io::Error> for FerroError {
    fn from(err: std::io::Error) -> Self {
        FerroError::Io {
            msg: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for FerroError {
    fn from(err: serde_json::Error) -> Self {
        FerroError::Json {
            msg: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for FerroError {
    fn from(err: toml::de::Error) -> Self {
        FerroError::Config {
            msg: err.to_string(),
        }
    }
}
