//! Rejection reasons for tables and experiments.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a table or a whole experiment was dropped.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cause", rename_all = "snake_case")]
pub enum RejectionCause {
    #[error("experiment has no score sets")]
    NoScoreSets,

    #[error("score set {table} has no missense scores")]
    EmptyScores { table: String },

    #[error("no reference or target sequence for score set {table}")]
    NoSequence { table: String },

    #[error("protein of score set {table} too short: {length} < {min}")]
    ProteinTooShort {
        table: String,
        length: usize,
        min: usize,
    },

    #[error("offset {declared} of score set {table} could not be reconciled (best hit rate {hit_rate:.3})")]
    OffsetIrreconcilable {
        table: String,
        declared: i64,
        hit_rate: f64,
    },

    #[error("score set {table} declares conflicting wild-type residues: {detail}")]
    ConflictingWildType { table: String, detail: String },

    #[error("coverage filtered: {cardinality} missense scores, coverage {coverage:.4} < {min_coverage}")]
    LowCoverage {
        cardinality: usize,
        coverage: f64,
        min_coverage: f64,
    },

    #[error("length coverage filtered: {covered} positions, length coverage {length_coverage:.4} < {min_length_coverage}")]
    LowLengthCoverage {
        covered: usize,
        length_coverage: f64,
        min_length_coverage: f64,
    },

    #[error("nonsense std filtered: nonsense std {nonsense_std:.4} vs missense std {missense_std:.4}")]
    HighNonsenseDeviation { nonsense_std: f64, missense_std: f64 },

    #[error("std filtered: normalized missense std {normalized_std:.4} < {std_filter}")]
    LowMissenseDeviation {
        normalized_std: f64,
        std_filter: f64,
    },
}

/// An experiment removed from a dataset, with the cause of removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterReason {
    pub urn: String,
    pub name: String,
    pub cause: RejectionCause,
}

impl FilterReason {
    pub fn new(urn: impl Into<String>, name: impl Into<String>, cause: RejectionCause) -> Self {
        Self {
            urn: urn.into(),
            name: name.into(),
            cause,
        }
    }

    /// Human-readable cause.
    pub fn reason(&self) -> String {
        self.cause.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_text() {
        let reason = FilterReason::new(
            "urn:mavedb:00000001-a",
            "BRCA1",
            RejectionCause::ProteinTooShort {
                table: "urn:mavedb:00000001-a-1".to_string(),
                length: 30,
                min: 50,
            },
        );
        assert_eq!(
            reason.reason(),
            "protein of score set urn:mavedb:00000001-a-1 too short: 30 < 50"
        );
    }
}
