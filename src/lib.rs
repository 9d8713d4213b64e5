// Copyright (c) 2024-2025 Fulcrum Genomics LLC
// SPDX-License-Identifier: MIT

//! ferro-mave: MAVE score table harmonization
//!
//! Part of the ferro bioinformatics toolkit.
//!
//! Multiplexed assays of variant effect report scores keyed by protein variant
//! identifiers whose numbering often disagrees with the canonical protein. This
//! crate places every score table on its reference protein, pools the tables of
//! an experiment, filters weak experiments and rescales the rest onto a common
//! axis.
//!
//! # Example
//!
//! ```
//! use ferro_mave::{AggregationEngine, Experiment, NoProvider, ScaleEngine, ScoreSet, ScoreTable};
//!
//! let table = ScoreTable::from_rows(
//!     "urn:mavedb:00000001-a-1",
//!     vec![
//!         ("p.Met6Leu", Some(-2.0)),
//!         ("p.Ala7Gly", Some(-1.0)),
//!         ("p.Cys8Ser", Some(0.0)),
//!         ("p.Cys8=", Some(0.0)),
//!     ],
//! );
//! let experiment = Experiment::new("urn:mavedb:00000001-a", "Example")
//!     .with_score_set(ScoreSet::new(table).with_target_sequence("MACD"));
//!
//! let aggregate = AggregationEngine::new(NoProvider).aggregate(&experiment).unwrap();
//! assert_eq!(aggregate.missense.get("p.Met1Leu"), Some(-2.0));
//!
//! let scaled = ScaleEngine::default().scale(&aggregate).unwrap();
//! assert_eq!(scaled.get("p.Met1Leu"), Some(0.0));
//! ```

pub mod aggregate;
pub mod config;
pub mod dataset;
pub mod domainome;
pub mod error;
pub mod offset;
pub mod output;
#[cfg(feature = "parallel")]
pub mod parallel;
pub mod protein;
pub mod reference;
pub mod scale;
pub mod score;
pub mod variant;

// Re-export commonly used types
pub use aggregate::{AggregationEngine, ExperimentAggregate, FilterReason, RejectionCause};
pub use config::{AggregationPolicy, PipelineConfig, ResolverConfig, ScalePolicy};
pub use dataset::{Dataset, Experiment, ScoreSet};
pub use error::{ErrorCode, FerroError};
pub use offset::{check_offset, OffsetResolution, OffsetResolver, OffsetStrategy};
pub use reference::{InMemoryProvider, NoProvider, ReferenceSequence, SequenceProvider};
pub use scale::{ScaleEngine, ScaledScoreSet};
pub use score::ScoreTable;
pub use variant::{apply_offset, get_variant_type, parse_identifier, ParsedVariant, VariantType};

/// Result type alias for ferro-mave operations
pub type Result<T> = std::result::Result<T, FerroError>;
