//! Parallel processing support for ferro-mave
//!
//! This module provides parallel variants of parsing and aggregation
//! operations using rayon. Enable with the `parallel` feature.
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(feature = "parallel")]
//! # fn main() {
//! use ferro_mave::aggregate::AggregationEngine;
//! use ferro_mave::parallel::aggregate_parallel;
//! use ferro_mave::reference::NoProvider;
//!
//! let engine = AggregationEngine::new(NoProvider);
//! let results = aggregate_parallel(&engine, &[]);
//! assert!(results.is_empty());
//! # }
//! # #[cfg(not(feature = "parallel"))]
//! # fn main() {}
//! ```

use rayon::prelude::*;

use crate::aggregate::{AggregationEngine, ExperimentAggregate, FilterReason};
use crate::dataset::Experiment;
use crate::reference::SequenceProvider;
use crate::variant::{parse_identifier, ParsedVariant};

/// Parse multiple identifiers in parallel
///
/// Order is preserved.
pub fn parse_identifiers_parallel<S: AsRef<str> + Sync>(identifiers: &[S]) -> Vec<ParsedVariant> {
    identifiers
        .par_iter()
        .map(|s| parse_identifier(s.as_ref()))
        .collect()
}

/// Aggregate multiple experiments in parallel
///
/// Returns one result per experiment, in input order.
pub fn aggregate_parallel<P: SequenceProvider + Sync>(
    engine: &AggregationEngine<P>,
    experiments: &[Experiment],
) -> Vec<Result<ExperimentAggregate, FilterReason>> {
    experiments
        .par_iter()
        .map(|experiment| engine.aggregate(experiment))
        .collect()
}
