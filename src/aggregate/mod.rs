//! Experiment-level aggregation.
//!
//! Each score table of an experiment is placed on its reference protein (see
//! [`crate::offset`]), its identifiers are shifted to reference numbering, and
//! the scores of all accepted tables are pooled and averaged per identifier.
//! Quality filters then decide whether the experiment is kept.

pub mod filter;
pub mod stats;

pub use filter::{FilterReason, RejectionCause};
pub use stats::{median, pearson, pearson_test, population_std, Correlation, SummaryStats};

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::config::{AggregationPolicy, PipelineConfig};
use crate::dataset::{Experiment, ScoreSet};
use crate::error::FerroError;
use crate::offset::{OffsetResolver, OffsetStrategy};
use crate::protein::AminoAcid;
use crate::reference::SequenceProvider;
use crate::score::Partition;
use crate::variant::ParsedVariant;

/// Scores of one variant class, pooled over tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreClass {
    /// Every score seen per shifted identifier, in table order
    pub raw: HashMap<String, Vec<f64>>,
    /// Mean of `raw` per identifier
    pub averaged: HashMap<String, f64>,
    /// Reference position of each identifier that has one
    pub positions: HashMap<String, i64>,
    pub stats: Option<SummaryStats>,
}

impl ScoreClass {
    fn push(&mut self, identifier: &str, score: f64, position: Option<i64>) {
        self.raw
            .entry(identifier.to_string())
            .or_default()
            .push(score);
        if let Some(position) = position {
            self.positions.insert(identifier.to_string(), position);
        }
    }

    fn finalize(&mut self) {
        self.averaged = self
            .raw
            .iter()
            .filter_map(|(id, scores)| stats::mean(scores).map(|m| (id.clone(), m)))
            .collect();
        let values: Vec<f64> = self.averaged.values().copied().collect();
        self.stats = SummaryStats::from_values(&values);
    }

    /// Number of distinct identifiers.
    pub fn len(&self) -> usize {
        self.averaged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.averaged.is_empty()
    }

    pub fn get(&self, identifier: &str) -> Option<f64> {
        self.averaged.get(identifier).copied()
    }

    /// Averaged values in no particular order.
    pub fn values(&self) -> Vec<f64> {
        self.averaged.values().copied().collect()
    }

    pub fn median(&self) -> Option<f64> {
        self.stats.map(|s| s.median)
    }
}

/// Mean score of substitutions to one residue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub residue: String,
    pub count: usize,
    pub mean: Option<f64>,
}

/// How one table was placed on its reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSummary {
    pub urn: String,
    pub offset: i64,
    pub hit_rate: f64,
    pub used_fallback: bool,
    pub strategy: Option<OffsetStrategy>,
    pub repaired: bool,
    pub entries: usize,
}

/// Pooled scores and statistics of one experiment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperimentAggregate {
    /// Corrected sequence of the first accepted table
    pub sequence: String,
    pub all: ScoreClass,
    pub missense: ScoreClass,
    pub nonsense: ScoreClass,
    pub synonymous: ScoreClass,
    /// Distinct positions with at least one missense score
    pub covered_positions: usize,
    pub baselines: Vec<Baseline>,
    pub tables: Vec<TableSummary>,
    pub rejected_tables: Vec<RejectionCause>,
}

impl ExperimentAggregate {
    pub fn protein_length(&self) -> usize {
        self.sequence.len()
    }

    /// Observed fraction of the `length * 19` possible substitutions.
    pub fn coverage(&self) -> f64 {
        let possible = self.protein_length() * 19;
        if possible == 0 {
            return 0.0;
        }
        self.missense.len() as f64 / possible as f64
    }

    /// Fraction of positions with at least one missense score.
    pub fn length_coverage(&self) -> f64 {
        if self.protein_length() == 0 {
            return 0.0;
        }
        self.covered_positions as f64 / self.protein_length() as f64
    }

    /// Effect size used to normalize the missense spread.
    ///
    /// The nonsense to synonymous median distance when both exist, otherwise the
    /// missense value range.
    pub fn normalizer(&self) -> Option<f64> {
        match (self.nonsense.median(), self.synonymous.median()) {
            (Some(nonsense), Some(synonymous)) => Some((nonsense - synonymous).abs()),
            _ => self.missense.stats.map(|s| s.range()),
        }
    }

    /// Missense standard deviation divided by [`Self::normalizer`].
    pub fn normalized_missense_std(&self) -> Option<f64> {
        let std = self.missense.stats?.std;
        let normalizer = self.normalizer()?;
        (normalizer > 0.0).then(|| std / normalizer)
    }

    /// Missense standard deviation divided by the missense value range.
    pub fn length_normalized_missense_std(&self) -> Option<f64> {
        let stats = self.missense.stats?;
        (stats.range() > 0.0).then(|| stats.std / stats.range())
    }

    /// Pearson correlation of averaged nonsense scores with their positions.
    pub fn nonsense_position_correlation(&self) -> Option<Correlation> {
        let (positions, scores): (Vec<f64>, Vec<f64>) = self
            .nonsense
            .averaged
            .iter()
            .filter_map(|(id, score)| {
                self.nonsense
                    .positions
                    .get(id)
                    .map(|&p| (p as f64, *score))
            })
            .unzip();
        pearson_test(&positions, &scores)
    }

    /// Mean baseline score of one residue.
    pub fn baseline(&self, residue: &str) -> Option<f64> {
        self.baselines
            .iter()
            .find(|b| b.residue.eq_ignore_ascii_case(residue))
            .and_then(|b| b.mean)
    }
}

/// A table placed on its reference, ready to be pooled.
struct PlacedTable<'a> {
    set: &'a ScoreSet,
    offset: i64,
    sequence: String,
    summary: TableSummary,
}

/// Pools the score tables of an experiment and applies quality filters.
///
/// # Example
///
/// ```
/// use ferro_mave::aggregate::AggregationEngine;
/// use ferro_mave::dataset::{Experiment, ScoreSet};
/// use ferro_mave::reference::NoProvider;
/// use ferro_mave::score::ScoreTable;
///
/// let table = ScoreTable::from_rows("set-1", vec![("p.Met11Leu", Some(-0.5))]);
/// let experiment = Experiment::new("exp-1", "Example")
///     .with_score_set(ScoreSet::new(table).with_offset(-10).with_target_sequence("MACD"));
///
/// let engine = AggregationEngine::new(NoProvider);
/// let aggregate = engine.aggregate(&experiment).unwrap();
/// assert_eq!(aggregate.missense.get("p.Met1Leu"), Some(-0.5));
/// ```
#[derive(Debug, Clone)]
pub struct AggregationEngine<P: SequenceProvider> {
    provider: P,
    policy: AggregationPolicy,
    resolver: OffsetResolver,
}

impl<P: SequenceProvider> AggregationEngine<P> {
    /// Create an engine with default policy and resolver settings.
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            policy: AggregationPolicy::default(),
            resolver: OffsetResolver::default(),
        }
    }

    /// Create an engine from a pipeline configuration.
    pub fn from_config(provider: P, config: &PipelineConfig) -> Self {
        Self {
            provider,
            policy: config.aggregation.clone(),
            resolver: OffsetResolver::new(config.resolver.clone()),
        }
    }

    pub fn with_policy(mut self, policy: AggregationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_resolver(mut self, resolver: OffsetResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn policy(&self) -> &AggregationPolicy {
        &self.policy
    }

    /// Aggregate one experiment.
    ///
    /// Tables that cannot be placed are skipped; when every table is skipped,
    /// or a quality filter fails, the experiment is rejected.
    pub fn aggregate(&self, experiment: &Experiment) -> Result<ExperimentAggregate, FilterReason> {
        let reject = |cause: RejectionCause| {
            FilterReason::new(experiment.urn.clone(), experiment.name.clone(), cause)
        };

        let mut placed = Vec::new();
        let mut rejected_tables = Vec::new();
        for set in &experiment.score_sets {
            match self.place_table(set) {
                Ok(table) => placed.push(table),
                Err(cause) => {
                    warn!("{}: score set skipped: {}", experiment.urn, cause);
                    rejected_tables.push(cause);
                }
            }
        }

        if placed.is_empty() {
            let cause = rejected_tables
                .pop()
                .unwrap_or(RejectionCause::NoScoreSets);
            return Err(reject(cause));
        }

        let fallback = placed.iter().filter(|t| t.summary.used_fallback).count();
        if fallback > 0 && fallback < placed.len() {
            warn!(
                "{}: {} of {} tables placed on their target sequence, pooled identifiers mix coordinate frames",
                experiment.urn,
                fallback,
                placed.len()
            );
        }

        let mut aggregate = self.pool(&placed);
        aggregate.rejected_tables = rejected_tables;

        self.apply_filters(&aggregate).map_err(reject)?;

        info!(
            "{}: {} tables pooled, {} missense scores over {} of {} positions",
            experiment.urn,
            aggregate.tables.len(),
            aggregate.missense.len(),
            aggregate.covered_positions,
            aggregate.protein_length()
        );
        Ok(aggregate)
    }

    /// Choose a sequence for one table and resolve its offset.
    fn place_table<'a>(&self, set: &'a ScoreSet) -> Result<PlacedTable<'a>, RejectionCause> {
        let table = &set.table;
        let missense: Vec<&ParsedVariant> = table.missense().map(|e| &e.variant).collect();
        if missense.is_empty() {
            return Err(RejectionCause::EmptyScores {
                table: set.urn.clone(),
            });
        }

        let provided = table.protein_accession().and_then(|accession| {
            self.provider
                .protein_sequence(accession)
                .map_err(|e| debug!("{}: {}", set.urn, e))
                .ok()
        });
        let (sequence, declared) = match provided.or_else(|| set.reference.clone()) {
            Some(reference) => {
                let declared = reference.offset.unwrap_or(set.declared_offset);
                (reference.sequence, declared)
            }
            None => match &set.target_sequence {
                Some(target) => (target.clone(), 0),
                None => {
                    return Err(RejectionCause::NoSequence {
                        table: set.urn.clone(),
                    })
                }
            },
        };

        if let Some(min) = self.policy.min_protein_length {
            if sequence.len() < min {
                return Err(RejectionCause::ProteinTooShort {
                    table: set.urn.clone(),
                    length: sequence.len(),
                    min,
                });
            }
        }

        let resolution = self.resolver.resolve(
            &sequence,
            declared,
            &missense,
            set.target_sequence.as_deref(),
        );

        let (Some(offset), Some(corrected)) = (resolution.offset, resolution.corrected_seq) else {
            return Err(match resolution.failure {
                Some(e @ FerroError::ConflictingWildType { .. }) => {
                    RejectionCause::ConflictingWildType {
                        table: set.urn.clone(),
                        detail: e.to_string(),
                    }
                }
                _ => RejectionCause::OffsetIrreconcilable {
                    table: set.urn.clone(),
                    declared,
                    hit_rate: resolution.hit_rate,
                },
            });
        };

        Ok(PlacedTable {
            set,
            offset,
            sequence: corrected,
            summary: TableSummary {
                urn: set.urn.clone(),
                offset,
                hit_rate: resolution.hit_rate,
                used_fallback: resolution.used_fallback,
                strategy: resolution.strategy,
                repaired: resolution.repaired,
                entries: table.len(),
            },
        })
    }

    /// Shift and pool the scores of all placed tables.
    fn pool(&self, placed: &[PlacedTable<'_>]) -> ExperimentAggregate {
        let mut aggregate = ExperimentAggregate {
            sequence: placed
                .first()
                .map(|t| t.sequence.clone())
                .unwrap_or_default(),
            ..Default::default()
        };

        let residues: Vec<(String, Option<AminoAcid>)> = self
            .policy
            .baseline_residues
            .iter()
            .map(|r| (r.clone(), AminoAcid::from_three_letter(r)))
            .collect();
        let mut baseline_scores: Vec<Vec<f64>> = vec![Vec::new(); residues.len()];

        for table in placed {
            for entry in table.set.table.entries() {
                let shifted = entry.variant.shifted(table.offset);
                let identifier = shifted.to_string();
                let position = shifted.position();

                aggregate.all.push(&identifier, entry.score, position);
                match entry.partition {
                    Partition::Missense => {
                        aggregate.missense.push(&identifier, entry.score, position);
                        if let Some((ref_aa, alt_aa, _)) = shifted.substitution() {
                            for (i, (name, residue)) in residues.iter().enumerate() {
                                if is_substitution_to(ref_aa, alt_aa, name, *residue) {
                                    baseline_scores[i].push(entry.score);
                                }
                            }
                        }
                    }
                    Partition::Nonsense => {
                        aggregate.nonsense.push(&identifier, entry.score, position)
                    }
                    Partition::Synonymous => {
                        aggregate.synonymous.push(&identifier, entry.score, position)
                    }
                    Partition::Other => {}
                }
            }
            aggregate.tables.push(table.summary.clone());
        }

        for class in [
            &mut aggregate.all,
            &mut aggregate.missense,
            &mut aggregate.nonsense,
            &mut aggregate.synonymous,
        ] {
            class.finalize();
        }

        aggregate.covered_positions = aggregate
            .missense
            .positions
            .values()
            .collect::<HashSet<_>>()
            .len();

        aggregate.baselines = residues
            .into_iter()
            .zip(baseline_scores)
            .map(|((residue, _), scores)| Baseline {
                residue,
                count: scores.len(),
                mean: stats::mean(&scores),
            })
            .collect();

        aggregate
    }

    /// Apply the configured filters in order, stopping at the first failure.
    fn apply_filters(&self, aggregate: &ExperimentAggregate) -> Result<(), RejectionCause> {
        let policy = &self.policy;
        let length = aggregate.protein_length() as f64;
        let cardinality = aggregate.missense.len();

        if let Some(min_coverage) = policy.min_coverage {
            if (cardinality as f64) < length * 19.0 * min_coverage {
                return Err(RejectionCause::LowCoverage {
                    cardinality,
                    coverage: aggregate.coverage(),
                    min_coverage,
                });
            }
        }

        if let Some(min_length_coverage) = policy.min_length_coverage {
            let covered = aggregate.covered_positions;
            if (covered as f64) < length * min_length_coverage
                && covered < policy.reasonable_length_coverage
            {
                return Err(RejectionCause::LowLengthCoverage {
                    covered,
                    length_coverage: aggregate.length_coverage(),
                    min_length_coverage,
                });
            }
        }

        let missense_std = aggregate.missense.stats.map_or(0.0, |s| s.std);

        if policy.nonsense_std_filter {
            if let Some(nonsense) = aggregate.nonsense.stats {
                if let Some(correlation) = aggregate.nonsense_position_correlation() {
                    match correlation.p_value {
                        Some(p) => debug!(
                            "Nonsense score / position correlation {:.3} (p = {:.3e}, n = {})",
                            correlation.r, p, correlation.n
                        ),
                        None => debug!(
                            "Nonsense score / position correlation {:.3} (n = {})",
                            correlation.r, correlation.n
                        ),
                    }
                }
                if nonsense.std * policy.nonsense_std_factor > missense_std {
                    return Err(RejectionCause::HighNonsenseDeviation {
                        nonsense_std: nonsense.std,
                        missense_std,
                    });
                }
            }
        }

        if let Some(std_filter) = policy.std_filter {
            let normalized_std = aggregate.normalized_missense_std().unwrap_or(0.0);
            if normalized_std < std_filter {
                return Err(RejectionCause::LowMissenseDeviation {
                    normalized_std,
                    std_filter,
                });
            }
        }

        Ok(())
    }
}

/// Substitution from any other residue to `residue`.
fn is_substitution_to(ref_aa: &str, alt_aa: &str, name: &str, residue: Option<AminoAcid>) -> bool {
    match residue {
        Some(residue) => {
            AminoAcid::from_three_letter(alt_aa) == Some(residue)
                && AminoAcid::from_three_letter(ref_aa) != Some(residue)
        }
        None => alt_aa.eq_ignore_ascii_case(name) && !ref_aa.eq_ignore_ascii_case(name),
    }
}
