//! Experiments, score sets and datasets.
//!
//! An [`Experiment`] groups the score tables measured against one protein. A
//! [`Dataset`] is the collection the pipeline runs over: aggregation removes
//! experiments that fail a filter, scaling fills in the normalized scores.
//!
//! Datasets are exchanged as a JSON bundle ([`DatasetBundle`]), optionally
//! gzip-compressed.

use flate2::read::MultiGzDecoder;
use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::aggregate::{AggregationEngine, ExperimentAggregate, FilterReason};
use crate::domainome::DomainAnchors;
use crate::error::FerroError;
use crate::reference::{ReferenceSequence, SequenceProvider};
use crate::scale::{ScaleEngine, ScaledScoreSet};
use crate::score::ScoreTable;

/// One score table with the metadata needed to place it on a reference.
#[derive(Debug, Clone)]
pub struct ScoreSet {
    pub urn: String,
    pub table: ScoreTable,
    /// Offset declared by the table metadata
    pub declared_offset: i64,
    /// Sequence of the assayed construct, used when no reference fits
    pub target_sequence: Option<String>,
    /// Full reference protein shipped with the metadata
    pub reference: Option<ReferenceSequence>,
}

impl ScoreSet {
    pub fn new(table: ScoreTable) -> Self {
        Self {
            urn: table.id().to_string(),
            table,
            declared_offset: 0,
            target_sequence: None,
            reference: None,
        }
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.declared_offset = offset;
        self
    }

    pub fn with_target_sequence(mut self, sequence: impl Into<String>) -> Self {
        self.target_sequence = Some(sequence.into());
        self
    }

    pub fn with_reference(mut self, reference: ReferenceSequence) -> Self {
        self.reference = Some(reference);
        self
    }
}

/// A group of score tables measured against one protein.
///
/// # Example
///
/// ```
/// use ferro_mave::dataset::{Experiment, ScoreSet};
/// use ferro_mave::score::ScoreTable;
///
/// let table = ScoreTable::from_rows("urn:mavedb:00000001-a-1", vec![("p.Met1Leu", Some(0.2))]);
/// let experiment = Experiment::new("urn:mavedb:00000001-a", "TP53 abundance")
///     .with_function_type("Abundance")
///     .with_score_set(ScoreSet::new(table).with_target_sequence("MACD"));
/// assert_eq!(experiment.display_name(), "TP53_abundance");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Experiment {
    pub urn: String,
    pub name: String,
    pub function_type: Option<String>,
    /// Identifier of the same experiment in a second collection
    pub secondary_id: Option<String>,
    pub score_sets: Vec<ScoreSet>,
    /// Pre-baked anchors; experiments carrying them are scaled with these
    pub domain_anchors: Option<DomainAnchors>,
    pub aggregate: Option<ExperimentAggregate>,
    pub scaled: Option<ScaledScoreSet>,
}

impl Experiment {
    pub fn new(urn: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            urn: urn.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_function_type(mut self, function_type: impl Into<String>) -> Self {
        self.function_type = Some(function_type.into());
        self
    }

    pub fn with_secondary_id(mut self, id: impl Into<String>) -> Self {
        self.secondary_id = Some(id.into());
        self
    }

    pub fn with_score_set(mut self, score_set: ScoreSet) -> Self {
        self.score_sets.push(score_set);
        self
    }

    pub fn with_domain_anchors(mut self, anchors: DomainAnchors) -> Self {
        self.domain_anchors = Some(anchors);
        self
    }

    /// Name safe for FASTA headers: no spaces or semicolons.
    pub fn display_name(&self) -> String {
        self.name
            .replace(' ', "_")
            .replace('β', "beta")
            .replace(';', "")
    }
}

/// The experiments a pipeline run works on.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub experiments: Vec<Experiment>,
}

impl Dataset {
    pub fn new(experiments: Vec<Experiment>) -> Self {
        Self { experiments }
    }

    pub fn push(&mut self, experiment: Experiment) {
        self.experiments.push(experiment);
    }

    pub fn len(&self) -> usize {
        self.experiments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.experiments.is_empty()
    }

    /// Look up an experiment by URN.
    pub fn get(&self, urn: &str) -> Result<&Experiment, FerroError> {
        self.experiments
            .iter()
            .find(|e| e.urn == urn)
            .ok_or_else(|| FerroError::ExperimentNotFound {
                urn: urn.to_string(),
            })
    }

    /// Aggregate every experiment, removing those that fail.
    ///
    /// Returns the reasons for every removed experiment in dataset order.
    pub fn aggregate_all<P: SequenceProvider>(
        &mut self,
        engine: &AggregationEngine<P>,
        progress: Option<&ProgressBar>,
    ) -> Vec<FilterReason> {
        let results: Vec<_> = self
            .experiments
            .iter()
            .map(|experiment| {
                let result = engine.aggregate(experiment);
                if let Some(pb) = progress {
                    pb.inc(1);
                }
                result
            })
            .collect();
        self.apply_results(results)
    }

    /// Aggregate experiments concurrently. Results match [`Dataset::aggregate_all`].
    #[cfg(feature = "parallel")]
    pub fn aggregate_all_parallel<P: SequenceProvider + Sync>(
        &mut self,
        engine: &AggregationEngine<P>,
    ) -> Vec<FilterReason> {
        let results = crate::parallel::aggregate_parallel(engine, &self.experiments);
        self.apply_results(results)
    }

    fn apply_results(
        &mut self,
        results: Vec<Result<ExperimentAggregate, FilterReason>>,
    ) -> Vec<FilterReason> {
        let mut filtered = Vec::new();
        let mut kept = Vec::with_capacity(self.experiments.len());
        for (mut experiment, result) in self.experiments.drain(..).zip(results) {
            match result {
                Ok(aggregate) => {
                    experiment.aggregate = Some(aggregate);
                    kept.push(experiment);
                }
                Err(reason) => {
                    warn!("Filtered {} ({}): {}", reason.urn, reason.name, reason.reason());
                    filtered.push(reason);
                }
            }
        }
        self.experiments = kept;
        info!(
            "{} experiments aggregated, {} filtered",
            self.experiments.len(),
            filtered.len()
        );
        filtered
    }

    /// Scale every aggregated experiment with missense scores.
    ///
    /// Returns the number of experiments scaled.
    pub fn scale_all(&mut self, engine: &ScaleEngine) -> usize {
        let mut scaled = 0usize;
        for experiment in &mut self.experiments {
            let Some(aggregate) = &experiment.aggregate else {
                continue;
            };
            if aggregate.missense.is_empty() {
                continue;
            }
            let result = match &experiment.domain_anchors {
                Some(anchors) => engine.scale_domainome(aggregate, anchors),
                None => engine.scale(aggregate),
            };
            match result {
                Ok(set) => {
                    experiment.scaled = Some(set);
                    scaled += 1;
                }
                Err(e) => warn!("Scaling failed for {}: {}", experiment.urn, e),
            }
        }
        scaled
    }

    /// Read a JSON bundle.
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, FerroError> {
        let bundle: DatasetBundle = serde_json::from_reader(reader)?;
        Ok(Self::from(bundle))
    }

    /// Read a JSON bundle from disk; `.gz` files are decompressed.
    pub fn from_path(path: &Path) -> Result<Self, FerroError> {
        let file = File::open(path).map_err(|e| FerroError::Io {
            msg: format!("Failed to open {}: {}", path.display(), e),
        })?;
        let is_gzipped = path.extension().map(|ext| ext == "gz").unwrap_or(false);
        let dataset = if is_gzipped {
            Self::from_json_reader(BufReader::new(MultiGzDecoder::new(file)))?
        } else {
            Self::from_json_reader(BufReader::new(file))?
        };
        debug!(
            "Read {} experiments from {}",
            dataset.len(),
            path.display()
        );
        Ok(dataset)
    }
}

/// Serialized form of a [`Dataset`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetBundle {
    pub experiments: Vec<ExperimentRecord>,
}

/// Serialized form of an [`Experiment`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentRecord {
    pub urn: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_id: Option<String>,
    #[serde(default)]
    pub score_sets: Vec<ScoreSetRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_anchors: Option<DomainAnchors>,
}

/// Serialized form of a [`ScoreSet`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSetRecord {
    pub urn: String,
    #[serde(default)]
    pub offset: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_sequence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<ReferenceSequence>,
    pub scores: Vec<ScoreRow>,
}

/// One row of a score table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRow {
    pub hgvs_pro: String,
    pub score: Option<f64>,
}

impl From<ScoreSetRecord> for ScoreSet {
    fn from(record: ScoreSetRecord) -> Self {
        let rows = record
            .scores
            .into_iter()
            .map(|row| (row.hgvs_pro, row.score));
        Self {
            table: ScoreTable::from_rows(record.urn.clone(), rows),
            urn: record.urn,
            declared_offset: record.offset,
            target_sequence: record.target_sequence,
            reference: record.reference,
        }
    }
}

impl From<ExperimentRecord> for Experiment {
    fn from(record: ExperimentRecord) -> Self {
        Self {
            urn: record.urn,
            name: record.name,
            function_type: record.function_type,
            secondary_id: record.secondary_id,
            score_sets: record.score_sets.into_iter().map(ScoreSet::from).collect(),
            domain_anchors: record.domain_anchors,
            aggregate: None,
            scaled: None,
        }
    }
}

impl From<DatasetBundle> for Dataset {
    fn from(bundle: DatasetBundle) -> Self {
        Self::new(bundle.experiments.into_iter().map(Experiment::from).collect())
    }
}
