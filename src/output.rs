//! Text outputs of a pipeline run.
//!
//! - Scaled FASTA: one record per experiment, variant lines between header and
//!   sequence
//! - Dataset statistics: one tab-separated row per experiment
//! - Filtered entries: one tab-separated line per removed experiment

use std::fmt::Display;
use std::io::Write;
use tracing::{debug, info};

use crate::aggregate::FilterReason;
use crate::dataset::{Dataset, Experiment};
use crate::error::FerroError;

/// Column headers of the statistics table.
pub const STATISTICS_HEADERS: [&str; 14] = [
    "Experiment URN",
    "Protein Length",
    "Dataset Cardinality",
    "Coverage",
    "Length Coverage",
    "Value Range",
    "Normalizer",
    "Missense Mean",
    "Missense Median",
    "Nonsense Mean",
    "Nonsense Median",
    "Missense STD",
    "Normalized Missense STD",
    "Length Normalized Missense STD",
];

/// Options for [`write_scaled_fasta`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FastaOptions {
    /// Write averaged raw missense scores instead of scaled ones
    pub write_unscaled: bool,
}

/// Render an optional value, `None` when absent.
fn opt<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| "None".to_string(), |v| v.to_string())
}

fn fasta_header(experiment: &Experiment) -> String {
    format!(
        ">{}_{}\t<{},{},function_type={}",
        experiment.display_name(),
        experiment.urn,
        experiment.urn,
        opt(experiment.secondary_id.as_deref()),
        opt(experiment.function_type.as_deref()),
    )
}

/// Write the scaled FASTA and, optionally, a header-and-sequence companion.
///
/// Variant lines are ordered by position, then identifier. Experiments without
/// scores are skipped. Returns the number of records written.
///
/// ```text
/// >NAME_URN\t<URN,SECONDARY_ID,function_type=TYPE
/// <p.Met1Leu #scaled_effect:0.5
/// MACD
/// ```
pub fn write_scaled_fasta<W: Write>(
    out: &mut W,
    mut sequences_only: Option<&mut dyn Write>,
    dataset: &Dataset,
    options: FastaOptions,
) -> Result<usize, FerroError> {
    let mut written = 0usize;
    for experiment in &dataset.experiments {
        let Some(aggregate) = &experiment.aggregate else {
            debug!("No aggregate for {}", experiment.urn);
            continue;
        };
        let scores = if options.write_unscaled {
            &aggregate.missense.averaged
        } else {
            match &experiment.scaled {
                Some(scaled) => &scaled.scores,
                None => {
                    debug!("No scaled scores for {}", experiment.urn);
                    continue;
                }
            }
        };
        if scores.is_empty() {
            debug!("Scores empty for {}", experiment.urn);
            continue;
        }

        let header = fasta_header(experiment);
        writeln!(out, "{}", header)?;

        let mut lines: Vec<(Option<i64>, &str, f64)> = scores
            .iter()
            .map(|(id, &score)| {
                let position = aggregate.missense.positions.get(id).copied();
                (position, id.as_str(), score)
            })
            .collect();
        lines.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));
        for (_, id, score) in lines {
            writeln!(out, "<{} #scaled_effect:{}", id, score)?;
        }
        writeln!(out, "{}", aggregate.sequence)?;

        if let Some(seq_out) = sequences_only.as_deref_mut() {
            writeln!(seq_out, "{}", header)?;
            writeln!(seq_out, "{}", aggregate.sequence)?;
        }
        written += 1;
    }
    info!("Wrote {} FASTA records", written);
    Ok(written)
}

/// Write the per-experiment statistics table.
///
/// Experiments whose missense scores are all identical are skipped. Returns the
/// number of rows written.
pub fn write_dataset_statistics<W: Write>(out: &mut W, dataset: &Dataset) -> Result<usize, FerroError> {
    writeln!(out, "{}", STATISTICS_HEADERS.join("\t"))?;
    let mut written = 0usize;
    for experiment in &dataset.experiments {
        let Some(aggregate) = &experiment.aggregate else {
            continue;
        };
        let Some(missense) = aggregate.missense.stats else {
            continue;
        };
        if missense.min == missense.max {
            info!("Min val equals max val for {}", experiment.urn);
            continue;
        }

        let nonsense = aggregate.nonsense.stats;
        let row = [
            format!("{}_{}", experiment.display_name(), experiment.urn),
            aggregate.protein_length().to_string(),
            aggregate.missense.len().to_string(),
            aggregate.coverage().to_string(),
            aggregate.length_coverage().to_string(),
            format!("[{} : {}]", missense.min, missense.max),
            opt(aggregate.normalizer()),
            missense.mean.to_string(),
            missense.median.to_string(),
            opt(nonsense.map(|s| s.mean)),
            opt(nonsense.map(|s| s.median)),
            missense.std.to_string(),
            opt(aggregate.normalized_missense_std()),
            opt(aggregate.length_normalized_missense_std()),
        ];
        writeln!(out, "{}", row.join("\t"))?;
        written += 1;
    }
    Ok(written)
}

/// Write one `urn<TAB>name<TAB>reason` line per filtered experiment.
pub fn write_filtered_entries<W: Write>(out: &mut W, filtered: &[FilterReason]) -> Result<(), FerroError> {
    for reason in filtered {
        writeln!(out, "{}\t{}\t{}", reason.urn, reason.name, reason.reason())?;
    }
    Ok(())
}
