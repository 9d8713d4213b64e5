//! Domain-level stability screens.
//!
//! These screens report one row per mutant domain sequence rather than per
//! identifier, and their scores are already normalized per domain. The helpers
//! here recover the wild-type domain sequence, turn each mutant into a protein
//! identifier, and build experiments that scale with fixed anchors.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::BufRead;
use tracing::{debug, warn};

use crate::dataset::{Experiment, ScoreSet};
use crate::error::FerroError;
use crate::scale::ScaleAnchors;
use crate::score::ScoreTable;
use crate::variant::aac_to_identifier;

/// Fixed reference points of a pre-normalized domain screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainAnchors {
    /// Score of a wild-type-like variant
    pub neutral: f64,
    /// Score of a fully destabilized variant
    pub strong_effect: f64,
    /// Score of a typical stabilizing variant; mirrors `strong_effect` when unset
    pub gain_effect: Option<f64>,
}

impl Default for DomainAnchors {
    fn default() -> Self {
        Self {
            neutral: 0.0,
            strong_effect: -1.0,
            gain_effect: None,
        }
    }
}

impl DomainAnchors {
    pub fn scale_anchors(&self) -> ScaleAnchors {
        ScaleAnchors {
            neutral: self.neutral,
            bottom: self.strong_effect,
            top: self
                .gain_effect
                .unwrap_or(2.0 * self.neutral - self.strong_effect),
        }
    }
}

/// One row of a domain screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainomeRow {
    pub domain_id: String,
    /// `<accession>_<change>`, e.g. `P04637_A12G`
    pub mutation_id: String,
    pub mutant_sequence: String,
    pub score: Option<f64>,
}

impl DomainomeRow {
    /// Accession and one-letter change of the mutation id.
    fn split_mutation(&self) -> Option<(&str, &str)> {
        self.mutation_id.split_once('_')
    }

    /// Declared wild-type residue, when the change has a numeric position.
    fn wild_type_residue(&self) -> Option<char> {
        let (_, aac) = self.split_mutation()?;
        let mut chars = aac.chars();
        let wt = chars.next()?;
        chars.next_back()?;
        let digits = chars.as_str();
        (!digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())).then_some(wt)
    }
}

/// Reconstruct the wild-type sequence from three single mutants.
///
/// Each position takes the residue shared by the mutants. Where all three
/// disagree the declared wild-type residue of the third mutant is used.
pub fn reconstruct_wild_type(samples: &[(char, &str)]) -> Option<String> {
    let [(_, first), (_, second), (third_wt, third)] = samples else {
        return None;
    };
    let length = first.chars().count();
    if second.chars().count() != length || third.chars().count() != length {
        return None;
    }

    let wild_type = first
        .chars()
        .zip(second.chars())
        .zip(third.chars())
        .map(|((a, b), c)| {
            if c == a || c == b {
                c
            } else if a == b {
                a
            } else {
                *third_wt
            }
        })
        .collect();
    Some(wild_type)
}

/// 1-based position of the last residue where `mutant` differs from `wild_type`.
pub fn mutation_position(wild_type: &str, mutant: &str) -> Option<usize> {
    wild_type
        .chars()
        .zip(mutant.chars())
        .enumerate()
        .filter(|(_, (w, m))| w != m)
        .map(|(i, _)| i + 1)
        .last()
}

/// Build one experiment per domain.
///
/// Rows are identified by the mutated position within the reconstructed domain
/// sequence; nonsense rows and rows without a score are dropped.
pub fn build_domain_experiments(rows: &[DomainomeRow]) -> Vec<Experiment> {
    let mut order: Vec<&str> = Vec::new();
    let mut samples: HashMap<&str, Vec<(char, &str)>> = HashMap::new();
    for row in rows {
        let Some(wt) = row.wild_type_residue() else {
            continue;
        };
        let entry = samples.entry(row.domain_id.as_str()).or_insert_with(|| {
            order.push(row.domain_id.as_str());
            Vec::new()
        });
        if entry.len() < 3 {
            entry.push((wt, row.mutant_sequence.as_str()));
        }
    }

    let mut experiments = Vec::new();
    for domain_id in order {
        let Some(wild_type) = samples
            .get(domain_id)
            .and_then(|s| reconstruct_wild_type(s))
        else {
            warn!("{}: fewer than three usable mutants, skipped", domain_id);
            continue;
        };

        let mut accession = None;
        let mut scores: Vec<(String, Option<f64>)> = Vec::new();
        for row in rows.iter().filter(|r| r.domain_id == domain_id) {
            let Some((acc, aac)) = row.split_mutation() else {
                continue;
            };
            if aac.ends_with('*') || row.score.is_none() || row.wild_type_residue().is_none() {
                continue;
            }
            let (Some(wt), Some(mt)) = (aac.chars().next(), aac.chars().last()) else {
                continue;
            };
            let Some(position) = mutation_position(&wild_type, &row.mutant_sequence) else {
                continue;
            };
            if let Some(identifier) = aac_to_identifier(&format!("{}{}{}", wt, position, mt)) {
                accession.get_or_insert_with(|| acc.to_string());
                scores.push((identifier, row.score));
            }
        }

        let name = domain_id.split('_').nth(1).unwrap_or(domain_id);
        let table = ScoreTable::from_rows(domain_id, scores);
        debug!("{}: {} scored mutants", domain_id, table.len());
        let mut experiment = Experiment::new(domain_id, name)
            .with_function_type("Stability")
            .with_domain_anchors(DomainAnchors::default())
            .with_score_set(ScoreSet::new(table).with_target_sequence(wild_type));
        if let Some(accession) = accession {
            experiment = experiment.with_secondary_id(accession);
        }
        experiments.push(experiment);
    }
    experiments
}

/// Read a tab-separated domain screen.
///
/// The header line is skipped. Columns used: 1 domain id, 3 mutation id,
/// 4 mutant sequence, 7 score.
pub fn read_domainome_table<R: BufRead>(reader: R) -> Result<Vec<DomainomeRow>, FerroError> {
    let mut rows = Vec::new();
    for line in reader.lines().skip(1) {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        let (Some(domain_id), Some(mutation_id), Some(mutant_sequence)) =
            (fields.first(), fields.get(2), fields.get(3))
        else {
            debug!("Skipping short domain screen line");
            continue;
        };
        rows.push(DomainomeRow {
            domain_id: domain_id.to_string(),
            mutation_id: mutation_id.to_string(),
            mutant_sequence: mutant_sequence.to_string(),
            score: fields.get(6).and_then(|s| s.trim().parse::<f64>().ok()),
        });
    }
    Ok(rows)
}
