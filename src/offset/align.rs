//! Alignment-derived offsets.
//!
//! The declared wild-type residues of a table are laid out on a scaffold
//! spanning the smallest to the largest declared position, with unobserved
//! positions filled by a placeholder. The scaffold is aligned semiglobally
//! against the reference: the scaffold must align end to end, the reference
//! may overhang on both sides. The number of reference residues clipped before
//! the scaffold gives the offset.

use bio::alignment::pairwise::Aligner;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::protein::AminoAcid;
use crate::variant::ParsedVariant;

/// Scaffolds wider than this are treated as corrupt numbering.
const MAX_SCAFFOLD_SPAN: i64 = 100_000;

/// Scoring used when aligning a scaffold to the reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AlignmentScoring {
    pub match_score: i32,
    pub mismatch_score: i32,
    pub gap_open: i32,
    pub gap_extend: i32,
    /// Score of any pair involving the placeholder
    pub placeholder_score: i32,
    pub placeholder: char,
}

impl Default for AlignmentScoring {
    fn default() -> Self {
        Self {
            match_score: 1,
            mismatch_score: -1,
            gap_open: -5,
            gap_extend: -1,
            placeholder_score: 0,
            placeholder: 'X',
        }
    }
}

/// Wild-type residues laid out by declared position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scaffold {
    /// One residue per position from `start`, placeholders where unobserved
    pub sequence: String,
    /// Declared position of the first scaffold residue
    pub start: i64,
    /// Number of positions with an observed residue
    pub observed: usize,
}

/// Build the wild-type scaffold from the declared substitutions.
///
/// Unknown residue codes are left as placeholders. When two variants declare
/// different residues at one position the first one wins.
pub fn extract_seq<V: Borrow<ParsedVariant>>(variants: &[V], placeholder: char) -> Option<Scaffold> {
    let mut residues: HashMap<i64, char> = HashMap::new();
    for variant in variants {
        let Some((ref_aa, _, position)) = variant.borrow().substitution() else {
            continue;
        };
        let Some(aa) = AminoAcid::from_three_letter(ref_aa) else {
            continue;
        };
        residues.entry(position).or_insert(aa.to_one_letter());
    }

    let start = *residues.keys().min()?;
    let end = *residues.keys().max()?;
    if end.checked_sub(start).map_or(true, |span| span >= MAX_SCAFFOLD_SPAN) {
        warn!(
            "Declared positions span {}..{}, skipping alignment",
            start, end
        );
        return None;
    }

    let sequence: String = (start..=end)
        .map(|position| residues.get(&position).copied().unwrap_or(placeholder))
        .collect();

    Some(Scaffold {
        sequence,
        start,
        observed: residues.len(),
    })
}

/// Offset implied by aligning `scaffold` against `reference`.
pub fn alignment_offset(reference: &str, scaffold: &Scaffold, scoring: &AlignmentScoring) -> Option<i64> {
    if reference.is_empty() || scaffold.sequence.is_empty() {
        return None;
    }

    let x = scaffold.sequence.as_bytes();
    let y = reference.as_bytes();
    let placeholder = scoring.placeholder as u8;
    let (match_score, mismatch_score, placeholder_score) = (
        scoring.match_score,
        scoring.mismatch_score,
        scoring.placeholder_score,
    );
    let score = move |a: u8, b: u8| -> i32 {
        if a == placeholder || b == placeholder {
            placeholder_score
        } else if a.eq_ignore_ascii_case(&b) {
            match_score
        } else {
            mismatch_score
        }
    };

    let mut aligner = Aligner::with_capacity(x.len(), y.len(), scoring.gap_open, scoring.gap_extend, score);
    let alignment = aligner.semiglobal(x, y);
    let offset = (alignment.ystart as i64).checked_sub(scaffold.start.checked_sub(1)?)?;
    debug!(
        "Scaffold of {} residues aligned at reference index {} (score {}), offset {}",
        x.len(),
        alignment.ystart,
        alignment.score,
        offset
    );
    Some(offset)
}

/// Extract the scaffold and align it in one step.
pub fn find_alignment_offset<V: Borrow<ParsedVariant>>(
    reference: &str,
    variants: &[V],
    scoring: &AlignmentScoring,
) -> Option<i64> {
    let scaffold = extract_seq(variants, scoring.placeholder)?;
    alignment_offset(reference, &scaffold, scoring)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::parse_identifier;

    fn variants(ids: &[&str]) -> Vec<ParsedVariant> {
        ids.iter().map(|id| parse_identifier(id)).collect()
    }

    #[test]
    fn test_extract_seq() {
        let scaffold = extract_seq(
            &variants(&["p.Glu12Gly", "p.Lys10Arg", "p.Lys10Met", "p.Leu14Pro"]),
            'X',
        )
        .unwrap();
        assert_eq!(scaffold.sequence, "KXEXL");
        assert_eq!(scaffold.start, 10);
        assert_eq!(scaffold.observed, 3);
    }

    #[test]
    fn test_extract_seq_empty() {
        assert!(extract_seq(&variants(&["p.Met1=", "_wt"]), 'X').is_none());
    }

    #[test]
    fn test_alignment_offset() {
        // Reference residues 4..=8 are "KWEYL", declared as 10..=14
        let reference = "MSTKWEYLPQRV";
        let ids = ["p.Lys10Arg", "p.Glu12Gly", "p.Leu14Pro"];
        let offset = find_alignment_offset(reference, &variants(&ids), &AlignmentScoring::default());
        assert_eq!(offset, Some(-6));
    }

    #[test]
    fn test_alignment_offset_identity() {
        let reference = "MACDEFGHIK";
        let ids = ["p.Met1Leu", "p.Cys3Ser", "p.Glu5Gly", "p.Gly7Ala"];
        let offset = find_alignment_offset(reference, &variants(&ids), &AlignmentScoring::default());
        assert_eq!(offset, Some(0));
    }
}
