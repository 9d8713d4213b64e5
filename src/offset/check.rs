//! Offset hit-rate checks.
//!
//! # Coordinate System
//!
//! | Field | Basis | Notes |
//! |-------|-------|-------|
//! | Declared variant positions | 1-based | As written in the identifier |
//! | `declared + delta` | 1-based | Position in the reference sequence |
//! | Internal byte indices | 0-based | `position - 1` |

use std::borrow::Borrow;
use tracing::debug;

use crate::protein::residue_matches;
use crate::variant::ParsedVariant;

/// Outcome of checking one candidate offset against a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OffsetCheck {
    /// At least one checkable substitution disagreed with the sequence
    pub mismatch_found: bool,
    /// `correct / (correct + incorrect)`, 0.0 when nothing was checkable
    pub hit_rate: f64,
    pub correct: usize,
    /// Mismatches plus positions falling outside the sequence
    pub incorrect: usize,
}

impl OffsetCheck {
    /// Number of substitutions that took part in the check.
    pub fn checked(&self) -> usize {
        self.correct + self.incorrect
    }
}

/// Residue of `seq` at a 1-based position, if inside the sequence.
pub(crate) fn residue_at(seq: &[u8], position: i64) -> Option<char> {
    if position < 1 {
        return None;
    }
    seq.get((position - 1) as usize).map(|&b| b as char)
}

/// Check how well `seq` agrees with the declared wild-type residues when every
/// position is shifted by `delta`.
///
/// Only single substitutions take part. Positions outside the sequence count as
/// mismatches.
///
/// # Example
///
/// ```
/// use ferro_mave::offset::check_offset;
/// use ferro_mave::variant::parse_identifier;
///
/// let variants = vec![parse_identifier("p.Met1Leu"), parse_identifier("p.Cys3Ser")];
/// let check = check_offset("MACD", 0, &variants);
/// assert!(!check.mismatch_found);
/// assert_eq!(check.hit_rate, 1.0);
/// ```
pub fn check_offset<V: Borrow<ParsedVariant>>(seq: &str, delta: i64, variants: &[V]) -> OffsetCheck {
    let bytes = seq.as_bytes();
    let mut correct = 0usize;
    let mut incorrect = 0usize;
    let mut reported_mismatch = false;
    let mut reported_out_of_range = false;

    for variant in variants {
        let Some((ref_aa, _, position)) = variant.borrow().substitution() else {
            continue;
        };
        let Some(shifted) = position.checked_add(delta) else {
            incorrect += 1;
            continue;
        };
        match residue_at(bytes, shifted) {
            Some(residue) if residue_matches(ref_aa, residue) => correct += 1,
            Some(residue) => {
                incorrect += 1;
                if !reported_mismatch {
                    reported_mismatch = true;
                    debug!(
                        "Offset {}: {} at {} (declared {}) does not match {}",
                        delta, ref_aa, shifted, position, residue
                    );
                }
            }
            None => {
                incorrect += 1;
                if !reported_out_of_range {
                    reported_out_of_range = true;
                    debug!(
                        "Offset {}: position {} (declared {}) outside sequence of length {}",
                        delta,
                        shifted,
                        position,
                        bytes.len()
                    );
                }
            }
        }
    }

    let total = correct + incorrect;
    OffsetCheck {
        mismatch_found: incorrect > 0,
        hit_rate: if total == 0 {
            0.0
        } else {
            correct as f64 / total as f64
        },
        correct,
        incorrect,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::parse_identifier;

    fn variants(ids: &[&str]) -> Vec<ParsedVariant> {
        ids.iter().map(|id| parse_identifier(id)).collect()
    }

    #[test]
    fn test_all_correct() {
        let check = check_offset("MACD", 0, &variants(&["p.Met1Leu", "p.Asp4Gly"]));
        assert!(!check.mismatch_found);
        assert_eq!(check.correct, 2);
        assert_eq!(check.hit_rate, 1.0);
    }

    #[test]
    fn test_shifted_numbering() {
        let check = check_offset("MACD", -5, &variants(&["p.Met6Leu", "p.Ala7Gly"]));
        assert!(!check.mismatch_found);
        assert_eq!(check.checked(), 2);
    }

    #[test]
    fn test_out_of_range_counts_as_mismatch() {
        let check = check_offset("MACD", 0, &variants(&["p.Met1Leu", "p.Lys9Arg"]));
        assert!(check.mismatch_found);
        assert_eq!(check.hit_rate, 0.5);

        let check = check_offset("MACD", -1, &variants(&["p.Met1Leu"]));
        assert_eq!(check.incorrect, 1);
    }

    #[test]
    fn test_overflowing_shift_counts_as_mismatch() {
        let check = check_offset("MACD", i64::MAX, &variants(&["p.Met1Leu", "p.Ala-1Gly"]));
        assert_eq!(check.incorrect, 2);
        assert!(check.mismatch_found);

        let check = check_offset("MACD", 2, &variants(&["p.Met-1Gly"]));
        assert_eq!(check.correct, 1);
    }

    #[test]
    fn test_non_substitutions_ignored() {
        let check = check_offset(
            "MACD",
            0,
            &variants(&["p.Met1=", "p.Ala2Ter", "p.[Met1Leu;Ala2Gly]", "_wt"]),
        );
        // Ter is a substitution alt; only the nonsense row takes part
        assert_eq!(check.checked(), 1);
        assert!(!check.mismatch_found);
    }

    #[test]
    fn test_nothing_checkable() {
        let check = check_offset::<ParsedVariant>("MACD", 0, &[]);
        assert!(!check.mismatch_found);
        assert_eq!(check.hit_rate, 0.0);
    }

    #[test]
    fn test_case_insensitive_sequence() {
        let check = check_offset("macd", 0, &variants(&["p.Met1Leu"]));
        assert_eq!(check.hit_rate, 1.0);
    }
}
