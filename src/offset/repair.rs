//! Reference sequence repair.

use std::borrow::Borrow;
use std::collections::HashMap;
use tracing::debug;

use crate::error::FerroError;
use crate::protein::AminoAcid;
use crate::variant::ParsedVariant;

/// Overwrite reference residues with the wild-type declared by the table.
///
/// Positions are shifted by `delta` first. Declared positions falling outside
/// the sequence and unknown residue codes are skipped. Two substitutions
/// declaring different residues at one position make the table unusable.
///
/// # Example
///
/// ```
/// use ferro_mave::offset::repair_sequence;
/// use ferro_mave::variant::parse_identifier;
///
/// let variants = vec![parse_identifier("p.Met1Leu"), parse_identifier("p.Gly2Ser")];
/// assert_eq!(repair_sequence("MACD", 0, &variants).unwrap(), "MGCD");
/// ```
pub fn repair_sequence<V: Borrow<ParsedVariant>>(
    seq: &str,
    delta: i64,
    variants: &[V],
) -> Result<String, FerroError> {
    let mut declared: HashMap<i64, char> = HashMap::new();
    for variant in variants {
        let Some((ref_aa, _, position)) = variant.borrow().substitution() else {
            continue;
        };
        let Some(aa) = AminoAcid::from_three_letter(ref_aa) else {
            continue;
        };
        let residue = aa.to_one_letter();
        let Some(shifted) = position.checked_add(delta) else {
            continue;
        };
        match declared.get(&shifted) {
            Some(&first) if first != residue => {
                return Err(FerroError::ConflictingWildType {
                    position: shifted,
                    first,
                    second: residue,
                });
            }
            Some(_) => {}
            None => {
                declared.insert(shifted, residue);
            }
        }
    }

    let mut bytes = seq.as_bytes().to_vec();
    let mut changed = 0usize;
    for (&position, &residue) in &declared {
        if position < 1 || position as usize > bytes.len() {
            continue;
        }
        let slot = &mut bytes[(position - 1) as usize];
        if !slot.eq_ignore_ascii_case(&(residue as u8)) {
            *slot = residue as u8;
            changed += 1;
        }
    }

    if changed > 0 {
        debug!("Repaired {} residues of a {} residue reference", changed, bytes.len());
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
