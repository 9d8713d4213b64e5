//! Tagged variant records.
//!
//! A record keeps every non-positional character of the identifier it came from,
//! so writing it back with `Display` reproduces the input exactly and shifting it
//! only touches the numbers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Edit keyword found in a range (`_`) identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeEdit {
    Deletion,
    Insertion,
    Delins,
    Duplication,
}

impl RangeEdit {
    /// The keyword as it appears in HGVS notation.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Deletion => "del",
            Self::Insertion => "ins",
            Self::Delins => "delins",
            Self::Duplication => "dup",
        }
    }
}

/// One decoded variant segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VariantRecord {
    /// Single amino acid substitution (`Met1Leu`, `Arg5Ter`)
    Substitution {
        ref_aa: String,
        alt_aa: String,
        position: i64,
    },
    /// Frameshift (`Arg97fs`, `Arg97Glyfs*16`, `Arg97ProfsTer23`)
    Frameshift {
        ref_aa: String,
        /// Residue between the position and `fs`, often empty
        alt_aa: String,
        position: i64,
        /// Everything after `fs`, e.g. `*16`; empty when absent
        shift_tail: String,
    },
    /// Range edit (`Lys2_Met4del`, `Lys2_Leu3insAla`)
    IndelRange {
        ref_aa_left: String,
        pos_left: i64,
        /// Keyword text attached to the left half, usually empty
        left_tail: String,
        ref_aa_right: String,
        pos_right: i64,
        edit: RangeEdit,
        /// Keyword and inserted residues following the right half
        tail: String,
    },
    /// Same residue as reference (`Met1=`)
    Synonymous { ref_aa: String, position: i64 },
    /// Substitution to the unspecified residue (`Met1Xaa`)
    Unknown { ref_aa: String, position: i64 },
    /// Text that could not be decoded, kept verbatim
    Invalid { raw_text: String },
}

impl VariantRecord {
    /// Create an invalid record from raw text.
    pub fn invalid(raw: impl Into<String>) -> Self {
        Self::Invalid {
            raw_text: raw.into(),
        }
    }

    /// Leftmost position of the record, if it has one.
    pub fn position(&self) -> Option<i64> {
        match self {
            Self::Substitution { position, .. }
            | Self::Frameshift { position, .. }
            | Self::Synonymous { position, .. }
            | Self::Unknown { position, .. } => Some(*position),
            Self::IndelRange { pos_left, .. } => Some(*pos_left),
            Self::Invalid { .. } => None,
        }
    }

    /// Returns true for records that could not be decoded.
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid { .. })
    }

    /// Copy of this record with every position moved by `delta`.
    ///
    /// A shift that would overflow leaves the record unchanged.
    pub fn shifted(&self, delta: i64) -> Self {
        let mut record = self.clone();
        match &mut record {
            Self::Substitution { position, .. }
            | Self::Frameshift { position, .. }
            | Self::Synonymous { position, .. }
            | Self::Unknown { position, .. } => match position.checked_add(delta) {
                Some(moved) => *position = moved,
                None => return self.clone(),
            },
            Self::IndelRange {
                pos_left,
                pos_right,
                ..
            } => match (pos_left.checked_add(delta), pos_right.checked_add(delta)) {
                (Some(left), Some(right)) => {
                    *pos_left = left;
                    *pos_right = right;
                }
                _ => return self.clone(),
            },
            Self::Invalid { .. } => {}
        }
        record
    }
}

impl fmt::Display for VariantRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Substitution {
                ref_aa,
                alt_aa,
                position,
            } => write!(f, "{}{}{}", ref_aa, position, alt_aa),
            Self::Frameshift {
                ref_aa,
                alt_aa,
                position,
                shift_tail,
            } => write!(f, "{}{}{}fs{}", ref_aa, position, alt_aa, shift_tail),
            Self::IndelRange {
                ref_aa_left,
                pos_left,
                left_tail,
                ref_aa_right,
                pos_right,
                tail,
                ..
            } => write!(
                f,
                "{}{}{}_{}{}{}",
                ref_aa_left, pos_left, left_tail, ref_aa_right, pos_right, tail
            ),
            Self::Synonymous { ref_aa, position } => write!(f, "{}{}=", ref_aa, position),
            Self::Unknown { ref_aa, position } => write!(f, "{}{}Xaa", ref_aa, position),
            Self::Invalid { raw_text } => write!(f, "{}", raw_text),
        }
    }
}

/// Single segment or bracketed list of segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", content = "records", rename_all = "snake_case")]
pub enum VariantBody {
    Single(VariantRecord),
    /// `[seg1;seg2;...]`, order preserved
    Compound(Vec<VariantRecord>),
}

/// A fully decomposed identifier.
///
/// `accession` is the optional `NP_000509.1:` qualifier and `prefix` the
/// two-character precursor tag (`p.`) shared by every segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedVariant {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accession: Option<String>,
    pub prefix: String,
    pub body: VariantBody,
}

impl ParsedVariant {
    /// The record of a single-segment identifier.
    pub fn record(&self) -> Option<&VariantRecord> {
        match &self.body {
            VariantBody::Single(record) => Some(record),
            VariantBody::Compound(_) => None,
        }
    }

    /// All records, one for single identifiers.
    pub fn records(&self) -> &[VariantRecord] {
        match &self.body {
            VariantBody::Single(record) => std::slice::from_ref(record),
            VariantBody::Compound(records) => records,
        }
    }

    /// Declared reference residue and position of a single substitution.
    pub fn substitution(&self) -> Option<(&str, &str, i64)> {
        match self.record()? {
            VariantRecord::Substitution {
                ref_aa,
                alt_aa,
                position,
            } => Some((ref_aa.as_str(), alt_aa.as_str(), *position)),
            _ => None,
        }
    }

    /// Leftmost position of a single-segment identifier.
    pub fn position(&self) -> Option<i64> {
        self.record().and_then(VariantRecord::position)
    }

    /// Copy with every embedded position moved by `delta`.
    pub fn shifted(&self, delta: i64) -> Self {
        let body = match &self.body {
            VariantBody::Single(record) => VariantBody::Single(record.shifted(delta)),
            VariantBody::Compound(records) => {
                VariantBody::Compound(records.iter().map(|r| r.shifted(delta)).collect())
            }
        };
        Self {
            accession: self.accession.clone(),
            prefix: self.prefix.clone(),
            body,
        }
    }

    /// Rebuild the identifier with every position moved by `delta`.
    pub fn apply_offset(&self, delta: i64) -> String {
        if delta == 0 {
            return self.to_string();
        }
        self.shifted(delta).to_string()
    }
}

impl fmt::Display for ParsedVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(accession) = &self.accession {
            write!(f, "{}:", accession)?;
        }
        write!(f, "{}", self.prefix)?;
        match &self.body {
            VariantBody::Single(record) => write!(f, "{}", record),
            VariantBody::Compound(records) => {
                write!(f, "[")?;
                for (i, record) in records.iter().enumerate() {
                    if i > 0 {
                        write!(f, ";")?;
                    }
                    write!(f, "{}", record)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Apply an offset to a parsed identifier.
pub fn apply_offset(variant: &ParsedVariant, delta: i64) -> String {
    variant.apply_offset(delta)
}
