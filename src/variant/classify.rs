//! Fast variant type classification from raw identifier text.
//!
//! Used to partition score tables into missense, nonsense and synonymous buckets
//! without a full structural parse. The structural parser remains the authority
//! for anything positional.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse variant class of an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantType {
    Synonymous,
    Unknown,
    Nonsense,
    Multi,
    Frameshift,
    Indel,
    Deletion,
    Insertion,
    Duplication,
    Sav,
}

impl VariantType {
    /// Name used in logs and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Synonymous => "synonymous",
            Self::Unknown => "unknown",
            Self::Nonsense => "nonsense",
            Self::Multi => "multi",
            Self::Frameshift => "frameshift",
            Self::Indel => "indel",
            Self::Deletion => "deletion",
            Self::Insertion => "insertion",
            Self::Duplication => "duplication",
            Self::Sav => "sav",
        }
    }
}

impl fmt::Display for VariantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a raw identifier by suffix and substring heuristics.
///
/// # Example
///
/// ```
/// use ferro_mave::variant::{get_variant_type, VariantType};
///
/// assert_eq!(get_variant_type("p.Met1Leu"), VariantType::Sav);
/// assert_eq!(get_variant_type("p.Arg5Ter"), VariantType::Nonsense);
/// assert_eq!(get_variant_type("p.Arg5="), VariantType::Synonymous);
/// ```
pub fn get_variant_type(identifier: &str) -> VariantType {
    let body = identifier
        .split_once(':')
        .map_or(identifier, |(_, rest)| rest);

    if body.is_empty() {
        return VariantType::Unknown;
    }

    if body == "_wt" || body == "_sy" || body == "p.(=)" || body.ends_with('=') {
        return VariantType::Synonymous;
    }

    if body.ends_with('?') || body.ends_with('*') {
        return VariantType::Unknown;
    }

    if body.ends_with("Ter") || body.starts_with("p.Ter") {
        return VariantType::Nonsense;
    }

    if body.ends_with(']') {
        return VariantType::Multi;
    }

    if body.contains("fs*") || body.contains("fsTer") || body.ends_with("fs") {
        return VariantType::Frameshift;
    }

    if body.contains("delins") {
        return VariantType::Indel;
    }

    if body.contains("del") {
        return VariantType::Deletion;
    }

    if body.contains("ins") {
        return VariantType::Insertion;
    }

    if body.contains("dup") {
        return VariantType::Duplication;
    }

    VariantType::Sav
}
