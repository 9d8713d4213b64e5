//! Amino acid residue codes.
//!
//! Score tables declare wild-type residues with three-letter codes (`Met`, `MET`),
//! while reference sequences use one-letter codes. The lookup tables here are
//! built once and shared read-only by the parser, the offset resolver and the
//! aggregation engine.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Amino acid enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AminoAcid {
    Ala, // A
    Arg, // R
    Asn, // N
    Asp, // D
    Cys, // C
    Gln, // Q
    Glu, // E
    Gly, // G
    His, // H
    Ile, // I
    Leu, // L
    Lys, // K
    Met, // M
    Phe, // F
    Pro, // P
    Pyl, // O (pyrrolysine)
    Sec, // U (selenocysteine)
    Ser, // S
    Thr, // T
    Trp, // W
    Tyr, // Y
    Val, // V
    Ter, // * (stop codon)
    Xaa, // X (unknown)
}

impl AminoAcid {
    /// All residues, in declaration order.
    pub const ALL: [AminoAcid; 24] = [
        Self::Ala,
        Self::Arg,
        Self::Asn,
        Self::Asp,
        Self::Cys,
        Self::Gln,
        Self::Glu,
        Self::Gly,
        Self::His,
        Self::Ile,
        Self::Leu,
        Self::Lys,
        Self::Met,
        Self::Phe,
        Self::Pro,
        Self::Pyl,
        Self::Sec,
        Self::Ser,
        Self::Thr,
        Self::Trp,
        Self::Tyr,
        Self::Val,
        Self::Ter,
        Self::Xaa,
    ];

    /// Parse from a 3-letter code, ignoring case (`Met`, `MET` and `met` all match).
    ///
    /// `Unk` is accepted as an alias of `Xaa`.
    pub fn from_three_letter(s: &str) -> Option<Self> {
        THREE_TO_AA.get(s.to_ascii_uppercase().as_str()).copied()
    }

    /// Get 3-letter code
    pub fn to_three_letter(&self) -> &'static str {
        match self {
            Self::Ala => "Ala",
            Self::Arg => "Arg",
            Self::Asn => "Asn",
            Self::Asp => "Asp",
            Self::Cys => "Cys",
            Self::Gln => "Gln",
            Self::Glu => "Glu",
            Self::Gly => "Gly",
            Self::His => "His",
            Self::Ile => "Ile",
            Self::Leu => "Leu",
            Self::Lys => "Lys",
            Self::Met => "Met",
            Self::Phe => "Phe",
            Self::Pro => "Pro",
            Self::Pyl => "Pyl",
            Self::Sec => "Sec",
            Self::Ser => "Ser",
            Self::Thr => "Thr",
            Self::Trp => "Trp",
            Self::Tyr => "Tyr",
            Self::Val => "Val",
            Self::Ter => "Ter",
            Self::Xaa => "Xaa",
        }
    }

    /// Get 1-letter code
    pub fn to_one_letter(&self) -> char {
        match self {
            Self::Ala => 'A',
            Self::Arg => 'R',
            Self::Asn => 'N',
            Self::Asp => 'D',
            Self::Cys => 'C',
            Self::Gln => 'Q',
            Self::Glu => 'E',
            Self::Gly => 'G',
            Self::His => 'H',
            Self::Ile => 'I',
            Self::Leu => 'L',
            Self::Lys => 'K',
            Self::Met => 'M',
            Self::Phe => 'F',
            Self::Pro => 'P',
            Self::Pyl => 'O',
            Self::Sec => 'U',
            Self::Ser => 'S',
            Self::Thr => 'T',
            Self::Trp => 'W',
            Self::Tyr => 'Y',
            Self::Val => 'V',
            Self::Ter => '*',
            Self::Xaa => 'X',
        }
    }

    /// Parse from 1-letter code.
    ///
    /// Reference sequences retrieved from sequence services are sometimes lower
    /// case, so both cases are accepted.
    pub fn from_one_letter(c: char) -> Option<Self> {
        ONE_TO_AA.get(&c.to_ascii_uppercase()).copied()
    }

    /// True for the twenty standard residues (no stop, no ambiguity codes).
    pub fn is_standard(&self) -> bool {
        !matches!(self, Self::Pyl | Self::Sec | Self::Ter | Self::Xaa)
    }
}

impl fmt::Display for AminoAcid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_three_letter())
    }
}

/// Upper-case three-letter code to residue.
static THREE_TO_AA: Lazy<HashMap<String, AminoAcid>> = Lazy::new(|| {
    let mut map: HashMap<String, AminoAcid> = AminoAcid::ALL
        .iter()
        .map(|aa| (aa.to_three_letter().to_ascii_uppercase(), *aa))
        .collect();
    map.insert("UNK".to_string(), AminoAcid::Xaa);
    map
});

/// Upper-case one-letter code to residue.
static ONE_TO_AA: Lazy<HashMap<char, AminoAcid>> = Lazy::new(|| {
    AminoAcid::ALL
        .iter()
        .map(|aa| (aa.to_one_letter(), *aa))
        .collect()
});

/// Convert a three-letter code to its one-letter code.
pub fn three_to_one(code: &str) -> Option<char> {
    AminoAcid::from_three_letter(code).map(|aa| aa.to_one_letter())
}

/// Convert a one-letter code to its three-letter code.
pub fn one_to_three(code: char) -> Option<&'static str> {
    AminoAcid::from_one_letter(code).map(|aa| aa.to_three_letter())
}

/// Compare a declared three-letter residue against a one-letter sequence residue.
pub fn residue_matches(declared: &str, seq_residue: char) -> bool {
    match (
        AminoAcid::from_three_letter(declared),
        AminoAcid::from_one_letter(seq_residue),
    ) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
