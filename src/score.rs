//! In-memory score tables.
//!
//! A [`ScoreTable`] holds one experimental measurement table: variant identifier
//! to score, with every identifier parsed and partitioned once at construction.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::variant::{get_variant_type, parse_identifier, ParsedVariant, VariantType};

/// Bucket a score is placed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    Missense,
    Nonsense,
    Synonymous,
    /// Frameshifts, indels, multi-variants and unknowns
    Other,
}

impl From<VariantType> for Partition {
    fn from(variant_type: VariantType) -> Self {
        match variant_type {
            VariantType::Sav => Partition::Missense,
            VariantType::Nonsense => Partition::Nonsense,
            VariantType::Synonymous => Partition::Synonymous,
            _ => Partition::Other,
        }
    }
}

/// One scored variant.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreEntry {
    pub identifier: String,
    pub variant: ParsedVariant,
    pub variant_type: VariantType,
    pub partition: Partition,
    pub score: f64,
}

/// One experimental score table.
#[derive(Debug, Clone, Default)]
pub struct ScoreTable {
    id: String,
    entries: Vec<ScoreEntry>,
    index: HashMap<String, usize>,
}

impl ScoreTable {
    /// Build a table from `(identifier, score)` rows.
    ///
    /// Rows without a score (`None` or NaN) are dropped. A repeated identifier
    /// keeps the last value seen.
    pub fn from_rows<I, S>(id: impl Into<String>, rows: I) -> Self
    where
        I: IntoIterator<Item = (S, Option<f64>)>,
        S: AsRef<str>,
    {
        let id = id.into();
        let mut entries: Vec<ScoreEntry> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut skipped = 0usize;

        for (identifier, score) in rows {
            let identifier = identifier.as_ref().trim();
            let score = match score {
                Some(s) if !s.is_nan() && !identifier.is_empty() => s,
                _ => {
                    skipped += 1;
                    continue;
                }
            };

            if let Some(&i) = index.get(identifier) {
                debug!("{}: duplicate identifier {} replaced", id, identifier);
                entries[i].score = score;
                continue;
            }

            let variant_type = get_variant_type(identifier);
            index.insert(identifier.to_string(), entries.len());
            entries.push(ScoreEntry {
                identifier: identifier.to_string(),
                variant: parse_identifier(identifier),
                variant_type,
                partition: Partition::from(variant_type),
                score,
            });
        }

        if skipped > 0 {
            debug!("{}: skipped {} rows without a score", id, skipped);
        }

        Self { id, entries, index }
    }

    /// Table identifier (score set URN).
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Score of an identifier.
    pub fn get(&self, identifier: &str) -> Option<f64> {
        self.index.get(identifier).map(|&i| self.entries[i].score)
    }

    /// All entries in first-seen order.
    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }

    /// Entries of one partition.
    pub fn partition(&self, partition: Partition) -> impl Iterator<Item = &ScoreEntry> {
        self.entries
            .iter()
            .filter(move |entry| entry.partition == partition)
    }

    pub fn missense(&self) -> impl Iterator<Item = &ScoreEntry> {
        self.partition(Partition::Missense)
    }

    pub fn nonsense(&self) -> impl Iterator<Item = &ScoreEntry> {
        self.partition(Partition::Nonsense)
    }

    pub fn synonymous(&self) -> impl Iterator<Item = &ScoreEntry> {
        self.partition(Partition::Synonymous)
    }

    pub fn other(&self) -> impl Iterator<Item = &ScoreEntry> {
        self.partition(Partition::Other)
    }

    /// Accession embedded in the first missense identifier that carries one.
    pub fn protein_accession(&self) -> Option<&str> {
        self.missense()
            .find_map(|entry| entry.variant.accession.as_deref())
    }
}
