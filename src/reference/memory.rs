//! In-memory sequence provider

use bio::io::fasta;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::FerroError;
use crate::reference::provider::{ReferenceSequence, SequenceProvider};

/// Protein sequences held in a map keyed by accession.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    proteins: HashMap<String, ReferenceSequence>,
}

impl InMemoryProvider {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a protein sequence to the provider
    pub fn add_protein(&mut self, accession: impl Into<String>, sequence: impl Into<String>) {
        self.proteins
            .insert(accession.into(), ReferenceSequence::new(sequence));
    }

    /// Add a protein sequence with a declared offset
    pub fn add_reference(&mut self, accession: impl Into<String>, reference: ReferenceSequence) {
        self.proteins.insert(accession.into(), reference);
    }

    /// Load proteins from FASTA text. Record ids become accessions.
    pub fn from_fasta_reader<R: Read>(reader: R) -> Result<Self, FerroError> {
        let mut provider = Self::new();
        for record in fasta::Reader::new(reader).records() {
            let record = record.map_err(|e| FerroError::Io {
                msg: format!("Invalid FASTA record: {}", e),
            })?;
            let sequence = String::from_utf8_lossy(record.seq()).to_ascii_uppercase();
            if provider.proteins.contains_key(record.id()) {
                warn!("Duplicate FASTA record {}, keeping the last", record.id());
            }
            provider.add_protein(record.id(), sequence);
        }
        debug!("Loaded {} protein sequences", provider.len());
        Ok(provider)
    }

    /// Load proteins from a FASTA file
    pub fn from_fasta(path: &Path) -> Result<Self, FerroError> {
        let file = File::open(path).map_err(|e| FerroError::Io {
            msg: format!("Failed to open {}: {}", path.display(), e),
        })?;
        Self::from_fasta_reader(file)
    }

    pub fn len(&self) -> usize {
        self.proteins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proteins.is_empty()
    }
}

impl SequenceProvider for InMemoryProvider {
    fn protein_sequence(&self, accession: &str) -> Result<ReferenceSequence, FerroError> {
        self.proteins
            .get(accession)
            .cloned()
            .ok_or_else(|| FerroError::SequenceNotFound {
                accession: accession.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_lookup() {
        let mut provider = InMemoryProvider::new();
        provider.add_protein("NP_000509.1", "MVHLTPEEK");
        provider.add_reference("P1", ReferenceSequence::new("MACD").with_offset(2));

        assert_eq!(
            provider.protein_sequence("NP_000509.1").unwrap().sequence,
            "MVHLTPEEK"
        );
        assert_eq!(provider.protein_sequence("P1").unwrap().offset, Some(2));
        assert!(provider.protein_sequence("missing").is_err());
    }

    #[test]
    fn test_from_fasta_reader() {
        let fasta = b">NP_1 first protein\nMACD\nEFG\n>NP_2\nmkv\n";
        let provider = InMemoryProvider::from_fasta_reader(&fasta[..]).unwrap();
        assert_eq!(provider.len(), 2);
        assert_eq!(provider.protein_sequence("NP_1").unwrap().sequence, "MACDEFG");
        assert_eq!(provider.protein_sequence("NP_2").unwrap().sequence, "MKV");
    }
}
