//! Sequence provider trait
//!
//! Defines the interface for accessing reference protein sequences.

use serde::{Deserialize, Serialize};

use crate::error::FerroError;

/// A reference protein together with the offset its metadata declares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceSequence {
    /// One-letter amino acid sequence
    pub sequence: String,
    /// Offset between table numbering and this sequence, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
}

impl ReferenceSequence {
    pub fn new(sequence: impl Into<String>) -> Self {
        Self {
            sequence: sequence.into(),
            offset: None,
        }
    }

    /// Attach a declared offset.
    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

/// Trait for providing reference protein sequences
///
/// Implementations might include:
/// - InMemoryProvider for tests and FASTA-backed runs
/// - Providers backed by a UniProt or RefSeq mirror
pub trait SequenceProvider {
    /// Get the protein sequence for an accession
    ///
    /// # Arguments
    ///
    /// * `accession` - Protein accession (e.g., "NP_000509.1", "P69905")
    fn protein_sequence(&self, accession: &str) -> Result<ReferenceSequence, FerroError>;

    /// Check if a protein exists
    fn has_protein(&self, accession: &str) -> bool {
        self.protein_sequence(accession).is_ok()
    }
}

impl SequenceProvider for Box<dyn SequenceProvider + Send + Sync> {
    fn protein_sequence(&self, accession: &str) -> Result<ReferenceSequence, FerroError> {
        (**self).protein_sequence(accession)
    }
}

impl<P: SequenceProvider + ?Sized> SequenceProvider for &P {
    fn protein_sequence(&self, accession: &str) -> Result<ReferenceSequence, FerroError> {
        (**self).protein_sequence(accession)
    }
}

/// Provider with no sequences; every table falls back to its own target sequence.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProvider;

impl SequenceProvider for NoProvider {
    fn protein_sequence(&self, accession: &str) -> Result<ReferenceSequence, FerroError> {
        Err(FerroError::SequenceNotFound {
            accession: accession.to_string(),
        })
    }
}
