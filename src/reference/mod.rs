//! Reference protein sequences
//!
//! Provides the lookup used to fetch the canonical protein a score table was
//! measured against.

pub mod memory;
pub mod provider;

pub use memory::InMemoryProvider;
pub use provider::{NoProvider, ReferenceSequence, SequenceProvider};
