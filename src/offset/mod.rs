//! Offset resolution between score table numbering and reference proteins.
//!
//! Score tables number their variants relative to whatever construct was
//! assayed, which often differs from the canonical protein. This module finds
//! the shift that makes the declared wild-type residues agree with a reference
//! sequence, repairing the reference where the agreement is partial.

pub mod align;
pub mod check;
pub mod repair;
pub mod resolve;

pub use align::{alignment_offset, extract_seq, find_alignment_offset, AlignmentScoring, Scaffold};
pub use check::{check_offset, OffsetCheck};
pub use repair::repair_sequence;
pub use resolve::{OffsetResolution, OffsetResolver, OffsetStrategy};
