//! Protein variant notation.
//!
//! MAVE score tables identify variants with short-form HGVS protein notation
//! (`p.Leu11Pro`), sometimes qualified with an accession (`NP_000509.1:p.Leu11Pro`)
//! and sometimes as bracketed multi-variants (`p.[Leu11Pro;Glu12Gly]`).
//!
//! Two views are offered:
//!
//! - [`parse_identifier`]: structural decomposition into [`ParsedVariant`], used for
//!   all positional work (offset checks, shifting, coverage)
//! - [`get_variant_type`]: a cheap text classifier used to partition score tables
//!
//! # Example
//!
//! ```
//! use ferro_mave::variant::{get_variant_type, parse_identifier, VariantType};
//!
//! let variant = parse_identifier("p.[Leu11Pro;Glu12Gly]");
//! assert_eq!(variant.apply_offset(-10), "p.[Leu1Pro;Glu2Gly]");
//! assert_eq!(get_variant_type("p.[Leu11Pro;Glu12Gly]"), VariantType::Multi);
//! ```

mod classify;
mod parser;
mod record;

pub use classify::{get_variant_type, VariantType};
pub use parser::{aac_to_identifier, parse_identifier, parse_identifier_strict};
pub use record::{apply_offset, ParsedVariant, RangeEdit, VariantBody, VariantRecord};
