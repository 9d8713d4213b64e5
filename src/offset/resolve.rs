//! Offset resolution.
//!
//! Candidate offsets are tried in the configured strategy order. The first one
//! under which every declared wild-type residue agrees with the reference wins
//! outright. Otherwise the candidate with the best hit rate above the floor is
//! taken and the reference is repaired to agree with the table.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use tracing::{debug, info, warn};

use crate::config::ResolverConfig;
use crate::error::FerroError;
use crate::offset::align::find_alignment_offset;
use crate::offset::check::check_offset;
use crate::offset::repair::repair_sequence;
use crate::variant::{parse_identifier, ParsedVariant};

/// Source of a candidate offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OffsetStrategy {
    /// The offset declared by the table metadata
    Declared,
    /// Offset from aligning the declared wild-type residues to the reference
    Alignment,
    Zero,
    DeclaredMinusOne,
    DeclaredPlusOne,
    MinusOne,
}

impl OffsetStrategy {
    pub const DEFAULT_ORDER: [OffsetStrategy; 6] = [
        OffsetStrategy::Declared,
        OffsetStrategy::Alignment,
        OffsetStrategy::Zero,
        OffsetStrategy::DeclaredMinusOne,
        OffsetStrategy::DeclaredPlusOne,
        OffsetStrategy::MinusOne,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Declared => "declared",
            Self::Alignment => "alignment",
            Self::Zero => "zero",
            Self::DeclaredMinusOne => "declared-minus-one",
            Self::DeclaredPlusOne => "declared-plus-one",
            Self::MinusOne => "minus-one",
        }
    }
}

impl fmt::Display for OffsetStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of resolving the offset of one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffsetResolution {
    /// Offset to add to declared positions; `None` when unresolvable
    pub offset: Option<i64>,
    /// The table's own target sequence was used instead of the reference
    pub used_fallback: bool,
    /// Hit rate of the accepted offset, or the best seen on failure
    pub hit_rate: f64,
    /// Sequence the shifted table agrees with
    pub corrected_seq: Option<String>,
    /// Strategy that produced the accepted offset; `None` for the fallback
    pub strategy: Option<OffsetStrategy>,
    /// Residues were overwritten to match the table
    pub repaired: bool,
    /// Why no offset was accepted
    #[serde(skip)]
    pub failure: Option<FerroError>,
}

impl OffsetResolution {
    fn unresolved(hit_rate: f64, failure: FerroError) -> Self {
        Self {
            offset: None,
            used_fallback: false,
            hit_rate,
            corrected_seq: None,
            strategy: None,
            repaired: false,
            failure: Some(failure),
        }
    }

    fn irreconcilable(declared: i64, hit_rate: f64) -> Self {
        Self::unresolved(hit_rate, FerroError::OffsetIrreconcilable { declared, hit_rate })
    }

    fn exact(offset: i64, hit_rate: f64, seq: &str, strategy: Option<OffsetStrategy>, used_fallback: bool) -> Self {
        Self {
            offset: Some(offset),
            used_fallback,
            hit_rate,
            corrected_seq: Some(seq.to_string()),
            strategy,
            repaired: false,
            failure: None,
        }
    }

    /// Returns true if an offset was found.
    pub fn is_resolved(&self) -> bool {
        self.offset.is_some()
    }
}

/// Best imperfect candidate seen so far.
struct Candidate {
    strategy: Option<OffsetStrategy>,
    offset: i64,
    hit_rate: f64,
}

/// Finds the offset between a score table's numbering and a reference protein.
///
/// # Example
///
/// ```
/// use ferro_mave::offset::OffsetResolver;
///
/// let resolver = OffsetResolver::default();
/// let resolution = resolver.resolve_identifiers("MACD", 5, &["p.Met1Leu"], None);
/// assert_eq!(resolution.offset, Some(0));
/// assert_eq!(resolution.hit_rate, 1.0);
/// assert_eq!(resolution.corrected_seq.as_deref(), Some("MACD"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct OffsetResolver {
    config: ResolverConfig,
}

impl OffsetResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Parse raw identifiers, then resolve.
    pub fn resolve_identifiers<S: AsRef<str>>(
        &self,
        reference_seq: &str,
        candidate_offset: i64,
        variant_ids: &[S],
        fallback_seq: Option<&str>,
    ) -> OffsetResolution {
        let variants: Vec<ParsedVariant> = variant_ids
            .iter()
            .map(|id| parse_identifier(id.as_ref()))
            .collect();
        self.resolve(reference_seq, candidate_offset, &variants, fallback_seq)
    }

    /// Resolve the offset of a set of variants against a reference sequence.
    ///
    /// When no candidate clears the hit-rate floor, `fallback_seq` is checked
    /// at offset 0.
    pub fn resolve<V: Borrow<ParsedVariant>>(
        &self,
        reference_seq: &str,
        candidate_offset: i64,
        variants: &[V],
        fallback_seq: Option<&str>,
    ) -> OffsetResolution {
        let floor = self.config.hit_rate_floor;
        let mut tried: Vec<i64> = Vec::new();
        let mut best: Option<Candidate> = None;
        let mut best_seen = 0.0f64;

        for &strategy in &self.config.strategies {
            let Some(offset) = self.candidate(strategy, reference_seq, candidate_offset, variants) else {
                debug!("Strategy {} produced no candidate", strategy);
                continue;
            };
            if tried.contains(&offset) {
                continue;
            }
            tried.push(offset);

            let check = check_offset(reference_seq, offset, variants);
            best_seen = best_seen.max(check.hit_rate);
            if !check.mismatch_found {
                if offset != candidate_offset {
                    info!(
                        "Offset corrected from {} to {} by {} strategy",
                        candidate_offset, offset, strategy
                    );
                }
                return OffsetResolution::exact(offset, check.hit_rate, reference_seq, Some(strategy), false);
            }

            debug!(
                "Strategy {} offset {}: hit rate {:.3} ({} of {})",
                strategy,
                offset,
                check.hit_rate,
                check.correct,
                check.checked()
            );
            let threshold = best.as_ref().map_or(floor, |b| b.hit_rate);
            if check.hit_rate > threshold {
                best = Some(Candidate {
                    strategy: Some(strategy),
                    offset,
                    hit_rate: check.hit_rate,
                });
            }
        }

        let (sequence, used_fallback, best) = match best {
            Some(best) => (reference_seq, false, best),
            None => {
                let Some(fallback) = fallback_seq else {
                    debug!("No offset cleared the hit-rate floor {}", floor);
                    return OffsetResolution::irreconcilable(candidate_offset, best_seen);
                };
                let check = check_offset(fallback, 0, variants);
                best_seen = best_seen.max(check.hit_rate);
                if !check.mismatch_found {
                    info!("Using fallback target sequence");
                    return OffsetResolution::exact(0, check.hit_rate, fallback, None, true);
                }
                if check.hit_rate <= floor {
                    debug!(
                        "Fallback sequence hit rate {:.3} does not clear floor {}",
                        check.hit_rate, floor
                    );
                    return OffsetResolution::irreconcilable(candidate_offset, best_seen);
                }
                let candidate = Candidate {
                    strategy: None,
                    offset: 0,
                    hit_rate: check.hit_rate,
                };
                (fallback, true, candidate)
            }
        };

        if !self.config.repair {
            return OffsetResolution::exact(best.offset, best.hit_rate, sequence, best.strategy, used_fallback);
        }

        match repair_sequence(sequence, best.offset, variants) {
            Ok(repaired) => {
                info!(
                    "Offset {} accepted with hit rate {:.3}, reference repaired",
                    best.offset, best.hit_rate
                );
                OffsetResolution {
                    offset: Some(best.offset),
                    used_fallback,
                    hit_rate: best.hit_rate,
                    corrected_seq: Some(repaired),
                    strategy: best.strategy,
                    repaired: true,
                    failure: None,
                }
            }
            Err(e) => {
                warn!("Offset {} abandoned: {}", best.offset, e);
                OffsetResolution::unresolved(best.hit_rate, e)
            }
        }
    }

    fn candidate<V: Borrow<ParsedVariant>>(
        &self,
        strategy: OffsetStrategy,
        reference_seq: &str,
        declared: i64,
        variants: &[V],
    ) -> Option<i64> {
        match strategy {
            OffsetStrategy::Declared => Some(declared),
            OffsetStrategy::Alignment => {
                find_alignment_offset(reference_seq, variants, &self.config.alignment)
            }
            OffsetStrategy::Zero => Some(0),
            OffsetStrategy::DeclaredMinusOne => declared.checked_sub(1),
            OffsetStrategy::DeclaredPlusOne => declared.checked_add(1),
            OffsetStrategy::MinusOne => Some(-1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_exact_at_declared() {
        let resolver = OffsetResolver::default();
        let resolution = resolver.resolve_identifiers("MACD", 0, &["p.Met1Leu"], None);
        assert_eq!(resolution.offset, Some(0));
        assert!(!resolution.used_fallback);
        assert_eq!(resolution.hit_rate, 1.0);
        assert_eq!(resolution.corrected_seq.as_deref(), Some("MACD"));
        assert_eq!(resolution.strategy, Some(OffsetStrategy::Declared));
        assert!(!resolution.repaired);
    }

    #[test]
    fn test_wrong_declared_offset_recovered() {
        let resolver = OffsetResolver::default();
        let resolution = resolver.resolve_identifiers("MACD", 5, &["p.Met1Leu"], None);
        assert_eq!(resolution.offset, Some(0));
        assert_eq!(resolution.corrected_seq.as_deref(), Some("MACD"));
    }

    #[test]
    fn test_nothing_checkable_accepts_declared() {
        let resolver = OffsetResolver::default();
        let resolution = resolver.resolve_identifiers("MACD", 7, &["p.Met1=", "p.[Met1Leu;Ala2Gly]"], None);
        assert_eq!(resolution.offset, Some(7));
        assert_eq!(resolution.hit_rate, 0.0);
        assert_eq!(resolution.strategy, Some(OffsetStrategy::Declared));
    }

    #[test]
    fn test_extreme_declared_offset() {
        let resolver = OffsetResolver::default();
        let resolution = resolver.resolve_identifiers("MACD", i64::MAX, &["p.Met1Leu", "p.Cys3Ser"], None);
        assert_eq!(resolution.offset, Some(0));
        assert_eq!(resolution.strategy, Some(OffsetStrategy::Alignment));
    }

    #[test]
    fn test_alignment_strategy() {
        let resolver = OffsetResolver::default();
        let reference = "MSTKWEYLPQRV";
        let ids = ["p.Lys10Arg", "p.Glu12Gly", "p.Leu14Pro"];
        let resolution = resolver.resolve_identifiers(reference, 3, &ids, None);
        assert_eq!(resolution.offset, Some(-6));
        assert_eq!(resolution.strategy, Some(OffsetStrategy::Alignment));
    }

    #[test]
    fn test_repair_above_floor() {
        let resolver = OffsetResolver::default();
        let ids = ["p.Met1Leu", "p.Ala2Gly", "p.Cys3Ser", "p.Trp4Arg"];
        let resolution = resolver.resolve_identifiers("MACD", 0, &ids, None);
        assert_eq!(resolution.offset, Some(0));
        assert_eq!(resolution.hit_rate, 0.75);
        assert!(resolution.repaired);
        assert_eq!(resolution.corrected_seq.as_deref(), Some("MACW"));
    }

    #[test]
    fn test_repair_disabled_keeps_reference() {
        let config = ResolverConfig {
            repair: false,
            ..Default::default()
        };
        let resolver = OffsetResolver::new(config);
        let ids = ["p.Met1Leu", "p.Ala2Gly", "p.Cys3Ser", "p.Trp4Arg"];
        let resolution = resolver.resolve_identifiers("MACD", 0, &ids, None);
        assert_eq!(resolution.corrected_seq.as_deref(), Some("MACD"));
        assert!(!resolution.repaired);
    }

    #[test]
    fn test_fallback() {
        let resolver = OffsetResolver::default();
        let ids = ["p.Lys1Arg", "p.Trp2Gly", "p.Tyr3Ser"];
        let resolution = resolver.resolve_identifiers("MACDEF", 0, &ids, Some("KWY"));
        assert_eq!(resolution.offset, Some(0));
        assert!(resolution.used_fallback);
        assert_eq!(resolution.corrected_seq.as_deref(), Some("KWY"));
        assert_eq!(resolution.strategy, None);
    }

    #[test]
    fn test_unresolvable() {
        let resolver = OffsetResolver::default();
        let ids = ["p.Lys1Arg", "p.Trp2Gly", "p.Tyr3Ser"];
        let resolution = resolver.resolve_identifiers("MACDEF", 0, &ids, None);
        assert!(!resolution.is_resolved());
        assert!(resolution.corrected_seq.is_none());
        assert!(!resolution.used_fallback);
        let failure = resolution.failure.unwrap();
        assert_eq!(failure.code(), ErrorCode::OffsetIrreconcilable);
        assert!(matches!(failure, FerroError::OffsetIrreconcilable { declared: 0, .. }));
    }

    #[test]
    fn test_conflict_abandons_offset() {
        let resolver = OffsetResolver::default();
        let ids = ["p.Met1Leu", "p.Ala2Gly", "p.Cys3Ser", "p.Trp4Arg", "p.Lys4Arg", "p.Met1Ala"];
        let resolution = resolver.resolve_identifiers("MACD", 0, &ids, None);
        assert!(!resolution.is_resolved());
        assert!(matches!(
            resolution.failure,
            Some(FerroError::ConflictingWildType { position: 4, .. })
        ));
    }
}
