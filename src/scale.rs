//! Score rescaling.
//!
//! Experiments report effects on arbitrary scales and in either direction. The
//! scaling here maps every missense score onto a common axis where the neutral
//! median sits at 1 and a typical strong effect at 0:
//!
//! ```text
//! scaled = sign * (score - neutral) / -|anchor - neutral| + 1
//! ```
//!
//! `sign` orients the axis so that the strong-effect side always lands below 1.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::aggregate::{median, ExperimentAggregate};
use crate::config::ScalePolicy;
use crate::domainome::DomainAnchors;
use crate::error::FerroError;

/// Reference points of one experiment's scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleAnchors {
    /// Neutral effect, mapped to 1
    pub neutral: f64,
    /// Typical strong effect, mapped to 0
    pub bottom: f64,
    /// Typical effect on the other side of the neutral median
    pub top: f64,
}

impl ScaleAnchors {
    /// Direction of the strong-effect side: 1 above the neutral median, -1 below.
    pub fn sign(&self) -> f64 {
        if self.bottom > self.neutral {
            1.0
        } else {
            -1.0
        }
    }

    /// Scale one score, stretching each side of the neutral median by its own anchor.
    pub fn scale(&self, score: f64) -> f64 {
        let on_bottom_side = (score - self.neutral) * (self.bottom - self.neutral) > 0.0;
        let anchor = if on_bottom_side { self.bottom } else { self.top };
        let stretch = -(anchor - self.neutral).abs();
        if stretch == 0.0 {
            return 1.0;
        }
        self.sign() * ((score - self.neutral) / stretch) + 1.0
    }
}

/// Rescaled missense scores of one experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaledScoreSet {
    pub anchors: ScaleAnchors,
    /// Scaled score per missense identifier
    pub scores: HashMap<String, f64>,
}

impl ScaledScoreSet {
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn get(&self, identifier: &str) -> Option<f64> {
        self.scores.get(identifier).copied()
    }
}

/// Single-anchor scaling of one score.
///
/// # Example
///
/// ```
/// use ferro_mave::scale::score_scale_function;
///
/// // Loss of function lowers the score
/// assert_eq!(score_scale_function(-2.0, 0.0, -2.0), 0.0);
/// assert_eq!(score_scale_function(0.0, 0.0, -2.0), 1.0);
/// assert_eq!(score_scale_function(-1.0, 0.0, -2.0), 0.5);
/// ```
pub fn score_scale_function(score: f64, median_synonymous: f64, bottom_anchor: f64) -> f64 {
    ScaleAnchors {
        neutral: median_synonymous,
        bottom: bottom_anchor,
        top: bottom_anchor,
    }
    .scale_single(score)
}

impl ScaleAnchors {
    fn scale_single(&self, score: f64) -> f64 {
        let stretch = -(self.bottom - self.neutral).abs();
        if stretch == 0.0 {
            return 1.0;
        }
        self.sign() * ((score - self.neutral) / stretch) + 1.0
    }
}

/// Second pass that compresses values below 1 towards `min`.
///
/// Values above 1 are returned unchanged. A `shift` of 0, below 0 or NaN is
/// the identity.
pub fn second_scale(value: f64, min: f64, shift: f64) -> f64 {
    if !second_scale_enabled(shift) || value > 1.0 || min >= 1.0 {
        return value;
    }
    let t = ((value - min) / (1.0 - min)).clamp(0.0, 1.0);
    min + t.powf(1.0 + shift) * (1.0 - min)
}

fn second_scale_enabled(shift: f64) -> bool {
    shift >= 0.0
}

/// Computes anchors and rescales aggregated experiments.
#[derive(Debug, Clone, Default)]
pub struct ScaleEngine {
    policy: ScalePolicy,
}

impl ScaleEngine {
    pub fn new(policy: ScalePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ScalePolicy {
        &self.policy
    }

    /// Derive the scale anchors of an experiment from its distributions.
    pub fn anchors(&self, aggregate: &ExperimentAggregate) -> Result<ScaleAnchors, FerroError> {
        let mut missense = aggregate.missense.values();
        if missense.is_empty() {
            return Err(FerroError::EmptyDistribution {
                what: "missense scores".to_string(),
            });
        }
        missense.sort_by(f64::total_cmp);

        let synonymous = aggregate.synonymous.values();
        let neutral = median(&synonymous)
            .or_else(|| median(&missense))
            .unwrap_or(0.0);

        let n = missense.len();
        let k = ((self.policy.anchor_percentile * n as f64).ceil() as usize).clamp(1, n);
        let lower = median(&missense[..k]).unwrap_or(neutral);
        let upper = median(&missense[n - k..]).unwrap_or(neutral);

        let sparse_synonymous = synonymous.len() < self.policy.min_synonymous;
        let anchors = match aggregate.nonsense.median() {
            Some(nonsense) if sparse_synonymous => {
                let top = if nonsense < neutral {
                    upper
                } else if nonsense > neutral {
                    lower
                } else if (lower - neutral).abs() >= (upper - neutral).abs() {
                    lower
                } else {
                    upper
                };
                ScaleAnchors {
                    neutral,
                    bottom: nonsense,
                    top,
                }
            }
            _ if (lower - neutral).abs() >= (upper - neutral).abs() => ScaleAnchors {
                neutral,
                bottom: lower,
                top: upper,
            },
            _ => ScaleAnchors {
                neutral,
                bottom: upper,
                top: lower,
            },
        };
        debug!(
            "Scale anchors: neutral {:.4}, bottom {:.4}, top {:.4}",
            anchors.neutral, anchors.bottom, anchors.top
        );
        Ok(anchors)
    }

    /// Rescale the missense scores of an experiment.
    pub fn scale(&self, aggregate: &ExperimentAggregate) -> Result<ScaledScoreSet, FerroError> {
        let anchors = self.anchors(aggregate)?;
        Ok(self.apply(aggregate, anchors))
    }

    /// Rescale using pre-baked per-domain anchors instead of derived ones.
    pub fn scale_domainome(
        &self,
        aggregate: &ExperimentAggregate,
        domain: &DomainAnchors,
    ) -> Result<ScaledScoreSet, FerroError> {
        if aggregate.missense.is_empty() {
            return Err(FerroError::EmptyDistribution {
                what: "missense scores".to_string(),
            });
        }
        Ok(self.apply(aggregate, domain.scale_anchors()))
    }

    fn apply(&self, aggregate: &ExperimentAggregate, anchors: ScaleAnchors) -> ScaledScoreSet {
        if anchors.bottom == anchors.neutral {
            warn!("Strong-effect anchor equals the neutral median, all scores map to 1");
        }
        let mut scores: HashMap<String, f64> = aggregate
            .missense
            .averaged
            .iter()
            .map(|(id, &score)| (id.clone(), anchors.scale(score)))
            .collect();

        if let Some(shift) = self.policy.second_scale_shift.filter(|&s| second_scale_enabled(s)) {
            let min = scores.values().copied().fold(f64::INFINITY, f64::min);
            if min < 1.0 {
                for value in scores.values_mut() {
                    *value = second_scale(*value, min, shift);
                }
            }
        }

        ScaledScoreSet { anchors, scores }
    }
}
