//! Configuration file support for ferro-mave.
//!
//! This module provides loading of `.ferro-mave.toml` configuration files
//! which tune offset resolution, aggregation filters and scaling.
//!
//! # Example Configuration
//!
//! ```toml
//! [resolver]
//! hit-rate-floor = 0.5
//! strategies = ["declared", "alignment", "zero"]
//!
//! [aggregation]
//! min-coverage = 0.1
//! nonsense-std-filter = true
//!
//! [scaling]
//! anchor-percentile = 0.05
//! ```
//!
//! # Config File Locations
//!
//! Configuration is searched in this order (first found wins):
//! 1. `.ferro-mave.toml` in current directory
//! 2. `~/.config/ferro/mave.toml`
//!
//! CLI flags take precedence over config file settings.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::FerroError;
use crate::offset::{AlignmentScoring, OffsetStrategy};

/// Complete pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PipelineConfig {
    pub resolver: ResolverConfig,
    pub aggregation: AggregationPolicy,
    pub scaling: ScalePolicy,
}

/// Offset resolution settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ResolverConfig {
    /// A candidate offset with mismatches must have a hit rate strictly above this
    pub hit_rate_floor: f64,
    /// Candidate offsets, tried in order
    pub strategies: Vec<OffsetStrategy>,
    /// Overwrite mismatching reference residues with the declared wild-type
    pub repair: bool,
    pub alignment: AlignmentScoring,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            hit_rate_floor: 0.5,
            strategies: OffsetStrategy::DEFAULT_ORDER.to_vec(),
            repair: true,
            alignment: AlignmentScoring::default(),
        }
    }
}

/// Experiment-level quality filters. Filters left unset are skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AggregationPolicy {
    /// Minimum reference protein length per table
    pub min_protein_length: Option<usize>,
    /// Minimum fraction of the `length * 19` possible substitutions observed
    pub min_coverage: Option<f64>,
    /// Minimum fraction of positions with at least one missense score
    pub min_length_coverage: Option<f64>,
    /// Covered-position count that satisfies the length filter on its own
    pub reasonable_length_coverage: usize,
    /// Reject experiments whose nonsense spread dwarfs the missense spread
    pub nonsense_std_filter: bool,
    pub nonsense_std_factor: f64,
    /// Minimum normalized missense standard deviation
    pub std_filter: Option<f64>,
    /// Residues whose substitution-to means are reported as baselines
    pub baseline_residues: Vec<String>,
}

impl Default for AggregationPolicy {
    fn default() -> Self {
        Self {
            min_protein_length: None,
            min_coverage: None,
            min_length_coverage: None,
            reasonable_length_coverage: 100,
            nonsense_std_filter: false,
            nonsense_std_factor: 5.0,
            std_filter: None,
            baseline_residues: vec!["Pro".to_string(), "Ala".to_string()],
        }
    }
}

/// Rescaling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ScalePolicy {
    /// Fraction of the missense distribution forming each tail
    pub anchor_percentile: f64,
    /// Below this many synonymous scores the nonsense median anchors the bottom
    pub min_synonymous: usize,
    /// Exponent shift for the optional second pass over values below 1
    pub second_scale_shift: Option<f64>,
}

impl Default for ScalePolicy {
    fn default() -> Self {
        Self {
            anchor_percentile: 0.05,
            min_synonymous: 5,
            second_scale_shift: None,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from the default locations.
    ///
    /// Searches for config in:
    /// 1. `.ferro-mave.toml` in current directory
    /// 2. `~/.config/ferro/mave.toml`
    pub fn load() -> Option<Self> {
        let cwd_config = PathBuf::from(".ferro-mave.toml");
        if cwd_config.exists() {
            match Self::load_from_path(&cwd_config) {
                Ok(config) => return Some(config),
                Err(e) => warn!("Ignoring {}: {}", cwd_config.display(), e),
            }
        }

        if let Some(home) = dirs_home() {
            let home_config = home.join(".config").join("ferro").join("mave.toml");
            if home_config.exists() {
                match Self::load_from_path(&home_config) {
                    Ok(config) => return Some(config),
                    Err(e) => warn!("Ignoring {}: {}", home_config.display(), e),
                }
            }
        }

        None
    }

    /// Load configuration from a specific path.
    pub fn load_from_path(path: &Path) -> Result<Self, FerroError> {
        let content = fs::read_to_string(path).map_err(|e| FerroError::Config {
            msg: format!("Failed to read {}: {}", path.display(), e),
        })?;
        debug!("Loaded configuration from {}", path.display());
        Self::parse(&content)
    }

    /// Parse configuration from TOML content.
    pub fn parse(content: &str) -> Result<Self, FerroError> {
        let config: PipelineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), FerroError> {
        let floor = self.resolver.hit_rate_floor;
        if !(0.0..=1.0).contains(&floor) {
            return Err(config_error(format!(
                "hit-rate-floor must be within [0, 1], got {}",
                floor
            )));
        }
        if self.resolver.strategies.is_empty() {
            return Err(config_error("at least one offset strategy is required"));
        }
        let scoring = &self.resolver.alignment;
        if scoring.gap_open > 0 || scoring.gap_extend > 0 {
            return Err(config_error("alignment gap penalties must not be positive"));
        }
        let percentile = self.scaling.anchor_percentile;
        if !(percentile > 0.0 && percentile <= 0.5) {
            return Err(config_error(format!(
                "anchor-percentile must be within (0, 0.5], got {}",
                percentile
            )));
        }
        if let Some(shift) = self.scaling.second_scale_shift {
            if shift < 0.0 {
                return Err(config_error("second-scale-shift must not be negative"));
            }
        }
        Ok(())
    }
}

fn config_error(msg: impl Into<String>) -> FerroError {
    FerroError::Config { msg: msg.into() }
}

/// Get the user's home directory.
fn dirs_home() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}
