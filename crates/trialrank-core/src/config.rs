//! Evaluation and fusion configuration.
//!
//! Defaults are exposed as constants so benchmarks, tests and the CLI agree
//! on the production setup. A run is configured with an explicit
//! [`EvalConfig`] value passed into the fusion engine and the evaluator;
//! nothing is read from global state.
//!
//! # Usage
//!
//! ```
//! use trialrank_core::config::{EvalConfig, DEFAULT_CUT};
//!
//! let config = EvalConfig::from_toml_str("cut = 5\n[fusion]\nexclusion_weight = 0.8\n").unwrap();
//! assert_eq!(config.cut, 5);
//! assert_ne!(config.cut, DEFAULT_CUT);
//! assert_eq!(config.fusion.weights.exclusion, 0.8);
//! ```

use crate::error::{ConfigError, FusionError};
use serde::{Deserialize, Serialize};
use std::path::Path;

// =============================================================================
// Retrieval
// =============================================================================

/// Maximum number of trials kept per topic and per retrieval source.
///
/// Ranked lists longer than this are truncated when read, and written run
/// files never exceed it.
pub const DEFAULT_RESULT_SIZE: usize = 1000;

/// Rank cutoff for precision and nDCG.
pub const DEFAULT_CUT: usize = 10;

/// Grade at which a judged trial counts as relevant for P, RR and R-Precision.
pub const HIGHLY_RELEVANT: u8 = 2;

// =============================================================================
// Fusion weights
// =============================================================================

/// Weight of the main-index score.
pub const DEFAULT_MAIN_WEIGHT: f64 = 0.4;

/// Weight of the inclusion-criteria score.
pub const DEFAULT_INCLUSION_WEIGHT: f64 = 0.4;

/// Weight of the exclusion-criteria score.
///
/// Exclusion is a cost criterion: a strong match against exclusion text
/// predicts the patient is excluded from the trial.
pub const DEFAULT_EXCLUSION_WEIGHT: f64 = 0.6;

/// Delimiter between fields of the metrics file.
pub const DEFAULT_METRICS_DELIMITER: char = ';';

/// Run tag written in the last column of run files.
pub const DEFAULT_RUN_NAME: &str = "trialrank";

/// Whether a higher criterion value is better or worse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    /// Higher is better
    Benefit,
    /// Lower is better
    Cost,
}

/// What to do with a criterion column whose Euclidean norm is zero.
///
/// A zero norm means no document scored on that criterion for the topic.
/// Under vector normalization both policies produce the same ranking: an
/// all-zero column puts both ideals at 0, so it adds nothing to either
/// distance. `Exclude` only makes that explicit in the distance loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZeroNormPolicy {
    /// Normalized entries are 0; the column still takes part in distances
    #[default]
    Zero,
    /// The column is left out of the ideal-distance computation
    Exclude,
}

/// One non-negative weight per criterion. The sum need not be 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CriterionWeights {
    #[serde(rename = "main_weight")]
    pub main: f64,
    #[serde(rename = "inclusion_weight")]
    pub inclusion: f64,
    #[serde(rename = "exclusion_weight")]
    pub exclusion: f64,
}

impl Default for CriterionWeights {
    fn default() -> Self {
        Self {
            main: DEFAULT_MAIN_WEIGHT,
            inclusion: DEFAULT_INCLUSION_WEIGHT,
            exclusion: DEFAULT_EXCLUSION_WEIGHT,
        }
    }
}

impl CriterionWeights {
    /// Creates a weight vector.
    pub fn new(main: f64, inclusion: f64, exclusion: f64) -> Self {
        Self {
            main,
            inclusion,
            exclusion,
        }
    }

    /// Weights in criterion order (main, inclusion, exclusion).
    pub fn as_array(&self) -> [f64; 3] {
        [self.main, self.inclusion, self.exclusion]
    }

    /// Rejects negative, NaN and infinite weights.
    pub fn validate(&self) -> Result<(), FusionError> {
        for (criterion, weight) in [
            ("main", self.main),
            ("inclusion", self.inclusion),
            ("exclusion", self.exclusion),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(FusionError::InvalidWeight { criterion, weight });
            }
        }
        Ok(())
    }
}

/// TOPSIS fusion settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// When false, only the main list is evaluated (single-index mode)
    pub enabled: bool,
    /// Per-criterion weights, flattened so the TOML keys read `main_weight = 0.4`
    #[serde(flatten)]
    pub weights: CriterionWeights,
    /// Polarity of (main, inclusion, exclusion)
    pub polarity: [Polarity; 3],
    /// Handling of criterion columns nobody scored on
    pub zero_norm: ZeroNormPolicy,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            weights: CriterionWeights::default(),
            polarity: [Polarity::Benefit, Polarity::Benefit, Polarity::Cost],
            zero_norm: ZeroNormPolicy::default(),
        }
    }
}

/// Settings for one evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Maximum ranked-list length per topic and source
    pub result_size: usize,
    /// Rank cutoff for P@cut and nDCG@cut
    pub cut: usize,
    /// Evaluate topics on the rayon pool
    pub parallel: bool,
    /// Field delimiter of the metrics file
    pub metrics_delimiter: char,
    /// Run tag for written run files
    pub run_name: String,
    pub fusion: FusionConfig,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            result_size: DEFAULT_RESULT_SIZE,
            cut: DEFAULT_CUT,
            parallel: true,
            metrics_delimiter: DEFAULT_METRICS_DELIMITER,
            run_name: DEFAULT_RUN_NAME.to_string(),
            fusion: FusionConfig::default(),
        }
    }
}

impl EvalConfig {
    /// Parses a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML configuration file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cut == 0 {
            return Err(ConfigError::InvalidValue("cut must be > 0".to_string()));
        }
        if self.result_size == 0 {
            return Err(ConfigError::InvalidValue(
                "result_size must be > 0".to_string(),
            ));
        }
        if self.metrics_delimiter.is_alphanumeric() || self.metrics_delimiter == '.' {
            return Err(ConfigError::InvalidValue(format!(
                "metrics_delimiter {:?} would be ambiguous with metric values",
                self.metrics_delimiter
            )));
        }
        self.fusion.weights.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let config = EvalConfig::default();
        assert_eq!(config.result_size, DEFAULT_RESULT_SIZE);
        assert_eq!(config.cut, DEFAULT_CUT);
        assert!(config.fusion.enabled);
        assert_eq!(
            config.fusion.weights.as_array(),
            [
                DEFAULT_MAIN_WEIGHT,
                DEFAULT_INCLUSION_WEIGHT,
                DEFAULT_EXCLUSION_WEIGHT
            ]
        );
        assert_eq!(config.fusion.polarity[2], Polarity::Cost);
        assert_eq!(config.fusion.zero_norm, ZeroNormPolicy::Zero);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EvalConfig::from_toml_str(
            r#"
            cut = 20
            [fusion]
            enabled = false
            zero_norm = "exclude"
            main_weight = 1.0
            "#,
        )
        .unwrap();

        assert_eq!(config.cut, 20);
        assert_eq!(config.result_size, DEFAULT_RESULT_SIZE);
        assert!(!config.fusion.enabled);
        assert_eq!(config.fusion.zero_norm, ZeroNormPolicy::Exclude);
        assert_eq!(config.fusion.weights.main, 1.0);
        assert_eq!(config.fusion.weights.inclusion, DEFAULT_INCLUSION_WEIGHT);
    }

    #[test]
    fn test_rejects_zero_cut() {
        let err = EvalConfig::from_toml_str("cut = 0").unwrap_err();
        assert!(err.to_string().contains("cut"));
    }

    #[test]
    fn test_rejects_negative_weight() {
        let err = EvalConfig::from_toml_str("[fusion]\nexclusion_weight = -0.5").unwrap_err();
        assert!(err.to_string().contains("exclusion"));
    }

    #[test]
    fn test_rejects_numeric_delimiter() {
        let err = EvalConfig::from_toml_str("metrics_delimiter = \"7\"").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }

    #[test]
    fn test_unknown_polarity_is_parse_error() {
        let err = EvalConfig::from_toml_str("[fusion]\npolarity = [\"benefit\", \"benefit\", \"neutral\"]")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = EvalConfig::from_path(Path::new("/nonexistent/trialrank.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
