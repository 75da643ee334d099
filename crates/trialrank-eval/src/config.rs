//! Configuration resolution for the evaluation tool.
//!
//! The effective [`EvalConfig`] is built in layers:
//! 1. Built-in defaults from `trialrank_core::config`
//! 2. A TOML file, found via `--config`, `$TRIALRANK_CONFIG`, or the
//!    platform config directory
//! 3. Command-line overrides

use anyhow::{bail, Context, Result};
use chrono::{DateTime, TimeZone};
use directories::ProjectDirs;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use trialrank_core::config::{CriterionWeights, EvalConfig};
use trialrank_core::trec;

/// Environment variable naming a config file
pub const CONFIG_ENV: &str = "TRIALRANK_CONFIG";

/// Config file name inside the platform config directory
pub const CONFIG_FILENAME: &str = "trialrank.toml";

/// Timestamp layout of default metrics file names (`yyMMddTHHmm`)
const METRICS_TIMESTAMP_FORMAT: &str = "%y%m%dT%H%M";

/// Values given on the command line that take precedence over the file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub cut: Option<usize>,
    pub result_size: Option<usize>,
    pub weights: Option<Vec<f64>>,
    pub no_fusion: bool,
    pub sequential: bool,
    pub delimiter: Option<char>,
    pub run_name: Option<String>,
}

/// Returns the platform config file location.
///
/// - Linux: `~/.config/trialrank/trialrank.toml`
/// - macOS: `~/Library/Application Support/dev.trialrank.trialrank/trialrank.toml`
/// - Windows: `%APPDATA%\trialrank\trialrank\config\trialrank.toml`
pub fn platform_config_path() -> Option<PathBuf> {
    ProjectDirs::from("dev", "trialrank", "trialrank")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
}

/// Picks the config file to load, if any.
///
/// Search order:
/// 1. `explicit` (`--config`)
/// 2. `env_value` (`$TRIALRANK_CONFIG`), when non-empty
/// 3. `platform`, when the file exists
pub fn resolve_config_path(
    explicit: Option<&Path>,
    env_value: Option<String>,
    platform: Option<PathBuf>,
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(value) = env_value.filter(|v| !v.trim().is_empty()) {
        return Some(PathBuf::from(value));
    }
    platform.filter(|path| path.is_file())
}

/// Loads the configuration file (or defaults) and applies `overrides`.
pub fn load_config(explicit: Option<&Path>, overrides: &Overrides) -> Result<EvalConfig> {
    let path = resolve_config_path(
        explicit,
        std::env::var(CONFIG_ENV).ok(),
        platform_config_path(),
    );

    let config = match path {
        Some(path) => {
            tracing::info!("Loading config from {}", path.display());
            EvalConfig::from_path(&path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?
        }
        None => EvalConfig::default(),
    };

    apply_overrides(config, overrides)
}

/// Applies command-line overrides and re-validates.
pub fn apply_overrides(mut config: EvalConfig, overrides: &Overrides) -> Result<EvalConfig> {
    if let Some(cut) = overrides.cut {
        config.cut = cut;
    }
    if let Some(result_size) = overrides.result_size {
        config.result_size = result_size;
    }
    if let Some(weights) = &overrides.weights {
        let [main, inclusion, exclusion] = weights.as_slice() else {
            bail!(
                "--weights expects 3 values (main,inclusion,exclusion), got {}",
                weights.len()
            );
        };
        config.fusion.weights = CriterionWeights::new(*main, *inclusion, *exclusion);
    }
    if overrides.no_fusion {
        config.fusion.enabled = false;
    }
    if overrides.sequential {
        config.parallel = false;
    }
    if let Some(delimiter) = overrides.delimiter {
        config.metrics_delimiter = delimiter;
    }
    if let Some(run_name) = &overrides.run_name {
        config.run_name = run_name.clone();
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Default metrics file path for a run started at `now`.
pub fn default_metrics_path<Tz>(now: &DateTime<Tz>, weights: &CriterionWeights) -> PathBuf
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let stamp = now.format(METRICS_TIMESTAMP_FORMAT).to_string();
    trec::default_metrics_path(&stamp, weights)
}
