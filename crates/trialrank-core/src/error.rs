//! Error types for trialrank-core.
//!
//! Each fallible area of the library has its own error enum. File-backed
//! errors carry the offending path so callers can report it without
//! re-threading context.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while configuring rank fusion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FusionError {
    /// A criterion weight is negative, NaN or infinite
    #[error("Invalid weight for {criterion}: {weight}")]
    InvalidWeight {
        /// Criterion name (main, inclusion, exclusion)
        criterion: &'static str,
        /// The rejected value
        weight: f64,
    },
}

/// Errors that can occur while loading relevance judgments.
#[derive(Debug, Error)]
pub enum QrelsError {
    /// Failed to read the judgments file
    #[error("Failed to read qrels file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur while reading or writing TREC run and metrics files.
#[derive(Debug, Error)]
pub enum RunFileError {
    /// Failed to read or write the file
    #[error("Run file I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A line does not follow the six-field run layout
    #[error("Malformed run line {line} in {path}: {reason}")]
    Malformed {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

/// Errors that can occur while reading a TREC topics file.
#[derive(Debug, Error)]
pub enum TopicsError {
    /// Failed to read the topics file
    #[error("Failed to read topics file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file is not well-formed XML
    #[error("Invalid topics XML in {path}: {source}")]
    Xml {
        path: PathBuf,
        #[source]
        source: quick_xml::Error,
    },
    /// A `<topic>` element lacks a numeric `number` attribute
    #[error("Topic in {path} has no valid number attribute (found {found:?})")]
    InvalidNumber {
        path: PathBuf,
        found: Option<String>,
    },
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The configuration file is not valid TOML for [`EvalConfig`](crate::config::EvalConfig)
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    /// A value is out of its accepted range
    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

impl From<FusionError> for ConfigError {
    fn from(err: FusionError) -> Self {
        ConfigError::InvalidValue(err.to_string())
    }
}
