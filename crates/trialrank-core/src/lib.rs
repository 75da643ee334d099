//! # trialrank core
//!
//! Rank fusion and retrieval evaluation for clinical-trial search.
//!
//! A clinical-trial search issues three queries per patient topic: one against
//! the main trial index and one each against the inclusion and exclusion
//! eligibility indexes. This crate merges those independently scored lists
//! with TOPSIS and scores the merged ranking against graded relevance
//! judgments.
//!
//! ## Modules
//!
//! - [`search`] - Ranked-list types and TOPSIS fusion
//! - [`evaluation`] - Per-topic metrics, run means, the evaluation runner and
//!   significance statistics
//! - [`trec`] - TREC run-file and metrics-file I/O
//! - [`eligibility`] - Topic age/gender extraction and criteria splitting
//! - [`config`] - Evaluation and fusion configuration with documented defaults
//! - [`error`] - Error types for fusion, judgment loading, run files and config

pub mod config;
pub mod eligibility;
pub mod error;
pub mod evaluation;
pub mod search;
pub mod trec;
