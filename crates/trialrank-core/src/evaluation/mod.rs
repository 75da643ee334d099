//! Retrieval quality evaluation against graded relevance judgments.
//!
//! # Overview
//!
//! - **Graded relevance**: 0 = not relevant, 1 = partially relevant,
//!   2 = highly relevant. Only grade 2 counts for P, RR and R-Precision; all
//!   grades contribute gain to nDCG.
//! - **Per topic**: [`TopicMetrics`] accumulates grades in rank order and
//!   [`evaluate_ranking`] drives it for one ranking.
//! - **Per run**: [`MeanMetrics`] averages topics with one shared
//!   denominator; [`Evaluator`] runs a whole collection in parallel.
//! - **Comparison**: [`compare_runs`] tests a run against a baseline with a
//!   paired t-test, Cohen's d and bootstrap intervals.
//!
//! # Metrics Reference
//!
//! | Metric | Description | Relevant grades |
//! |--------|-------------|-----------------|
//! | nDCG@cut | Normalized Discounted Cumulative Gain | 0, 1, 2 (gain 2^g - 1) |
//! | RPrec | Precision at R, the number of highly relevant judgments | 2 |
//! | P@cut | Precision at the cutoff | 2 |
//! | RR | Reciprocal rank of the first highly relevant result | 2 |

pub mod mean;
pub mod metrics;
pub mod qrels;
pub mod runner;
pub mod stats;

pub use mean::{MeanMetrics, MeanSummary};
pub use metrics::{evaluate_ranking, TopicMetrics, TopicScores};
pub use qrels::{RelevanceJudgmentStore, TopicJudgments};
pub use runner::{evaluate_topic, Evaluator, RunEvaluation, TopicEvaluation};
pub use stats::{
    bootstrap_ci, cohens_d, compare_runs, interpret_cohens_d, paired_ttest, BootstrapResult,
    RunComparison, TTestResult,
};
