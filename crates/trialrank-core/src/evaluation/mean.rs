//! Run-level averages over per-topic scores.

use super::metrics::TopicScores;
use serde::Serialize;

/// Accumulator for mean P@cut, MRR, mean nDCG@cut and mean R-Precision.
///
/// All four means share one denominator: the number of topics updated.
/// A NaN nDCG adds nothing to the nDCG sum but still counts as a topic;
/// [`ndcg_skipped`](Self::ndcg_skipped) reports how often that happened.
///
/// Parallel evaluation keeps one accumulator per worker and combines them
/// with [`merge`](Self::merge). The result does not depend on topic order.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeanMetrics {
    precision_sum: f64,
    reciprocal_rank_sum: f64,
    ndcg_sum: f64,
    r_precision_sum: f64,
    topics: usize,
    ndcg_skipped: usize,
}

impl MeanMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one topic's values.
    pub fn update(&mut self, precision: f64, reciprocal_rank: f64, ndcg: f64, r_precision: f64) {
        self.precision_sum += precision;
        self.reciprocal_rank_sum += reciprocal_rank;
        self.r_precision_sum += r_precision;
        if ndcg.is_nan() {
            self.ndcg_skipped += 1;
        } else {
            self.ndcg_sum += ndcg;
        }
        self.topics += 1;
    }

    /// Adds a topic from its [`TopicScores`].
    pub fn add_scores(&mut self, scores: &TopicScores) {
        self.update(
            scores.precision,
            scores.reciprocal_rank,
            scores.ndcg,
            scores.r_precision,
        );
    }

    /// Folds another accumulator into this one.
    pub fn merge(mut self, other: MeanMetrics) -> MeanMetrics {
        self.precision_sum += other.precision_sum;
        self.reciprocal_rank_sum += other.reciprocal_rank_sum;
        self.ndcg_sum += other.ndcg_sum;
        self.r_precision_sum += other.r_precision_sum;
        self.topics += other.topics;
        self.ndcg_skipped += other.ndcg_skipped;
        self
    }

    /// Number of topics updated.
    pub fn topics(&self) -> usize {
        self.topics
    }

    /// Topics whose nDCG was NaN.
    pub fn ndcg_skipped(&self) -> usize {
        self.ndcg_skipped
    }

    pub fn mean_precision(&self) -> f64 {
        self.mean(self.precision_sum)
    }

    pub fn mean_reciprocal_rank(&self) -> f64 {
        self.mean(self.reciprocal_rank_sum)
    }

    pub fn mean_ndcg(&self) -> f64 {
        self.mean(self.ndcg_sum)
    }

    pub fn mean_r_precision(&self) -> f64 {
        self.mean(self.r_precision_sum)
    }

    /// Snapshot of the four means.
    pub fn summary(&self) -> MeanSummary {
        MeanSummary {
            ndcg: self.mean_ndcg(),
            r_precision: self.mean_r_precision(),
            precision: self.mean_precision(),
            reciprocal_rank: self.mean_reciprocal_rank(),
            topics: self.topics,
            ndcg_skipped: self.ndcg_skipped,
        }
    }

    fn mean(&self, sum: f64) -> f64 {
        if self.topics == 0 {
            0.0
        } else {
            sum / self.topics as f64
        }
    }
}

/// Serializable view of [`MeanMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeanSummary {
    pub ndcg: f64,
    pub r_precision: f64,
    pub precision: f64,
    pub reciprocal_rank: f64,
    pub topics: usize,
    pub ndcg_skipped: usize,
}
