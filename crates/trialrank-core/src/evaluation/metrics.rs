//! Graded-relevance metrics for a single topic.
//!
//! [`TopicMetrics`] is fed one relevance grade per rank, best rank first,
//! and then queried for:
//! - P@k (Precision at k)
//! - RR (Reciprocal Rank)
//! - DCG@k, IDCG@k and nDCG@k (Normalized Discounted Cumulative Gain)
//! - R-Precision
//!
//! Only grade [`HIGHLY_RELEVANT`] counts as relevant for precision, RR and
//! R-Precision. Every grade contributes gain to DCG.
//!
//! # References
//!
//! - Järvelin & Kekäläinen (2002). "Cumulated gain-based evaluation of IR techniques"
//! - Voorhees & Harman (2005). "TREC: Experiment and Evaluation in Information Retrieval"

use super::qrels::TopicJudgments;
use crate::config::HIGHLY_RELEVANT;
use crate::search::RankedList;
use serde::Serialize;

/// Accumulates the grades of one topic's ranking.
///
/// Lifecycle: create per topic, call [`update`](Self::update) for ranks
/// `0, 1, 2, ...` in order, read the metrics, drop.
///
/// # Example
///
/// ```
/// use trialrank_core::evaluation::TopicMetrics;
///
/// let mut metrics = TopicMetrics::new();
/// for (rank, grade) in [2, 0, 1].into_iter().enumerate() {
///     metrics.update(grade, rank);
/// }
/// assert_eq!(metrics.reciprocal_rank(), 1.0);
/// assert!((metrics.dcg_at(3) - 3.5).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TopicMetrics {
    grades: Vec<u8>,
    first_relevant_pos: Option<usize>,
    relevant_retrieved: usize,
}

impl TopicMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the grade of the document at 0-indexed `rank`.
    ///
    /// # Panics
    ///
    /// Panics unless `rank` is the next rank in sequence (the number of grades
    /// fed so far). Reciprocal rank and precision depend on position.
    pub fn update(&mut self, grade: u8, rank: usize) {
        assert_eq!(
            rank,
            self.grades.len(),
            "grades must be fed in ascending rank order"
        );

        if grade == HIGHLY_RELEVANT {
            self.first_relevant_pos = Some(self.first_relevant_pos.map_or(rank, |p| p.min(rank)));
            self.relevant_retrieved += 1;
        }
        self.grades.push(grade);
    }

    /// Number of ranks fed so far.
    pub fn ranks_seen(&self) -> usize {
        self.grades.len()
    }

    /// Highly relevant documents among all ranks fed so far.
    pub fn relevant_retrieved(&self) -> usize {
        self.relevant_retrieved
    }

    /// Precision at k: highly relevant documents in the first `k` fed ranks,
    /// divided by `k`.
    ///
    /// When exactly `k` ranks have been fed this is `relevant_retrieved / k`.
    /// If fewer were fed, the missing ranks count as non-relevant. Clamp `k`
    /// to the number of retrieved documents at the call site.
    ///
    /// # Panics
    ///
    /// Panics if `k == 0`.
    pub fn precision_at(&self, k: usize) -> f64 {
        assert!(k > 0, "precision cutoff must be > 0");
        let relevant = if k >= self.grades.len() {
            self.relevant_retrieved
        } else {
            self.grades[..k]
                .iter()
                .filter(|&&g| g == HIGHLY_RELEVANT)
                .count()
        };
        relevant as f64 / k as f64
    }

    /// `1 / (first_relevant_rank + 1)`, or 0.0 if no highly relevant
    /// document was seen.
    pub fn reciprocal_rank(&self) -> f64 {
        self.first_relevant_pos
            .map_or(0.0, |pos| 1.0 / (pos + 1) as f64)
    }

    /// DCG over the first `k` fed grades.
    ///
    /// ```text
    /// DCG@k = Σ_{i=0}^{k-1} (2^grade[i] - 1) / log₂(i + 2)
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `k == 0`.
    pub fn dcg_at(&self, k: usize) -> f64 {
        assert!(k > 0, "DCG cutoff must be > 0");
        dcg(self.grades.iter().copied(), k)
    }

    /// DCG of the fed grades re-ordered best first.
    ///
    /// # Panics
    ///
    /// Panics if `k == 0`.
    pub fn idcg_at(&self, k: usize) -> f64 {
        assert!(k > 0, "IDCG cutoff must be > 0");
        let mut ideal = self.grades.clone();
        ideal.sort_unstable_by(|a, b| b.cmp(a));
        dcg(ideal.into_iter(), k)
    }

    /// `DCG@k / IDCG@k`, or 0.0 when IDCG is 0 (nothing relevant fed).
    pub fn ndcg_at(&self, k: usize) -> f64 {
        let idcg = self.idcg_at(k);
        if idcg == 0.0 {
            0.0
        } else {
            self.dcg_at(k) / idcg
        }
    }

    /// Precision at the topic's number of highly relevant judgments.
    ///
    /// Returns 0.0 for topics without any highly relevant judgment.
    pub fn r_precision(&self, total_relevant: usize) -> f64 {
        if total_relevant == 0 {
            0.0
        } else {
            self.precision_at(total_relevant)
        }
    }
}

fn dcg(grades: impl Iterator<Item = u8>, k: usize) -> f64 {
    grades
        .take(k)
        .enumerate()
        .map(|(i, grade)| gain(grade) / discount(i))
        .sum()
}

/// Exponential gain: 2^grade - 1 (0 -> 0, 1 -> 1, 2 -> 3).
#[inline]
fn gain(grade: u8) -> f64 {
    2f64.powi(i32::from(grade)) - 1.0
}

/// Logarithmic discount for 0-indexed rank `i`: log₂(i + 2).
#[inline]
fn discount(rank: usize) -> f64 {
    (rank as f64 + 2.0).log2()
}

// ============================================================================
// Per-topic evaluation
// ============================================================================

/// Final metric values for one topic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TopicScores {
    /// nDCG at the effective cut
    pub ndcg: f64,
    /// R-Precision
    pub r_precision: f64,
    /// Precision at the effective cut
    pub precision: f64,
    /// Reciprocal rank
    pub reciprocal_rank: f64,
    /// `min(cut, retrieved)`
    pub cut: usize,
    /// Length of the evaluated ranking
    pub retrieved: usize,
    /// Highly relevant judgments for the topic
    pub total_relevant: usize,
}

impl TopicScores {
    /// Scores of a topic for which nothing was retrieved.
    pub fn empty(total_relevant: usize) -> Self {
        Self {
            ndcg: 0.0,
            r_precision: 0.0,
            precision: 0.0,
            reciprocal_rank: 0.0,
            cut: 0,
            retrieved: 0,
            total_relevant,
        }
    }
}

/// Scores a ranking against one topic's judgments.
///
/// The effective cut is `min(cut, retrieved)`. Ranks are fed up to
/// `max(cut, min(total_relevant, retrieved))` so that R-Precision sees as many
/// ranks as exist. Unjudged documents count as grade 0.
///
/// # Panics
///
/// Panics if `cut == 0`.
pub fn evaluate_ranking(ranking: &RankedList, judgments: &TopicJudgments, cut: usize) -> TopicScores {
    assert!(cut > 0, "cut must be > 0");

    let total_relevant = judgments.total_relevant();
    let retrieved = ranking.len();
    if retrieved == 0 {
        return TopicScores::empty(total_relevant);
    }

    let cut = cut.min(retrieved);
    let depth = cut.max(total_relevant.min(retrieved));

    let mut metrics = TopicMetrics::new();
    for (rank, doc) in ranking.iter().take(depth).enumerate() {
        metrics.update(judgments.grade(&doc.doc_id), rank);
    }

    TopicScores {
        ndcg: ndcg_at_cut(&metrics, cut),
        r_precision: metrics.r_precision(total_relevant),
        precision: metrics.precision_at(cut),
        reciprocal_rank: reciprocal_rank_at_cut(&metrics, cut),
        cut,
        retrieved,
        total_relevant,
    }
}

/// nDCG restricted to the first `cut` grades (IDCG from those grades only).
fn ndcg_at_cut(metrics: &TopicMetrics, cut: usize) -> f64 {
    let mut head = TopicMetrics::new();
    for (rank, &grade) in metrics.grades.iter().take(cut).enumerate() {
        head.update(grade, rank);
    }
    head.ndcg_at(cut)
}

/// Reciprocal rank over the first `cut` ranks.
fn reciprocal_rank_at_cut(metrics: &TopicMetrics, cut: usize) -> f64 {
    match metrics.first_relevant_pos {
        Some(pos) if pos < cut => 1.0 / (pos + 1) as f64,
        _ => 0.0,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::DocId;

    fn fed(grades: &[u8]) -> TopicMetrics {
        let mut metrics = TopicMetrics::new();
        for (rank, &grade) in grades.iter().enumerate() {
            metrics.update(grade, rank);
        }
        metrics
    }

    fn judgments(pairs: &[(&str, u8)]) -> TopicJudgments {
        TopicJudgments::from_pairs(pairs.iter().map(|&(id, g)| (DocId::new(id), g)))
    }

    #[test]
    fn test_dcg_example() {
        let metrics = fed(&[2, 0, 1]);

        // 3/1 + 0/log2(3) + 1/2
        assert!((metrics.dcg_at(3) - 3.5).abs() < 1e-12);
        // ideal [2, 1, 0]: 3 + 1/log2(3)
        assert!((metrics.idcg_at(3) - 3.6309).abs() < 1e-4);
        assert!((metrics.ndcg_at(3) - 0.9639).abs() < 1e-4);
    }

    #[test]
    fn test_ndcg_perfect_ranking() {
        let metrics = fed(&[2, 2, 1, 0]);
        assert!((metrics.ndcg_at(4) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_ndcg_no_relevant_is_zero() {
        let metrics = fed(&[0, 0, 0]);
        assert_eq!(metrics.ndcg_at(3), 0.0);
    }

    #[test]
    fn test_reciprocal_rank() {
        assert_eq!(fed(&[2, 0]).reciprocal_rank(), 1.0);
        assert!((fed(&[0, 1, 0, 0, 2]).reciprocal_rank() - 0.2).abs() < 1e-12);
        assert_eq!(fed(&[0, 1, 1]).reciprocal_rank(), 0.0);
    }

    #[test]
    fn test_partial_relevance_not_counted_for_precision() {
        let metrics = fed(&[1, 2, 1]);
        assert_eq!(metrics.relevant_retrieved(), 1);
        assert!((metrics.precision_at(3) - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_precision_counts_only_first_k() {
        let metrics = fed(&[2, 0, 2, 2]);
        assert_eq!(metrics.precision_at(2), 0.5);
        assert_eq!(metrics.precision_at(4), 0.75);
        // Unfed ranks count as non-relevant
        assert_eq!(metrics.precision_at(6), 0.5);
    }

    #[test]
    fn test_r_precision() {
        let metrics = fed(&[2, 0, 2, 0]);
        assert_eq!(metrics.r_precision(2), 0.5);
        assert_eq!(metrics.r_precision(4), 0.5);
        assert_eq!(metrics.r_precision(0), 0.0);
    }

    #[test]
    #[should_panic(expected = "ascending rank order")]
    fn test_out_of_order_rank_panics() {
        let mut metrics = TopicMetrics::new();
        metrics.update(2, 0);
        metrics.update(1, 2);
    }

    #[test]
    #[should_panic(expected = "must be > 0")]
    fn test_zero_cutoff_panics() {
        fed(&[2]).precision_at(0);
    }

    #[test]
    fn test_evaluate_ranking_basic() {
        let ranking = RankedList::from_pairs([("a", 3.0), ("b", 2.0), ("c", 1.0)]);
        let judged = judgments(&[("b", 2), ("c", 1), ("z", 2)]);

        let scores = evaluate_ranking(&ranking, &judged, 10);

        assert_eq!(scores.cut, 3);
        assert_eq!(scores.retrieved, 3);
        assert_eq!(scores.total_relevant, 2);
        assert!((scores.precision - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(scores.reciprocal_rank, 0.5);
        assert_eq!(scores.r_precision, 0.5);
        assert!(scores.ndcg > 0.0 && scores.ndcg < 1.0);
    }

    #[test]
    fn test_evaluate_ranking_r_precision_beyond_cut() {
        // Three relevant judgments, cut 1: R-Precision looks at three ranks
        let ranking = RankedList::from_pairs([("x", 4.0), ("a", 3.0), ("b", 2.0), ("c", 1.0)]);
        let judged = judgments(&[("a", 2), ("b", 2), ("c", 2)]);

        let scores = evaluate_ranking(&ranking, &judged, 1);

        assert_eq!(scores.cut, 1);
        assert_eq!(scores.precision, 0.0);
        assert!((scores.r_precision - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(scores.reciprocal_rank, 0.0);
        assert_eq!(scores.ndcg, 0.0);
    }

    #[test]
    fn test_evaluate_ranking_r_precision_below_cut() {
        // One relevant judgment at rank 2, cut 10
        let ranking = RankedList::from_pairs([("x", 3.0), ("a", 2.0), ("y", 1.0)]);
        let judged = judgments(&[("a", 2)]);

        let scores = evaluate_ranking(&ranking, &judged, 10);

        assert_eq!(scores.r_precision, 0.0);
        assert_eq!(scores.reciprocal_rank, 0.5);
        assert!((scores.precision - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_evaluate_empty_ranking() {
        let scores = evaluate_ranking(&RankedList::default(), &judgments(&[("a", 2)]), 10);
        assert_eq!(scores, TopicScores::empty(1));
    }

    #[test]
    fn test_evaluate_case_insensitive_match() {
        let ranking = RankedList::from_pairs([("NCT0001", 1.0)]);
        let judged = judgments(&[("nct0001", 2)]);
        assert_eq!(evaluate_ranking(&ranking, &judged, 10).precision, 1.0);
    }
}
