//! TOPSIS fusion of the main, inclusion and exclusion rankings.
//!
//! TOPSIS (Technique for Order of Preference by Similarity to Ideal
//! Solution) treats each retrieval source as a decision criterion and each
//! retrieved trial as an alternative. Every trial is scored by how close it
//! lies to the best value seen on every criterion and how far from the worst.
//!
//! # Algorithm
//!
//! ```text
//! x[d][c]   = score of doc d from source c (0 if not retrieved)
//! r[d][c]   = x[d][c] / sqrt(Σ_d x[d][c]²)            vector normalization
//! v[d][c]   = w[c] * r[d][c]                           weighting
//! A+[c]     = max_d v (benefit) | min_d v (cost)       ideal best
//! A-[c]     = min_d v (benefit) | max_d v (cost)       ideal worst
//! S+[d]     = ||v[d] - A+||,  S-[d] = ||v[d] - A-||
//! C[d]      = S-[d] / (S-[d] + S+[d])                  closeness in [0, 1]
//! ```
//!
//! Main and inclusion are benefit criteria. Exclusion is a cost criterion: a
//! trial whose exclusion text matches the patient strongly is likely to
//! exclude them.
//!
//! # Degenerate input
//!
//! - No document retrieved by any source: empty ranking.
//! - A column whose norm is 0: see [`ZeroNormPolicy`].
//! - `S+ + S- == 0` (a document equal to both ideals): closeness 1.0.
//!
//! The output order is descending closeness with ties broken by ascending
//! document id, so identical inputs always produce identical rankings.

use super::types::{DocId, RankedList, ScoredDoc, Source};
use crate::config::{FusionConfig, Polarity, ZeroNormPolicy};
use crate::error::FusionError;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

/// Number of criteria (retrieval sources).
pub const CRITERIA: usize = 3;

/// One value per criterion, in [`Source::column`] order.
pub type CriterionVector = [f64; CRITERIA];

// ============================================================================
// Decision matrix
// ============================================================================

/// Document id → criterion score vector for one topic.
///
/// Backed by a `BTreeMap` so every scan visits rows in document-id order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecisionMatrix {
    rows: BTreeMap<DocId, CriterionVector>,
}

impl DecisionMatrix {
    /// Unions the documents of the three lists.
    ///
    /// A document missing from a list scores 0 on that criterion. When a list
    /// repeats a document, its first (best-ranked) entry is used.
    pub fn from_lists(main: &RankedList, inclusion: &RankedList, exclusion: &RankedList) -> Self {
        let mut rows: BTreeMap<DocId, CriterionVector> = BTreeMap::new();

        for (source, list) in [
            (Source::Main, main),
            (Source::Inclusion, inclusion),
            (Source::Exclusion, exclusion),
        ] {
            let column = source.column();
            let mut seen: HashSet<&DocId> = HashSet::with_capacity(list.len());

            for ScoredDoc { doc_id, score } in list {
                if !seen.insert(doc_id) {
                    continue;
                }
                let score = if score.is_finite() {
                    *score
                } else {
                    warn!("Non-finite {} score {} for '{}', using 0", source, score, doc_id);
                    0.0
                };
                rows.entry(doc_id.clone()).or_insert([0.0; CRITERIA])[column] = score;
            }
        }

        Self { rows }
    }

    /// Builds a matrix from explicit rows.
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (DocId, CriterionVector)>,
    {
        Self {
            rows: rows.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, doc_id: &DocId) -> Option<&CriterionVector> {
        self.rows.get(doc_id)
    }

    /// Rows in document-id order.
    pub fn rows(&self) -> impl Iterator<Item = (&DocId, &CriterionVector)> {
        self.rows.iter()
    }

    /// Euclidean norm of each criterion column.
    pub fn column_norms(&self) -> CriterionVector {
        let mut sums = [0.0; CRITERIA];
        for row in self.rows.values() {
            for (sum, value) in sums.iter_mut().zip(row) {
                *sum += value * value;
            }
        }
        sums.map(f64::sqrt)
    }

    /// Divides every column by its norm. Zero-norm columns become all zeros.
    pub fn normalized(&self) -> Self {
        let norms = self.column_norms();
        let rows = self
            .rows
            .iter()
            .map(|(doc_id, row)| {
                let mut normalized = [0.0; CRITERIA];
                for c in 0..CRITERIA {
                    if norms[c] > 0.0 {
                        normalized[c] = row[c] / norms[c];
                    }
                }
                (doc_id.clone(), normalized)
            })
            .collect();
        Self { rows }
    }

    /// Multiplies every column by its weight.
    pub fn weighted(&self, weights: &CriterionVector) -> Self {
        let rows = self
            .rows
            .iter()
            .map(|(doc_id, row)| {
                let mut weighted = *row;
                for (value, weight) in weighted.iter_mut().zip(weights) {
                    *value *= weight;
                }
                (doc_id.clone(), weighted)
            })
            .collect();
        Self { rows }
    }
}

// ============================================================================
// Ideal solutions
// ============================================================================

/// Ideal-best and ideal-worst vectors of a weighted matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdealVectors {
    pub best: CriterionVector,
    pub worst: CriterionVector,
}

impl IdealVectors {
    /// Scans the rows once. Returns `None` for an empty matrix.
    pub fn from_matrix(matrix: &DecisionMatrix, polarity: &[Polarity; CRITERIA]) -> Option<Self> {
        if matrix.is_empty() {
            return None;
        }

        let mut best = [0.0; CRITERIA];
        let mut worst = [0.0; CRITERIA];
        for c in 0..CRITERIA {
            let (b, w) = match polarity[c] {
                Polarity::Benefit => (f64::NEG_INFINITY, f64::INFINITY),
                Polarity::Cost => (f64::INFINITY, f64::NEG_INFINITY),
            };
            best[c] = b;
            worst[c] = w;
        }

        for (_, row) in matrix.rows() {
            for c in 0..CRITERIA {
                match polarity[c] {
                    Polarity::Benefit => {
                        best[c] = best[c].max(row[c]);
                        worst[c] = worst[c].min(row[c]);
                    }
                    Polarity::Cost => {
                        best[c] = best[c].min(row[c]);
                        worst[c] = worst[c].max(row[c]);
                    }
                }
            }
        }

        Some(Self { best, worst })
    }
}

/// Relative closeness of `row` to the ideal-best vector.
///
/// Only criteria with `active[c] == true` contribute to the distances.
/// Returns 1.0 when the row coincides with both ideals.
pub fn closeness(row: &CriterionVector, ideals: &IdealVectors, active: &[bool; CRITERIA]) -> f64 {
    let mut to_best = 0.0;
    let mut to_worst = 0.0;
    for c in (0..CRITERIA).filter(|&c| active[c]) {
        to_best += (row[c] - ideals.best[c]).powi(2);
        to_worst += (row[c] - ideals.worst[c]).powi(2);
    }
    let to_best = to_best.sqrt();
    let to_worst = to_worst.sqrt();

    let total = to_best + to_worst;
    if total == 0.0 {
        return 1.0;
    }
    (to_worst / total).clamp(0.0, 1.0)
}

// ============================================================================
// Fused ranking
// ============================================================================

/// A fused document with its closeness coefficient.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FusedDoc {
    pub doc_id: DocId,
    pub closeness: f64,
}

/// Consensus ranking, descending by closeness.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FusedRanking {
    docs: Vec<FusedDoc>,
}

impl FusedRanking {
    /// Sorts `docs` by descending closeness, ties by ascending id.
    pub fn from_unsorted(mut docs: Vec<FusedDoc>) -> Self {
        docs.sort_by(|a, b| rank_order(a, b));
        Self { docs }
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FusedDoc> {
        self.docs.iter()
    }

    pub fn as_slice(&self) -> &[FusedDoc] {
        &self.docs
    }

    /// The ranking as a [`RankedList`] scored by closeness.
    pub fn to_ranked_list(&self) -> RankedList {
        RankedList::new(
            self.docs
                .iter()
                .map(|d| ScoredDoc {
                    doc_id: d.doc_id.clone(),
                    score: d.closeness,
                })
                .collect(),
        )
    }
}

fn rank_order(a: &FusedDoc, b: &FusedDoc) -> Ordering {
    b.closeness
        .total_cmp(&a.closeness)
        .then_with(|| a.doc_id.cmp(&b.doc_id))
}

// ============================================================================
// TopsisFusion
// ============================================================================

/// Fuses the three per-source rankings of a topic.
///
/// # Example
///
/// ```
/// use trialrank_core::config::{CriterionWeights, FusionConfig};
/// use trialrank_core::search::{RankedList, TopsisFusion};
///
/// let fusion = TopsisFusion::new(FusionConfig {
///     weights: CriterionWeights::new(1.0, 1.0, 1.0),
///     ..FusionConfig::default()
/// })
/// .unwrap();
///
/// let main = RankedList::from_pairs([("doc1", 3.0)]);
/// let inclusion = RankedList::from_pairs([("doc1", 4.0)]);
/// let exclusion = RankedList::from_pairs([("doc2", 5.0)]);
///
/// let fused = fusion.fuse(&main, &inclusion, &exclusion);
/// assert_eq!(fused.as_slice()[0].doc_id.as_str(), "doc1");
/// assert_eq!(fused.as_slice()[0].closeness, 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct TopsisFusion {
    config: FusionConfig,
}

impl TopsisFusion {
    /// Validates the weights and creates the fusion engine.
    pub fn new(config: FusionConfig) -> Result<Self, FusionError> {
        config.weights.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Fuses three ranked lists into one ranking.
    pub fn fuse(
        &self,
        main: &RankedList,
        inclusion: &RankedList,
        exclusion: &RankedList,
    ) -> FusedRanking {
        self.fuse_matrix(&DecisionMatrix::from_lists(main, inclusion, exclusion))
    }

    /// Runs TOPSIS on an already assembled decision matrix.
    pub fn fuse_matrix(&self, matrix: &DecisionMatrix) -> FusedRanking {
        if matrix.is_empty() {
            return FusedRanking::default();
        }

        let norms = matrix.column_norms();
        let active: [bool; CRITERIA] = match self.config.zero_norm {
            ZeroNormPolicy::Zero => [true; CRITERIA],
            ZeroNormPolicy::Exclude => norms.map(|n| n > 0.0),
        };
        if norms.iter().any(|&n| n == 0.0) {
            debug!(
                "Zero-norm criterion columns {:?} ({:?} policy)",
                norms, self.config.zero_norm
            );
        }

        let weighted = matrix
            .normalized()
            .weighted(&self.config.weights.as_array());
        let Some(ideals) = IdealVectors::from_matrix(&weighted, &self.config.polarity) else {
            return FusedRanking::default();
        };

        let docs = weighted
            .rows()
            .map(|(doc_id, row)| FusedDoc {
                doc_id: doc_id.clone(),
                closeness: closeness(row, &ideals, &active),
            })
            .collect();

        let ranking = FusedRanking::from_unsorted(docs);
        debug!("Fused {} documents", ranking.len());
        ranking
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CriterionWeights;

    fn unit_fusion() -> TopsisFusion {
        TopsisFusion::new(FusionConfig {
            weights: CriterionWeights::new(1.0, 1.0, 1.0),
            ..FusionConfig::default()
        })
        .unwrap()
    }

    fn ids(ranking: &FusedRanking) -> Vec<&str> {
        ranking.iter().map(|d| d.doc_id.as_str()).collect()
    }

    #[test]
    fn test_two_document_example() {
        // Doc1 = (3, 4, 0), Doc2 = (0, 0, 5); column norms 3, 4, 5
        let main = RankedList::from_pairs([("doc1", 3.0)]);
        let inclusion = RankedList::from_pairs([("doc1", 4.0)]);
        let exclusion = RankedList::from_pairs([("doc2", 5.0)]);

        let fused = unit_fusion().fuse(&main, &inclusion, &exclusion);

        assert_eq!(ids(&fused), vec!["doc1", "doc2"]);
        assert!((fused.as_slice()[0].closeness - 1.0).abs() < 1e-12);
        assert!(fused.as_slice()[1].closeness.abs() < 1e-12);
    }

    #[test]
    fn test_decision_matrix_defaults_missing_to_zero() {
        let main = RankedList::from_pairs([("a", 2.0), ("b", 1.0)]);
        let inclusion = RankedList::from_pairs([("b", 5.0)]);
        let exclusion = RankedList::from_pairs([("c", 7.0)]);

        let matrix = DecisionMatrix::from_lists(&main, &inclusion, &exclusion);

        assert_eq!(matrix.len(), 3);
        assert_eq!(matrix.get(&DocId::new("a")), Some(&[2.0, 0.0, 0.0]));
        assert_eq!(matrix.get(&DocId::new("b")), Some(&[1.0, 5.0, 0.0]));
        assert_eq!(matrix.get(&DocId::new("c")), Some(&[0.0, 0.0, 7.0]));
    }

    #[test]
    fn test_duplicate_entry_keeps_first() {
        let main = RankedList::from_pairs([("a", 9.0), ("A", 1.0)]);
        let matrix = DecisionMatrix::from_lists(&main, &RankedList::default(), &RankedList::default());
        assert_eq!(matrix.get(&DocId::new("a")), Some(&[9.0, 0.0, 0.0]));
    }

    #[test]
    fn test_non_finite_score_treated_as_zero() {
        let main = RankedList::from_pairs([("a", f64::NAN), ("b", 1.0)]);
        let matrix = DecisionMatrix::from_lists(&main, &RankedList::default(), &RankedList::default());
        assert_eq!(matrix.get(&DocId::new("a")), Some(&[0.0, 0.0, 0.0]));
    }

    #[test]
    fn test_column_norms_and_normalization() {
        let matrix = DecisionMatrix::from_rows([
            (DocId::new("a"), [3.0, 0.0, 1.0]),
            (DocId::new("b"), [4.0, 0.0, 0.0]),
        ]);
        assert_eq!(matrix.column_norms(), [5.0, 0.0, 1.0]);

        let normalized = matrix.normalized();
        assert_eq!(normalized.get(&DocId::new("a")), Some(&[0.6, 0.0, 1.0]));
        assert_eq!(normalized.get(&DocId::new("b")), Some(&[0.8, 0.0, 0.0]));
    }

    #[test]
    fn test_ideal_vectors_follow_polarity() {
        let matrix = DecisionMatrix::from_rows([
            (DocId::new("a"), [0.2, 0.9, 0.1]),
            (DocId::new("b"), [0.8, 0.1, 0.7]),
        ]);
        let polarity = [Polarity::Benefit, Polarity::Benefit, Polarity::Cost];
        let ideals = IdealVectors::from_matrix(&matrix, &polarity).unwrap();

        assert_eq!(ideals.best, [0.8, 0.9, 0.1]);
        assert_eq!(ideals.worst, [0.2, 0.1, 0.7]);
        assert!(IdealVectors::from_matrix(&DecisionMatrix::default(), &polarity).is_none());
    }

    #[test]
    fn test_empty_input_gives_empty_ranking() {
        let empty = RankedList::default();
        assert!(unit_fusion().fuse(&empty, &empty, &empty).is_empty());
    }

    #[test]
    fn test_single_document_is_maximal() {
        let main = RankedList::from_pairs([("only", 2.0)]);
        let fused = unit_fusion().fuse(&main, &RankedList::default(), &RankedList::default());
        assert_eq!(fused.len(), 1);
        assert_eq!(fused.as_slice()[0].closeness, 1.0);
    }

    #[test]
    fn test_zero_norm_column_does_not_produce_nan() {
        // Nobody matched exclusion text
        let main = RankedList::from_pairs([("a", 3.0), ("b", 1.0)]);
        let inclusion = RankedList::from_pairs([("b", 2.0), ("a", 1.0)]);
        let fused = unit_fusion().fuse(&main, &inclusion, &RankedList::default());

        for doc in fused.iter() {
            assert!(doc.closeness.is_finite());
            assert!((0.0..=1.0).contains(&doc.closeness));
        }
    }

    #[test]
    fn test_zero_norm_policies_agree() {
        let main = RankedList::from_pairs([("a", 3.0), ("b", 1.0)]);
        let empty = RankedList::default();

        let matrix = DecisionMatrix::from_lists(&main, &empty, &empty);
        let zero = unit_fusion().fuse_matrix(&matrix);
        let exclude = TopsisFusion::new(FusionConfig {
            weights: CriterionWeights::new(1.0, 1.0, 1.0),
            zero_norm: ZeroNormPolicy::Exclude,
            ..FusionConfig::default()
        })
        .unwrap()
        .fuse_matrix(&matrix);

        assert_eq!(zero, exclude);
        assert_eq!(exclude.as_slice()[0].closeness, 1.0);
        assert_eq!(exclude.as_slice()[1].closeness, 0.0);
    }

    #[test]
    fn test_exclusion_is_cost_criterion() {
        // Same main and inclusion evidence; "b" also matches exclusion text
        let main = RankedList::from_pairs([("a", 1.0), ("b", 1.0)]);
        let inclusion = RankedList::from_pairs([("a", 1.0), ("b", 1.0)]);
        let exclusion = RankedList::from_pairs([("b", 4.0)]);

        let fused = unit_fusion().fuse(&main, &inclusion, &exclusion);
        assert_eq!(ids(&fused), vec!["a", "b"]);
    }

    #[test]
    fn test_ties_broken_by_doc_id() {
        let main = RankedList::from_pairs([("zeta", 1.0), ("alpha", 1.0), ("mid", 1.0)]);
        let fused = unit_fusion().fuse(&main, &RankedList::default(), &RankedList::default());
        assert_eq!(ids(&fused), vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_order_independent_of_input_order() {
        let main = RankedList::from_pairs([("a", 5.0), ("b", 3.0), ("c", 3.0), ("d", 1.0)]);
        let inclusion = RankedList::from_pairs([("c", 2.0), ("a", 1.0)]);
        let exclusion = RankedList::from_pairs([("d", 4.0), ("b", 0.5)]);

        let mut reversed_main = main.as_slice().to_vec();
        reversed_main.reverse();
        let reversed_main = RankedList::new(reversed_main);

        let fusion = unit_fusion();
        assert_eq!(
            fusion.fuse(&main, &inclusion, &exclusion),
            fusion.fuse(&reversed_main, &inclusion, &exclusion)
        );
    }

    #[test]
    fn test_weights_change_ranking() {
        // "a" is strong on main, "b" strong on inclusion
        let main = RankedList::from_pairs([("a", 10.0), ("b", 1.0)]);
        let inclusion = RankedList::from_pairs([("b", 10.0), ("a", 1.0)]);
        let empty = RankedList::default();

        let favor_main = TopsisFusion::new(FusionConfig {
            weights: CriterionWeights::new(1.0, 0.1, 0.0),
            ..FusionConfig::default()
        })
        .unwrap();
        let favor_inclusion = TopsisFusion::new(FusionConfig {
            weights: CriterionWeights::new(0.1, 1.0, 0.0),
            ..FusionConfig::default()
        })
        .unwrap();

        assert_eq!(ids(&favor_main.fuse(&main, &inclusion, &empty))[0], "a");
        assert_eq!(ids(&favor_inclusion.fuse(&main, &inclusion, &empty))[0], "b");
    }

    #[test]
    fn test_invalid_weights_rejected() {
        let err = TopsisFusion::new(FusionConfig {
            weights: CriterionWeights::new(0.4, f64::NAN, 0.6),
            ..FusionConfig::default()
        })
        .unwrap_err();
        assert!(matches!(
            err,
            FusionError::InvalidWeight {
                criterion: "inclusion",
                ..
            }
        ));
    }

    #[test]
    fn test_closeness_guards_zero_distance() {
        let ideals = IdealVectors {
            best: [0.5, 0.5, 0.5],
            worst: [0.5, 0.5, 0.5],
        };
        assert_eq!(closeness(&[0.5, 0.5, 0.5], &ideals, &[true; CRITERIA]), 1.0);
        assert_eq!(closeness(&[0.1, 0.2, 0.3], &ideals, &[false; CRITERIA]), 1.0);
    }

    #[test]
    fn test_to_ranked_list_preserves_order() {
        let main = RankedList::from_pairs([("a", 1.0), ("b", 2.0)]);
        let fused = unit_fusion().fuse(&main, &RankedList::default(), &RankedList::default());
        let list = fused.to_ranked_list();
        let ids: Vec<&str> = list.iter().map(|d| d.doc_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(list.as_slice()[0].score, 1.0);
    }
}
