//! Evaluation runner: fuses each topic's lists and scores the result.
//!
//! Topics are independent, so [`Evaluator::evaluate`] spreads them over the
//! rayon pool. Each worker folds into its own [`MeanMetrics`]; the partial
//! accumulators are merged at the end and the per-topic results are sorted by
//! topic id, so output does not depend on scheduling.

use super::mean::{MeanMetrics, MeanSummary};
use super::metrics::{evaluate_ranking, TopicScores};
use super::qrels::{RelevanceJudgmentStore, TopicJudgments};
use crate::config::EvalConfig;
use crate::error::FusionError;
use crate::search::{RankedList, SourceLists, TopicId, TopsisFusion};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// Result of evaluating one topic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicEvaluation {
    pub topic: TopicId,
    #[serde(flatten)]
    pub scores: TopicScores,
    /// Whether the ranking came from TOPSIS fusion
    pub fused: bool,
    /// Final ranking, best first, at most `result_size` long
    #[serde(skip)]
    pub ranking: RankedList,
}

/// Builds the final ranking for one topic and scores it.
///
/// With a fusion engine and three lists the ranking is the TOPSIS fusion of
/// the lists, scored by closeness. Otherwise the main list is evaluated as
/// is. The ranking is truncated to `config.result_size`.
pub fn evaluate_topic(
    topic: TopicId,
    lists: &SourceLists,
    judgments: &TopicJudgments,
    config: &EvalConfig,
    fusion: Option<&TopsisFusion>,
) -> TopicEvaluation {
    let (mut ranking, fused) = match (lists, fusion) {
        (
            SourceLists::Triple {
                main,
                inclusion,
                exclusion,
            },
            Some(fusion),
        ) => (fusion.fuse(main, inclusion, exclusion).to_ranked_list(), true),
        _ => {
            let mut main = lists.main().clone();
            let removed = main.dedup_docs();
            if removed > 0 {
                warn!("Topic {}: dropped {} repeated documents", topic, removed);
            }
            (main, false)
        }
    };
    ranking.truncate(config.result_size);

    let scores = evaluate_ranking(&ranking, judgments, config.cut);
    debug!(
        "Topic {}: nDCG@{}={:.4} P={:.4} RR={:.4} RPrec={:.4}",
        topic, scores.cut, scores.ndcg, scores.precision, scores.reciprocal_rank, scores.r_precision
    );

    TopicEvaluation {
        topic,
        scores,
        fused,
        ranking,
    }
}

/// Per-topic results and run means.
#[derive(Debug, Clone, PartialEq)]
pub struct RunEvaluation {
    topics: Vec<TopicEvaluation>,
    mean: MeanMetrics,
}

impl RunEvaluation {
    /// Per-topic results in ascending topic order.
    pub fn topics(&self) -> &[TopicEvaluation] {
        &self.topics
    }

    pub fn mean(&self) -> &MeanMetrics {
        &self.mean
    }

    pub fn summary(&self) -> MeanSummary {
        self.mean.summary()
    }

    /// nDCG per topic, for pairing with another run.
    pub fn ndcg_by_topic(&self) -> BTreeMap<TopicId, f64> {
        self.topics
            .iter()
            .map(|eval| (eval.topic, eval.scores.ndcg))
            .collect()
    }

    /// Final rankings per topic, for writing a run file.
    pub fn rankings(&self) -> impl Iterator<Item = (TopicId, &RankedList)> + '_ {
        self.topics.iter().map(|eval| (eval.topic, &eval.ranking))
    }
}

/// Runs fusion and evaluation over every topic of a collection.
///
/// # Example
///
/// ```
/// use std::collections::BTreeMap;
/// use trialrank_core::config::EvalConfig;
/// use trialrank_core::evaluation::{Evaluator, RelevanceJudgmentStore};
/// use trialrank_core::search::{DocId, RankedList, SourceLists, TopicId};
///
/// let mut qrels = RelevanceJudgmentStore::new();
/// qrels.insert(TopicId::new(1), DocId::new("NCT01"), 2);
///
/// let mut lists = BTreeMap::new();
/// lists.insert(
///     TopicId::new(1),
///     SourceLists::Single(RankedList::from_pairs([("NCT01", 3.0), ("NCT02", 1.0)])),
/// );
///
/// let evaluator = Evaluator::new(EvalConfig::default()).unwrap();
/// let run = evaluator.evaluate(&lists, &qrels);
/// assert_eq!(run.mean().mean_reciprocal_rank(), 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct Evaluator {
    config: EvalConfig,
    fusion: Option<TopsisFusion>,
}

impl Evaluator {
    /// Creates an evaluator; builds the fusion engine when fusion is enabled.
    pub fn new(config: EvalConfig) -> Result<Self, FusionError> {
        let fusion = if config.fusion.enabled {
            Some(TopsisFusion::new(config.fusion.clone())?)
        } else {
            None
        };
        Ok(Self { config, fusion })
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Evaluates every topic that has rankings or judgments.
    pub fn evaluate(
        &self,
        lists: &BTreeMap<TopicId, SourceLists>,
        qrels: &RelevanceJudgmentStore,
    ) -> RunEvaluation {
        self.evaluate_with_progress(lists, qrels, &|| {})
    }

    /// Like [`evaluate`](Self::evaluate), calling `progress` once per
    /// finished topic (from worker threads when running in parallel).
    pub fn evaluate_with_progress(
        &self,
        lists: &BTreeMap<TopicId, SourceLists>,
        qrels: &RelevanceJudgmentStore,
        progress: &(dyn Fn() + Sync),
    ) -> RunEvaluation {
        let topics: Vec<TopicId> = lists
            .keys()
            .copied()
            .chain(qrels.topics())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let no_lists = SourceLists::Single(RankedList::default());
        let no_judgments = TopicJudgments::default();

        let run_topic = |topic: TopicId| {
            let eval = evaluate_topic(
                topic,
                lists.get(&topic).unwrap_or(&no_lists),
                qrels.judgments_for(topic).unwrap_or(&no_judgments),
                &self.config,
                self.fusion.as_ref(),
            );
            progress();
            eval
        };

        let fold_topic = |(mut evals, mut mean): (Vec<TopicEvaluation>, MeanMetrics), topic| {
            let eval = run_topic(topic);
            mean.add_scores(&eval.scores);
            evals.push(eval);
            (evals, mean)
        };

        let (mut evals, mean) = if self.config.parallel {
            topics
                .par_iter()
                .copied()
                .fold(|| (Vec::new(), MeanMetrics::new()), fold_topic)
                .reduce(
                    || (Vec::new(), MeanMetrics::new()),
                    |(mut left, left_mean), (right, right_mean)| {
                        left.extend(right);
                        (left, left_mean.merge(right_mean))
                    },
                )
        } else {
            topics
                .iter()
                .copied()
                .fold((Vec::new(), MeanMetrics::new()), fold_topic)
        };
        evals.sort_by_key(|eval| eval.topic);

        info!(
            "Evaluated {} topics: nDCG@{}={:.4} RPrec={:.4} P@{}={:.4} MRR={:.4}",
            mean.topics(),
            self.config.cut,
            mean.mean_ndcg(),
            mean.mean_r_precision(),
            self.config.cut,
            mean.mean_precision(),
            mean.mean_reciprocal_rank()
        );

        RunEvaluation {
            topics: evals,
            mean,
        }
    }
}
