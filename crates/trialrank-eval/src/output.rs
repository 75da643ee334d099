//! Report formatting.
//!
//! Supports both human-readable tables and JSON for scripting.

use crate::profile::TopicFilters;
use serde::Serialize;
use std::path::PathBuf;
use trialrank_core::eligibility::Criteria;
use trialrank_core::config::{CriterionWeights, EvalConfig};
use trialrank_core::evaluation::{MeanSummary, RunComparison, RunEvaluation, TopicEvaluation};

/// Everything printed at the end of a run.
#[derive(Debug, Serialize)]
pub struct EvalReport<'a> {
    pub settings: Settings,
    pub mean: MeanSummary,
    pub topics: &'a [TopicEvaluation],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<RunComparison>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_file: Option<PathBuf>,
}

/// Run settings echoed into the report.
#[derive(Debug, Serialize)]
pub struct Settings {
    pub cut: usize,
    pub result_size: usize,
    pub fusion: bool,
    pub weights: CriterionWeights,
}

impl From<&EvalConfig> for Settings {
    fn from(config: &EvalConfig) -> Self {
        Self {
            cut: config.cut,
            result_size: config.result_size,
            fusion: config.fusion.enabled,
            weights: config.fusion.weights,
        }
    }
}

impl<'a> EvalReport<'a> {
    pub fn new(config: &EvalConfig, run: &'a RunEvaluation) -> Self {
        Self {
            settings: Settings::from(config),
            mean: run.summary(),
            topics: run.topics(),
            comparison: None,
            metrics_file: None,
            run_file: None,
        }
    }
}

/// Formats any report as pretty JSON.
pub fn format_json<T: Serialize + ?Sized>(report: &T) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
}

/// Formats topic filters as a table.
pub fn format_topic_filters(filters: &[TopicFilters]) -> String {
    let mut output = String::new();
    output.push_str(&format!("{}\n", "=".repeat(70)));
    output.push_str(&format!("TOPIC PROFILES ({} topics)\n", filters.len()));
    output.push_str(&format!("{}\n", "=".repeat(70)));
    output.push_str(&format!(
        "{:<8} {:<16} {:>8} {:<10} {:<8}\n",
        "Topic", "Age", "Years", "Gender", "Filter"
    ));
    for f in filters {
        let years = f
            .age_years
            .map_or_else(|| "-".to_string(), |years| format!("{:.2}", years));
        output.push_str(&format!(
            "{:<8} {:<16} {:>8} {:<10} {:<8}\n",
            f.topic,
            f.age.as_deref().unwrap_or("-"),
            years,
            f.gender.as_deref().unwrap_or("-"),
            f.gender_filter.unwrap_or("all")
        ));
    }
    output.push_str(&"=".repeat(70));
    output
}

/// Formats the two sections of split eligibility text.
pub fn format_criteria(criteria: &Criteria) -> String {
    let mut output = String::new();
    output.push_str(&format!("{}\n", "=".repeat(70)));
    output.push_str("INCLUSION CRITERIA\n");
    output.push_str(&format!("{}\n", "-".repeat(70)));
    output.push_str(&format!("{}\n", criteria.inclusion));
    output.push_str(&format!("{}\n", "=".repeat(70)));
    output.push_str("EXCLUSION CRITERIA\n");
    output.push_str(&format!("{}\n", "-".repeat(70)));
    output.push_str(&format!("{}\n", criteria.exclusion));
    output.push_str(&"=".repeat(70));
    output
}

/// Formats the report for the terminal.
///
/// Per-topic rows are included when `per_topic` is set.
pub fn format_human(report: &EvalReport<'_>, per_topic: bool) -> String {
    let s = &report.settings;
    let mut output = String::new();

    output.push_str(&format!("{}\n", "=".repeat(70)));
    output.push_str("TRIALRANK EVALUATION\n");
    output.push_str(&format!("{}\n", "=".repeat(70)));
    output.push_str(&format!(
        "Topics: {}   cut: {}   result size: {}\n",
        report.mean.topics, s.cut, s.result_size
    ));
    if s.fusion {
        output.push_str(&format!(
            "Fusion: TOPSIS (main {}, inclusion {}, exclusion {})\n",
            s.weights.main, s.weights.inclusion, s.weights.exclusion
        ));
    } else {
        output.push_str("Fusion: off (main index only)\n");
    }

    let cut_label = |name: &str| format!("{}@{}", name, s.cut);

    if per_topic && !report.topics.is_empty() {
        output.push_str(&format!("\n{}\n", "-".repeat(70)));
        output.push_str(&format!(
            "{:<8} {:>10} {:>10} {:>10} {:>10} {:>8}\n",
            "Topic",
            cut_label("nDCG"),
            "RPrec",
            cut_label("P"),
            "RR",
            "Rel"
        ));
        for eval in report.topics {
            let m = &eval.scores;
            output.push_str(&format!(
                "{:<8} {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>8}\n",
                eval.topic, m.ndcg, m.r_precision, m.precision, m.reciprocal_rank, m.total_relevant
            ));
        }
    }

    let mean = &report.mean;
    output.push_str(&format!("\n{}\n", "-".repeat(70)));
    output.push_str("MEAN\n");
    output.push_str(&format!(
        "{:<12} {:.4}\n{:<12} {:.4}\n{:<12} {:.4}\n{:<12} {:.4}\n",
        cut_label("nDCG"),
        mean.ndcg,
        "RPrec",
        mean.r_precision,
        cut_label("P"),
        mean.precision,
        "MRR",
        mean.reciprocal_rank
    ));
    if mean.ndcg_skipped > 0 {
        output.push_str(&format!(
            "({} topic(s) with undefined nDCG counted as 0)\n",
            mean.ndcg_skipped
        ));
    }

    if let Some(c) = &report.comparison {
        output.push_str(&format!("\n{}\n", "-".repeat(70)));
        output.push_str(&format!(
            "BASELINE COMPARISON (nDCG, {} topics, * = p < 0.05)\n",
            c.topics
        ));
        output.push_str(&format!("{:<10} {}\n", "This run", c.system.format(4)));
        output.push_str(&format!("{:<10} {}\n", "Baseline", c.baseline.format(4)));
        output.push_str(&format!(
            "{}   d={:.3} ({})\n",
            c.ttest.format(),
            c.effect_size,
            c.effect
        ));
    }

    if report.metrics_file.is_some() || report.run_file.is_some() {
        output.push('\n');
    }
    if let Some(path) = &report.metrics_file {
        output.push_str(&format!("Metrics written to {}\n", path.display()));
    }
    if let Some(path) = &report.run_file {
        output.push_str(&format!("Run written to {}\n", path.display()));
    }

    output.push_str(&"=".repeat(70));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use trialrank_core::evaluation::{Evaluator, RelevanceJudgmentStore};
    use trialrank_core::search::{DocId, RankedList, SourceLists, TopicId};

    fn sample_run(config: &EvalConfig) -> RunEvaluation {
        let mut qrels = RelevanceJudgmentStore::new();
        qrels.insert(TopicId::new(4), DocId::new("NCT1"), 2);
        let mut lists = BTreeMap::new();
        lists.insert(
            TopicId::new(4),
            SourceLists::Single(RankedList::from_pairs([("NCT2", 2.0), ("NCT1", 1.0)])),
        );
        Evaluator::new(config.clone()).unwrap().evaluate(&lists, &qrels)
    }

    #[test]
    fn test_json_contains_topics_and_mean() {
        let config = EvalConfig::default();
        let run = sample_run(&config);
        let report = EvalReport::new(&config, &run);

        let value: serde_json::Value = serde_json::from_str(&format_json(&report)).unwrap();
        assert_eq!(value["settings"]["cut"], 10);
        assert_eq!(value["settings"]["weights"]["exclusion_weight"], 0.6);
        assert_eq!(value["mean"]["reciprocal_rank"], 0.5);
        assert_eq!(value["topics"][0]["topic"], 4);
        assert_eq!(value["topics"][0]["reciprocal_rank"], 0.5);
        assert!(value.get("comparison").is_none());
    }

    #[test]
    fn test_human_output() {
        let mut config = EvalConfig::default();
        config.fusion.enabled = false;
        let run = sample_run(&config);
        let mut report = EvalReport::new(&config, &run);
        report.metrics_file = Some(PathBuf::from("metrics/x.csv"));

        let text = format_human(&report, true);
        assert!(text.contains("Fusion: off"));
        assert!(text.contains("nDCG@10"));
        assert!(text.contains("MRR          0.5000"));
        assert!(text.contains("Metrics written to metrics/x.csv"));
        assert!(!text.contains("BASELINE"));
    }

    #[test]
    fn test_topic_filters_table() {
        let filters = vec![
            TopicFilters {
                topic: TopicId::new(1),
                age: Some("58-year-old".to_string()),
                age_years: Some(58.0),
                gender: Some("woman".to_string()),
                gender_filter: Some("female"),
            },
            TopicFilters {
                topic: TopicId::new(2),
                age: None,
                age_years: None,
                gender: None,
                gender_filter: None,
            },
        ];

        let text = format_topic_filters(&filters);
        assert!(text.contains("TOPIC PROFILES (2 topics)"));
        assert!(text.contains("58-year-old"));
        assert!(text.contains("58.00"));
        assert!(text.contains("female"));
        assert!(text.lines().any(|line| line.starts_with('2') && line.trim_end().ends_with("all")));

        let value: serde_json::Value = serde_json::from_str(&format_json(&filters)).unwrap();
        assert_eq!(value[0]["gender_filter"], "female");
        assert!(value[1]["age_years"].is_null());
    }

    #[test]
    fn test_criteria_sections() {
        let criteria = Criteria {
            inclusion: "- Adults".to_string(),
            exclusion: "- Pregnancy".to_string(),
        };
        let text = format_criteria(&criteria);
        let inclusion = text.find("INCLUSION CRITERIA").unwrap();
        let exclusion = text.find("EXCLUSION CRITERIA").unwrap();
        assert!(inclusion < text.find("- Adults").unwrap());
        assert!(exclusion < text.find("- Pregnancy").unwrap());
    }
}
