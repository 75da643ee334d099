//! Loading inputs and running an evaluation.

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use trialrank_core::evaluation::{
    compare_runs, Evaluator, RelevanceJudgmentStore, RunComparison, RunEvaluation,
};
use trialrank_core::search::{SourceLists, TopicId};
use trialrank_core::trec;

/// Run files for one evaluation.
#[derive(Debug, Clone)]
pub struct RunInputs {
    pub main: PathBuf,
    pub inclusion: Option<PathBuf>,
    pub exclusion: Option<PathBuf>,
}

/// Reads the run files into per-topic source lists.
///
/// With inclusion and exclusion runs every topic gets a triple (a topic
/// missing from one run gets an empty list there). With only the main run
/// every topic is single-index.
pub fn load_source_lists(
    inputs: &RunInputs,
    result_size: usize,
) -> Result<BTreeMap<TopicId, SourceLists>> {
    let read = |path: &Path| {
        trec::read_run_file(path, result_size)
            .with_context(|| format!("Failed to read run file: {}", path.display()))
    };

    let mut main = read(&inputs.main)?;
    let (mut inclusion, mut exclusion) = match (&inputs.inclusion, &inputs.exclusion) {
        (Some(inclusion), Some(exclusion)) => (read(inclusion)?, read(exclusion)?),
        (None, None) => {
            return Ok(main
                .into_iter()
                .map(|(topic, list)| (topic, SourceLists::Single(list)))
                .collect());
        }
        _ => bail!("--inclusion and --exclusion must be given together"),
    };

    let topics: BTreeSet<TopicId> = main
        .keys()
        .chain(inclusion.keys())
        .chain(exclusion.keys())
        .copied()
        .collect();

    Ok(topics
        .into_iter()
        .map(|topic| {
            let lists = SourceLists::Triple {
                main: main.remove(&topic).unwrap_or_default(),
                inclusion: inclusion.remove(&topic).unwrap_or_default(),
                exclusion: exclusion.remove(&topic).unwrap_or_default(),
            };
            (topic, lists)
        })
        .collect())
}

/// Loads the relevance judgments.
pub fn load_qrels(path: &Path) -> Result<RelevanceJudgmentStore> {
    let qrels = RelevanceJudgmentStore::from_path(path)
        .with_context(|| format!("Failed to load qrels: {}", path.display()))?;
    if qrels.is_empty() {
        tracing::warn!("No judgments found in {}", path.display());
    }
    Ok(qrels)
}

/// Evaluates all topics, drawing a progress bar on stderr unless `quiet`.
pub fn run_evaluation(
    evaluator: &Evaluator,
    lists: &BTreeMap<TopicId, SourceLists>,
    qrels: &RelevanceJudgmentStore,
    quiet: bool,
) -> RunEvaluation {
    let topics = lists
        .keys()
        .copied()
        .chain(qrels.topics())
        .collect::<BTreeSet<_>>()
        .len();

    let pb = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(topics as u64)
    };
    if let Ok(style) = ProgressStyle::default_bar().template("{msg} [{bar:40}] {pos}/{len}") {
        pb.set_style(style);
    }
    pb.set_message("Topics");

    let run = evaluator.evaluate_with_progress(lists, qrels, &|| pb.inc(1));
    pb.finish_and_clear();
    run
}

/// Compares `run` against the per-topic nDCG of a baseline metrics file.
pub fn compare_with_baseline(
    run: &RunEvaluation,
    baseline: &Path,
    delimiter: char,
) -> Result<Option<RunComparison>> {
    let baseline_ndcg = trec::read_ndcg_column(baseline, delimiter)
        .with_context(|| format!("Failed to read baseline metrics: {}", baseline.display()))?;

    let comparison = compare_runs(&run.ndcg_by_topic(), &baseline_ndcg);
    if comparison.is_none() {
        tracing::warn!(
            "Fewer than two topics shared with baseline {}, skipping comparison",
            baseline.display()
        );
    }
    Ok(comparison)
}

#[cfg(test)]
mod tests {
    use super::*;
    use trialrank_core::config::EvalConfig;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_single_mode_without_criteria_runs() {
        let dir = tempfile::tempdir().unwrap();
        let inputs = RunInputs {
            main: write(dir.path(), "main.run", "1 Q0 A 1 2.0 r\n2 Q0 B 1 1.0 r\n"),
            inclusion: None,
            exclusion: None,
        };

        let lists = load_source_lists(&inputs, 1000).unwrap();
        assert_eq!(lists.len(), 2);
        assert!(lists.values().all(|l| matches!(l, SourceLists::Single(_))));
    }

    #[test]
    fn test_triple_mode_unions_topics() {
        let dir = tempfile::tempdir().unwrap();
        let inputs = RunInputs {
            main: write(dir.path(), "main.run", "1 Q0 A 1 2.0 r\n"),
            inclusion: Some(write(dir.path(), "in.run", "2 Q0 A 1 2.0 r\n")),
            exclusion: Some(write(dir.path(), "ex.run", "1 Q0 B 1 2.0 r\n")),
        };

        let lists = load_source_lists(&inputs, 1000).unwrap();
        assert_eq!(lists.len(), 2);
        assert!(lists[&TopicId::new(2)].main().is_empty());
    }

    #[test]
    fn test_half_criteria_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let inputs = RunInputs {
            main: write(dir.path(), "main.run", "1 Q0 A 1 2.0 r\n"),
            inclusion: Some(write(dir.path(), "in.run", "1 Q0 A 1 2.0 r\n")),
            exclusion: None,
        };
        assert!(load_source_lists(&inputs, 1000).is_err());
    }

    #[test]
    fn test_missing_run_file_has_context() {
        let inputs = RunInputs {
            main: PathBuf::from("/nonexistent/main.run"),
            inclusion: None,
            exclusion: None,
        };
        let err = load_source_lists(&inputs, 1000).unwrap_err();
        assert!(format!("{err:#}").contains("main.run"));
    }

    #[test]
    fn test_run_and_compare_with_baseline() {
        let dir = tempfile::tempdir().unwrap();
        let qrels = load_qrels(&write(dir.path(), "qrels", "1 0 A 2\n2 0 B 2\n3 0 C 2\n")).unwrap();
        let inputs = RunInputs {
            main: write(
                dir.path(),
                "main.run",
                "1 Q0 A 1 2.0 r\n2 Q0 X 1 2.0 r\n2 Q0 B 2 1.0 r\n3 Q0 C 1 1.0 r\n",
            ),
            inclusion: None,
            exclusion: None,
        };
        let lists = load_source_lists(&inputs, 1000).unwrap();
        let evaluator = Evaluator::new(EvalConfig::default()).unwrap();
        let run = run_evaluation(&evaluator, &lists, &qrels, true);
        assert_eq!(run.topics().len(), 3);

        let baseline = dir.path().join("baseline.csv");
        trec::write_metrics_file(&baseline, &run, 10, ';').unwrap();
        let comparison = compare_with_baseline(&run, &baseline, ';').unwrap().unwrap();
        assert_eq!(comparison.topics, 3);
        assert_eq!(comparison.ttest.t_statistic, 0.0);
    }
}
