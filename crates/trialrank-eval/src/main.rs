//! trialrank evaluation tool
//!
//! Fuses per-topic rankings from the main, inclusion-criteria and
//! exclusion-criteria indexes with TOPSIS and scores the fused ranking against
//! graded relevance judgments.
//!
//! # Usage
//!
//! ```bash
//! # Fuse three runs and evaluate
//! trialrank-eval --qrels qrels.txt --main main.run \
//!     --inclusion inclusion.run --exclusion exclusion.run
//!
//! # Evaluate the main run alone (single-index mode)
//! trialrank-eval --qrels qrels.txt --main main.run
//!
//! # Custom weights, write the fused run, compare against an earlier metrics file
//! trialrank-eval --qrels qrels.txt --main main.run --inclusion in.run \
//!     --exclusion ex.run --weights 0.5,0.3,0.8 --run-out fused.run \
//!     --compare-baseline metrics/baseline_metrics.csv
//!
//! # JSON report for scripting
//! trialrank-eval --qrels qrels.txt --main main.run --json
//!
//! # Age and gender filters extracted from a topics file
//! trialrank-eval --profile-topics topics2022.xml
//!
//! # Inclusion / exclusion split of a trial's eligibility text
//! trialrank-eval --split-criteria eligibility.txt
//! ```

mod config;
mod evaluate;
mod output;
mod profile;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use trialrank_core::evaluation::Evaluator;
use trialrank_core::trec;

/// Evaluate fused clinical-trial rankings.
///
/// Reads TREC run files and a qrels file, fuses the runs with TOPSIS, and
/// reports nDCG, R-Precision, precision and reciprocal rank per topic.
#[derive(Parser, Debug)]
#[command(name = "trialrank-eval", version, about)]
struct Cli {
    /// Relevance judgments (topic iteration doc grade)
    #[arg(long, required_unless_present_any = ["profile_topics", "split_criteria"])]
    qrels: Option<PathBuf>,

    /// Run file from the main trial index
    #[arg(long, required_unless_present_any = ["profile_topics", "split_criteria"])]
    main: Option<PathBuf>,

    /// Run file from the inclusion-criteria index
    #[arg(long, requires = "exclusion")]
    inclusion: Option<PathBuf>,

    /// Run file from the exclusion-criteria index
    #[arg(long, requires = "inclusion")]
    exclusion: Option<PathBuf>,

    /// Config file (default: $TRIALRANK_CONFIG or the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Rank cutoff for nDCG and precision
    #[arg(long)]
    cut: Option<usize>,

    /// Maximum trials kept per topic and source
    #[arg(long)]
    result_size: Option<usize>,

    /// Criterion weights: main,inclusion,exclusion
    #[arg(long, value_delimiter = ',')]
    weights: Option<Vec<f64>>,

    /// Evaluate the main run only, even if criteria runs are given
    #[arg(long)]
    no_fusion: bool,

    /// Evaluate topics on a single thread
    #[arg(long)]
    sequential: bool,

    /// Metrics file field delimiter
    #[arg(long)]
    delimiter: Option<char>,

    /// Metrics file path (default: metrics/<timestamp>_<weights>_metrics.csv)
    #[arg(long)]
    metrics_out: Option<PathBuf>,

    /// Write the final rankings as a TREC run file
    #[arg(long)]
    run_out: Option<PathBuf>,

    /// Run tag for --run-out
    #[arg(long)]
    run_name: Option<String>,

    /// Metrics file of a baseline run to compare nDCG against
    #[arg(long)]
    compare_baseline: Option<PathBuf>,

    /// Show per-topic rows in the report
    #[arg(long)]
    per_topic: bool,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Print the age and gender filters of a TREC topics file and exit
    #[arg(long, value_name = "TOPICS_XML", conflicts_with_all = ["qrels", "main"])]
    profile_topics: Option<PathBuf>,

    /// Print the inclusion/exclusion split of an eligibility text file and exit
    #[arg(
        long,
        value_name = "FILE",
        conflicts_with_all = ["qrels", "main", "profile_topics"]
    )]
    split_criteria: Option<PathBuf>,
}

impl Cli {
    fn overrides(&self) -> config::Overrides {
        config::Overrides {
            cut: self.cut,
            result_size: self.result_size,
            weights: self.weights.clone(),
            no_fusion: self.no_fusion,
            sequential: self.sequential,
            delimiter: self.delimiter,
            run_name: self.run_name.clone(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Some(path) = &cli.profile_topics {
        let filters = profile::load_topic_filters(path)?;
        let rendered = if cli.json {
            output::format_json(&filters)
        } else {
            output::format_topic_filters(&filters)
        };
        println!("{}", rendered);
        return Ok(());
    }

    if let Some(path) = &cli.split_criteria {
        let criteria = profile::load_criteria(path)?;
        let rendered = if cli.json {
            output::format_json(&criteria)
        } else {
            output::format_criteria(&criteria)
        };
        println!("{}", rendered);
        return Ok(());
    }

    let (Some(qrels_path), Some(main_path)) = (&cli.qrels, &cli.main) else {
        bail!("--qrels and --main are required to evaluate");
    };

    let config = config::load_config(cli.config.as_deref(), &cli.overrides())?;
    let evaluator = Evaluator::new(config.clone()).context("Invalid fusion settings")?;

    let qrels = evaluate::load_qrels(qrels_path)?;
    let inputs = evaluate::RunInputs {
        main: main_path.clone(),
        inclusion: cli.inclusion.clone(),
        exclusion: cli.exclusion.clone(),
    };
    let lists = evaluate::load_source_lists(&inputs, config.result_size)?;
    tracing::info!(
        "Loaded {} ranked topics, {} judged topics",
        lists.len(),
        qrels.len()
    );

    let run = evaluate::run_evaluation(&evaluator, &lists, &qrels, cli.json);

    let metrics_path = cli
        .metrics_out
        .clone()
        .unwrap_or_else(|| config::default_metrics_path(&chrono::Local::now(), &config.fusion.weights));
    trec::write_metrics_file(&metrics_path, &run, config.cut, config.metrics_delimiter)
        .with_context(|| format!("Failed to write metrics: {}", metrics_path.display()))?;

    if let Some(run_path) = &cli.run_out {
        trec::write_run_file(run_path, run.rankings(), &config.run_name, config.result_size)
            .with_context(|| format!("Failed to write run: {}", run_path.display()))?;
    }

    let comparison = match &cli.compare_baseline {
        Some(baseline) => evaluate::compare_with_baseline(&run, baseline, config.metrics_delimiter)?,
        None => None,
    };

    let mut report = output::EvalReport::new(&config, &run);
    report.comparison = comparison;
    report.metrics_file = Some(metrics_path);
    report.run_file = cli.run_out.clone();

    let rendered = if cli.json {
        output::format_json(&report)
    } else {
        output::format_human(&report, cli.per_topic)
    };
    println!("{}", rendered);

    Ok(())
}
