//! Per-topic metrics file.
//!
//! ```text
//! id;nDCG@10;RPrec;P@10;RR
//! 1;0.9639404333166532;0.5;0.3;1
//! ...
//! mean;0.61;0.42;0.37;0.74
//! ```

use crate::config::CriterionWeights;
use crate::error::RunFileError;
use crate::evaluation::RunEvaluation;
use crate::search::TopicId;
use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Label of the trailing row holding the run means.
pub const MEAN_ROW: &str = "mean";

/// Directory the default metrics file is written to.
pub const METRICS_DIR: &str = "metrics";

/// Header line for a run evaluated at `cut`.
pub fn header(cut: usize, delimiter: char) -> String {
    format!("id{d}nDCG@{cut}{d}RPrec{d}P@{cut}{d}RR", d = delimiter)
}

/// Default metrics file path: `metrics/{timestamp}_{main}_{in}_{ex}_metrics.csv`.
///
/// `timestamp` is formatted by the caller (`yyMMddTHHmm` by convention).
pub fn default_metrics_path(timestamp: &str, weights: &CriterionWeights) -> PathBuf {
    Path::new(METRICS_DIR).join(format!(
        "{}_{}_{}_{}_metrics.csv",
        timestamp, weights.main, weights.inclusion, weights.exclusion
    ))
}

/// Writes the header, one row per topic and the `mean` row.
pub fn write_metrics(
    writer: impl Write,
    run: &RunEvaluation,
    cut: usize,
    delimiter: char,
) -> std::io::Result<()> {
    let mut writer = BufWriter::new(writer);
    writeln!(writer, "{}", header(cut, delimiter))?;

    let d = delimiter;
    for eval in run.topics() {
        let s = &eval.scores;
        writeln!(
            writer,
            "{}{d}{}{d}{}{d}{}{d}{}",
            eval.topic, s.ndcg, s.r_precision, s.precision, s.reciprocal_rank
        )?;
    }

    let mean = run.mean();
    writeln!(
        writer,
        "{MEAN_ROW}{d}{}{d}{}{d}{}{d}{}",
        mean.mean_ndcg(),
        mean.mean_r_precision(),
        mean.mean_precision(),
        mean.mean_reciprocal_rank()
    )?;
    writer.flush()
}

/// Writes a metrics file at `path`, creating parent directories.
pub fn write_metrics_file(
    path: &Path,
    run: &RunEvaluation,
    cut: usize,
    delimiter: char,
) -> Result<(), RunFileError> {
    let io_err = |source| RunFileError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let file = std::fs::File::create(path).map_err(io_err)?;
    write_metrics(file, run, cut, delimiter).map_err(io_err)
}

/// Reads the per-topic nDCG column of a metrics file written earlier.
///
/// The header and `mean` rows are skipped.
pub fn read_ndcg_column(path: &Path, delimiter: char) -> Result<BTreeMap<TopicId, f64>, RunFileError> {
    let file = std::fs::File::open(path).map_err(|source| RunFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_ndcg_column(file, path, delimiter)
}

fn parse_ndcg_column(
    reader: impl Read,
    path: &Path,
    delimiter: char,
) -> Result<BTreeMap<TopicId, f64>, RunFileError> {
    let mut scores = BTreeMap::new();

    for (index, line) in BufReader::new(reader).lines().enumerate() {
        let line = line.map_err(|source| RunFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut fields = line.split(delimiter);
        let (Some(id), Some(ndcg)) = (fields.next(), fields.next()) else {
            continue;
        };
        if index == 0 || id == MEAN_ROW || id.trim().is_empty() {
            continue;
        }

        let malformed = |reason: String| RunFileError::Malformed {
            path: path.to_path_buf(),
            line: index + 1,
            reason,
        };
        let topic: TopicId = id
            .parse()
            .map_err(|e| malformed(format!("invalid topic id {id:?}: {e}")))?;
        let ndcg: f64 = ndcg
            .trim()
            .parse()
            .map_err(|e| malformed(format!("invalid nDCG {ndcg:?}: {e}")))?;
        scores.insert(topic, ndcg);
    }

    Ok(scores)
}
