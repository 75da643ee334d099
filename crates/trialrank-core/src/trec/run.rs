//! TREC run files: `topicId Q0 docId rank score runName`.

use crate::error::RunFileError;
use crate::search::{DocId, RankedList, ScoredDoc, TopicId};
use std::collections::{BTreeMap, HashSet};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::{debug, warn};

/// Ranked lists of a run file, keyed by topic.
pub type RunLists = BTreeMap<TopicId, RankedList>;

/// Reads a run file, keeping at most `result_size` documents per topic.
pub fn read_run_file(path: &Path, result_size: usize) -> Result<RunLists, RunFileError> {
    let file = std::fs::File::open(path).map_err(|source| RunFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let lists = read_run(file, path, result_size)?;
    debug!("Read {} topics from {}", lists.len(), path.display());
    Ok(lists)
}

/// Parses run lines from `reader`; `path` is only used in errors.
///
/// Each topic's list is ordered by descending score, equal scores by the
/// rank column, then truncated to `result_size`. A document listed more than
/// once for a topic keeps only its best-ranked entry. Scores must be finite.
pub fn read_run(reader: impl Read, path: &Path, result_size: usize) -> Result<RunLists, RunFileError> {
    let mut entries: BTreeMap<TopicId, Vec<(u64, usize, ScoredDoc)>> = BTreeMap::new();

    for (index, line) in BufReader::new(reader).lines().enumerate() {
        let line = line.map_err(|source| RunFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }

        let malformed = |reason: String| RunFileError::Malformed {
            path: path.to_path_buf(),
            line: index + 1,
            reason,
        };

        let fields: Vec<&str> = line.split_whitespace().collect();
        let [topic, _q0, doc_id, rank, score, _run_name] = fields.as_slice() else {
            return Err(malformed(format!("expected 6 fields, found {}", fields.len())));
        };

        let topic: TopicId = topic
            .parse()
            .map_err(|e| malformed(format!("invalid topic id {topic:?}: {e}")))?;
        let rank: u64 = rank
            .parse()
            .map_err(|e| malformed(format!("invalid rank {rank:?}: {e}")))?;
        let score: f64 = score
            .parse()
            .map_err(|e| malformed(format!("invalid score {score:?}: {e}")))?;
        if !score.is_finite() {
            return Err(malformed(format!("non-finite score {score}")));
        }

        entries
            .entry(topic)
            .or_default()
            .push((rank, index + 1, ScoredDoc::new(DocId::new(doc_id), score)));
    }

    Ok(entries
        .into_iter()
        .map(|(topic, mut docs)| {
            docs.sort_by_key(|(rank, _, _)| *rank);
            docs.sort_by(|(_, _, a), (_, _, b)| b.score.total_cmp(&a.score));

            let mut seen = HashSet::with_capacity(docs.len());
            let mut list = RankedList::default();
            for (_, line, doc) in docs {
                if seen.insert(doc.doc_id.clone()) {
                    list.push(doc);
                } else {
                    warn!(
                        "Skipping duplicate '{}' for topic {} at line {} of {}",
                        doc.doc_id,
                        topic,
                        line,
                        path.display()
                    );
                }
            }
            list.truncate(result_size);
            (topic, list)
        })
        .collect())
}

/// Writes rankings in run format: upper-case ids, 1-indexed ranks, at most
/// `result_size` lines per topic.
pub fn write_run<'a>(
    writer: impl Write,
    rankings: impl IntoIterator<Item = (TopicId, &'a RankedList)>,
    run_name: &str,
    result_size: usize,
) -> std::io::Result<()> {
    let mut writer = BufWriter::new(writer);
    for (topic, ranking) in rankings {
        for (rank, doc) in ranking.iter().take(result_size).enumerate() {
            writeln!(
                writer,
                "{} Q0 {} {} {} {}",
                topic,
                doc.doc_id.to_run_format(),
                rank + 1,
                doc.score,
                run_name
            )?;
        }
    }
    writer.flush()
}

/// Writes a run file at `path`, creating parent directories.
pub fn write_run_file<'a>(
    path: &Path,
    rankings: impl IntoIterator<Item = (TopicId, &'a RankedList)>,
    run_name: &str,
    result_size: usize,
) -> Result<(), RunFileError> {
    let io_err = |source| RunFileError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let file = std::fs::File::create(path).map_err(io_err)?;
    write_run(file, rankings, run_name, result_size).map_err(io_err)
}
