//! Relevance judgments (qrels) in TREC format.
//!
//! Each line reads `topicId iteration docId grade`, whitespace separated.
//! The iteration column is ignored. Document ids are case-normalized by
//! [`DocId`]. Lines that do not parse are skipped with a warning that names
//! the line number; only a file that cannot be read is an error.

use crate::config::HIGHLY_RELEVANT;
use crate::error::QrelsError;
use crate::search::{DocId, TopicId};
use std::collections::{BTreeMap, HashMap};
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::{debug, warn};

/// Judgments for one topic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopicJudgments {
    grades: HashMap<DocId, u8>,
    total_relevant: usize,
}

impl TopicJudgments {
    /// Builds judgments from `(doc, grade)` pairs. A later pair for the same
    /// document replaces the earlier one.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (DocId, u8)>) -> Self {
        let mut judgments = Self::default();
        for (doc_id, grade) in pairs {
            judgments.insert(doc_id, grade);
        }
        judgments
    }

    fn insert(&mut self, doc_id: DocId, grade: u8) {
        if let Some(previous) = self.grades.insert(doc_id, grade) {
            if previous == HIGHLY_RELEVANT {
                self.total_relevant -= 1;
            }
        }
        if grade == HIGHLY_RELEVANT {
            self.total_relevant += 1;
        }
    }

    /// Grade of `doc_id`, 0 when unjudged.
    pub fn grade(&self, doc_id: &DocId) -> u8 {
        self.grades.get(doc_id).copied().unwrap_or(0)
    }

    /// Number of highly relevant judgments.
    pub fn total_relevant(&self) -> usize {
        self.total_relevant
    }

    /// Number of judged documents, any grade.
    pub fn len(&self) -> usize {
        self.grades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grades.is_empty()
    }
}

/// All judgments of a test collection, keyed by topic.
///
/// Read-only after loading, so it can be shared across evaluation workers
/// by reference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelevanceJudgmentStore {
    topics: BTreeMap<TopicId, TopicJudgments>,
}

impl RelevanceJudgmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one judgment.
    pub fn insert(&mut self, topic: TopicId, doc_id: DocId, grade: u8) {
        self.topics.entry(topic).or_default().insert(doc_id, grade);
    }

    /// Loads a qrels file.
    pub fn from_path(path: &Path) -> Result<Self, QrelsError> {
        let file = std::fs::File::open(path).map_err(|source| QrelsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file).map_err(|source| QrelsError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parses qrels lines from any reader.
    pub fn from_reader(reader: impl Read) -> std::io::Result<Self> {
        let mut store = Self::new();
        let mut skipped = 0usize;

        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        let mut index = 0usize;

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            index += 1;

            let parsed = std::str::from_utf8(&buf)
                .map_err(|e| format!("invalid UTF-8: {e}"))
                .and_then(|line| {
                    if line.trim().is_empty() {
                        Ok(None)
                    } else {
                        parse_line(line).map(Some)
                    }
                });
            match parsed {
                Ok(None) => {}
                Ok(Some((topic, doc_id, grade))) => store.insert(topic, doc_id, grade),
                Err(reason) => {
                    skipped += 1;
                    warn!("Skipping qrels line {}: {}", index, reason);
                }
            }
        }

        debug!(
            "Loaded judgments for {} topics ({} lines skipped)",
            store.topics.len(),
            skipped
        );
        Ok(store)
    }

    /// Judgments for `topic`, if any were recorded.
    pub fn judgments_for(&self, topic: TopicId) -> Option<&TopicJudgments> {
        self.topics.get(&topic)
    }

    /// Grade of `doc_id` for `topic`, 0 when unjudged.
    pub fn grade(&self, topic: TopicId, doc_id: &DocId) -> u8 {
        self.judgments_for(topic)
            .map_or(0, |judgments| judgments.grade(doc_id))
    }

    /// Highly relevant judgments for `topic`.
    pub fn total_relevant(&self, topic: TopicId) -> usize {
        self.judgments_for(topic)
            .map_or(0, TopicJudgments::total_relevant)
    }

    /// Judged topics in ascending order.
    pub fn topics(&self) -> impl Iterator<Item = TopicId> + '_ {
        self.topics.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

fn parse_line(line: &str) -> Result<(TopicId, DocId, u8), String> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let [topic, _iteration, doc_id, grade] = fields.as_slice() else {
        return Err(format!("expected 4 fields, found {}", fields.len()));
    };

    let topic: TopicId = topic
        .parse()
        .map_err(|e| format!("invalid topic id {topic:?}: {e}"))?;
    let grade: u8 = grade
        .parse()
        .map_err(|e| format!("invalid grade {grade:?}: {e}"))?;

    Ok((topic, DocId::new(doc_id), grade))
}
