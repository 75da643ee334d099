use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Trial identifier (e.g. an NCT number).
///
/// Ids are lowercased on construction so that ranked lists and relevance
/// judgments match regardless of the case either side was written in.
/// [`DocId::to_run_format`] gives the upper-cased form used in run files.
///
/// ```
/// use trialrank_core::search::DocId;
///
/// assert_eq!(DocId::new("NCT00001234"), DocId::new("nct00001234"));
/// assert_eq!(DocId::new("nct00001234").to_run_format(), "NCT00001234");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocId(String);

impl DocId {
    /// Creates a case-normalized document id.
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_lowercase())
    }

    /// The normalized (lowercase) id.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Upper-cased id for TREC run output.
    pub fn to_run_format(&self) -> String {
        self.0.to_uppercase()
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Topic (patient description) number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TopicId(u32);

impl TopicId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TopicId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// One retrieval source queried per topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Full trial text
    Main,
    /// Inclusion-criteria text
    Inclusion,
    /// Exclusion-criteria text
    Exclusion,
}

impl Source {
    /// All sources in criterion-column order.
    pub const ALL: [Source; 3] = [Source::Main, Source::Inclusion, Source::Exclusion];

    /// Column of this source in the decision matrix.
    pub fn column(self) -> usize {
        match self {
            Source::Main => 0,
            Source::Inclusion => 1,
            Source::Exclusion => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Source::Main => "main",
            Source::Inclusion => "inclusion",
            Source::Exclusion => "exclusion",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A document and the score one retrieval source gave it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDoc {
    pub doc_id: DocId,
    pub score: f64,
}

impl ScoredDoc {
    pub fn new(doc_id: impl Into<DocId>, score: f64) -> Self {
        Self {
            doc_id: doc_id.into(),
            score,
        }
    }
}

/// Ordered results of one retrieval source for one topic, best first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankedList {
    docs: Vec<ScoredDoc>,
}

impl RankedList {
    /// Wraps results that are already in rank order.
    pub fn new(docs: Vec<ScoredDoc>) -> Self {
        Self { docs }
    }

    /// Builds a list from `(id, score)` pairs in rank order.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        Self {
            docs: pairs
                .into_iter()
                .map(|(id, score)| ScoredDoc::new(DocId::new(id), score))
                .collect(),
        }
    }

    /// Sorts by descending score. Equal scores keep their current order.
    pub fn sort_by_score(&mut self) {
        self.docs.sort_by(|a, b| b.score.total_cmp(&a.score));
    }

    /// Drops repeated documents, keeping each one's first (best-ranked)
    /// entry. Returns the number of entries removed.
    pub fn dedup_docs(&mut self) -> usize {
        let before = self.docs.len();
        let mut seen = HashSet::with_capacity(before);
        self.docs.retain(|doc| seen.insert(doc.doc_id.clone()));
        before - self.docs.len()
    }

    /// Keeps at most `limit` results.
    pub fn truncate(&mut self, limit: usize) {
        self.docs.truncate(limit);
    }

    pub fn push(&mut self, doc: ScoredDoc) {
        self.docs.push(doc);
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScoredDoc> {
        self.docs.iter()
    }

    pub fn as_slice(&self) -> &[ScoredDoc] {
        &self.docs
    }
}

impl<'a> IntoIterator for &'a RankedList {
    type Item = &'a ScoredDoc;
    type IntoIter = std::slice::Iter<'a, ScoredDoc>;

    fn into_iter(self) -> Self::IntoIter {
        self.docs.iter()
    }
}

/// Ranked lists available for one topic.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceLists {
    /// Single-index mode: only the main list is scored
    Single(RankedList),
    /// One list per source, fused with TOPSIS
    Triple {
        main: RankedList,
        inclusion: RankedList,
        exclusion: RankedList,
    },
}

impl SourceLists {
    /// The main-index list, present in both modes.
    pub fn main(&self) -> &RankedList {
        match self {
            SourceLists::Single(main) => main,
            SourceLists::Triple { main, .. } => main,
        }
    }
}
