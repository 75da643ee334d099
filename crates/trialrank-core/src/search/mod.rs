//! Ranked lists and rank fusion.
//!
//! Each topic is searched against three indexes by the external retrieval
//! layer:
//!
//! - **main**: the full trial text
//! - **inclusion**: inclusion-criteria text only
//! - **exclusion**: exclusion-criteria text only
//!
//! Each search yields a [`RankedList`]. [`TopsisFusion`] merges the three into
//! a single [`FusedRanking`] scored by TOPSIS closeness.
//!
//! # Architecture
//!
//! - `types`: Identifiers and ranked-list containers (DocId, TopicId, RankedList, SourceLists)
//! - `fusion`: Decision matrix, ideal vectors and the TOPSIS engine
//!
//! # Usage
//!
//! ```
//! use trialrank_core::config::FusionConfig;
//! use trialrank_core::search::{RankedList, TopsisFusion};
//!
//! let fusion = TopsisFusion::new(FusionConfig::default()).unwrap();
//! let main = RankedList::from_pairs([("NCT01", 12.5), ("NCT02", 9.1)]);
//! let inclusion = RankedList::from_pairs([("NCT02", 7.0)]);
//! let exclusion = RankedList::from_pairs([("NCT01", 8.3)]);
//!
//! let ranking = fusion.fuse(&main, &inclusion, &exclusion);
//! assert_eq!(ranking.len(), 2);
//! ```

pub mod fusion;
pub mod types;

pub use fusion::{
    closeness, CriterionVector, DecisionMatrix, FusedDoc, FusedRanking, IdealVectors,
    TopsisFusion, CRITERIA,
};
pub use types::{DocId, RankedList, ScoredDoc, Source, SourceLists, TopicId};
