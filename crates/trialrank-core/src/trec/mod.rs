//! TREC-style file formats.
//!
//! - `run`: ranked lists in and out (`topicId Q0 docId rank score runName`)
//! - `metrics_file`: per-topic metrics table with a trailing `mean` row
//! - `topics`: patient topic descriptions (`<topic number="N">` XML)
//!
//! Relevance judgments are read by
//! [`RelevanceJudgmentStore`](crate::evaluation::RelevanceJudgmentStore).

pub mod metrics_file;
pub mod run;
pub mod topics;

pub use metrics_file::{
    default_metrics_path, header, read_ndcg_column, write_metrics, write_metrics_file, MEAN_ROW,
    METRICS_DIR,
};
pub use run::{read_run, read_run_file, write_run, write_run_file, RunLists};
pub use topics::{read_topics, read_topics_file, Topic};
