//! Eligibility text helpers used when building queries and indexes.
//!
//! - `topic`: age and gender mentioned in a patient description, and the
//!   trial-side filter values they map to
//! - `criteria`: splitting a trial's eligibility text into the inclusion and
//!   exclusion sections that feed the two criteria indexes

pub mod criteria;
pub mod topic;

pub use criteria::{split_criteria, Criteria};
pub use topic::{gender_filter_value, normalize_age, TopicProfile};
