//! Topic profiles and criteria splitting.
//!
//! These modes inspect the inputs of the retrieval side: the patient
//! attributes a search would filter trials on, and the inclusion/exclusion
//! texts the two criteria indexes are built from.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use trialrank_core::eligibility::{split_criteria, Criteria};
use trialrank_core::search::TopicId;
use trialrank_core::trec::{self, Topic};

/// Filter values derived from one topic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicFilters {
    pub topic: TopicId,
    pub age: Option<String>,
    pub age_years: Option<f64>,
    pub gender: Option<String>,
    /// Trial gender value to match besides "all"
    pub gender_filter: Option<&'static str>,
}

impl From<&Topic> for TopicFilters {
    fn from(topic: &Topic) -> Self {
        Self {
            topic: topic.id,
            age: topic.profile.age.clone(),
            age_years: topic.profile.age_years(),
            gender: topic.profile.gender.clone(),
            gender_filter: topic.profile.gender_filter(),
        }
    }
}

/// Reads a topics file and derives each topic's filters.
pub fn load_topic_filters(path: &Path) -> Result<Vec<TopicFilters>> {
    let topics = trec::read_topics_file(path)
        .with_context(|| format!("Failed to read topics: {}", path.display()))?;
    if topics.is_empty() {
        tracing::warn!("No topics found in {}", path.display());
    }
    Ok(topics.iter().map(TopicFilters::from).collect())
}

/// Reads an eligibility text file and splits it.
pub fn load_criteria(path: &Path) -> Result<Criteria> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read eligibility text: {}", path.display()))?;
    Ok(split_criteria(&text))
}
