//! TREC clinical-trials topic files.
//!
//! ```xml
//! <topics task="2022 TREC Clinical Trials">
//!   <topic number="1">A 58-year-old African-American woman presents ...</topic>
//! </topics>
//! ```

use crate::eligibility::TopicProfile;
use crate::error::TopicsError;
use crate::search::TopicId;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// One patient topic with the attributes extracted from its description.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Topic {
    pub id: TopicId,
    /// Description, trimmed and lowercased
    pub description: String,
    #[serde(flatten)]
    pub profile: TopicProfile,
}

impl Topic {
    pub fn new(id: TopicId, description: &str) -> Self {
        let description = description.trim().to_lowercase();
        let profile = TopicProfile::from_description(&description);
        Self {
            id,
            description,
            profile,
        }
    }
}

/// Reads a topics file.
pub fn read_topics_file(path: &Path) -> Result<Vec<Topic>, TopicsError> {
    let text = std::fs::read_to_string(path).map_err(|source| TopicsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let topics = read_topics(&text, path)?;
    debug!("Read {} topics from {}", topics.len(), path.display());
    Ok(topics)
}

/// Parses the `<topic number="N">` elements of `text`, in id order.
///
/// `path` is only used in errors. Elements other than `<topic>` are ignored.
pub fn read_topics(text: &str, path: &Path) -> Result<Vec<Topic>, TopicsError> {
    let xml_err = |source: quick_xml::Error| TopicsError::Xml {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = Reader::from_str(text);
    let mut topics = Vec::new();
    let mut current: Option<(TopicId, String)> = None;

    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(start) if start.name().as_ref() == b"topic" => {
                let found = start
                    .try_get_attribute("number")
                    .map_err(|e| xml_err(e.into()))?
                    .map(|attr| attr.unescape_value().map(|value| value.into_owned()))
                    .transpose()
                    .map_err(xml_err)?;
                let Some(id) = found.as_deref().and_then(|n| n.trim().parse().ok()) else {
                    return Err(TopicsError::InvalidNumber {
                        path: path.to_path_buf(),
                        found,
                    });
                };
                current = Some((id, String::new()));
            }
            Event::Text(content) => {
                if let Some((_, description)) = current.as_mut() {
                    description.push_str(&content.unescape().map_err(xml_err)?);
                }
            }
            Event::CData(content) => {
                if let Some((_, description)) = current.as_mut() {
                    description.push_str(&String::from_utf8_lossy(&content));
                }
            }
            Event::End(end) if end.name().as_ref() == b"topic" => {
                if let Some((id, description)) = current.take() {
                    topics.push(Topic::new(id, &description));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    topics.sort_by_key(|topic| topic.id);
    Ok(topics)
}
