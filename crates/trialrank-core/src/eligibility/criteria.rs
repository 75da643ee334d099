//! Splitting trial eligibility text into inclusion and exclusion sections.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static INCLUSION_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)inclusion criteria").expect("valid inclusion heading"));

static EXCLUSION_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)exclusion criteria").expect("valid exclusion heading"));

/// Inclusion and exclusion text of one trial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Criteria {
    pub inclusion: String,
    pub exclusion: String,
}

/// Splits eligibility text on its "Inclusion Criteria" and "Exclusion
/// Criteria" headings (any case).
///
/// Each section runs from the end of its first heading to the next heading
/// of the other kind, or to the end of the text, and is trimmed. When both
/// sections come out empty, the whole text is used for both sides so the
/// trial still has something to index.
///
/// ```
/// use trialrank_core::eligibility::split_criteria;
///
/// let criteria = split_criteria(
///     "Inclusion Criteria:\n- Age >= 18\n\nExclusion Criteria:\n- Pregnancy",
/// );
/// assert_eq!(criteria.inclusion, ":\n- Age >= 18");
/// assert_eq!(criteria.exclusion, ":\n- Pregnancy");
/// ```
pub fn split_criteria(text: &str) -> Criteria {
    let inclusion = section(text, &INCLUSION_HEADING, &EXCLUSION_HEADING);
    let exclusion = section(text, &EXCLUSION_HEADING, &INCLUSION_HEADING);

    if inclusion.is_empty() && exclusion.is_empty() {
        Criteria {
            inclusion: text.to_string(),
            exclusion: text.to_string(),
        }
    } else {
        Criteria {
            inclusion: inclusion.to_string(),
            exclusion: exclusion.to_string(),
        }
    }
}

/// Text between the first `heading` and the following `stop` heading.
fn section<'a>(text: &'a str, heading: &Regex, stop: &Regex) -> &'a str {
    let Some(start) = heading.find(text).map(|m| m.end()) else {
        return "";
    };
    let rest = &text[start..];
    let end = stop.find(rest).map_or(rest.len(), |m| m.start());
    rest[..end].trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_sections() {
        let criteria = split_criteria(
            "INCLUSION CRITERIA - adults with type 2 diabetes EXCLUSION CRITERIA - renal failure",
        );
        assert_eq!(criteria.inclusion, "- adults with type 2 diabetes");
        assert_eq!(criteria.exclusion, "- renal failure");
    }

    #[test]
    fn test_exclusion_before_inclusion() {
        let criteria = split_criteria("Exclusion criteria: smokers. Inclusion criteria: healthy volunteers.");
        assert_eq!(criteria.exclusion, ": smokers.");
        assert_eq!(criteria.inclusion, ": healthy volunteers.");
    }

    #[test]
    fn test_only_inclusion() {
        let criteria = split_criteria("Inclusion criteria: over 65");
        assert_eq!(criteria.inclusion, ": over 65");
        assert_eq!(criteria.exclusion, "");
    }

    #[test]
    fn test_multiline_section() {
        let criteria = split_criteria("Inclusion criteria\n1. a\n2. b\nExclusion criteria\n1. c");
        assert_eq!(criteria.inclusion, "1. a\n2. b");
        assert_eq!(criteria.exclusion, "1. c");
    }

    #[test]
    fn test_no_headings_uses_full_text() {
        let text = "Healthy adults aged 18-45.";
        let criteria = split_criteria(text);
        assert_eq!(criteria.inclusion, text);
        assert_eq!(criteria.exclusion, text);
    }

    #[test]
    fn test_empty_sections_use_full_text() {
        let text = "Inclusion criteria Exclusion criteria";
        let criteria = split_criteria(text);
        assert_eq!(criteria.inclusion, text);
        assert_eq!(criteria.exclusion, text);
    }
}
