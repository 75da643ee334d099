//! Patient attributes extracted from a topic description.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static TOPIC_AGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\d+-(?:year|month|week)-old").expect("valid age pattern")
});

static AGE_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+)[\s-]+(year|month|week)s?").expect("valid age value pattern")
});

const GENDER_WORDS: [&str; 7] = ["male", "man", "boy", "female", "woman", "girl", "infant"];

/// Age and gender mentioned in a patient description.
///
/// # Example
///
/// ```
/// use trialrank_core::eligibility::TopicProfile;
///
/// let profile = TopicProfile::from_description(
///     "A 58-year-old African-American woman presents to the ER with chest pain.",
/// );
/// assert_eq!(profile.age.as_deref(), Some("58-year-old"));
/// assert_eq!(profile.gender.as_deref(), Some("woman"));
/// assert_eq!(profile.age_years(), Some(58.0));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TopicProfile {
    /// First `N-year-old`, `N-month-old` or `N-week-old` phrase (any case), lowercased
    pub age: Option<String>,
    /// First gender word, lowercased with punctuation stripped
    pub gender: Option<String>,
}

impl TopicProfile {
    pub fn from_description(text: &str) -> Self {
        let age = TOPIC_AGE.find(text).map(|m| m.as_str().to_lowercase());
        let gender = text
            .split_whitespace()
            .map(|token| {
                token
                    .chars()
                    .filter(|c| !c.is_ascii_punctuation())
                    .collect::<String>()
                    .to_lowercase()
            })
            .find(|token| GENDER_WORDS.contains(&token.as_str()));

        Self { age, gender }
    }

    /// Age in years, if one was found and parses.
    pub fn age_years(&self) -> Option<f64> {
        self.age.as_deref().and_then(normalize_age)
    }

    /// Gender value to filter trials on, if the topic names one.
    pub fn gender_filter(&self) -> Option<&'static str> {
        self.gender.as_deref().and_then(gender_filter_value)
    }
}

/// Converts `N year(s)`, `N month(s)` or `N week(s)` to years.
///
/// Months are twelfths and weeks fifty-second parts of a year. The number and
/// unit may be separated by whitespace or hyphens and the unit is matched
/// without regard to case, so `18 Years` and `3-month-old` both parse.
///
/// ```
/// use trialrank_core::eligibility::normalize_age;
///
/// assert_eq!(normalize_age("18 Years"), Some(18.0));
/// assert_eq!(normalize_age("6 months"), Some(0.5));
/// assert_eq!(normalize_age("N/A"), None);
/// ```
pub fn normalize_age(text: &str) -> Option<f64> {
    let captures = AGE_VALUE.captures(text)?;
    let value: f64 = captures[1].parse().ok()?;
    match captures[2].to_ascii_lowercase().as_str() {
        "year" => Some(value),
        "month" => Some(value / 12.0),
        "week" => Some(value / 52.0),
        _ => None,
    }
}

/// Maps a topic gender word to the trial gender field value.
///
/// `None` means the topic does not restrict gender ("infant", unknown words).
pub fn gender_filter_value(word: &str) -> Option<&'static str> {
    match word {
        "woman" | "female" | "girl" => Some("female"),
        "man" | "male" | "boy" => Some("male"),
        _ => None,
    }
}
