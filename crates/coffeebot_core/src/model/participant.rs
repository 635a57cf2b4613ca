//! Participant domain model.
//!
//! # Responsibility
//! - Define the roster entry read fresh every pairing cycle.
//! - Map raw roster rows onto participants with documented defaults.
//! - Validate boundary invariants before anything reaches the engine.
//!
//! # Invariants
//! - `email` is the participant key; uniqueness is assumed, not re-checked here.
//! - `email` never contains the canonical key separator.
//! - `cadence` is at least 1.
//! - `topics` stays a raw string and is split only at consumption time.

use crate::pairing::key::KEY_SEPARATOR;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Timezone shown for participants who did not provide one.
pub const UNKNOWN_TIMEZONE: &str = "UNKNOWN";
/// Cadence applied when a roster row leaves it blank: every week.
pub const DEFAULT_CADENCE: u32 = 1;

static TOPIC_SPLIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*,\s*").expect("valid topic split regex"));

/// One roster entry eligible for pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Display name used in greetings and subjects.
    pub name: String,
    /// Unique key within a cycle.
    pub email: String,
    /// Free-form timezone label, `UNKNOWN` when absent.
    pub timezone: String,
    /// Recurrence period in ISO weeks.
    pub cadence: u32,
    /// Raw `YYYY/MM/DD` (or `YYYY-MM-DD`) opt-out date.
    pub suppress_until: Option<String>,
    /// Raw comma-separated topic list.
    pub topics: String,
}

/// Raw roster row as captured at signup; every column is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantRow {
    pub name: Option<String>,
    pub email: Option<String>,
    pub timezone: Option<String>,
    pub suppress_until: Option<String>,
    pub cadence: Option<u32>,
    pub topics: Option<String>,
}

impl Participant {
    /// Creates a participant with default timezone, cadence and topics.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            timezone: UNKNOWN_TIMEZONE.to_string(),
            cadence: DEFAULT_CADENCE,
            suppress_until: None,
            topics: String::new(),
        }
    }

    /// Maps a raw roster row, filling blanks with the documented defaults.
    ///
    /// Missing `name`/`email` become empty strings; `validate()` rejects them.
    pub fn from_row(row: ParticipantRow) -> Self {
        Self {
            name: row.name.unwrap_or_default(),
            email: row.email.unwrap_or_default(),
            timezone: non_blank(row.timezone).unwrap_or_else(|| UNKNOWN_TIMEZONE.to_string()),
            cadence: row.cadence.unwrap_or(DEFAULT_CADENCE),
            suppress_until: non_blank(row.suppress_until),
            topics: row.topics.unwrap_or_default(),
        }
    }

    /// Splits the raw topic string into trimmed, non-empty topics.
    pub fn topic_list(&self) -> Vec<String> {
        TOPIC_SPLIT_RE
            .split(self.topics.trim())
            .filter(|topic| !topic.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Validates boundary invariants.
    pub fn validate(&self) -> Result<(), ParticipantValidationError> {
        if self.email.trim().is_empty() {
            return Err(ParticipantValidationError::EmptyEmail);
        }
        if self.email.contains(KEY_SEPARATOR) {
            return Err(ParticipantValidationError::EmailContainsSeparator(
                self.email.clone(),
            ));
        }
        if self.name.trim().is_empty() {
            return Err(ParticipantValidationError::EmptyName(self.email.clone()));
        }
        if self.cadence == 0 {
            return Err(ParticipantValidationError::NonPositiveCadence(
                self.email.clone(),
            ));
        }
        Ok(())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|inner| !inner.trim().is_empty())
}

/// Validation error for participant boundary invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParticipantValidationError {
    EmptyEmail,
    EmailContainsSeparator(String),
    EmptyName(String),
    NonPositiveCadence(String),
}

impl Display for ParticipantValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "participant email cannot be empty"),
            Self::EmailContainsSeparator(email) => write!(
                f,
                "participant email `{email}` must not contain `{KEY_SEPARATOR}`"
            ),
            Self::EmptyName(email) => write!(f, "participant `{email}` has an empty name"),
            Self::NonPositiveCadence(email) => {
                write!(f, "participant `{email}` must have a cadence of at least 1 week")
            }
        }
    }
}

impl Error for ParticipantValidationError {}

#[cfg(test)]
mod tests {
    use super::{Participant, ParticipantRow, ParticipantValidationError, UNKNOWN_TIMEZONE};

    #[test]
    fn from_row_keeps_provided_values() {
        let participant = Participant::from_row(ParticipantRow {
            name: Some("TEST_NAME".to_string()),
            email: Some("TEST@EMAIL.COM".to_string()),
            timezone: Some("TEST_TZ".to_string()),
            suppress_until: Some(String::new()),
            cadence: Some(10),
            topics: Some("TEST, TOPICS".to_string()),
        });

        assert_eq!(participant.name, "TEST_NAME");
        assert_eq!(participant.email, "TEST@EMAIL.COM");
        assert_eq!(participant.timezone, "TEST_TZ");
        assert_eq!(participant.suppress_until, None);
        assert_eq!(participant.cadence, 10);
        assert_eq!(participant.topics, "TEST, TOPICS");
    }

    #[test]
    fn from_row_maps_to_expected_defaults() {
        let participant = Participant::from_row(ParticipantRow::default());

        assert_eq!(participant.cadence, 1);
        assert_eq!(participant.timezone, UNKNOWN_TIMEZONE);
        assert_eq!(participant.suppress_until, None);
        assert_eq!(participant.topics, "");
        assert_eq!(
            participant.validate(),
            Err(ParticipantValidationError::EmptyEmail)
        );
    }

    #[test]
    fn topic_list_trims_around_commas() {
        let mut participant = Participant::new("foo", "foo@gmail.com");
        participant.topics = " rust ,  coffee,board games ,, ".to_string();

        assert_eq!(participant.topic_list(), vec!["rust", "coffee", "board games"]);
    }

    #[test]
    fn topic_list_is_empty_for_blank_topics() {
        let participant = Participant::new("foo", "foo@gmail.com");
        assert!(participant.topic_list().is_empty());
    }

    #[test]
    fn validate_rejects_separator_in_email_and_zero_cadence() {
        let mut participant = Participant::new("foo", "foo@gmail.com,bar@gmail.com");
        assert!(matches!(
            participant.validate(),
            Err(ParticipantValidationError::EmailContainsSeparator(_))
        ));

        participant.email = "foo@gmail.com".to_string();
        participant.cadence = 0;
        assert!(matches!(
            participant.validate(),
            Err(ParticipantValidationError::NonPositiveCadence(_))
        ));
    }

    #[test]
    fn roster_json_uses_field_names_and_round_trips() {
        let mut participant = Participant::new("foo", "foo@gmail.com");
        participant.topics = "rust, coffee".to_string();

        let value = serde_json::to_value(&participant).unwrap();
        assert_eq!(value["email"], "foo@gmail.com");
        assert_eq!(value["timezone"], UNKNOWN_TIMEZONE);
        assert_eq!(value["cadence"], 1);
        assert!(value["suppress_until"].is_null());

        let back: Participant = serde_json::from_value(value).unwrap();
        assert_eq!(back, participant);
    }

    #[test]
    fn partial_row_json_fills_defaults() {
        let row: ParticipantRow =
            serde_json::from_str(r#"{"name":"bar","email":"bar@gmail.com","timezone":"  "}"#)
                .unwrap();

        let participant = Participant::from_row(row);
        assert_eq!(participant.timezone, UNKNOWN_TIMEZONE);
        assert_eq!(participant.cadence, 1);
        assert_eq!(participant.suppress_until, None);
    }
}
