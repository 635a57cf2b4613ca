//! Cadence and suppression filtering.
//!
//! # Responsibility
//! - Decide which roster entries are due for pairing this cycle.
//! - Compute ISO-8601 week numbers for the cadence check.
//!
//! # Invariants
//! - Filtering is pure: no I/O, no failure path.
//! - Suppression compares year, month and day independently. This is not a
//!   chronological comparison.
//! - An unparsable suppression date never suppresses.

use crate::model::participant::Participant;
use chrono::{Datelike, NaiveDate};
use log::warn;

const SUPPRESS_DATE_FORMATS: &[&str] = &["%Y/%m/%d", "%Y-%m-%d"];

/// Returns the ISO-8601 week number (1-53) containing `date`.
pub fn iso_week_number(date: NaiveDate) -> u32 {
    date.iso_week().week()
}

/// Returns whether `week_number` is a pairing week for `cadence`.
///
/// A zero cadence is never due; validation rejects it earlier.
pub fn is_cadence_week(week_number: u32, cadence: u32) -> bool {
    cadence != 0 && week_number % cadence == 0
}

/// Parses a raw suppression date, accepting `/` or `-` separators.
pub fn parse_suppress_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    SUPPRESS_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
}

/// Returns whether a participant with `suppress_until` sits out on `today`.
pub fn should_suppress(today: NaiveDate, suppress_until: Option<&str>) -> bool {
    let Some(raw) = suppress_until.filter(|value| !value.trim().is_empty()) else {
        return false;
    };

    let Some(until) = parse_suppress_date(raw) else {
        warn!("event=suppress_parse module=eligibility status=ignored value={raw}");
        return false;
    };

    today.year() <= until.year() && today.month() <= until.month() && today.day() <= until.day()
}

/// Returns whether `participant` is due this cycle.
pub fn is_eligible(participant: &Participant, week_number: u32, today: NaiveDate) -> bool {
    is_cadence_week(week_number, participant.cadence)
        && !should_suppress(today, participant.suppress_until.as_deref())
}

/// Selects the roster entries due for pairing, preserving roster order.
pub fn filter_eligible(
    roster: &[Participant],
    week_number: u32,
    today: NaiveDate,
) -> Vec<Participant> {
    roster
        .iter()
        .filter(|participant| is_eligible(participant, week_number, today))
        .cloned()
        .collect()
}
