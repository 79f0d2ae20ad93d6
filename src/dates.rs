//! Date helpers shared by the calendar and leave modules.
//!
//! Backend rows carry dates as strings in more than one shape: `pto_records`
//! and `holidays` use `YYYY-MM-DD`, while employee birthdays may be stored as
//! an ISO timestamp or as `DD/MM/YYYY`.

use chrono::{Datelike, NaiveDate};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    #[error("date is empty")]
    Empty,
    #[error("invalid date: {0}")]
    Invalid(String),
}

/// Rewrites a raw date into `YYYY-MM-DD` shape.
///
/// ISO timestamps lose their time part and `DD/MM/YYYY` is reordered.
/// Anything else passes through untouched, and no calendar check is made, so
/// `32/01/2025` becomes `2025-01-32`.
pub fn normalize_date(raw: Option<&str>) -> Option<String> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }

    if let Some((date, _)) = raw.split_once('T') {
        return Some(date.to_string());
    }

    if raw.contains('/') {
        let parts: Vec<&str> = raw.split('/').collect();
        if let [day, month, year] = parts.as_slice() {
            return Some(format!("{}-{}-{}", year, month, day));
        }
    }

    Some(raw.to_string())
}

/// Strict counterpart of [`normalize_date`]: the result is a real calendar day.
pub fn parse_date(raw: &str) -> Result<NaiveDate, DateError> {
    let normalized = normalize_date(Some(raw)).ok_or(DateError::Empty)?;
    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
        .map_err(|_| DateError::Invalid(raw.to_string()))
}

/// Moves a birthday onto `year`, keeping month and day.
pub fn anchor_to_year(birthday: Option<&str>, year: i32) -> Option<String> {
    let clean = normalize_date(birthday)?;
    let mut parts = clean.split('-');
    let (_, month, day) = (parts.next()?, parts.next()?, parts.next()?);
    Some(format!("{}-{}-{}", year, month, day))
}

/// `MON`, `TUE`, ...
pub fn weekday_label(date: NaiveDate) -> String {
    date.format("%a").to_string().to_uppercase()
}

pub fn in_year(date: NaiveDate, year: i32) -> bool {
    date.year() == year
}
