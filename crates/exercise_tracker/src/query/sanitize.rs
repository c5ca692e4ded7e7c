use std::num::NonZeroUsize;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Weekday};

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y %m %d",
    "%Y/%m/%d",
    "%a %b %d %Y",
    "%m/%d/%Y",
];

// Month-name shapes, also tried after a leading weekday name is dropped.
const MONTH_NAME_FORMATS: &[&str] = &["%b %d %Y", "%B %d %Y", "%b %d, %Y", "%B %d, %Y"];

const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Filters for a log query after raw client input has been normalized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogFilters {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: Option<NonZeroUsize>,
}

/// Normalize raw query parameters. Anything unparseable becomes `None`,
/// meaning "no bound" / "no cap"; this never fails.
pub fn sanitize(
    raw_from: Option<&str>,
    raw_to: Option<&str>,
    raw_limit: Option<&str>,
) -> LogFilters {
    LogFilters {
        from: raw_from.and_then(parse_calendar_date),
        to: raw_to.and_then(parse_calendar_date),
        limit: raw_limit.and_then(parse_limit),
    }
}

pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    // Bare digit runs like "20230105" or "1672531200" are not calendar days.
    if value.is_empty() || value.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }

    if let Some(date) = first_match(value, DATE_FORMATS) {
        return Some(date);
    }
    if let Some(date) = first_match(value, MONTH_NAME_FORMATS) {
        return Some(date);
    }
    if let Some(date) =
        without_weekday(value).and_then(|rest| first_match(rest, MONTH_NAME_FORMATS))
    {
        return Some(date);
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp.date_naive());
    }

    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|timestamp| timestamp.date())
}

fn first_match(value: &str, formats: &[&str]) -> Option<NaiveDate> {
    formats
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

/// `"Mon Jan 01 2023"` names the wrong weekday for its date; `%a` rejects it,
/// so the weekday token is dropped and the remainder parsed on its own.
fn without_weekday(value: &str) -> Option<&str> {
    let (head, rest) = value.split_once(char::is_whitespace)?;
    head.trim_end_matches(',').parse::<Weekday>().ok()?;
    Some(rest.trim_start())
}

pub fn parse_limit(raw: &str) -> Option<NonZeroUsize> {
    let value: i64 = raw.trim().parse().ok()?;
    if value <= 0 {
        return None;
    }
    usize::try_from(value).ok().and_then(NonZeroUsize::new)
}
