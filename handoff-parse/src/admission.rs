//! Admission dates for sorting the census.

use std::cmp::Ordering;
use std::sync::LazyLock;

use chrono::NaiveDate;
use handoff_core::PatientRecord;
use regex::Regex;

static ADMISSION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:admit(?:ted)?|admission|adm)\b").expect("valid regex")
});

static US_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4}|\d{2})\b").expect("valid regex")
});

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").expect("valid regex"));

/// Admission date as unix millis (UTC midnight), or 0 when none parses.
pub fn extract_admission_date(lines: &[String]) -> i64 {
    lines
        .iter()
        .filter(|line| ADMISSION_LINE.is_match(line))
        .find_map(|line| parse_date(line))
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|datetime| datetime.and_utc().timestamp_millis())
        .unwrap_or(0)
}

fn parse_date(line: &str) -> Option<NaiveDate> {
    if let Some(caps) = ISO_DATE.captures(line) {
        return NaiveDate::from_ymd_opt(
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
            caps[3].parse().ok()?,
        );
    }

    let caps = US_DATE.captures(line)?;
    let mut year: i32 = caps[3].parse().ok()?;
    if caps[3].len() == 2 {
        year += 2000;
    }
    NaiveDate::from_ymd_opt(year, caps[1].parse().ok()?, caps[2].parse().ok()?)
}

/// Sort by admission date; records without one always go last.
pub fn sort_by_admission(records: &mut [PatientRecord], descending: bool) {
    records.sort_by(|a, b| match (a.admitted_at, b.admitted_at) {
        (0, 0) => Ordering::Equal,
        (0, _) => Ordering::Greater,
        (_, 0) => Ordering::Less,
        (x, y) if descending => y.cmp(&x),
        (x, y) => x.cmp(&y),
    });
}
