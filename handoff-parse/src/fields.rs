//! Single-purpose field extractors over a section's body lines.
//!
//! Each extractor is independent and total: no match yields an empty string
//! (or an empty [`Vitals`]).

use std::sync::LazyLock;

use handoff_core::Vitals;
use regex::Regex;

static AGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\*\*age:\*\*\s*(.*)$").expect("valid regex"));

static ADMITTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\*\*admitted(?:\s+for)?:\*\*\s*(.*)$").expect("valid regex")
});

static SUMMARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:#+\s*(?:\*\*)?|\*\*)\s*(?:summary|assessment|tl;dr|impression)\b\s*:?\s*(?:\*\*)?\s*:?\s*(.*)$",
    )
    .expect("valid regex")
});

static DISPO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:#+\s*(?:\*\*)?|\*\*)\s*(?:disposition|dispo)\b\s*:?\s*(?:\*\*)?\s*:?\s*(.*)$",
    )
    .expect("valid regex")
});

static VITALS_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^\s*(?:[-*]\s+)?(?:\*\*)?VS:|\bBP:\s*\d{2,3}/\d{2,3}|\bT:\s*\d{2})")
        .expect("valid regex")
});

static BP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bBP:\s*(\d{2,3}/\d{2,3})").expect("valid regex"));

static HR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bHR:\s*(\d{2,3})").expect("valid regex"));

static TEMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:T|Temp|Tmax):\s*(\d{2,3}(?:\.\d+)?)").expect("valid regex")
});

static SPO2: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)SpO2:\s*(\d{2,3})\s*%").expect("valid regex"));

static O2: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bO2:\s*(\d{2,3})\s*%").expect("valid regex"));

/// Trailing text of the first `**Age:**` line.
pub fn extract_age(lines: &[String]) -> String {
    first_capture(&AGE, lines)
}

/// Trailing text of the first `**Admitted:**` / `**Admitted for:**` line.
pub fn extract_admit_reason(lines: &[String]) -> String {
    first_capture(&ADMITTED, lines)
}

/// Summary, Assessment, TL;DR or Impression text.
pub fn extract_summary_snippet(lines: &[String]) -> String {
    labeled_or_next_line(&SUMMARY, lines)
}

/// Dispo / Disposition text.
pub fn extract_dispo(lines: &[String]) -> String {
    labeled_or_next_line(&DISPO, lines)
}

/// Vitals from the first line that looks like a vitals line.
///
/// Every component is optional; SpO2 is preferred over a bare O2 label.
pub fn extract_vitals(lines: &[String]) -> Vitals {
    let Some(line) = lines.iter().find(|line| VITALS_LINE.is_match(line)) else {
        return Vitals::default();
    };

    Vitals {
        raw: line.trim().to_string(),
        bp: capture(&BP, line),
        hr: capture(&HR, line),
        temp: capture(&TEMP, line),
        o2: capture(&SPO2, line).or_else(|| capture(&O2, line)),
    }
}

fn capture(pattern: &Regex, line: &str) -> Option<String> {
    pattern
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|value| value.as_str().to_string())
}

fn first_capture(pattern: &Regex, lines: &[String]) -> String {
    lines
        .iter()
        .find_map(|line| capture(pattern, line))
        .map(|value| value.trim().to_string())
        .unwrap_or_default()
}

fn labeled_or_next_line(pattern: &Regex, lines: &[String]) -> String {
    for (idx, line) in lines.iter().enumerate() {
        let Some(value) = capture(pattern, line) else {
            continue;
        };
        let value = value.trim();
        if !value.is_empty() {
            return value.to_string();
        }
        return lines
            .get(idx + 1)
            .map(|next| next.trim().to_string())
            .unwrap_or_default();
    }
    String::new()
}
