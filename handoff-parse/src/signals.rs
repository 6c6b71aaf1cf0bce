//! Pattern tables that flag critical labs, code-status badges and clinical
//! keywords.

use std::sync::LazyLock;

use regex::Regex;

/// Analyte name followed by its numeric value, e.g. `K: 6.2`, `Hgb 5.5`.
static CRITICAL_LAB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(potassium|K\+?|sodium|Na\+?|hemoglobin|Hgb|Hb|lactic acid|lactate|INR|pH)\s*[:=]?\s*(\d+(?:\.\d+)?)",
    )
    .expect("valid regex")
});

pub const STATUS_BADGES: [&str; 6] = [
    "Discharge",
    "DNR",
    "DNI",
    "Full Code",
    "Comfort Care",
    "Hospice",
];

pub const CLINICAL_KEYWORDS: [&str; 35] = [
    "Sepsis",
    "Septic Shock",
    "Pneumonia",
    "AKI",
    "CKD",
    "CHF",
    "Heart Failure",
    "COPD",
    "Asthma",
    "DKA",
    "HHS",
    "STEMI",
    "NSTEMI",
    "ACS",
    "Afib",
    "PE",
    "DVT",
    "Stroke",
    "TIA",
    "GI Bleed",
    "Pancreatitis",
    "Cirrhosis",
    "Cellulitis",
    "UTI",
    "Pyelonephritis",
    "Hyperkalemia",
    "Hyponatremia",
    "Anemia",
    "Delirium",
    "Seizure",
    "Respiratory Failure",
    "ARDS",
    "Hypotension",
    "Syncope",
    "Encephalopathy",
];

struct KeywordPattern {
    regex: Regex,
    label: &'static str,
}

fn keyword(pattern: &str, label: &'static str) -> KeywordPattern {
    KeywordPattern {
        regex: Regex::new(pattern).expect("valid regex"),
        label,
    }
}

/// Small word-bounded set used by the background keyword scan.
static SCAN_PATTERNS: LazyLock<Vec<KeywordPattern>> = LazyLock::new(|| {
    vec![
        keyword(r"(?i)\bsep(?:sis|tic)\b", "Sepsis"),
        keyword(r"(?i)\bpneumonia\b", "Pneumonia"),
        keyword(r"(?i)\baki\b|acute kidney injury", "AKI"),
        keyword(r"(?i)\bchf\b|heart failure", "CHF"),
        keyword(r"(?i)\bcopd\b", "COPD"),
        keyword(r"(?i)\bdka\b", "DKA"),
        keyword(r"(?i)\bn?stemi\b", "STEMI"),
        keyword(r"(?i)\bpe\b|pulmonary embol", "PE"),
        keyword(r"(?i)\bstroke\b|\bcva\b", "Stroke"),
        keyword(r"(?i)\bgi\s*bleed", "GI Bleed"),
    ]
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Analyte {
    Potassium,
    Sodium,
    Hemoglobin,
    Lactate,
    Inr,
    Ph,
}

impl Analyte {
    fn from_label(label: &str) -> Option<Self> {
        let lower = label.to_lowercase();
        match lower.trim_end_matches('+') {
            "k" | "potassium" => Some(Self::Potassium),
            "na" | "sodium" => Some(Self::Sodium),
            "hgb" | "hb" | "hemoglobin" => Some(Self::Hemoglobin),
            "lactate" | "lactic acid" => Some(Self::Lactate),
            "inr" => Some(Self::Inr),
            "ph" => Some(Self::Ph),
            _ => None,
        }
    }

    fn is_critical(self, value: f64) -> bool {
        match self {
            Self::Potassium => value < 3.0 || value >= 5.6,
            Self::Sodium => value < 120.0 || value >= 160.0,
            Self::Hemoglobin => value < 6.0,
            Self::Lactate => value >= 4.0,
            Self::Inr => value >= 5.0,
            Self::Ph => value < 6.0 || (7.0..7.3).contains(&value),
        }
    }
}

/// First critical lab value on the line, as the matched text.
pub fn critical_lab_match(line: &str) -> Option<&str> {
    CRITICAL_LAB.captures_iter(line).find_map(|caps| {
        let analyte = Analyte::from_label(caps.get(1)?.as_str())?;
        let value: f64 = caps.get(2)?.as_str().parse().ok()?;
        if analyte.is_critical(value) {
            caps.get(0).map(|m| m.as_str().trim())
        } else {
            None
        }
    })
}

pub fn is_critical_lab(line: &str) -> bool {
    critical_lab_match(line).is_some()
}

/// One snippet per line that carries a critical value.
pub fn critical_labs(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .filter_map(|line| critical_lab_match(line))
        .map(str::to_string)
        .collect()
}

/// Code-status and discharge badges mentioned anywhere in the section.
pub fn status_badges(lines: &[String]) -> Vec<String> {
    let lowered: Vec<String> = lines.iter().map(|line| line.to_lowercase()).collect();
    STATUS_BADGES
        .iter()
        .filter(|badge| {
            let needle = badge.to_lowercase();
            lowered.iter().any(|line| line.contains(&needle))
        })
        .map(|badge| badge.to_string())
        .collect()
}

/// Vocabulary terms found in the heading lines (`#...` or `**Assessment:**`).
///
/// Plain substring matching, so `PE` also hits inside longer words.
pub fn clinical_keywords(lines: &[String]) -> Vec<String> {
    let headings = lines
        .iter()
        .map(|line| line.trim_start())
        .filter(|line| is_keyword_heading(line))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    if headings.is_empty() {
        return Vec::new();
    }

    CLINICAL_KEYWORDS
        .iter()
        .filter(|term| headings.contains(&term.to_lowercase()))
        .map(|term| term.to_string())
        .collect()
}

fn is_keyword_heading(line: &str) -> bool {
    line.starts_with('#')
        || line
            .get(..15)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("**assessment:**"))
}

/// Keyword scan over raw content, independent of section splitting.
pub fn scan_keywords(content: &str) -> Vec<String> {
    SCAN_PATTERNS
        .iter()
        .filter(|pattern| pattern.regex.is_match(content))
        .map(|pattern| pattern.label.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(input: &[&str]) -> Vec<String> {
        input.iter().map(|line| line.to_string()).collect()
    }

    #[test]
    fn flags_critical_values() {
        assert!(is_critical_lab("K: 6.2"));
        assert!(is_critical_lab("Potassium: 2.8"));
        assert!(is_critical_lab("Hgb: 5.5"));
        assert!(is_critical_lab("Lactate: 4.5"));
        assert!(is_critical_lab("INR 5.3 on warfarin"));
        assert!(is_critical_lab("ABG pH 7.21"));
        assert!(is_critical_lab("Na 118"));
        assert!(is_critical_lab("Na 160"));
        assert!(is_critical_lab("K: 5.6"));
        assert!(is_critical_lab("pH 5.9"));
        assert!(is_critical_lab("pH 7.29"));
        assert!(is_critical_lab("pH 7.0"));
    }

    #[test]
    fn ignores_normal_values() {
        assert!(!is_critical_lab("K: 4.0"));
        assert!(!is_critical_lab("Na 138, Hgb 9.1, lactate 1.2"));
        assert!(!is_critical_lab("pH 7.35"));
        assert!(!is_critical_lab("pH 7.30"));
        assert!(!is_critical_lab("pH 6.5"));
        assert!(!is_critical_lab("Na 159"));
        assert!(!is_critical_lab("Na 120"));
        assert!(!is_critical_lab("K: 5.5"));
        assert!(!is_critical_lab("HbA1c 9.2"));
        assert!(!is_critical_lab("no labs today"));
    }

    #[test]
    fn critical_match_is_first_critical_on_line() {
        assert_eq!(critical_lab_match("K 4.1, Na 118, Hgb 5.0"), Some("Na 118"));
    }

    #[test]
    fn critical_labs_one_per_line() {
        let body = lines(&["BMP: K: 6.2, Na 119", "CBC Hgb: 5.5", "stable"]);
        assert_eq!(critical_labs(&body), vec!["K: 6.2", "Hgb: 5.5"]);
    }

    #[test]
    fn status_badges_in_vocabulary_order() {
        let body = lines(&["Code: dnr/dni", "likely discharge tomorrow"]);
        assert_eq!(status_badges(&body), vec!["Discharge", "DNR", "DNI"]);
        assert!(status_badges(&lines(&["full plan"])).is_empty());
    }

    #[test]
    fn keywords_come_from_headings_only() {
        let body = lines(&[
            "# SEPSIS from UTI",
            "lactate trending down",
            "pneumonia ruled out",
            "**Assessment:** AKI on CKD",
        ]);
        let found = clinical_keywords(&body);
        assert!(found.contains(&"Sepsis".to_string()));
        assert!(found.contains(&"UTI".to_string()));
        assert!(found.contains(&"AKI".to_string()));
        assert!(found.contains(&"CKD".to_string()));
        assert!(!found.contains(&"Pneumonia".to_string()));
    }

    #[test]
    fn keywords_match_inside_longer_words() {
        let found = clinical_keywords(&lines(&["## Hypertension"]));
        assert_eq!(found, vec!["PE"]);
    }

    #[test]
    fn no_keywords_without_vocabulary_terms() {
        assert!(clinical_keywords(&lines(&["# Ankle fracture"])).is_empty());
        assert!(clinical_keywords(&[]).is_empty());
    }

    #[test]
    fn scan_is_case_insensitive_and_canonical() {
        assert_eq!(scan_keywords("pt with SEPSIS, r/o pneumonia"), vec!["Sepsis", "Pneumonia"]);
        assert!(scan_keywords("ankle sprain").is_empty());
    }
}
