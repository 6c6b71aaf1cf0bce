//! `{{token}}` substitution for note templates.

use std::collections::HashMap;
use std::fmt::Write;
use std::sync::LazyLock;

use chrono::{Local, NaiveDateTime};
use handoff_core::{HandoffConfig, PatientRecord, Vitals};
use regex::{Captures, Regex};

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{([a-z]+(?:\.[a-z0-9]+)?)\}\}").expect("valid regex")
});

const UNKNOWN_PATIENT: &str = "Unknown Patient";
const NO_VITALS: &str = "No vitals recorded";

/// Source of the wall-clock time used by `{{date}}` and `{{time}}`.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Local system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Resolved values for the patient tokens. Empty fields fall back to the
/// token defaults at render time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateContext {
    fields: HashMap<&'static str, String>,
}

impl TemplateContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, token: &'static str, value: impl Into<String>) -> Self {
        self.fields.insert(token, value.into());
        self
    }

    pub fn get(&self, token: &str) -> Option<&str> {
        self.fields
            .get(token)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    pub fn from_record(record: &PatientRecord) -> Self {
        let vitals = &record.vitals;
        Self::new()
            .with("name", &record.name)
            .with("room", &record.room)
            .with("age", &record.age)
            .with("gender", &record.gender)
            .with("vitals", format_vitals(vitals))
            .with("vitals.bp", vitals.bp.clone().unwrap_or_default())
            .with("vitals.hr", vitals.hr.clone().unwrap_or_default())
            .with("vitals.temp", vitals.temp.clone().unwrap_or_default())
            .with("vitals.o2", vitals.o2.clone().unwrap_or_default())
            .with(
                "problems",
                record
                    .problems
                    .iter()
                    .map(|title| format!("- {title}"))
                    .collect::<Vec<_>>()
                    .join("\n"),
            )
    }
}

/// Component summary, or the raw line when no component was recognized.
fn format_vitals(vitals: &Vitals) -> String {
    let mut parts = Vec::new();
    if let Some(bp) = &vitals.bp {
        parts.push(format!("BP {bp}"));
    }
    if let Some(hr) = &vitals.hr {
        parts.push(format!("HR {hr}"));
    }
    if let Some(temp) = &vitals.temp {
        parts.push(format!("T {temp}"));
    }
    if let Some(o2) = &vitals.o2 {
        parts.push(format!("SpO2 {o2}%"));
    }
    if parts.is_empty() {
        return vitals.raw.trim().to_string();
    }
    parts.join(", ")
}

/// Renders templates against a [`TemplateContext`].
///
/// `{{date}}` and `{{time}}` read the clock at render time, so output is
/// only deterministic with a [`FixedClock`].
pub struct TemplateEngine {
    clock: Box<dyn Clock>,
    date_format: String,
    time_format: String,
}

impl TemplateEngine {
    pub fn new(clock: Box<dyn Clock>, config: &HandoffConfig) -> Self {
        Self {
            clock,
            date_format: config.date_format.clone(),
            time_format: config.time_format.clone(),
        }
    }

    pub fn system(config: &HandoffConfig) -> Self {
        Self::new(Box::new(SystemClock), config)
    }

    /// Replace every known token in one pass; unknown tokens stay verbatim.
    pub fn render(&self, template: &str, context: &TemplateContext) -> String {
        let now = self.clock.now();
        TOKEN
            .replace_all(template, |caps: &Captures<'_>| {
                let token = &caps[1];
                match token {
                    "date" => format_instant(&now, &self.date_format),
                    "time" => format_instant(&now, &self.time_format),
                    "name" => context.get(token).unwrap_or(UNKNOWN_PATIENT).to_string(),
                    "vitals" => context.get(token).unwrap_or(NO_VITALS).to_string(),
                    "room" | "age" | "gender" | "vitals.bp" | "vitals.hr" | "vitals.temp"
                    | "vitals.o2" | "problems" => context.get(token).unwrap_or_default().to_string(),
                    _ => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}

/// Formats with a chrono pattern; an invalid pattern renders as empty.
fn format_instant(instant: &NaiveDateTime, pattern: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", instant.format(pattern)).is_err() {
        out.clear();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn engine() -> TemplateEngine {
        let instant = NaiveDate::from_ymd_opt(2024, 3, 5)
            .and_then(|date| date.and_hms_opt(7, 30, 0))
            .unwrap();
        TemplateEngine::new(Box::new(FixedClock(instant)), &HandoffConfig::default())
    }

    #[test]
    fn substitutes_every_occurrence() {
        let context = TemplateContext::new().with("name", "Jane Roe").with("room", "12B");
        let rendered = engine().render("{{name}} / {{room}} / {{name}}", &context);
        assert_eq!(rendered, "Jane Roe / 12B / Jane Roe");
    }

    #[test]
    fn missing_fields_use_defaults() {
        let rendered = engine().render(
            "[{{name}}] [{{vitals}}] [{{room}}] [{{vitals.bp}}]",
            &TemplateContext::new(),
        );
        assert_eq!(rendered, "[Unknown Patient] [No vitals recorded] [] []");
    }

    #[test]
    fn date_and_time_come_from_clock() {
        let rendered = engine().render("{{date}} {{time}}", &TemplateContext::new());
        assert_eq!(rendered, "03/05/2024 07:30");
    }

    #[test]
    fn invalid_date_pattern_renders_empty() {
        let config = HandoffConfig {
            date_format: "%".to_string(),
            ..HandoffConfig::default()
        };
        let engine = TemplateEngine::new(Box::new(SystemClock), &config);
        assert_eq!(engine.render("[{{date}}]", &TemplateContext::new()), "[]");
    }

    #[test]
    fn unknown_tokens_are_left_alone() {
        let rendered = engine().render("{{mrn}} {{name}}", &TemplateContext::new());
        assert_eq!(rendered, "{{mrn}} Unknown Patient");
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let context = TemplateContext::new().with("name", "{{room}}").with("room", "12");
        assert_eq!(engine().render("{{name}}", &context), "{{room}}");
    }

    #[test]
    fn context_from_record_formats_vitals_and_problems() {
        let record = PatientRecord {
            name: "Jane Roe".to_string(),
            vitals: Vitals {
                raw: "VS: BP: 120/80 SpO2: 97%".to_string(),
                bp: Some("120/80".to_string()),
                o2: Some("97".to_string()),
                ..Vitals::default()
            },
            problems: vec!["CAP".to_string(), "AKI".to_string()],
            ..PatientRecord::default()
        };
        let context = TemplateContext::from_record(&record);
        let rendered = engine().render(
            "{{name}}: {{vitals}} | {{vitals.o2}}\n{{problems}}",
            &context,
        );
        assert_eq!(rendered, "Jane Roe: BP 120/80, SpO2 97% | 97\n- CAP\n- AKI");
    }

    #[test]
    fn vitals_line_without_components_renders_raw() {
        let record = PatientRecord {
            vitals: Vitals {
                raw: "VS: afebrile, stable".to_string(),
                ..Vitals::default()
            },
            ..PatientRecord::default()
        };
        let context = TemplateContext::from_record(&record);
        assert_eq!(engine().render("{{vitals}}", &context), "VS: afebrile, stable");
        assert_eq!(
            engine().render("{{vitals}}", &TemplateContext::from_record(&PatientRecord::default())),
            "No vitals recorded"
        );
    }
}
