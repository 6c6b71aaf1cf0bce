//! Per-patient records and the dashboard projection.

use handoff_core::{
    Acuity, DashboardEntry, HandoffConfig, HeaderInfo, PatientRecord, Section,
};

use crate::admission::extract_admission_date;
use crate::fields::{
    extract_admit_reason, extract_age, extract_dispo, extract_summary_snippet, extract_vitals,
};
use crate::header::{parse_header, synthesize_header};
use crate::problems::display_problems;
use crate::sections::split_sections;
use crate::signals::{clinical_keywords, critical_labs, status_badges};
use crate::tasks::tasks;

/// Build one record per patient section, in document order.
///
/// A preamble only yields a record when it has a non-blank line; its
/// header is synthesized from the body. Indexes count emitted records, so a
/// blank preamble takes no slot.
pub fn build_records(document: &str, config: &HandoffConfig) -> Vec<PatientRecord> {
    records_from_sections(&split_sections(document), config)
}

pub fn records_from_sections(sections: &[Section], config: &HandoffConfig) -> Vec<PatientRecord> {
    let records: Vec<PatientRecord> = sections
        .iter()
        .filter(|section| {
            !section.is_preamble() || section.lines.iter().any(|line| !line.trim().is_empty())
        })
        .enumerate()
        .map(|(index, section)| record_from_section(index, section, config))
        .collect();

    tracing::debug!(records = records.len(), "built patient records");
    records
}

/// Derive a fresh record from one section.
pub fn record_from_section(index: usize, section: &Section, config: &HandoffConfig) -> PatientRecord {
    let header = if section.is_preamble() {
        synthesize_header(&section.lines, Some(index), config)
    } else {
        section.header.clone()
    };
    let HeaderInfo {
        name,
        room,
        age: header_age,
        gender,
    } = parse_header(&header);

    let lines = &section.lines;
    let body_age = extract_age(lines);
    let age = if body_age.is_empty() {
        header_age
    } else {
        body_age
    };

    tracing::trace!(index, %name, "extracting patient section");

    PatientRecord {
        index,
        header,
        name,
        room,
        age,
        gender,
        admit_reason: extract_admit_reason(lines),
        admitted_at: extract_admission_date(lines),
        vitals: extract_vitals(lines),
        problems: display_problems(lines, config),
        status_badges: status_badges(lines),
        clinical_keywords: clinical_keywords(lines),
        critical_labs: critical_labs(lines),
        tasks: tasks(lines),
        summary_snippet: extract_summary_snippet(lines),
        dispo: extract_dispo(lines),
    }
}

/// Triage tier: critical labs or a sepsis/failure problem is High, a long
/// problem list is Medium.
pub fn acuity(record: &PatientRecord, config: &HandoffConfig) -> Acuity {
    let flagged_problem = record.problems.iter().any(|title| {
        let lower = title.to_lowercase();
        lower.contains("sepsis") || lower.contains("failure")
    });

    if !record.critical_labs.is_empty() || flagged_problem {
        Acuity::High
    } else if record.problems.len() > config.acuity_medium_problem_count {
        Acuity::Medium
    } else {
        Acuity::Low
    }
}

pub fn dashboard_entry(record: &PatientRecord, config: &HandoffConfig) -> DashboardEntry {
    DashboardEntry {
        id: record.index,
        name: record.name.clone(),
        room: record.room.clone(),
        vitals: record.vitals.raw.clone(),
        critical_labs: record.critical_labs.clone(),
        active_problems: record.problems.clone(),
        acuity: acuity(record, config),
    }
}

pub fn dashboard(records: &[PatientRecord], config: &HandoffConfig) -> Vec<DashboardEntry> {
    records
        .iter()
        .map(|record| dashboard_entry(record, config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with(problems: &[&str], labs: &[&str]) -> PatientRecord {
        PatientRecord {
            problems: problems.iter().map(|p| p.to_string()).collect(),
            critical_labs: labs.iter().map(|l| l.to_string()).collect(),
            ..PatientRecord::default()
        }
    }

    #[test]
    fn one_critical_lab_is_high() {
        let record = record_with(&["Gout"], &["K: 6.2"]);
        assert_eq!(acuity(&record, &HandoffConfig::default()), Acuity::High);
    }

    #[test]
    fn sepsis_or_failure_problem_is_high() {
        let config = HandoffConfig::default();
        assert_eq!(acuity(&record_with(&["Urosepsis"], &[]), &config), Acuity::High);
        assert_eq!(
            acuity(&record_with(&["Acute Respiratory FAILURE"], &[]), &config),
            Acuity::High
        );
    }

    #[test]
    fn four_problems_is_medium() {
        let record = record_with(&["CAP", "AKI", "DM2", "HTN"], &[]);
        assert_eq!(acuity(&record, &HandoffConfig::default()), Acuity::Medium);
    }

    #[test]
    fn one_problem_is_low() {
        let record = record_with(&["Cellulitis"], &[]);
        assert_eq!(acuity(&record, &HandoffConfig::default()), Acuity::Low);
    }

    #[test]
    fn record_combines_extractors() {
        let doc = "### 2. Jane Roe - 12B (72F)\n**Admitted:** 2024-03-01 for CHF\n**VS:** BP: 100/60 HR: 112\n# Heart failure: diurese\n- [x] lasix\n- [ ] daily weight\nDNR\n";
        let records = build_records(doc, &HandoffConfig::default());
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.name, "Jane Roe");
        assert_eq!(record.room, "12B");
        assert_eq!(record.age, "72");
        assert_eq!(record.gender, "F");
        assert_eq!(record.admit_reason, "2024-03-01 for CHF");
        assert!(record.admitted_at > 0);
        assert_eq!(record.vitals.hr.as_deref(), Some("112"));
        assert_eq!(record.problems, vec!["Heart failure"]);
        assert_eq!(record.clinical_keywords, vec!["Heart Failure"]);
        assert_eq!(record.status_badges, vec!["DNR"]);
        assert_eq!(record.tasks.progress, 50.0);

        let entry = dashboard_entry(record, &HandoffConfig::default());
        assert_eq!(entry.acuity, Acuity::High);
        assert_eq!(entry.vitals, "**VS:** BP: 100/60 HR: 112");
    }

    #[test]
    fn body_age_overrides_header_age() {
        let doc = "### Jane Roe (72F)\n**Age:** 73\n";
        let records = build_records(doc, &HandoffConfig::default());
        assert_eq!(records[0].age, "73");
    }

    #[test]
    fn preamble_record_uses_synthesized_header() {
        let doc = "Name: Tom Hale\n65yo M\n### 2. Jane Roe - 4\n";
        let records = build_records(doc, &HandoffConfig::default());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].header, "### 1. Tom Hale (65M)");
        assert_eq!(records[0].name, "Tom Hale");
        assert_eq!(records[1].index, 1);
        assert_eq!(records[1].name, "Jane Roe");
    }

    #[test]
    fn blank_preamble_has_no_record() {
        let records = build_records("\n\n### A\n", &HandoffConfig::default());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "A");
        assert_eq!(records[0].index, 0);
    }

    #[test]
    fn blank_preamble_does_not_shift_patient_index() {
        let doc = "\n### 1. Jane Roe - 12\n# Sepsis\n- abx\n";
        let config = HandoffConfig::default();
        let records = build_records(doc, &config);
        let plans = crate::problems::extract_plans(doc);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].index, 0);
        assert_eq!(dashboard(&records, &config)[0].id, 0);
        assert_eq!(plans[0].patient_index, records[0].index);
    }
}
