use handoff_core::HandoffConfig;
use handoff_parse::{
    build_records, emr_clean, extract_plans, is_critical_lab, split_sections, tasks,
};
use proptest::prelude::*;

/// Lines drawn from the shapes a real handoff mixes together.
fn handoff_line() -> impl Strategy<Value = String> {
    prop_oneof![
        "[ -~]{0,40}",
        "### [A-Za-z .()-]{0,30}",
        "# [A-Za-z :]{0,20}",
        "- \\[[ xX]\\] [a-z ]{0,15}",
        "\\*\\*(VS|Admitted|Dispo|Assessment):\\*\\* [ -~]{0,20}",
        "(K|Na|Hgb|INR|pH|Lactate): [0-9]{1,3}(\\.[0-9])?",
        Just(String::new()),
    ]
}

fn handoff_document() -> impl Strategy<Value = String> {
    prop::collection::vec(handoff_line(), 0..30).prop_map(|lines| lines.join("\n"))
}

proptest! {
    #[test]
    fn splitting_conserves_every_line(document in handoff_document()) {
        let sections = split_sections(&document);
        let header_lines = sections.iter().filter(|s| !s.is_preamble()).count();
        let body_lines: usize = sections.iter().map(|s| s.lines.len()).sum();
        prop_assert_eq!(header_lines + body_lines, document.lines().count());
    }

    #[test]
    fn every_patient_header_starts_a_section(document in handoff_document()) {
        let sections = split_sections(&document);
        let headers = document.lines().filter(|line| line.starts_with("### ")).count();
        prop_assert_eq!(sections.iter().filter(|s| !s.is_preamble()).count(), headers);
        for section in sections.iter().filter(|s| !s.is_preamble()) {
            prop_assert!(section.header.starts_with("### "));
        }
    }

    #[test]
    fn records_never_outnumber_sections(document in handoff_document()) {
        let sections = split_sections(&document);
        let records = build_records(&document, &HandoffConfig::default());
        prop_assert!(records.len() <= sections.len());
        for record in &records {
            prop_assert!(record.header.starts_with("### "));
            prop_assert!(record.tasks.completed <= record.tasks.total);
            prop_assert!((0.0..=100.0).contains(&record.tasks.progress));
        }
    }

    #[test]
    fn plans_skip_the_preamble(document in handoff_document()) {
        let patients = split_sections(&document)
            .into_iter()
            .filter(|s| !s.is_preamble())
            .count();
        for plan in extract_plans(&document) {
            prop_assert!(plan.patient_index < patients);
            prop_assert!(!plan.problems.is_empty());
        }
    }

    #[test]
    fn cleaning_is_idempotent(document in handoff_document()) {
        let once = emr_clean(&document);
        prop_assert_eq!(emr_clean(&once), once.clone());
        prop_assert!(!once.contains("**"));
    }

    #[test]
    fn task_counts_are_bounded(
        marks in prop::collection::vec(prop_oneof![Just("- [ ] a"), Just("- [x] b"), Just("note")], 0..20)
    ) {
        let lines: Vec<String> = marks.iter().map(|m| m.to_string()).collect();
        let progress = tasks(&lines);
        let done = marks.iter().filter(|m| m.starts_with("- [x]")).count();
        let open = marks.iter().filter(|m| m.starts_with("- [ ]")).count();
        prop_assert_eq!(progress.completed, done);
        prop_assert_eq!(progress.total, done + open);
    }

    #[test]
    fn potassium_in_range_is_never_critical(tenths in 30u32..56) {
        let line = format!("K: {}.{}", tenths / 10, tenths % 10);
        prop_assert!(!is_critical_lab(&line), "{line}");
    }
}
