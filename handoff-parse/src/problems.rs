//! Problem lists: `#` heading lines grouped with their plan lines.

use handoff_core::{ExtractedPlan, HandoffConfig, Problem, Section};

use crate::sections::split_sections;

/// Problem → plan trees for every patient section that has `#` headings.
///
/// `patient_index` counts real patient sections only; sections without a
/// single heading contribute nothing.
pub fn extract_plans(document: &str) -> Vec<ExtractedPlan> {
    plans_from_sections(&split_sections(document))
}

pub fn plans_from_sections(sections: &[Section]) -> Vec<ExtractedPlan> {
    sections
        .iter()
        .filter(|section| !section.is_preamble())
        .enumerate()
        .filter_map(|(patient_index, section)| {
            let problems = group_problems(&section.lines);
            if problems.is_empty() {
                return None;
            }
            Some(ExtractedPlan {
                patient_header: section.header.clone(),
                patient_index,
                problems,
            })
        })
        .collect()
}

fn group_problems(lines: &[String]) -> Vec<Problem> {
    let mut problems = Vec::new();
    let mut open: Option<Problem> = None;

    for line in lines {
        let trimmed = line.trim();
        if trimmed.starts_with('#') {
            if let Some(done) = open.take() {
                problems.push(done);
            }
            open = Some(Problem {
                title: heading_title(trimmed).to_string(),
                details: Vec::new(),
            });
        } else if !trimmed.is_empty() {
            if let Some(problem) = open.as_mut() {
                problem.details.push(trimmed.to_string());
            }
        }
    }

    problems.extend(open);
    problems
}

/// Heading text without the `#` markers and anything after the first `:`.
fn heading_title(line: &str) -> &str {
    let stripped = line.trim_start_matches('#');
    stripped.split(':').next().unwrap_or_default().trim()
}

/// Display titles: every `#` line, filtered to a sensible length.
///
/// Noisier than [`extract_plans`]: any heading counts, including ones like
/// `## Assessment`.
pub fn display_problems(lines: &[String], config: &HandoffConfig) -> Vec<String> {
    lines
        .iter()
        .map(|line| line.trim_start())
        .filter(|line| line.starts_with('#'))
        .map(heading_title)
        .filter(|title| (1..=config.problem_title_max_chars).contains(&title.chars().count()))
        .map(str::to_string)
        .collect()
}
