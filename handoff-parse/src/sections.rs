//! Splits a raw handoff document into patient sections.

use handoff_core::{Section, HEADER_DELIMITER, PREAMBLE_HEADER};

/// Split a document into sections in document order.
///
/// Every line starting with `"### "` opens a new section. Lines before the
/// first delimiter land in a `Preamble` section, which is only emitted when
/// it holds at least one line. Body lines are kept verbatim, blank ones
/// included.
pub fn split_sections(raw: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    if raw.is_empty() {
        return sections;
    }

    let mut current = Section::new(PREAMBLE_HEADER);
    for line in raw.lines() {
        if is_header_line(line) {
            if !current.is_preamble() || !current.lines.is_empty() {
                sections.push(current);
            }
            current = Section::new(line);
        } else {
            current.lines.push(line.to_string());
        }
    }
    if !current.is_preamble() || !current.lines.is_empty() {
        sections.push(current);
    }

    tracing::debug!(sections = sections.len(), "split handoff document");
    sections
}

/// True when the line opens a new section.
pub fn is_header_line(line: &str) -> bool {
    line.starts_with(HEADER_DELIMITER)
}

/// Number of sections that are real patient entries.
pub fn patient_section_count(sections: &[Section]) -> usize {
    sections.iter().filter(|section| !section.is_preamble()).count()
}
