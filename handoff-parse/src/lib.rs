//! Free-text handoff document to structured patient records.
//!
//! Parsing is total: malformed or partial input always produces best-effort
//! output, never an error.

pub mod admission;
pub mod clean;
pub mod dispatch;
pub mod fields;
pub mod header;
pub mod problems;
pub mod record;
pub mod sections;
pub mod signals;
pub mod tasks;
pub mod template;

use handoff_core::{HandoffConfig, HandoffSnapshot};

pub use admission::{extract_admission_date, sort_by_admission};
pub use clean::emr_clean;
pub use dispatch::{handle_request, AsyncDispatcher, PendingResult, ThreadWorker, WorkerTransport};
pub use header::{parse_header, synthesize_header};
pub use problems::{display_problems, extract_plans};
pub use record::{acuity, build_records, dashboard};
pub use sections::split_sections;
pub use signals::{clinical_keywords, critical_labs, is_critical_lab, scan_keywords, status_badges};
pub use tasks::tasks;
pub use template::{Clock, FixedClock, SystemClock, TemplateContext, TemplateEngine};

/// Records and problem plans for a whole document, from one split.
pub fn summarize_document(document: &str, config: &HandoffConfig) -> HandoffSnapshot {
    let sections = split_sections(document);
    tracing::debug!(
        patients = sections::patient_section_count(&sections),
        "summarizing handoff document"
    );
    let records = record::records_from_sections(&sections, config);
    let plans = problems::plans_from_sections(&sections);
    HandoffSnapshot::new(records, plans)
}
