//! Plain-text rendering for pasting into an EMR.

use std::sync::LazyLock;

use regex::Regex;

static TREND_ARROWS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[↑↓→←⬆⬇↗↘⇧⇩]").expect("valid regex"));

static HEADER_MARKERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:#+\s*)+").expect("valid regex"));

static CHECKLIST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)[-*+]\s+\[([ xX])\]\s*").expect("valid regex"));

static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)[-*+]\s+").expect("valid regex"));

/// Strip markdown so the text survives a paste into a record system.
///
/// Per line: trend arrows and `**` are removed, leading `#` markers dropped,
/// `- [ ]` / `- [x]` become `[ ]` / `[x]`, other bullets become `•`, and
/// trailing whitespace is trimmed. Applying it twice changes nothing.
pub fn emr_clean(text: &str) -> String {
    text.split('\n').map(clean_line).collect::<Vec<_>>().join("\n")
}

fn clean_line(line: &str) -> String {
    let line = TREND_ARROWS.replace_all(line, "");
    let line = line.replace("**", "");
    let line = HEADER_MARKERS.replace(&line, "");
    let line = CHECKLIST.replace(&line, |caps: &regex::Captures<'_>| {
        let mark = if &caps[2] == " " { " " } else { "x" };
        format!("{}[{mark}] ", &caps[1])
    });
    let line = BULLET.replace(&line, "${1}• ");
    line.trim_end().to_string()
}
