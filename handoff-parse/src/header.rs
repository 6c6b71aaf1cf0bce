//! Patient identity from section header lines.

use std::sync::LazyLock;

use handoff_core::{HandoffConfig, HeaderInfo, HEADER_DELIMITER};
use regex::{Captures, Regex};

static ORDINAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\s+").expect("valid regex"));

static SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+[-–—]\s+").expect("valid regex"));

/// `(65M)`, `(65 f)`, `(72)` or `(F)`.
static DEMOGRAPHICS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(\s*(?:(\d{1,3})\s*([A-Za-z])?|([A-Za-z]))\s*\)").expect("valid regex")
});

static TRAILING_DEMOGRAPHICS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*\(\s*(?:(\d{1,3})\s*([A-Za-z])?|([A-Za-z]))\s*\)\s*$").expect("valid regex")
});

static SECTION_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^[\s#*]*(?:(?:night|day|evening|morning|overnight|shift|weekend|nursing|team|icu|floor|daily|interval|brief|physical|hospital|past|medical|surgical|social|family)\s+){0,2}(?:handoff|census|summary|assessment|plan|history|exam|vitals|labs|imaging|meds|disposition)(?:\s+[a-z0-9/&.-]+){0,2}[\s*:]*$",
    )
    .expect("valid regex")
});

static NAME_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\bname\s*:\s*\**\s*([^|;]+?)\s*\**\s*(?:[|;]|\s+(?:room|bed|unit|age|sex|gender)\s*:|$)",
    )
    .expect("valid regex")
});

static ROOM_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:room|bed|unit)\s*:\s*\**\s*([^|;,]+?)\s*\**\s*(?:[|;,]|\s+(?:name|age|sex|gender)\s*:|$)",
    )
    .expect("valid regex")
});

static AGE_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bage\s*:\s*\**\s*(\d{1,3})\b").expect("valid regex"));

static SEX_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:sex|gender)\s*:\s*\**\s*(male|female|man|woman|m|f)\b")
        .expect("valid regex")
});

static AGE_GENDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(\d{1,3})\s*-?\s*(?:yo|y/o|y\.o\.|yrs?|years?[\s-]+old)\s*,?\s*(male|female|man|woman|m|f)\b",
    )
    .expect("valid regex")
});

/// `Jane Roe`, `J. Roe`, optionally followed by ` - 12B`.
static BARE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^((?:[A-Z][a-z'’-]+|[A-Z]\.)(?:\s+[A-Z][A-Za-z'’-]+)+)(?:\s+[-–—]\s+(\S+))?\s*$",
    )
    .expect("valid regex")
});

/// Parse `### <n>. Name - Room (65M)` into its parts.
///
/// Missing parts come back as empty strings.
pub fn parse_header(header: &str) -> HeaderInfo {
    let trimmed = header.trim();
    let without_marker = trimmed.strip_prefix("###").unwrap_or(trimmed).trim_start();
    let rest = ORDINAL.replace(without_marker, "");

    let mut info = HeaderInfo::default();
    match SEPARATOR.find(&rest) {
        Some(separator) => {
            let right = &rest[separator.end()..];
            info.name = rest[..separator.start()].trim().to_string();
            info.room = right.split('(').next().unwrap_or_default().trim().to_string();
            if let Some(caps) = DEMOGRAPHICS.captures(right) {
                apply_demographics(&mut info, &caps);
            }
        }
        None => match TRAILING_DEMOGRAPHICS.captures(&rest) {
            Some(caps) => {
                let start = caps.get(0).map_or(rest.len(), |m| m.start());
                info.name = rest[..start].trim().to_string();
                apply_demographics(&mut info, &caps);
            }
            None => info.name = rest.trim().to_string(),
        },
    }
    info
}

fn apply_demographics(info: &mut HeaderInfo, caps: &Captures<'_>) {
    if let Some(age) = caps.get(1) {
        info.age = age.as_str().to_string();
    }
    if let Some(letter) = caps.get(2).or_else(|| caps.get(3)) {
        info.gender = gender_code(letter.as_str()).to_string();
    }
}

/// Map a sex token to `M`/`F`; anything else maps to an empty string.
pub fn gender_code(token: &str) -> &'static str {
    match token.to_lowercase().as_str() {
        "m" | "male" | "man" => "M",
        "f" | "female" | "woman" => "F",
        _ => "",
    }
}

#[derive(Default)]
struct Identity {
    name: Option<String>,
    room: Option<String>,
    age: Option<String>,
    gender: Option<String>,
}

impl Identity {
    fn set_name(&mut self, value: &str) {
        set_once(&mut self.name, value);
    }

    fn set_room(&mut self, value: &str) {
        set_once(&mut self.room, value);
    }

    fn set_age(&mut self, value: &str) {
        set_once(&mut self.age, value);
    }

    fn set_gender(&mut self, value: &str) {
        set_once(&mut self.gender, gender_code(value));
    }
}

fn set_once(slot: &mut Option<String>, value: &str) {
    let value = value.trim().trim_matches('*').trim();
    if slot.is_none() && !value.is_empty() {
        *slot = Some(value.to_string());
    }
}

/// Build a header line for the preamble section from its body.
///
/// Lines are scanned in order and the first value found for each field is
/// kept. Within a line, labeled fields are tried before the combined
/// `65yo M` form. The first candidate line may also be taken as a bare
/// `First Last` name when no name is set yet, so a later `Name:` label never
/// overrides it.
pub fn synthesize_header(lines: &[String], index: Option<usize>, config: &HandoffConfig) -> String {
    let mut identity = Identity::default();
    let mut first_candidate = true;

    for line in lines.iter().take(config.header_scan_lines) {
        let trimmed = line.trim();
        if trimmed.is_empty() || SECTION_LABEL.is_match(trimmed) {
            continue;
        }

        if let Some(caps) = NAME_LABEL.captures(trimmed) {
            identity.set_name(&caps[1]);
        }
        if let Some(caps) = ROOM_LABEL.captures(trimmed) {
            identity.set_room(&caps[1]);
        }
        if let Some(caps) = AGE_LABEL.captures(trimmed) {
            identity.set_age(&caps[1]);
        }
        if let Some(caps) = SEX_LABEL.captures(trimmed) {
            identity.set_gender(&caps[1]);
        }
        if let Some(caps) = AGE_GENDER.captures(trimmed) {
            identity.set_age(&caps[1]);
            identity.set_gender(&caps[2]);
        }

        if first_candidate && identity.name.is_none() {
            let bare = trimmed.trim_matches('*').trim();
            if !bare.contains(':') {
                if let Some(caps) = BARE_NAME.captures(bare) {
                    identity.set_name(&caps[1]);
                    if let Some(room) = caps.get(2) {
                        identity.set_room(room.as_str());
                    }
                }
            }
        }
        first_candidate = false;
    }

    let ordinal = index.map(|i| format!("{}. ", i + 1)).unwrap_or_default();
    let Some(name) = identity.name else {
        tracing::trace!("no patient name found in preamble");
        return format!("{HEADER_DELIMITER}{ordinal}New Patient");
    };

    let mut header = format!(
        "{HEADER_DELIMITER}{ordinal}{}",
        truncate_name(&name, config.header_name_max_chars)
    );
    if let Some(room) = identity.room {
        header.push_str(" — ");
        header.push_str(&room);
    }
    let demographics = format!(
        "{}{}",
        identity.age.unwrap_or_default(),
        identity.gender.unwrap_or_default()
    );
    if !demographics.is_empty() {
        header.push_str(&format!(" ({demographics})"));
    }
    header
}

fn truncate_name(name: &str, max_chars: usize) -> String {
    if name.chars().count() <= max_chars {
        return name.to_string();
    }
    let mut truncated: String = name.chars().take(max_chars).collect();
    truncated.push('…');
    truncated
}
