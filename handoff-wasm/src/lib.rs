//! Bridge WASM <-> JavaScript trung lập framework.
//!
//! `handle_worker_message` là phía worker của giao thức: trang web đăng ký
//! nó trong `onmessage` của Web Worker và gửi lại kết quả bằng `postMessage`.

use chrono::NaiveDateTime;
use handoff_core::{HandoffConfig, HandoffError, PatientRecord, WorkerRequest};
use handoff_parse::{FixedClock, TemplateContext, TemplateEngine};
use serde::Deserialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[derive(Deserialize)]
struct JsHandoffConfig {
    #[serde(default)]
    header_scan_lines: Option<usize>,
    #[serde(default)]
    header_name_max_chars: Option<usize>,
    #[serde(default)]
    problem_title_max_chars: Option<usize>,
    #[serde(default)]
    acuity_medium_problem_count: Option<usize>,
    #[serde(default)]
    date_format: Option<String>,
    #[serde(default)]
    time_format: Option<String>,
}

impl From<JsHandoffConfig> for HandoffConfig {
    fn from(cfg: JsHandoffConfig) -> Self {
        let mut base = HandoffConfig::default();
        if let Some(lines) = cfg.header_scan_lines {
            base.header_scan_lines = lines;
        }
        if let Some(chars) = cfg.header_name_max_chars {
            base.header_name_max_chars = chars;
        }
        if let Some(chars) = cfg.problem_title_max_chars {
            base.problem_title_max_chars = chars;
        }
        if let Some(count) = cfg.acuity_medium_problem_count {
            base.acuity_medium_problem_count = count;
        }
        if let Some(format) = cfg.date_format {
            base.date_format = format;
        }
        if let Some(format) = cfg.time_format {
            base.time_format = format;
        }
        // Trình duyệt tự quản lý Web Worker.
        base.use_background_worker = false;
        base
    }
}

fn read_config(config: Option<JsValue>) -> Result<HandoffConfig, JsValue> {
    match config {
        Some(js_cfg) if !js_cfg.is_undefined() && !js_cfg.is_null() => {
            let cfg: JsHandoffConfig = from_value(js_cfg)
                .map_err(|err| JsValue::from_str(&format!("Không đọc được config: {err}")))?;
            Ok(HandoffConfig::from(cfg))
        }
        _ => Ok(HandoffConfig {
            use_background_worker: false,
            ..HandoffConfig::default()
        }),
    }
}

fn set_panic_hook() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Tách tài liệu thành các mục.
#[wasm_bindgen]
pub fn parse_document(content: &str) -> Result<JsValue, JsValue> {
    set_panic_hook();
    to_value(&handoff_parse::split_sections(content))
        .map_err(|err| JsValue::from_str(&format!("Không serialize danh sách mục: {err}")))
}

/// Bản ghi bệnh nhân và kế hoạch điều trị cho cả tài liệu.
#[wasm_bindgen]
pub fn summarize_document(content: &str, config: Option<JsValue>) -> Result<JsValue, JsValue> {
    set_panic_hook();
    let cfg = read_config(config)?;
    let snapshot = handoff_parse::summarize_document(content, &cfg);

    to_value(&snapshot)
        .map_err(|err| JsValue::from_str(&format!("Không serialize snapshot: {err}")))
}

/// Bảng theo dõi rút gọn cho cả tài liệu.
#[wasm_bindgen]
pub fn dashboard(content: &str, config: Option<JsValue>) -> Result<JsValue, JsValue> {
    set_panic_hook();
    let cfg = read_config(config)?;
    let records = handoff_parse::build_records(content, &cfg);

    to_value(&handoff_parse::dashboard(&records, &cfg))
        .map_err(|err| JsValue::from_str(&format!("Không serialize bảng theo dõi: {err}")))
}

/// Xử lý một thông điệp `PARSE_DOCUMENT` / `EXTRACT_KEYWORDS` trong worker.
#[wasm_bindgen]
pub fn handle_worker_message(message: JsValue) -> Result<JsValue, JsValue> {
    set_panic_hook();
    let request: WorkerRequest = from_value(message)
        .map_err(|err| JsValue::from_str(&format_handoff_error(HandoffError::Parse(err.to_string()))))?;

    to_value(&handoff_parse::handle_request(request))
        .map_err(|err| JsValue::from_str(&format!("Không serialize phản hồi worker: {err}")))
}

#[wasm_bindgen]
pub fn emr_clean(text: &str) -> String {
    handoff_parse::emr_clean(text)
}

/// Điền mẫu ghi chú từ một bản ghi bệnh nhân.
///
/// `now` là giờ địa phương dạng `YYYY-MM-DDTHH:MM:SS`, do JavaScript cung
/// cấp vì WASM không có đồng hồ hệ thống.
#[wasm_bindgen]
pub fn render_template(
    template: &str,
    record: JsValue,
    now: &str,
    config: Option<JsValue>,
) -> Result<String, JsValue> {
    set_panic_hook();
    let cfg = read_config(config)?;

    let context = if record.is_undefined() || record.is_null() {
        TemplateContext::new()
    } else {
        let record: PatientRecord = from_value(record)
            .map_err(|err| JsValue::from_str(&format!("Không đọc được bản ghi: {err}")))?;
        TemplateContext::from_record(&record)
    };

    let instant: NaiveDateTime = now.parse().map_err(|err| {
        JsValue::from_str(&format_handoff_error(HandoffError::Parse(format!(
            "thời điểm `{now}`: {err}"
        ))))
    })?;

    let engine = TemplateEngine::new(Box::new(FixedClock(instant)), &cfg);
    Ok(engine.render(template, &context))
}

fn format_handoff_error(err: HandoffError) -> String {
    format!("Handoff error: {err}")
}
