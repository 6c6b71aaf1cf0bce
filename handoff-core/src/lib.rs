//! Kiểu dữ liệu lõi cho bản bàn giao (handoff) bệnh nhân.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Dấu mở đầu một mục bệnh nhân trong tài liệu.
pub const HEADER_DELIMITER: &str = "### ";

/// Tiêu đề giả cho phần văn bản đứng trước dấu mở đầu đầu tiên.
pub const PREAMBLE_HEADER: &str = "Preamble";

/// Cấu hình các ngưỡng heuristic khi trích xuất.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HandoffConfig {
    /// Số dòng tối đa quét khi tự dựng tiêu đề cho phần mở đầu.
    pub header_scan_lines: usize,
    /// Số ký tự tối đa của tên trong tiêu đề tự dựng.
    pub header_name_max_chars: usize,
    /// Độ dài tối đa của tên vấn đề trong danh sách hiển thị.
    pub problem_title_max_chars: usize,
    /// Vượt quá số vấn đề này thì mức độ ưu tiên là Medium.
    pub acuity_medium_problem_count: usize,
    /// Cho phép chạy tách mục trên worker nền.
    pub use_background_worker: bool,
    /// Định dạng chrono cho `{{date}}`.
    pub date_format: String,
    /// Định dạng chrono cho `{{time}}`.
    pub time_format: String,
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self {
            header_scan_lines: 15,
            header_name_max_chars: 17,
            problem_title_max_chars: 59,
            acuity_medium_problem_count: 3,
            use_background_worker: true,
            date_format: "%m/%d/%Y".to_string(),
            time_format: "%H:%M".to_string(),
        }
    }
}

impl HandoffConfig {
    /// Đọc cấu hình từ JSON; trường thiếu lấy giá trị mặc định.
    pub fn from_json_str(input: &str) -> Result<Self, HandoffError> {
        serde_json::from_str(input).map_err(|err| HandoffError::Config(err.to_string()))
    }
}

/// Một mục liên tục của tài liệu, bắt đầu bằng dòng tiêu đề.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Section {
    pub header: String,
    pub lines: Vec<String>,
}

impl Section {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            lines: Vec::new(),
        }
    }

    /// Mục giả chứa văn bản trước tiêu đề thật đầu tiên.
    pub fn is_preamble(&self) -> bool {
        self.header == PREAMBLE_HEADER
    }
}

/// Danh tính bệnh nhân đọc từ dòng tiêu đề.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct HeaderInfo {
    pub name: String,
    pub room: String,
    pub age: String,
    /// `"M"`, `"F"` hoặc rỗng.
    pub gender: String,
}

/// Chỉ số sống lấy từ một dòng duy nhất.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Vitals {
    /// Dòng gốc chứa chỉ số sống, rỗng nếu không tìm thấy.
    pub raw: String,
    pub bp: Option<String>,
    pub hr: Option<String>,
    pub temp: Option<String>,
    pub o2: Option<String>,
}

impl Vitals {
    pub fn is_empty(&self) -> bool {
        self.bp.is_none() && self.hr.is_none() && self.temp.is_none() && self.o2.is_none()
    }
}

/// Tiến độ checklist của một bệnh nhân.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct TaskProgress {
    pub total: usize,
    pub completed: usize,
    /// Phần trăm hoàn thành, 0 khi không có việc nào.
    pub progress: f64,
}

/// Bản ghi bệnh nhân, dựng lại từ đầu sau mỗi lần phân tích.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PatientRecord {
    /// Vị trí của mục trong tài liệu.
    pub index: usize,
    pub header: String,
    pub name: String,
    pub room: String,
    pub age: String,
    pub gender: String,
    pub admit_reason: String,
    /// Unix millis, 0 khi không đọc được ngày nhập viện.
    pub admitted_at: i64,
    pub vitals: Vitals,
    pub problems: Vec<String>,
    pub status_badges: Vec<String>,
    pub clinical_keywords: Vec<String>,
    pub critical_labs: Vec<String>,
    pub tasks: TaskProgress,
    pub summary_snippet: String,
    pub dispo: String,
}

/// Một vấn đề cùng các dòng kế hoạch đi kèm.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Problem {
    pub title: String,
    pub details: Vec<String>,
}

/// Danh sách vấn đề và kế hoạch của một bệnh nhân.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractedPlan {
    pub patient_header: String,
    /// Vị trí bệnh nhân, không tính phần mở đầu.
    pub patient_index: usize,
    pub problems: Vec<Problem>,
}

/// Mức độ ưu tiên trên bảng theo dõi.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Acuity {
    High,
    Medium,
    Low,
}

/// Hình chiếu gọn của bệnh nhân cho bảng theo dõi.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardEntry {
    pub id: usize,
    pub name: String,
    pub room: String,
    /// Dòng chỉ số sống gốc.
    pub vitals: String,
    pub critical_labs: Vec<String>,
    pub active_problems: Vec<String>,
    pub acuity: Acuity,
}

/// Nội dung gửi kèm yêu cầu tới worker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContentPayload {
    pub content: String,
}

/// Thông điệp gửi tới worker nền.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind")]
pub enum WorkerRequest {
    #[serde(rename = "PARSE_DOCUMENT")]
    ParseDocument { id: u64, payload: ContentPayload },
    #[serde(rename = "EXTRACT_KEYWORDS")]
    ExtractKeywords { id: u64, payload: ContentPayload },
}

impl WorkerRequest {
    pub fn id(&self) -> u64 {
        match self {
            Self::ParseDocument { id, .. } | Self::ExtractKeywords { id, .. } => *id,
        }
    }
}

/// Thông điệp worker nền trả về.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind")]
pub enum WorkerResponse {
    #[serde(rename = "PARSE_RESULT")]
    ParseResult { id: u64, result: Vec<Section> },
    #[serde(rename = "KEYWORDS_RESULT")]
    KeywordsResult { id: u64, result: Vec<String> },
}

impl WorkerResponse {
    pub fn id(&self) -> u64 {
        match self {
            Self::ParseResult { id, .. } | Self::KeywordsResult { id, .. } => *id,
        }
    }
}

/// Kết quả tổng hợp của một lần phân tích tài liệu.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HandoffSnapshot {
    pub generated_at: DateTime<Utc>,
    pub records: Vec<PatientRecord>,
    pub plans: Vec<ExtractedPlan>,
}

impl HandoffSnapshot {
    /// Khởi tạo snapshot từ các thành phần đã chuẩn bị.
    pub fn new(records: Vec<PatientRecord>, plans: Vec<ExtractedPlan>) -> Self {
        Self {
            generated_at: Utc::now(),
            records,
            plans,
        }
    }

    /// Bản ghi theo thứ tự tài liệu.
    pub fn patients(&self) -> &[PatientRecord] {
        &self.records
    }
}

/// Lỗi ở ranh giới hệ thống; bản thân việc phân tích không bao giờ lỗi.
#[derive(Debug, thiserror::Error)]
pub enum HandoffError {
    #[error("Không đọc được dữ liệu: {0}")]
    Parse(String),
    #[error("Cấu hình không hợp lệ: {0}")]
    Config(String),
    #[error("Worker nền không khả dụng: {0}")]
    WorkerUnavailable(String),
    #[error("Worker nền đã ngắt trước khi trả kết quả")]
    WorkerDisconnected,
    #[error("Hết thời gian chờ worker nền")]
    Timeout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_fills_missing_fields_with_defaults() {
        let cfg = HandoffConfig::from_json_str(r#"{"header_scan_lines": 5}"#).unwrap();
        assert_eq!(cfg.header_scan_lines, 5);
        assert_eq!(cfg.header_name_max_chars, 17);
        assert!(cfg.use_background_worker);
    }

    #[test]
    fn config_rejects_wrong_types() {
        let err = HandoffConfig::from_json_str(r#"{"header_scan_lines": "many"}"#).unwrap_err();
        assert!(matches!(err, HandoffError::Config(_)));
    }

    #[test]
    fn worker_messages_use_kind_tag() {
        let request = WorkerRequest::ParseDocument {
            id: 7,
            payload: ContentPayload {
                content: "### A".to_string(),
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["kind"], "PARSE_DOCUMENT");
        assert_eq!(value["id"], 7);
        assert_eq!(value["payload"]["content"], "### A");

        let response: WorkerResponse = serde_json::from_str(
            r#"{"kind":"KEYWORDS_RESULT","id":3,"result":["Sepsis"]}"#,
        )
        .unwrap();
        assert_eq!(response.id(), 3);
        assert_eq!(
            response,
            WorkerResponse::KeywordsResult {
                id: 3,
                result: vec!["Sepsis".to_string()]
            }
        );
    }

    #[test]
    fn preamble_is_detected_by_header() {
        assert!(Section::new(PREAMBLE_HEADER).is_preamble());
        assert!(!Section::new("### 1. Jane Roe").is_preamble());
    }
}
