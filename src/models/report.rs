use serde::{Deserialize, Serialize};

/// One row of a course's free-form report. Key order is preserved so the
/// first row can drive the CSV header.
pub type ReportRow = serde_json::Map<String, serde_json::Value>;

/// Points a course at an externally defined report. At most one per
/// (instance, course).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseReport {
    pub id: i64,
    pub instance_id: i64,
    pub course_id: i64,
    pub report_id: i64,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCourseReport {
    pub course_id: i64,
    pub report_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCourseReport {
    pub report_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
