use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    Online,
    Offline,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceStats {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub url: String,
    pub courses_count: i64,
    pub users_count: i64,
    pub status: InstanceStatus,
    pub last_sync: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_instances: i64,
    pub active_instances: i64,
    pub total_courses: i64,
    pub total_users: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub summary: DashboardSummary,
    pub instances: Vec<InstanceStats>,
}
