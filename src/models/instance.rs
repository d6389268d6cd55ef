use serde::{Deserialize, Deserializer, Serialize};

/// A registered Moodle endpoint. The access token is write-only from the
/// console's point of view: whatever the server sends back is masked on
/// arrival and the full value is never held.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodleInstance {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub moodle_url: String,
    #[serde(
        rename = "moodle_token",
        default,
        deserialize_with = "masked",
        skip_serializing
    )]
    pub masked_token: String,
    pub contact_email: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub last_sync_at: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

fn masked<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let token = Option::<String>::deserialize(deserializer)?;
    Ok(token.as_deref().map(mask_token).unwrap_or_default())
}

/// Keeps the last four characters visible.
pub fn mask_token(token: &str) -> String {
    let count = token.chars().count();
    if count == 0 {
        return String::new();
    }
    if count <= 4 {
        return "*".repeat(count);
    }
    let tail: String = token.chars().skip(count - 4).collect();
    format!("{}{}", "*".repeat(count - 4), tail)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInstanceRequest {
    pub name: String,
    pub slug: String,
    pub moodle_url: String,
    pub moodle_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateInstanceRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moodle_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moodle_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestConnectionResponse {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub site_name: Option<String>,
    #[serde(default)]
    pub moodle_version: Option<String>,
    #[serde(default)]
    pub courses_count: Option<i64>,
    #[serde(default)]
    pub error: Option<String>,
}
