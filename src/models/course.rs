use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Moodle's front page is exposed as a course with this id.
pub const SITE_COURSE_ID: i64 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodleCourse {
    pub id: i64,
    pub shortname: String,
    pub fullname: String,
    #[serde(default)]
    pub categoryid: i64,
    #[serde(default)]
    pub visible: i64,
    #[serde(default)]
    pub startdate: i64,
    #[serde(default)]
    pub enddate: i64,
}

impl MoodleCourse {
    pub fn is_visible(&self) -> bool {
        self.visible != 0
    }

    pub fn starts_at(&self) -> Option<DateTime<Utc>> {
        epoch(self.startdate)
    }

    pub fn ends_at(&self) -> Option<DateTime<Utc>> {
        epoch(self.enddate)
    }
}

/// Moodle uses `0` for "not set".
pub(crate) fn epoch(seconds: i64) -> Option<DateTime<Utc>> {
    if seconds <= 0 {
        return None;
    }
    DateTime::from_timestamp(seconds, 0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomField {
    #[serde(rename = "type", default)]
    pub field_type: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub name: String,
    pub shortname: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodleUser {
    pub id: i64,
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    #[serde(default)]
    pub customfields: Vec<CustomField>,
}

impl MoodleUser {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
    }

    pub fn initials(&self) -> String {
        self.firstname
            .chars()
            .take(1)
            .chain(self.lastname.chars().take(1))
            .collect()
    }

    /// Value of a custom profile field, `"-"` when absent or blank.
    pub fn custom_field(&self, shortname: &str) -> &str {
        self.customfields
            .iter()
            .find(|f| f.shortname == shortname)
            .map(|f| f.value.as_str())
            .filter(|v| !v.is_empty())
            .unwrap_or("-")
    }
}
