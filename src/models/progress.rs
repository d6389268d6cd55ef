use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::course::epoch;

/// Grade item type the platform uses for the course total.
pub const COURSE_ITEM_TYPE: &str = "course";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionSummary {
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub timecompleted: Option<i64>,
}

impl CompletionSummary {
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.timecompleted.and_then(epoch)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradeStatus {
    Graded,
    NoValue,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeItem {
    pub itemtype: String,
    #[serde(default)]
    pub itemname: Option<String>,
    #[serde(default)]
    pub itemmodule: Option<String>,
    #[serde(default)]
    pub graderaw: Option<f64>,
    #[serde(default)]
    pub grademin: Option<f64>,
    #[serde(default)]
    pub grademax: Option<f64>,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl GradeItem {
    pub fn is_course_total(&self) -> bool {
        self.itemtype == COURSE_ITEM_TYPE
    }

    pub fn status(&self) -> GradeStatus {
        if self.graderaw.is_some() {
            GradeStatus::Graded
        } else if self.status.as_deref() == Some("novalue") {
            GradeStatus::NoValue
        } else {
            GradeStatus::Pending
        }
    }

    pub fn percentage(&self) -> Option<f64> {
        match (self.graderaw, self.grademax) {
            (Some(raw), Some(max)) if max > 0.0 => Some(raw / max * 100.0),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleValue {
    pub status: i32,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRule {
    #[serde(default)]
    pub rulename: Option<String>,
    pub rulevalue: RuleValue,
}

impl ActivityRule {
    pub fn is_met(&self) -> bool {
        self.rulevalue.status == 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityCompletion {
    pub cmid: i64,
    pub modname: String,
    #[serde(default)]
    pub state: i32,
    #[serde(default)]
    pub timecompleted: i64,
    #[serde(default)]
    pub details: Vec<ActivityRule>,
}

impl ActivityCompletion {
    pub fn is_complete(&self) -> bool {
        self.state == 1
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        epoch(self.timecompleted)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseModule {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub modname: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseSection {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub modules: Vec<CourseModule>,
}
