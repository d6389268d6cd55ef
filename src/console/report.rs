//! Report tab: mapping configuration plus the custom report rows.

use tracing::{info, warn};

use crate::api::{CourseApi, ReportApi};
use crate::console::LoadState;
use crate::console::form::{FormPhase, TransitionError};
use crate::models::{CourseReport, NewCourseReport, ReportRow, UpdateCourseReport};

pub const MAPPING_FAILED: &str = "Failed to load the report configuration";
pub const SAVE_FAILED: &str = "Failed to save the report configuration";
pub const REMOVE_FAILED: &str = "Failed to remove the report configuration";
pub const ROWS_FAILED: &str = "Failed to load the report";
pub const REPORT_ID_REQUIRED: &str = "A report identifier is required";

/// A missing mapping is a normal state, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum MappingView {
    Unconfigured,
    Configured(CourseReport),
    Failed(String),
}

impl MappingView {
    pub async fn load(api: &dyn ReportApi, instance_id: i64, course_id: i64) -> Self {
        match api.get_mapping(instance_id, course_id).await {
            Ok(mapping) => MappingView::Configured(mapping),
            Err(e) if e.is_not_found() => MappingView::Unconfigured,
            Err(e) => {
                warn!(instance_id, course_id, "report mapping lookup failed: {}", e);
                MappingView::Failed(e.user_message(MAPPING_FAILED))
            }
        }
    }

    pub fn mapping(&self) -> Option<&CourseReport> {
        match self {
            MappingView::Configured(mapping) => Some(mapping),
            _ => None,
        }
    }
}

pub async fn load_report_rows(
    api: &dyn CourseApi,
    instance_id: i64,
    course_id: i64,
) -> LoadState<Vec<ReportRow>> {
    LoadState::from_result(
        api.course_report_rows(instance_id, course_id).await,
        ROWS_FAILED,
    )
}

#[derive(Debug, Clone)]
pub struct ReportConfigForm {
    instance_id: i64,
    course_id: i64,
    existing: Option<CourseReport>,
    pub report_id: Option<i64>,
    pub notes: String,
    phase: FormPhase,
}

impl ReportConfigForm {
    pub fn open(instance_id: i64, course_id: i64, view: &MappingView) -> Self {
        let existing = view.mapping().cloned();
        Self {
            instance_id,
            course_id,
            report_id: existing.as_ref().map(|m| m.report_id),
            notes: existing
                .as_ref()
                .and_then(|m| m.notes.clone())
                .unwrap_or_default(),
            existing,
            phase: FormPhase::Editing,
        }
    }

    pub fn phase(&self) -> &FormPhase {
        &self.phase
    }

    pub fn is_new(&self) -> bool {
        self.existing.is_none()
    }

    fn notes(&self) -> Option<String> {
        let trimmed = self.notes.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    /// Creates the mapping the first time, updates it afterwards.
    pub async fn save(
        &mut self,
        api: &dyn ReportApi,
    ) -> Result<Option<CourseReport>, TransitionError> {
        let Some(report_id) = self.report_id else {
            self.phase.fail(REPORT_ID_REQUIRED);
            return Ok(None);
        };
        self.phase.submit()?;

        let result = if self.is_new() {
            api.create_mapping(
                self.instance_id,
                &NewCourseReport {
                    course_id: self.course_id,
                    report_id,
                    notes: self.notes(),
                },
            )
            .await
        } else {
            api.update_mapping(
                self.instance_id,
                self.course_id,
                &UpdateCourseReport {
                    report_id,
                    notes: self.notes(),
                },
            )
            .await
        };

        match result {
            Ok(mapping) => {
                info!(
                    instance_id = self.instance_id,
                    course_id = self.course_id,
                    report_id,
                    "report mapping saved"
                );
                self.existing = Some(mapping.clone());
                self.phase.succeed();
                Ok(Some(mapping))
            }
            Err(e) => {
                warn!("saving report mapping failed: {}", e);
                self.phase.fail(e.user_message(SAVE_FAILED));
                Ok(None)
            }
        }
    }

    /// Returns `true` when the mapping is gone (or never existed).
    pub async fn remove(&mut self, api: &dyn ReportApi) -> Result<bool, TransitionError> {
        if self.is_new() {
            return Ok(true);
        }
        self.phase.submit()?;
        match api.delete_mapping(self.instance_id, self.course_id).await {
            Ok(()) => {
                info!(
                    instance_id = self.instance_id,
                    course_id = self.course_id,
                    "report mapping removed"
                );
                self.existing = None;
                self.phase.succeed();
                Ok(true)
            }
            Err(e) => {
                warn!("removing report mapping failed: {}", e);
                self.phase.fail(e.user_message(REMOVE_FAILED));
                Ok(false)
            }
        }
    }
}
