//! Headless page and modal state. Each page action catches its own errors
//! and turns them into a banner message; only the 401 path escapes, via the
//! client's forced logout.

pub mod export;
pub mod form;
pub mod instances;
pub mod pages;
pub mod report;
pub mod user_detail;

pub use export::{export_csv, export_filename, render_csv};
pub use form::{FormPhase, TransitionError};
pub use instances::{ConnectionTest, CreateInstanceForm, EditInstanceForm, InstanceDraft};
pub use pages::{CourseDetailPage, CourseTab, InstanceDetailPage, InstancesPage};
pub use report::{MappingView, ReportConfigForm};
pub use user_detail::{
    DetailTab, EnrichedActivity, GradeBand, GradeBreakdown, UserDetail, UserDetailModal,
};

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> LoadState<T> {
    pub fn from_result(
        result: Result<T, crate::error::ApiError>,
        fallback: &str,
    ) -> Self {
        match result {
            Ok(value) => LoadState::Ready(value),
            Err(e) => {
                tracing::warn!("{}: {}", fallback, e);
                LoadState::Failed(e.user_message(fallback))
            }
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            LoadState::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            LoadState::Failed(msg) => Some(msg.as_str()),
            _ => None,
        }
    }
}
