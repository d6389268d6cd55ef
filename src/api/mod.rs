//! Typed resource services. Each method maps to exactly one endpoint.
//!
//! The console view-models only see the traits.

pub mod auth;
pub mod courses;
pub mod instances;
pub mod reports;

use async_trait::async_trait;

use crate::error::ApiError;
use crate::models::*;

pub use auth::AuthService;
pub use courses::CourseService;
pub use instances::InstanceService;
pub use reports::ReportService;

#[async_trait]
pub trait InstanceApi: Send + Sync {
    async fn list_instances(&self, active_only: bool) -> Result<Vec<MoodleInstance>, ApiError>;
    async fn get_instance(&self, id: i64) -> Result<MoodleInstance, ApiError>;
    async fn create_instance(&self, req: &NewInstanceRequest) -> Result<MoodleInstance, ApiError>;
    async fn update_instance(
        &self,
        id: i64,
        req: &UpdateInstanceRequest,
    ) -> Result<MoodleInstance, ApiError>;
    async fn delete_instance(&self, id: i64) -> Result<(), ApiError>;
    async fn test_connection(&self, id: i64) -> Result<TestConnectionResponse, ApiError>;
}

#[async_trait]
pub trait CourseApi: Send + Sync {
    async fn dashboard_stats(&self) -> Result<DashboardStats, ApiError>;
    async fn courses(&self, instance_id: i64) -> Result<Vec<MoodleCourse>, ApiError>;
    async fn course_users(
        &self,
        instance_id: i64,
        course_id: i64,
    ) -> Result<Vec<MoodleUser>, ApiError>;
    async fn user_completion(
        &self,
        instance_id: i64,
        course_id: i64,
        user_id: i64,
    ) -> Result<CompletionSummary, ApiError>;
    async fn user_grades(
        &self,
        instance_id: i64,
        course_id: i64,
        user_id: i64,
    ) -> Result<Vec<GradeItem>, ApiError>;
    async fn user_activities(
        &self,
        instance_id: i64,
        course_id: i64,
        user_id: i64,
    ) -> Result<Vec<ActivityCompletion>, ApiError>;
    async fn course_contents(
        &self,
        instance_id: i64,
        course_id: i64,
    ) -> Result<Vec<CourseSection>, ApiError>;
    async fn course_report_rows(
        &self,
        instance_id: i64,
        course_id: i64,
    ) -> Result<Vec<ReportRow>, ApiError>;
}

/// Report mapping CRUD. A missing mapping comes back as
/// [`ApiError::NotFound`], which callers turn into an "unconfigured" state.
#[async_trait]
pub trait ReportApi: Send + Sync {
    async fn list_mappings(&self, instance_id: i64) -> Result<Vec<CourseReport>, ApiError>;
    async fn get_mapping(&self, instance_id: i64, course_id: i64)
    -> Result<CourseReport, ApiError>;
    async fn create_mapping(
        &self,
        instance_id: i64,
        req: &NewCourseReport,
    ) -> Result<CourseReport, ApiError>;
    async fn update_mapping(
        &self,
        instance_id: i64,
        course_id: i64,
        req: &UpdateCourseReport,
    ) -> Result<CourseReport, ApiError>;
    async fn delete_mapping(&self, instance_id: i64, course_id: i64) -> Result<(), ApiError>;
}
