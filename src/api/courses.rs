use async_trait::async_trait;

use crate::api::CourseApi;
use crate::client::ApiClient;
use crate::error::ApiError;
use crate::models::{
    ActivityCompletion, CompletionSummary, CourseSection, DashboardStats, GradeItem, MoodleCourse,
    MoodleUser, ReportRow,
};

/// Read-only mirrors of the remote platform.
#[derive(Debug, Clone)]
pub struct CourseService {
    client: ApiClient,
}

impl CourseService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

fn course_path(instance_id: i64, course_id: i64) -> String {
    format!("/instances/{}/courses/{}", instance_id, course_id)
}

fn user_path(instance_id: i64, course_id: i64, user_id: i64) -> String {
    format!("{}/users/{}", course_path(instance_id, course_id), user_id)
}

#[async_trait]
impl CourseApi for CourseService {
    async fn dashboard_stats(&self) -> Result<DashboardStats, ApiError> {
        self.client.get("/dashboard/stats").await
    }

    async fn courses(&self, instance_id: i64) -> Result<Vec<MoodleCourse>, ApiError> {
        self.client
            .get(&format!("/instances/{}/courses", instance_id))
            .await
    }

    async fn course_users(
        &self,
        instance_id: i64,
        course_id: i64,
    ) -> Result<Vec<MoodleUser>, ApiError> {
        self.client
            .get(&format!("{}/users", course_path(instance_id, course_id)))
            .await
    }

    async fn user_completion(
        &self,
        instance_id: i64,
        course_id: i64,
        user_id: i64,
    ) -> Result<CompletionSummary, ApiError> {
        self.client
            .get(&format!("{}/completion", user_path(instance_id, course_id, user_id)))
            .await
    }

    async fn user_grades(
        &self,
        instance_id: i64,
        course_id: i64,
        user_id: i64,
    ) -> Result<Vec<GradeItem>, ApiError> {
        self.client
            .get(&format!("{}/grades", user_path(instance_id, course_id, user_id)))
            .await
    }

    async fn user_activities(
        &self,
        instance_id: i64,
        course_id: i64,
        user_id: i64,
    ) -> Result<Vec<ActivityCompletion>, ApiError> {
        self.client
            .get(&format!("{}/activities", user_path(instance_id, course_id, user_id)))
            .await
    }

    async fn course_contents(
        &self,
        instance_id: i64,
        course_id: i64,
    ) -> Result<Vec<CourseSection>, ApiError> {
        self.client
            .get(&format!("{}/contents", course_path(instance_id, course_id)))
            .await
    }

    async fn course_report_rows(
        &self,
        instance_id: i64,
        course_id: i64,
    ) -> Result<Vec<ReportRow>, ApiError> {
        self.client
            .get(&format!("{}/report", course_path(instance_id, course_id)))
            .await
    }
}
