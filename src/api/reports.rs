use async_trait::async_trait;

use crate::api::ReportApi;
use crate::client::ApiClient;
use crate::error::ApiError;
use crate::models::{CourseReport, NewCourseReport, UpdateCourseReport};

#[derive(Debug, Clone)]
pub struct ReportService {
    client: ApiClient,
}

impl ReportService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ReportApi for ReportService {
    async fn list_mappings(&self, instance_id: i64) -> Result<Vec<CourseReport>, ApiError> {
        self.client
            .get(&format!("/course-reports/{}", instance_id))
            .await
    }

    async fn get_mapping(
        &self,
        instance_id: i64,
        course_id: i64,
    ) -> Result<CourseReport, ApiError> {
        self.client
            .get(&format!("/course-reports/{}/{}", instance_id, course_id))
            .await
    }

    async fn create_mapping(
        &self,
        instance_id: i64,
        req: &NewCourseReport,
    ) -> Result<CourseReport, ApiError> {
        self.client
            .post_json(&format!("/course-reports/{}", instance_id), req)
            .await
    }

    async fn update_mapping(
        &self,
        instance_id: i64,
        course_id: i64,
        req: &UpdateCourseReport,
    ) -> Result<CourseReport, ApiError> {
        self.client
            .put_json(&format!("/course-reports/{}/{}", instance_id, course_id), req)
            .await
    }

    async fn delete_mapping(&self, instance_id: i64, course_id: i64) -> Result<(), ApiError> {
        self.client
            .delete(&format!("/course-reports/{}/{}", instance_id, course_id))
            .await
    }
}
