use async_trait::async_trait;
use serde::Serialize;

use crate::api::InstanceApi;
use crate::client::ApiClient;
use crate::error::ApiError;
use crate::models::{MoodleInstance, NewInstanceRequest, TestConnectionResponse, UpdateInstanceRequest};

#[derive(Serialize)]
struct ListQuery {
    active_only: bool,
}

#[derive(Debug, Clone)]
pub struct InstanceService {
    client: ApiClient,
}

impl InstanceService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl InstanceApi for InstanceService {
    async fn list_instances(&self, active_only: bool) -> Result<Vec<MoodleInstance>, ApiError> {
        if active_only {
            self.client
                .get_with_query("/moodle-instances", &ListQuery { active_only })
                .await
        } else {
            self.client.get("/moodle-instances").await
        }
    }

    async fn get_instance(&self, id: i64) -> Result<MoodleInstance, ApiError> {
        self.client.get(&format!("/moodle-instances/{}", id)).await
    }

    async fn create_instance(&self, req: &NewInstanceRequest) -> Result<MoodleInstance, ApiError> {
        self.client.post_json("/moodle-instances", req).await
    }

    async fn update_instance(
        &self,
        id: i64,
        req: &UpdateInstanceRequest,
    ) -> Result<MoodleInstance, ApiError> {
        self.client
            .put_json(&format!("/moodle-instances/{}", id), req)
            .await
    }

    async fn delete_instance(&self, id: i64) -> Result<(), ApiError> {
        self.client.delete(&format!("/moodle-instances/{}", id)).await
    }

    async fn test_connection(&self, id: i64) -> Result<TestConnectionResponse, ApiError> {
        self.client
            .post_empty(&format!("/moodle-instances/{}/test", id))
            .await
    }
}
