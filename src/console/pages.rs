//! Page loaders for the three protected screens.

use crate::api::{CourseApi, InstanceApi};
use crate::console::LoadState;
use crate::error::ApiError;
use crate::models::{MoodleCourse, MoodleInstance, MoodleUser, SITE_COURSE_ID};

pub const INSTANCES_FAILED: &str = "Failed to load instances";
pub const INSTANCE_FAILED: &str = "Failed to load instance data";
pub const COURSE_FAILED: &str = "Failed to load course data";
pub const COURSE_NOT_FOUND: &str = "Course not found";

#[derive(Debug, Clone, PartialEq)]
pub struct InstancesPage {
    pub instances: LoadState<Vec<MoodleInstance>>,
}

impl InstancesPage {
    /// Only active instances are listed.
    pub async fn load(api: &dyn InstanceApi) -> Self {
        Self {
            instances: LoadState::from_result(api.list_instances(true).await, INSTANCES_FAILED),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstanceOverview {
    pub instance: MoodleInstance,
    pub courses: Vec<MoodleCourse>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstanceDetailPage {
    pub state: LoadState<InstanceOverview>,
}

impl InstanceDetailPage {
    pub async fn load(instances: &dyn InstanceApi, courses: &dyn CourseApi, id: i64) -> Self {
        let result = async {
            let instance = instances.get_instance(id).await?;
            let courses = courses
                .courses(id)
                .await?
                .into_iter()
                .filter(|c| c.id != SITE_COURSE_ID)
                .collect();
            Ok::<_, ApiError>(InstanceOverview { instance, courses })
        }
        .await;

        Self {
            state: LoadState::from_result(result, INSTANCE_FAILED),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CourseTab {
    #[default]
    Users,
    Report,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CourseOverview {
    pub course: MoodleCourse,
    pub users: Vec<MoodleUser>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CourseDetailPage {
    pub state: LoadState<CourseOverview>,
    pub tab: CourseTab,
}

impl CourseDetailPage {
    /// The course record is looked up in the instance's course list; there
    /// is no single-course endpoint.
    pub async fn load(api: &dyn CourseApi, instance_id: i64, course_id: i64) -> Self {
        let state = match api.courses(instance_id).await {
            Err(e) => LoadState::from_result(Err(e), COURSE_FAILED),
            Ok(courses) => match courses.into_iter().find(|c| c.id == course_id) {
                None => LoadState::Failed(COURSE_NOT_FOUND.to_string()),
                Some(course) => LoadState::from_result(
                    api.course_users(instance_id, course_id)
                        .await
                        .map(|users| CourseOverview { course, users }),
                    COURSE_FAILED,
                ),
            },
        };

        Self {
            state,
            tab: CourseTab::default(),
        }
    }

    pub fn select(&mut self, tab: CourseTab) {
        self.tab = tab;
    }
}
