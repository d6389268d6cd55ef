pub mod course;
pub mod dashboard;
pub mod instance;
pub mod progress;
pub mod report;
pub mod user;

pub use course::{CustomField, MoodleCourse, MoodleUser, SITE_COURSE_ID};
pub use dashboard::{DashboardStats, DashboardSummary, InstanceStats, InstanceStatus};
pub use instance::{
    MoodleInstance, NewInstanceRequest, TestConnectionResponse, UpdateInstanceRequest, mask_token,
};
pub use progress::{
    ActivityCompletion, ActivityRule, COURSE_ITEM_TYPE, CompletionSummary, CourseModule,
    CourseSection, GradeItem, GradeStatus, RuleValue,
};
pub use report::{CourseReport, NewCourseReport, ReportRow, UpdateCourseReport};
pub use user::{LoginResponse, UserProfile};
