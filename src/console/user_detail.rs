//! User detail modal: four independent fetches joined locally.

use std::collections::HashMap;

use tracing::warn;

use crate::api::CourseApi;
use crate::console::LoadState;
use crate::error::ApiError;
use crate::models::{
    ActivityCompletion, CompletionSummary, CourseSection, GradeItem, MoodleUser,
};

pub const USER_DETAIL_FAILED: &str = "Failed to load user data";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DetailTab {
    #[default]
    Profile,
    Completion,
    Grades,
}

/// Human label for a Moodle module type, falling back to the raw code.
pub fn module_type_label(modname: &str) -> &str {
    match modname {
        "page" => "Page",
        "quiz" => "Quiz",
        "scorm" => "SCORM",
        "forum" => "Forum",
        "assign" => "Assignment",
        "resource" => "Resource",
        "url" => "URL",
        "label" => "Label",
        other => other,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedActivity {
    pub activity: ActivityCompletion,
    pub name: String,
}

/// Module id to display name, across every section.
pub fn module_names(contents: &[CourseSection]) -> HashMap<i64, String> {
    contents
        .iter()
        .flat_map(|section| section.modules.iter())
        .map(|module| (module.id, module.name.clone()))
        .collect()
}

/// Names each activity after its content module (matched on `cmid`), or
/// after its module type when the module is unknown or unnamed.
pub fn enrich_activities(
    activities: Vec<ActivityCompletion>,
    contents: &[CourseSection],
) -> Vec<EnrichedActivity> {
    let names = module_names(contents);
    activities
        .into_iter()
        .map(|activity| {
            let name = names
                .get(&activity.cmid)
                .filter(|name| !name.is_empty())
                .cloned()
                .unwrap_or_else(|| activity.modname.clone());
            EnrichedActivity { activity, name }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradeBand {
    Pass,
    Borderline,
    Fail,
    Ungraded,
}

impl GradeBand {
    pub fn of(grade: &GradeItem) -> Self {
        match grade.percentage() {
            Some(p) if p >= 60.0 => GradeBand::Pass,
            Some(p) if p >= 40.0 => GradeBand::Borderline,
            Some(_) => GradeBand::Fail,
            None => GradeBand::Ungraded,
        }
    }
}

/// One course total plus the per-item grades.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GradeBreakdown {
    pub course: Option<GradeItem>,
    pub items: Vec<GradeItem>,
}

impl GradeBreakdown {
    pub fn partition(grades: Vec<GradeItem>) -> Self {
        let mut breakdown = GradeBreakdown::default();
        for grade in grades {
            if !grade.is_course_total() {
                breakdown.items.push(grade);
            } else if breakdown.course.is_none() {
                breakdown.course = Some(grade);
            } else {
                warn!("ignoring extra course-level grade record");
            }
        }
        breakdown
    }
}

/// The error to report for a failed fan-out: an `Auth` failure if there is
/// one, otherwise the first in request order.
fn preferred_failure(errors: impl IntoIterator<Item = Option<ApiError>>) -> Option<ApiError> {
    let mut chosen: Option<ApiError> = None;
    for error in errors.into_iter().flatten() {
        match &chosen {
            Some(current) if current.is_auth() || !error.is_auth() => {}
            _ => chosen = Some(error),
        }
    }
    chosen
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserDetail {
    pub user: MoodleUser,
    pub completion: CompletionSummary,
    pub grades: GradeBreakdown,
    pub activities: Vec<EnrichedActivity>,
}

impl UserDetail {
    /// Issues all four requests at once and waits for every one of them to
    /// settle, even after one has failed. A rejected token wins over any
    /// other failure.
    pub async fn fetch(
        api: &dyn CourseApi,
        instance_id: i64,
        course_id: i64,
        user: MoodleUser,
    ) -> Result<Self, ApiError> {
        let (completion, grades, activities, contents) = tokio::join!(
            api.user_completion(instance_id, course_id, user.id),
            api.user_grades(instance_id, course_id, user.id),
            api.user_activities(instance_id, course_id, user.id),
            api.course_contents(instance_id, course_id),
        );

        let (completion, grades, activities, contents) =
            match (completion, grades, activities, contents) {
                (Ok(c), Ok(g), Ok(a), Ok(t)) => (c, g, a, t),
                (c, g, a, t) => {
                    let failure = preferred_failure([c.err(), g.err(), a.err(), t.err()]);
                    return Err(failure.unwrap_or_else(|| {
                        ApiError::Decode("user detail failed without an error".to_string())
                    }));
                }
            };

        Ok(Self {
            user,
            completion,
            grades: GradeBreakdown::partition(grades),
            activities: enrich_activities(activities, &contents),
        })
    }

    pub fn completed_activities(&self) -> usize {
        self.activities
            .iter()
            .filter(|a| a.activity.is_complete())
            .count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserDetailModal {
    pub tab: DetailTab,
    pub state: LoadState<UserDetail>,
}

impl UserDetailModal {
    pub async fn open(
        api: &dyn CourseApi,
        instance_id: i64,
        course_id: i64,
        user: MoodleUser,
    ) -> Self {
        Self {
            tab: DetailTab::default(),
            state: LoadState::from_result(
                UserDetail::fetch(api, instance_id, course_id, user).await,
                USER_DETAIL_FAILED,
            ),
        }
    }

    pub fn select(&mut self, tab: DetailTab) {
        self.tab = tab;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CourseModule;

    fn activity(cmid: i64, modname: &str) -> ActivityCompletion {
        ActivityCompletion {
            cmid,
            modname: modname.into(),
            state: 0,
            timecompleted: 0,
            details: Vec::new(),
        }
    }

    fn contents() -> Vec<CourseSection> {
        vec![CourseSection {
            id: 10,
            name: "Week 1".into(),
            modules: vec![CourseModule {
                id: 5,
                name: "Week 1 Quiz".into(),
                modname: "quiz".into(),
            }],
        }]
    }

    #[test]
    fn activity_takes_module_name() {
        let enriched = enrich_activities(vec![activity(5, "quiz")], &contents());
        assert_eq!(enriched[0].name, "Week 1 Quiz");
    }

    #[test]
    fn unknown_module_falls_back_to_type() {
        let enriched = enrich_activities(vec![activity(6, "quiz")], &contents());
        assert_eq!(enriched[0].name, "quiz");
    }

    #[test]
    fn grades_split_into_total_and_items() {
        let grades: Vec<GradeItem> = serde_json::from_value(serde_json::json!([
            {"itemtype": "course", "graderaw": 78.0},
            {"itemtype": "mod", "itemname": "Quiz 1", "graderaw": 9.0}
        ]))
        .unwrap();

        let breakdown = GradeBreakdown::partition(grades);
        assert_eq!(breakdown.course.as_ref().and_then(|g| g.graderaw), Some(78.0));
        assert_eq!(breakdown.items.len(), 1);
        assert_eq!(breakdown.items[0].itemname.as_deref(), Some("Quiz 1"));
    }

    #[test]
    fn grade_bands() {
        let grade = |raw: Option<f64>| GradeItem {
            itemtype: "mod".into(),
            itemname: None,
            itemmodule: None,
            graderaw: raw,
            grademin: Some(0.0),
            grademax: Some(10.0),
            feedback: None,
            status: None,
        };
        assert_eq!(GradeBand::of(&grade(Some(6.0))), GradeBand::Pass);
        assert_eq!(GradeBand::of(&grade(Some(4.0))), GradeBand::Borderline);
        assert_eq!(GradeBand::of(&grade(Some(3.9))), GradeBand::Fail);
        assert_eq!(GradeBand::of(&grade(None)), GradeBand::Ungraded);
    }

    #[test]
    fn labels_known_module_types() {
        assert_eq!(module_type_label("assign"), "Assignment");
        assert_eq!(module_type_label("h5pactivity"), "h5pactivity");
    }

    #[test]
    fn rejected_token_wins_over_other_failures() {
        let server = || ApiError::Request {
            status: 500,
            detail: None,
        };
        let chosen = preferred_failure([
            None,
            Some(server()),
            None,
            Some(ApiError::Auth { message: None }),
        ]);
        assert!(chosen.unwrap().is_auth());

        let chosen = preferred_failure([Some(server()), Some(ApiError::NotFound { detail: None })]);
        assert!(matches!(chosen, Some(ApiError::Request { status: 500, .. })));
        assert!(preferred_failure([None, None]).is_none());
    }
}
