use moodle_console::api::CourseApi;
use moodle_console::console::user_detail::module_type_label;
use moodle_console::console::{
    CourseDetailPage, DetailTab, GradeBand, InstanceDetailPage, LoadState, UserDetailModal,
};
use moodle_console::guard::Route;
use moodle_console::models::{GradeItem, GradeStatus, InstanceStatus, MoodleUser};

use super::{CommandError, Console, or_dash};

fn status_label(status: InstanceStatus) -> &'static str {
    match status {
        InstanceStatus::Online => "online",
        InstanceStatus::Offline => "offline",
        InstanceStatus::Error => "error",
    }
}

pub async fn dashboard(console: &Console) -> Result<(), CommandError> {
    console.enter(Route::Instances)?;
    let stats = console.courses.dashboard_stats().await?;
    let summary = &stats.summary;
    println!(
        "instances: {} ({} active)  courses: {}  users: {}",
        summary.total_instances, summary.active_instances, summary.total_courses, summary.total_users
    );
    for instance in &stats.instances {
        println!(
            "{:>4}  {:<20} {:<8} courses={} users={} last_sync={}",
            instance.id,
            instance.name,
            status_label(instance.status),
            instance.courses_count,
            instance.users_count,
            or_dash(instance.last_sync.as_deref())
        );
    }
    Ok(())
}

pub async fn courses(console: &Console, instance_id: i64) -> Result<(), CommandError> {
    console.enter(Route::InstanceDetail { instance_id })?;
    let page = InstanceDetailPage::load(&console.instances, &console.courses, instance_id).await;
    let overview = match page.state {
        LoadState::Ready(overview) => overview,
        LoadState::Failed(msg) => return Err(CommandError::Failed(msg)),
        LoadState::Loading => return Ok(()),
    };

    if overview.courses.is_empty() {
        println!("No courses");
    }
    for course in &overview.courses {
        let start = course
            .starts_at()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>5}  {:<16} {:<40} start={} {}",
            course.id,
            course.shortname,
            course.fullname,
            start,
            if course.is_visible() { "" } else { "(hidden)" }
        );
    }
    Ok(())
}

async fn course_page(
    console: &Console,
    instance_id: i64,
    course_id: i64,
) -> Result<CourseDetailPage, CommandError> {
    console.enter(Route::CourseDetail {
        instance_id,
        course_id,
    })?;
    let page = CourseDetailPage::load(&console.courses, instance_id, course_id).await;
    if let LoadState::Failed(msg) = &page.state {
        return Err(CommandError::Failed(msg.clone()));
    }
    Ok(page)
}

pub async fn users(console: &Console, instance_id: i64, course_id: i64) -> Result<(), CommandError> {
    let page = course_page(console, instance_id, course_id).await?;
    let Some(overview) = page.state.ready() else {
        return Ok(());
    };

    println!("{} ({})", overview.course.fullname, overview.course.shortname);
    for user in &overview.users {
        println!(
            "{:>6}  {:<3} {:<30} {:<20} {}",
            user.id,
            user.initials(),
            user.full_name(),
            user.username,
            user.email
        );
    }
    Ok(())
}

fn find_user(users: &[MoodleUser], user_id: i64) -> Result<MoodleUser, CommandError> {
    users
        .iter()
        .find(|u| u.id == user_id)
        .cloned()
        .ok_or_else(|| CommandError::Failed("User not found".to_string()))
}

fn grade_line(grade: &GradeItem) -> String {
    let name = grade.itemname.as_deref().unwrap_or("Course total");
    match grade.status() {
        GradeStatus::Graded => {
            let band = match GradeBand::of(grade) {
                GradeBand::Pass => "pass",
                GradeBand::Borderline => "borderline",
                GradeBand::Fail => "fail",
                GradeBand::Ungraded => "ungraded",
            };
            format!(
                "{:<40} {:>6.1} / {:<6.1} ({:.0}%, {})",
                name,
                grade.graderaw.unwrap_or_default(),
                grade.grademax.unwrap_or_default(),
                grade.percentage().unwrap_or_default(),
                band
            )
        }
        GradeStatus::NoValue => format!("{:<40} no grade", name),
        GradeStatus::Pending => format!("{:<40} pending", name),
    }
}

pub async fn user(
    console: &Console,
    instance_id: i64,
    course_id: i64,
    user_id: i64,
    tab: DetailTab,
) -> Result<(), CommandError> {
    let page = course_page(console, instance_id, course_id).await?;
    let Some(overview) = page.state.ready() else {
        return Ok(());
    };
    let user = find_user(&overview.users, user_id)?;

    let mut modal = UserDetailModal::open(&console.courses, instance_id, course_id, user).await;
    modal.select(tab);
    let detail = match modal.state {
        LoadState::Ready(detail) => detail,
        LoadState::Failed(msg) => return Err(CommandError::Failed(msg)),
        LoadState::Loading => return Ok(()),
    };

    println!("{} <{}>", detail.user.full_name(), detail.user.email);
    match modal.tab {
        DetailTab::Profile => {
            println!("  username:       {}", detail.user.username);
            println!("  codice fiscale: {}", detail.user.custom_field("codice_fiscale"));
            println!("  profession:     {}", detail.user.custom_field("profession"));
            println!("  phone:          {}", detail.user.custom_field("telefono"));
        }
        DetailTab::Completion => {
            let done = match detail.completion.completed_at() {
                Some(at) if detail.completion.completed => format!("completed {}", at.format("%Y-%m-%d")),
                _ if detail.completion.completed => "completed".to_string(),
                _ => "in progress".to_string(),
            };
            println!(
                "  course {} ({}/{} activities)",
                done,
                detail.completed_activities(),
                detail.activities.len()
            );
            for entry in &detail.activities {
                println!(
                    "  [{}] {:<40} {}",
                    if entry.activity.is_complete() { "x" } else { " " },
                    entry.name,
                    module_type_label(&entry.activity.modname)
                );
                for rule in &entry.activity.details {
                    println!(
                        "        {} {}",
                        if rule.is_met() { "+" } else { "-" },
                        rule.rulevalue.description
                    );
                }
            }
        }
        DetailTab::Grades => {
            match &detail.grades.course {
                Some(total) => println!("  {}", grade_line(total)),
                None => println!("  no course grade"),
            }
            for item in &detail.grades.items {
                println!("  {}", grade_line(item));
            }
        }
    }
    Ok(())
}
