use std::path::Path;

use moodle_console::api::ReportApi;
use moodle_console::console::report::load_report_rows;
use moodle_console::console::{
    CourseDetailPage, LoadState, MappingView, ReportConfigForm, export_csv,
};
use moodle_console::guard::Route;
use moodle_console::models::CourseReport;

use super::{CommandError, Console, or_dash};
use crate::ReportCommand;

pub async fn run(console: &Console, command: ReportCommand) -> Result<(), CommandError> {
    match command {
        ReportCommand::Mappings { instance_id } => mappings(console, instance_id).await,
        ReportCommand::Show {
            instance_id,
            course_id,
        } => show(console, instance_id, course_id).await,
        ReportCommand::Set {
            instance_id,
            course_id,
            report_id,
            notes,
        } => set(console, instance_id, course_id, report_id, notes).await,
        ReportCommand::Remove {
            instance_id,
            course_id,
        } => remove(console, instance_id, course_id).await,
        ReportCommand::Export {
            instance_id,
            course_id,
            dir,
        } => {
            let dir = dir.unwrap_or_else(|| console.export_dir.clone());
            export(console, instance_id, course_id, &dir).await
        }
    }
}

fn print_mapping(mapping: &CourseReport) {
    println!(
        "course {:>5}  report {:>5}  {}",
        mapping.course_id,
        mapping.report_id,
        or_dash(mapping.notes.as_deref())
    );
}

async fn mapping_view(
    console: &Console,
    instance_id: i64,
    course_id: i64,
) -> Result<MappingView, CommandError> {
    console.enter(Route::CourseDetail {
        instance_id,
        course_id,
    })?;
    match MappingView::load(&console.reports, instance_id, course_id).await {
        MappingView::Failed(msg) => Err(CommandError::Failed(msg)),
        view => Ok(view),
    }
}

async fn mappings(console: &Console, instance_id: i64) -> Result<(), CommandError> {
    console.enter(Route::InstanceDetail { instance_id })?;
    let mappings = console.reports.list_mappings(instance_id).await?;
    if mappings.is_empty() {
        println!("No report mappings");
    }
    mappings.iter().for_each(print_mapping);
    Ok(())
}

async fn show(console: &Console, instance_id: i64, course_id: i64) -> Result<(), CommandError> {
    match mapping_view(console, instance_id, course_id).await? {
        MappingView::Configured(mapping) => print_mapping(&mapping),
        _ => println!("No report configured for this course"),
    }
    Ok(())
}

async fn set(
    console: &Console,
    instance_id: i64,
    course_id: i64,
    report_id: i64,
    notes: Option<String>,
) -> Result<(), CommandError> {
    let view = mapping_view(console, instance_id, course_id).await?;
    let mut form = ReportConfigForm::open(instance_id, course_id, &view);
    let created = form.is_new();
    form.report_id = Some(report_id);
    if let Some(notes) = notes {
        form.notes = notes;
    }

    match form.save(&console.reports).await? {
        Some(mapping) => {
            println!("{} report mapping", if created { "Created" } else { "Updated" });
            print_mapping(&mapping);
            Ok(())
        }
        None => Err(CommandError::Failed(
            form.phase().error().unwrap_or_default().to_string(),
        )),
    }
}

async fn remove(console: &Console, instance_id: i64, course_id: i64) -> Result<(), CommandError> {
    let view = mapping_view(console, instance_id, course_id).await?;
    let mut form = ReportConfigForm::open(instance_id, course_id, &view);
    if form.is_new() {
        println!("No report configured for this course");
        return Ok(());
    }
    if form.remove(&console.reports).await? {
        println!("Removed report mapping");
        Ok(())
    } else {
        Err(CommandError::Failed(
            form.phase().error().unwrap_or_default().to_string(),
        ))
    }
}

async fn export(
    console: &Console,
    instance_id: i64,
    course_id: i64,
    dir: &Path,
) -> Result<(), CommandError> {
    let view = mapping_view(console, instance_id, course_id).await?;
    if view.mapping().is_none() {
        return Err(CommandError::Failed(
            "No report configured for this course".to_string(),
        ));
    }

    let page = CourseDetailPage::load(&console.courses, instance_id, course_id).await;
    let course = match page.state {
        LoadState::Ready(overview) => overview.course,
        LoadState::Failed(msg) => return Err(CommandError::Failed(msg)),
        LoadState::Loading => return Ok(()),
    };

    let rows = match load_report_rows(&console.courses, instance_id, course_id).await {
        LoadState::Ready(rows) => rows,
        LoadState::Failed(msg) => return Err(CommandError::Failed(msg)),
        LoadState::Loading => return Ok(()),
    };

    match export_csv(&rows, &course.shortname, dir)? {
        Some(path) => println!("Wrote {} rows to {}", rows.len(), path.display()),
        None => println!("Report is empty, nothing exported"),
    }
    Ok(())
}
