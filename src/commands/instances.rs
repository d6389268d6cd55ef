use moodle_console::api::InstanceApi;
use moodle_console::console::{
    ConnectionTest, CreateInstanceForm, EditInstanceForm, InstanceDetailPage, InstancesPage,
    LoadState,
};
use moodle_console::guard::Route;
use moodle_console::models::MoodleInstance;

use super::{CommandError, Console, or_dash};
use crate::{InstanceCommand, InstanceFields, InstanceUpdateFields};

pub async fn run(console: &Console, command: InstanceCommand) -> Result<(), CommandError> {
    match command {
        InstanceCommand::List { all } => list(console, all).await,
        InstanceCommand::Show { id } => show(console, id).await,
        InstanceCommand::Create { fields, test } => create(console, fields, test).await,
        InstanceCommand::Update { id, fields } => update(console, id, fields).await,
        InstanceCommand::Delete { id, yes } => delete(console, id, yes).await,
        InstanceCommand::Test { id } => test(console, id).await,
    }
}

fn print_row(instance: &MoodleInstance) {
    println!(
        "{:>4}  {:<20} {:<16} {:<40} {}",
        instance.id,
        instance.name,
        instance.slug,
        instance.moodle_url,
        if instance.is_active { "active" } else { "inactive" }
    );
}

fn print_test(result: &ConnectionTest) {
    match result {
        ConnectionTest::NotRun => {}
        ConnectionTest::Passed(response) => {
            println!("Connection OK: {}", response.message);
            println!("  site:    {}", or_dash(response.site_name.as_deref()));
            println!("  version: {}", or_dash(response.moodle_version.as_deref()));
            if let Some(count) = response.courses_count {
                println!("  courses: {}", count);
            }
        }
        ConnectionTest::Failed(reason) => println!("Connection failed: {}", reason),
    }
}

async fn list(console: &Console, all: bool) -> Result<(), CommandError> {
    console.enter(Route::Instances)?;
    let state = if all {
        LoadState::from_result(
            console.instances.list_instances(false).await,
            moodle_console::console::pages::INSTANCES_FAILED,
        )
    } else {
        InstancesPage::load(&console.instances).await.instances
    };

    match state {
        LoadState::Ready(instances) if instances.is_empty() => println!("No instances"),
        LoadState::Ready(instances) => instances.iter().for_each(print_row),
        LoadState::Failed(msg) => return Err(CommandError::Failed(msg)),
        LoadState::Loading => {}
    }
    Ok(())
}

async fn show(console: &Console, id: i64) -> Result<(), CommandError> {
    console.enter(Route::InstanceDetail { instance_id: id })?;
    let page = InstanceDetailPage::load(&console.instances, &console.courses, id).await;
    let overview = match page.state {
        LoadState::Ready(overview) => overview,
        LoadState::Failed(msg) => return Err(CommandError::Failed(msg)),
        LoadState::Loading => return Ok(()),
    };

    let instance = &overview.instance;
    println!("{} ({})", instance.name, instance.slug);
    println!("  url:       {}", instance.moodle_url);
    println!("  token:     {}", instance.masked_token);
    println!("  contact:   {}", or_dash(instance.contact_email.as_deref()));
    println!("  notes:     {}", or_dash(instance.notes.as_deref()));
    println!("  active:    {}", instance.is_active);
    println!("  last sync: {}", or_dash(instance.last_sync_at.as_deref()));
    println!("  courses:   {}", overview.courses.len());
    Ok(())
}

async fn create(console: &Console, fields: InstanceFields, test: bool) -> Result<(), CommandError> {
    console.enter(Route::Instances)?;
    let mut form = CreateInstanceForm::open(console.session.clone());
    form.draft.name = fields.name;
    form.draft.set_slug(&fields.slug);
    form.draft.moodle_url = fields.url;
    form.set_token(&fields.token);
    form.draft.contact_email = fields.contact_email.unwrap_or_default();
    form.draft.notes = fields.notes.unwrap_or_default();
    form.draft.is_active = !fields.inactive;

    if test {
        let result = form.test_connection(&console.instances).await?.clone();
        if let Some(trial) = form.trial_instance() {
            println!("Saved inactive instance {} for the test", trial.id);
        }
        print_test(&result);
        return match form.phase().error() {
            Some(msg) => Err(CommandError::Failed(msg.to_string())),
            None => Ok(()),
        };
    }

    match form.submit(&console.instances).await? {
        Some(instance) => {
            println!("Created instance {}", instance.id);
            print_row(&instance);
            Ok(())
        }
        None => Err(CommandError::Failed(
            form.phase().error().unwrap_or_default().to_string(),
        )),
    }
}

fn apply(form: &mut EditInstanceForm, fields: InstanceUpdateFields) {
    if let Some(name) = fields.name {
        form.draft.name = name;
    }
    if let Some(slug) = fields.slug {
        form.draft.set_slug(&slug);
    }
    if let Some(url) = fields.url {
        form.draft.moodle_url = url;
    }
    if let Some(token) = fields.token {
        form.set_token(&token);
    }
    if let Some(email) = fields.contact_email {
        form.draft.contact_email = email;
    }
    if let Some(notes) = fields.notes {
        form.draft.notes = notes;
    }
    if let Some(active) = fields.active {
        form.draft.is_active = active;
    }
}

async fn edit_form(console: &Console, id: i64) -> Result<EditInstanceForm, CommandError> {
    let instance = console.instances.get_instance(id).await?;
    Ok(EditInstanceForm::open(console.session.clone(), instance))
}

async fn update(
    console: &Console,
    id: i64,
    fields: InstanceUpdateFields,
) -> Result<(), CommandError> {
    console.enter(Route::InstanceDetail { instance_id: id })?;
    let mut form = edit_form(console, id).await?;
    apply(&mut form, fields);

    match form.submit(&console.instances).await? {
        Some(instance) => {
            println!("Updated instance {}", instance.id);
            print_row(&instance);
            Ok(())
        }
        None => Err(CommandError::Failed(
            form.phase().error().unwrap_or_default().to_string(),
        )),
    }
}

async fn delete(console: &Console, id: i64, yes: bool) -> Result<(), CommandError> {
    console.enter(Route::InstanceDetail { instance_id: id })?;
    let mut form = edit_form(console, id).await?;
    if !yes {
        println!("{}", form.confirmation_prompt());
        println!("Re-run with --yes to confirm.");
        return Ok(());
    }
    if form.delete(&console.instances, true).await? {
        println!("Deleted instance {}", id);
        Ok(())
    } else {
        Err(CommandError::Failed(
            form.phase().error().unwrap_or_default().to_string(),
        ))
    }
}

async fn test(console: &Console, id: i64) -> Result<(), CommandError> {
    console.enter(Route::InstanceDetail { instance_id: id })?;
    let mut form = edit_form(console, id).await?;
    let result = form.test_connection(&console.instances).await?.clone();
    print_test(&result);
    match form.phase().error() {
        Some(msg) => Err(CommandError::Failed(msg.to_string())),
        None => Ok(()),
    }
}
