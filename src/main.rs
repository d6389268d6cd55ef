use std::path::PathBuf;

use clap::{Parser, Subcommand};
use moodle_console::config::ConsoleConfig;
use moodle_console::console::DetailTab;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use crate::commands::Console;

#[derive(Parser)]
#[command(name = "moodle-console", about = "Admin console for Moodle instances", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and keep the session for later commands
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "CONSOLE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// End the current session
    Logout,
    /// Show the signed-in operator
    Whoami,
    /// Platform-wide counters and per-instance status
    Dashboard,
    /// Manage registered Moodle instances
    Instances {
        #[command(subcommand)]
        command: InstanceCommand,
    },
    /// List the courses of an instance
    Courses { instance_id: i64 },
    /// List the users enrolled in a course
    Users { instance_id: i64, course_id: i64 },
    /// Profile, completion and grades of one enrolled user
    User {
        instance_id: i64,
        course_id: i64,
        user_id: i64,
        #[arg(long, value_enum, default_value_t = TabArg::Profile)]
        tab: TabArg,
    },
    /// Course report configuration and export
    Report {
        #[command(subcommand)]
        command: ReportCommand,
    },
}

#[derive(Subcommand)]
pub enum InstanceCommand {
    /// Active instances only, unless --all is given
    List {
        #[arg(long)]
        all: bool,
    },
    Show { id: i64 },
    Create {
        #[command(flatten)]
        fields: InstanceFields,
        /// Test the connection instead of saving (leaves an inactive record)
        #[arg(long)]
        test: bool,
    },
    Update {
        id: i64,
        #[command(flatten)]
        fields: InstanceUpdateFields,
    },
    Delete {
        id: i64,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Test the connection of a saved instance
    Test { id: i64 },
}

#[derive(clap::Args, Debug, Clone)]
pub struct InstanceFields {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub slug: String,
    #[arg(long)]
    pub url: String,
    #[arg(long, env = "CONSOLE_MOODLE_TOKEN", hide_env_values = true)]
    pub token: String,
    #[arg(long)]
    pub contact_email: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
    #[arg(long)]
    pub inactive: bool,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct InstanceUpdateFields {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub slug: Option<String>,
    #[arg(long)]
    pub url: Option<String>,
    /// Leave unset to keep the stored token
    #[arg(long)]
    pub token: Option<String>,
    #[arg(long)]
    pub contact_email: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
    #[arg(long)]
    pub active: Option<bool>,
}

#[derive(Subcommand)]
pub enum ReportCommand {
    /// Every report mapping of an instance
    Mappings { instance_id: i64 },
    Show { instance_id: i64, course_id: i64 },
    Set {
        instance_id: i64,
        course_id: i64,
        #[arg(long)]
        report_id: i64,
        #[arg(long)]
        notes: Option<String>,
    },
    Remove { instance_id: i64, course_id: i64 },
    /// Write the report rows to a CSV file
    Export {
        instance_id: i64,
        course_id: i64,
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabArg {
    Profile,
    Completion,
    Grades,
}

impl From<TabArg> for DetailTab {
    fn from(tab: TabArg) -> Self {
        match tab {
            TabArg::Profile => DetailTab::Profile,
            TabArg::Completion => DetailTab::Completion,
            TabArg::Grades => DetailTab::Grades,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "moodle_console=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = ConsoleConfig::new_from_env()?;
    let (console, mut redirects) = Console::connect(&config).await?;

    let result = match cli.command {
        Commands::Login { email, password } => commands::auth::login(&console, &email, &password).await,
        Commands::Logout => commands::auth::logout(&console).await,
        Commands::Whoami => commands::auth::whoami(&console).await,
        Commands::Dashboard => commands::courses::dashboard(&console).await,
        Commands::Instances { command } => commands::instances::run(&console, command).await,
        Commands::Courses { instance_id } => commands::courses::courses(&console, instance_id).await,
        Commands::Users {
            instance_id,
            course_id,
        } => commands::courses::users(&console, instance_id, course_id).await,
        Commands::User {
            instance_id,
            course_id,
            user_id,
            tab,
        } => commands::courses::user(&console, instance_id, course_id, user_id, tab.into()).await,
        Commands::Report { command } => commands::report::run(&console, command).await,
    };

    // a rejected token already cleared the stored session
    if let Ok(route) = redirects.try_recv() {
        info!(to = %route, "redirected");
        eprintln!("Session expired, run `moodle-console login` again.");
    }

    result.map_err(Into::into)
}
