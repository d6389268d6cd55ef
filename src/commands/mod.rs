pub mod auth;
pub mod courses;
pub mod instances;
pub mod report;

use std::path::PathBuf;
use std::sync::Arc;

use moodle_console::api::{AuthService, CourseService, InstanceService, ReportService};
use moodle_console::client::ApiClient;
use moodle_console::config::ConsoleConfig;
use moodle_console::console::TransitionError;
use moodle_console::error::ApiError;
use moodle_console::guard::{ChannelNavigator, GuardDecision, Route, RouteGuard};
use moodle_console::session::{SessionContext, SqliteSessionStore};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Not signed in, run `moodle-console login` first")]
    NotSignedIn,

    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// Everything a command needs, wired once per invocation.
pub struct Console {
    pub session: SessionContext,
    pub guard: RouteGuard,
    pub auth: AuthService,
    pub instances: InstanceService,
    pub courses: CourseService,
    pub reports: ReportService,
    pub export_dir: PathBuf,
}

impl Console {
    pub async fn connect(
        config: &ConsoleConfig,
    ) -> Result<(Self, UnboundedReceiver<Route>), ApiError> {
        let store = SqliteSessionStore::connect(&config.session_db_url).await?;
        let session = SessionContext::new(Arc::new(store));
        session.restore().await?;

        let (navigator, redirects) = ChannelNavigator::new();
        let client = ApiClient::new(config, session.clone(), Arc::new(navigator))?;

        let console = Self {
            guard: RouteGuard::new(session.clone()),
            auth: AuthService::new(client.clone()),
            instances: InstanceService::new(client.clone()),
            courses: CourseService::new(client.clone()),
            reports: ReportService::new(client),
            export_dir: config.export_dir.clone(),
            session,
        };
        Ok((console, redirects))
    }

    /// Refuses protected commands when no session is stored.
    pub fn enter(&self, route: Route) -> Result<(), CommandError> {
        match self.guard.check(route) {
            GuardDecision::Render(_) => Ok(()),
            GuardDecision::Redirect(_) => Err(CommandError::NotSignedIn),
        }
    }
}

fn or_dash(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => "-",
    }
}
