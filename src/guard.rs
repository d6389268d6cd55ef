//! Route gating. The guard only checks that a token is present; it never
//! asks the server. A stale token is caught by the first protected call,
//! which goes through the client's forced-logout path. This is a usability
//! gate, not an authorization boundary: the backend enforces access.

use std::fmt;

use tokio::sync::mpsc;
use tracing::debug;

use crate::session::SessionContext;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Instances,
    InstanceDetail { instance_id: i64 },
    CourseDetail { instance_id: i64, course_id: i64 },
}

impl Route {
    /// Unknown paths fall through to the instance list.
    pub fn parse(path: &str) -> Route {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            ["login"] => Route::Login,
            ["instances", id] => match id.parse() {
                Ok(instance_id) => Route::InstanceDetail { instance_id },
                Err(_) => Route::Instances,
            },
            ["instances", id, "courses", course] => match (id.parse(), course.parse()) {
                (Ok(instance_id), Ok(course_id)) => Route::CourseDetail {
                    instance_id,
                    course_id,
                },
                _ => Route::Instances,
            },
            _ => Route::Instances,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Instances => "/".to_string(),
            Route::InstanceDetail { instance_id } => format!("/instances/{}", instance_id),
            Route::CourseDetail {
                instance_id,
                course_id,
            } => format!("/instances/{}/courses/{}", instance_id, course_id),
        }
    }

    pub fn is_protected(&self) -> bool {
        !matches!(self, Route::Login)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Render(Route),
    Redirect(Route),
}

#[derive(Debug, Clone)]
pub struct RouteGuard {
    session: SessionContext,
}

impl RouteGuard {
    pub fn new(session: SessionContext) -> Self {
        Self { session }
    }

    pub fn check(&self, route: Route) -> GuardDecision {
        if route.is_protected() && !self.session.is_authenticated() {
            debug!(route = %route, "no session, redirecting to login");
            return GuardDecision::Redirect(Route::Login);
        }
        GuardDecision::Render(route)
    }
}

/// Receives forced navigations, e.g. the jump to login after a rejected token.
pub trait Navigator: Send + Sync {
    fn redirect(&self, to: Route);
}

/// Forwards redirects to whoever owns the receiving end.
#[derive(Debug, Clone)]
pub struct ChannelNavigator {
    tx: mpsc::UnboundedSender<Route>,
}

impl ChannelNavigator {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Route>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Navigator for ChannelNavigator {
    fn redirect(&self, to: Route) {
        // receiver gone means nobody is listening anymore
        let _ = self.tx.send(to);
    }
}
