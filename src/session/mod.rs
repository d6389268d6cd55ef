//! Client-side session: the bearer token, the cached operator profile and
//! any instance secrets revealed while editing.
//!
//! `SessionContext` is the only owner of this state. Every transition back
//! to anonymous goes through [`SessionContext::end`], which wipes all of it.

pub mod store;

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::models::UserProfile;

pub use store::{MemorySessionStore, SessionStore, SqliteSessionStore, StoredSession};

#[derive(Clone, PartialEq)]
pub struct Session {
    token: String,
    profile: Option<UserProfile>,
}

impl Session {
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("profile", &self.profile)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum SessionState {
    #[default]
    Anonymous,
    Authenticated(Session),
}

/// Where a typed-in instance access token is held until the session ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecretSlot {
    NewInstance,
    Instance(i64),
}

#[derive(Default)]
struct Inner {
    state: SessionState,
    revealed_secrets: HashMap<SecretSlot, String>,
}

#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<RwLock<Inner>>,
    store: Arc<dyn SessionStore>,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("state", &self.state())
            .finish()
    }
}

impl SessionContext {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            store,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySessionStore::default()))
    }

    /// Reloads whatever a previous run persisted.
    pub async fn restore(&self) -> Result<(), ApiError> {
        let stored = self.store.load().await?;
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.state = match stored {
            Some(stored) => {
                debug!("restored persisted session");
                SessionState::Authenticated(Session {
                    token: stored.token,
                    profile: stored.profile,
                })
            }
            None => SessionState::Anonymous,
        };
        Ok(())
    }

    pub fn state(&self) -> SessionState {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .state
            .clone()
    }

    pub fn token(&self) -> Option<String> {
        match &self.inner.read().unwrap_or_else(PoisonError::into_inner).state {
            SessionState::Authenticated(session) => Some(session.token.clone()),
            SessionState::Anonymous => None,
        }
    }

    pub fn profile(&self) -> Option<UserProfile> {
        match &self.inner.read().unwrap_or_else(PoisonError::into_inner).state {
            SessionState::Authenticated(session) => session.profile.clone(),
            SessionState::Anonymous => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Starts a session with a freshly issued token, replacing any previous
    /// one so that only a single session exists at a time.
    pub async fn begin(&self, token: String) -> Result<(), ApiError> {
        {
            let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
            inner.revealed_secrets.clear();
            inner.state = SessionState::Authenticated(Session {
                token: token.clone(),
                profile: None,
            });
        }
        self.store
            .save(&StoredSession {
                token,
                profile: None,
            })
            .await
    }

    /// Caches the operator profile. Ignored when no session is active.
    pub async fn set_profile(&self, profile: UserProfile) -> Result<(), ApiError> {
        let stored = {
            let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
            match &mut inner.state {
                SessionState::Authenticated(session) => {
                    session.profile = Some(profile);
                    StoredSession {
                        token: session.token.clone(),
                        profile: session.profile.clone(),
                    }
                }
                SessionState::Anonymous => {
                    warn!("profile received without an active session, dropping it");
                    return Ok(());
                }
            }
        };
        self.store.save(&stored).await
    }

    /// Keeps a typed-in instance access token for the current session.
    /// Ignored while anonymous.
    pub fn remember_secret(&self, slot: SecretSlot, secret: String) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if matches!(inner.state, SessionState::Authenticated(_)) {
            inner.revealed_secrets.insert(slot, secret);
        }
    }

    pub fn revealed_secret(&self, slot: SecretSlot) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .revealed_secrets
            .get(&slot)
            .cloned()
    }

    pub fn forget_secret(&self, slot: SecretSlot) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .revealed_secrets
            .remove(&slot);
    }

    /// Returns to anonymous. Local state is cleared first and unconditionally,
    /// then the persisted copy; a store failure is returned so the caller can
    /// tell the operator the token is still on disk.
    pub async fn end(&self) -> Result<(), ApiError> {
        let was_authenticated = {
            let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
            let was = matches!(inner.state, SessionState::Authenticated(_));
            inner.state = SessionState::Anonymous;
            inner.revealed_secrets.clear();
            was
        };
        if was_authenticated {
            info!("session ended");
        }
        self.store.clear().await
    }
}
