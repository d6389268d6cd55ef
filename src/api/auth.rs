use tracing::{info, warn};

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::models::{LoginResponse, UserProfile};
use crate::session::SessionContext;

#[derive(Debug, Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn session(&self) -> &SessionContext {
        self.client.session()
    }

    /// Exchanges credentials for a bearer token. Does not touch the session.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        self.client
            .post_form("/auth/login", &[("username", email), ("password", password)])
            .await
            .map_err(ApiError::into_login_error)
    }

    pub async fn current_user(&self) -> Result<UserProfile, ApiError> {
        if !self.session().is_authenticated() {
            return Err(ApiError::Auth { message: None });
        }
        self.client.get("/auth/me").await
    }

    /// Login, keep the token, fetch and cache the profile. A failure after
    /// the token was issued throws the half-built session away.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<UserProfile, ApiError> {
        let login = self.login(email, password).await?;
        self.session().begin(login.access_token).await?;

        let profile = match self.current_user().await {
            Ok(profile) => profile,
            Err(e) => {
                warn!("profile fetch after login failed: {}", e);
                if let Err(clear) = self.session().end().await {
                    warn!("failed to clear persisted session: {}", clear);
                }
                return Err(e);
            }
        };
        self.session().set_profile(profile.clone()).await?;

        info!("signed in as {}", profile.email);
        Ok(profile)
    }

    /// Best-effort server invalidation; local state is always cleared. The
    /// only error returned is a failure to wipe the persisted session.
    pub async fn logout(&self) -> Result<(), ApiError> {
        if self.session().is_authenticated() {
            if let Err(e) = self.client.post_discard("/auth/logout").await {
                warn!("server logout failed, clearing local session anyway: {}", e);
            }
        }
        self.session().end().await
    }
}
