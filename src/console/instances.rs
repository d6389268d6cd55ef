//! Create / edit instance modals.

use tracing::{info, warn};

use crate::api::InstanceApi;
use crate::console::form::{FormPhase, TransitionError};
use crate::session::{SecretSlot, SessionContext};
use crate::models::{
    MoodleInstance, NewInstanceRequest, TestConnectionResponse, UpdateInstanceRequest,
};

pub const CREATE_FAILED: &str = "Failed to create the instance";
pub const UPDATE_FAILED: &str = "Failed to update the instance";
pub const DELETE_FAILED: &str = "Failed to delete the instance";
pub const TEST_FAILED: &str = "Connection test failed";
pub const TEST_NEEDS_URL_AND_TOKEN: &str = "Moodle URL and token are required to test the connection";

/// Lower-case, only `a-z`, `0-9` and `-`.
pub fn sanitize_slug(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect()
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Plain form fields. The access token is not one of them: it is held by
/// the session (see [`SecretSlot`]) so that logging out wipes it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstanceDraft {
    pub name: String,
    slug: String,
    pub moodle_url: String,
    pub contact_email: String,
    pub notes: String,
    pub is_active: bool,
}

impl InstanceDraft {
    pub fn new() -> Self {
        Self {
            is_active: true,
            ..Self::default()
        }
    }

    pub fn from_instance(instance: &MoodleInstance) -> Self {
        Self {
            name: instance.name.clone(),
            slug: instance.slug.clone(),
            moodle_url: instance.moodle_url.clone(),
            contact_email: instance.contact_email.clone().unwrap_or_default(),
            notes: instance.notes.clone().unwrap_or_default(),
            is_active: instance.is_active,
        }
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn set_slug(&mut self, raw: &str) {
        self.slug = sanitize_slug(raw);
    }

    pub fn can_test(&self, token: &str) -> bool {
        !self.moodle_url.trim().is_empty() && !token.trim().is_empty()
    }

    pub fn to_create(&self, token: &str, is_active: bool) -> NewInstanceRequest {
        NewInstanceRequest {
            name: self.name.trim().to_string(),
            slug: self.slug.clone(),
            moodle_url: self.moodle_url.trim().to_string(),
            moodle_token: token.trim().to_string(),
            contact_email: optional(&self.contact_email),
            notes: optional(&self.notes),
            is_active: Some(is_active),
        }
    }

    /// An empty token means "keep the current one".
    pub fn to_update(&self, token: &str) -> UpdateInstanceRequest {
        UpdateInstanceRequest {
            name: Some(self.name.trim().to_string()),
            slug: Some(self.slug.clone()),
            moodle_url: Some(self.moodle_url.trim().to_string()),
            moodle_token: optional(token),
            contact_email: Some(self.contact_email.trim().to_string()),
            notes: Some(self.notes.trim().to_string()),
            is_active: Some(self.is_active),
        }
    }
}

/// Token field of an instance form, backed by the session.
#[derive(Debug, Clone)]
struct TokenField {
    session: SessionContext,
    slot: SecretSlot,
}

impl TokenField {
    /// The field always opens empty; the stored token is never read back.
    fn open(session: SessionContext, slot: SecretSlot) -> Self {
        session.forget_secret(slot);
        Self { session, slot }
    }

    fn set(&self, token: &str) {
        let token = token.trim();
        if token.is_empty() {
            self.session.forget_secret(self.slot);
        } else {
            self.session.remember_secret(self.slot, token.to_string());
        }
    }

    fn value(&self) -> String {
        self.session.revealed_secret(self.slot).unwrap_or_default()
    }

    fn clear(&self) {
        self.session.forget_secret(self.slot);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum ConnectionTest {
    #[default]
    NotRun,
    Passed(TestConnectionResponse),
    Failed(String),
}

impl ConnectionTest {
    fn from_response(response: TestConnectionResponse) -> Self {
        if response.success {
            ConnectionTest::Passed(response)
        } else {
            let reason = response
                .error
                .clone()
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| response.message.clone());
            ConnectionTest::Failed(reason)
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateInstanceForm {
    pub draft: InstanceDraft,
    token: TokenField,
    phase: FormPhase,
    test: ConnectionTest,
    trial_instance: Option<MoodleInstance>,
}

impl CreateInstanceForm {
    pub fn open(session: SessionContext) -> Self {
        Self {
            draft: InstanceDraft::new(),
            token: TokenField::open(session, SecretSlot::NewInstance),
            phase: FormPhase::Editing,
            test: ConnectionTest::NotRun,
            trial_instance: None,
        }
    }

    pub fn set_token(&mut self, token: &str) {
        self.token.set(token);
    }

    /// What the operator typed, for as long as the session lasts.
    pub fn token(&self) -> String {
        self.token.value()
    }

    pub fn phase(&self) -> &FormPhase {
        &self.phase
    }

    pub fn test_result(&self) -> &ConnectionTest {
        &self.test
    }

    /// The inactive record a connection test had to create, if any.
    pub fn trial_instance(&self) -> Option<&MoodleInstance> {
        self.trial_instance.as_ref()
    }

    pub async fn submit(
        &mut self,
        api: &dyn InstanceApi,
    ) -> Result<Option<MoodleInstance>, TransitionError> {
        self.phase.submit()?;
        let request = self.draft.to_create(&self.token(), self.draft.is_active);
        match api.create_instance(&request).await {
            Ok(instance) => {
                info!(id = instance.id, slug = %instance.slug, "instance created");
                self.token.clear();
                self.phase.succeed();
                Ok(Some(instance))
            }
            Err(e) => {
                warn!("instance creation failed: {}", e);
                self.phase.fail(e.user_message(CREATE_FAILED));
                Ok(None)
            }
        }
    }

    /// An unsaved instance has no id to test against, so it is first created
    /// inactive and then tested. The inactive record stays behind.
    pub async fn test_connection(
        &mut self,
        api: &dyn InstanceApi,
    ) -> Result<&ConnectionTest, TransitionError> {
        if !self.draft.can_test(&self.token()) {
            self.test = ConnectionTest::NotRun;
            self.phase.fail(TEST_NEEDS_URL_AND_TOKEN);
            return Ok(&self.test);
        }

        self.phase.submit()?;
        self.test = ConnectionTest::NotRun;

        let trial = match api.create_instance(&self.draft.to_create(&self.token(), false)).await {
            Ok(instance) => instance,
            Err(e) => {
                warn!("could not create trial instance: {}", e);
                self.phase.fail(e.user_message(TEST_FAILED));
                return Ok(&self.test);
            }
        };
        info!(id = trial.id, "created inactive instance for connection test");
        let trial_id = trial.id;
        self.trial_instance = Some(trial);

        match api.test_connection(trial_id).await {
            Ok(response) => {
                self.test = ConnectionTest::from_response(response);
                self.phase.settle();
            }
            Err(e) => {
                warn!(id = trial_id, "connection test failed: {}", e);
                self.phase.fail(e.user_message(TEST_FAILED));
            }
        }
        Ok(&self.test)
    }
}

#[derive(Debug, Clone)]
pub struct EditInstanceForm {
    pub instance: MoodleInstance,
    pub draft: InstanceDraft,
    token: TokenField,
    phase: FormPhase,
    test: ConnectionTest,
}

impl EditInstanceForm {
    pub fn open(session: SessionContext, instance: MoodleInstance) -> Self {
        let draft = InstanceDraft::from_instance(&instance);
        let token = TokenField::open(session, SecretSlot::Instance(instance.id));
        Self {
            instance,
            draft,
            token,
            phase: FormPhase::Editing,
            test: ConnectionTest::NotRun,
        }
    }

    /// A blank token keeps the stored one.
    pub fn set_token(&mut self, token: &str) {
        self.token.set(token);
    }

    pub fn token(&self) -> String {
        self.token.value()
    }

    pub fn phase(&self) -> &FormPhase {
        &self.phase
    }

    pub fn test_result(&self) -> &ConnectionTest {
        &self.test
    }

    pub fn confirmation_prompt(&self) -> String {
        format!(
            "Delete instance \"{}\"? This action cannot be undone.",
            self.instance.name
        )
    }

    pub async fn submit(
        &mut self,
        api: &dyn InstanceApi,
    ) -> Result<Option<MoodleInstance>, TransitionError> {
        self.phase.submit()?;
        let request = self.draft.to_update(&self.token());
        match api.update_instance(self.instance.id, &request).await {
            Ok(updated) => {
                info!(id = updated.id, "instance updated");
                self.token.clear();
                self.instance = updated.clone();
                self.phase.succeed();
                Ok(Some(updated))
            }
            Err(e) => {
                warn!(id = self.instance.id, "instance update failed: {}", e);
                self.phase.fail(e.user_message(UPDATE_FAILED));
                Ok(None)
            }
        }
    }

    pub async fn test_connection(
        &mut self,
        api: &dyn InstanceApi,
    ) -> Result<&ConnectionTest, TransitionError> {
        self.phase.submit()?;
        self.test = ConnectionTest::NotRun;
        match api.test_connection(self.instance.id).await {
            Ok(response) => {
                self.test = ConnectionTest::from_response(response);
                self.phase.settle();
            }
            Err(e) => {
                warn!(id = self.instance.id, "connection test failed: {}", e);
                self.phase.fail(e.user_message(TEST_FAILED));
            }
        }
        Ok(&self.test)
    }

    /// Returns `true` once the instance is gone. Nothing is sent unless the
    /// operator confirmed.
    pub async fn delete(
        &mut self,
        api: &dyn InstanceApi,
        confirmed: bool,
    ) -> Result<bool, TransitionError> {
        if !confirmed {
            return Ok(false);
        }
        self.phase.submit()?;
        match api.delete_instance(self.instance.id).await {
            Ok(()) => {
                info!(id = self.instance.id, "instance deleted");
                self.phase.succeed();
                Ok(true)
            }
            Err(e) => {
                warn!(id = self.instance.id, "instance deletion failed: {}", e);
                self.phase.fail(e.user_message(DELETE_FAILED));
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_is_sanitized() {
        let mut draft = InstanceDraft::new();
        draft.set_slug("Digital Health_2024!");
        assert_eq!(draft.slug(), "digitalhealth2024");
        draft.set_slug("dh-Roma");
        assert_eq!(draft.slug(), "dh-roma");
    }

    #[test]
    fn empty_token_keeps_stored_one() {
        let draft = InstanceDraft {
            name: "DH".into(),
            slug: "dh".into(),
            moodle_url: "https://moodle.example.org".into(),
            contact_email: String::new(),
            notes: String::new(),
            is_active: true,
        };
        let update = draft.to_update("   ");
        assert!(update.moodle_token.is_none());
        let body = serde_json::to_value(&update).unwrap();
        assert!(body.get("moodle_token").is_none());
    }

    #[test]
    fn failed_trial_reports_backend_reason() {
        let test = ConnectionTest::from_response(TestConnectionResponse {
            success: false,
            message: "Connection failed".into(),
            site_name: None,
            moodle_version: None,
            courses_count: None,
            error: Some("invalidtoken".into()),
        });
        assert_eq!(test, ConnectionTest::Failed("invalidtoken".into()));
    }
}
