use std::fmt;

use thiserror::Error;

/// Lifecycle of a modal form. Only one submission can be in flight.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FormPhase {
    #[default]
    Idle,
    Editing,
    Submitting,
    Failed(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("cannot {action} while {phase}")]
pub struct TransitionError {
    pub action: &'static str,
    pub phase: String,
}

impl fmt::Display for FormPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormPhase::Idle => f.write_str("idle"),
            FormPhase::Editing => f.write_str("editing"),
            FormPhase::Submitting => f.write_str("submitting"),
            FormPhase::Failed(_) => f.write_str("failed"),
        }
    }
}

impl FormPhase {
    /// Opening the form or touching a field. A previous error stays visible
    /// until the next submission.
    pub fn edit(&mut self) -> Result<(), TransitionError> {
        if self.is_submitting() {
            return Err(self.reject("edit"));
        }
        if !matches!(self, FormPhase::Failed(_)) {
            *self = FormPhase::Editing;
        }
        Ok(())
    }

    pub fn submit(&mut self) -> Result<(), TransitionError> {
        if !matches!(self, FormPhase::Editing | FormPhase::Failed(_)) {
            return Err(self.reject("submit"));
        }
        *self = FormPhase::Submitting;
        Ok(())
    }

    /// Success closes the form.
    pub fn succeed(&mut self) {
        *self = FormPhase::Idle;
    }

    /// Failure keeps the form open with a banner.
    pub fn fail(&mut self, message: impl Into<String>) {
        *self = FormPhase::Failed(message.into());
    }

    /// Back to editing after a non-closing action (e.g. a connection test).
    pub fn settle(&mut self) {
        *self = FormPhase::Editing;
    }

    pub fn close(&mut self) {
        *self = FormPhase::Idle;
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self, FormPhase::Submitting)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            FormPhase::Failed(msg) => Some(msg.as_str()),
            _ => None,
        }
    }

    fn reject(&self, action: &'static str) -> TransitionError {
        TransitionError {
            action,
            phase: self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path() {
        let mut phase = FormPhase::default();
        phase.edit().unwrap();
        phase.submit().unwrap();
        assert!(phase.is_submitting());
        phase.succeed();
        assert_eq!(phase, FormPhase::Idle);
    }

    #[test]
    fn no_double_submit() {
        let mut phase = FormPhase::Editing;
        phase.submit().unwrap();
        let err = phase.submit().unwrap_err();
        assert_eq!(err.to_string(), "cannot submit while submitting");
    }

    #[test]
    fn cannot_submit_a_closed_form() {
        let mut phase = FormPhase::Idle;
        assert!(phase.submit().is_err());
    }

    #[test]
    fn retry_after_failure() {
        let mut phase = FormPhase::Editing;
        phase.submit().unwrap();
        phase.fail("Slug already exists");
        assert_eq!(phase.error(), Some("Slug already exists"));
        phase.edit().unwrap();
        assert_eq!(phase.error(), Some("Slug already exists"));
        phase.submit().unwrap();
        assert!(phase.error().is_none());
    }
}
