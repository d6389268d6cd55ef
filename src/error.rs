use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

pub const NETWORK_MESSAGE: &str = "Could not connect to the server";
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid credentials";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication rejected")]
    Auth { message: Option<String> },

    #[error("Not found")]
    NotFound { detail: Option<String> },

    #[error("Validation error: {}", .messages.join(", "))]
    Validation { messages: Vec<String> },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request failed with status {status}")]
    Request { status: u16, detail: Option<String> },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Session storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Error body returned by the backend. `detail` is either a plain message,
/// a list of per-field validation errors, or something else entirely.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<ErrorDetail>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    Message(String),
    Fields(Vec<FieldError>),
    Other(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldError {
    pub msg: String,
    #[serde(default)]
    pub loc: Vec<serde_json::Value>,
}

impl ErrorDetail {
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.detail)
    }

    pub fn message(&self) -> Option<String> {
        match self {
            ErrorDetail::Message(msg) => Some(msg.clone()),
            _ => None,
        }
    }
}

impl ApiError {
    /// Maps a non-success status plus its parsed body to the taxonomy.
    /// 401 is not handled here; the client intercepts it first.
    pub fn from_status(status: StatusCode, detail: Option<ErrorDetail>) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => ApiError::Auth {
                message: detail.and_then(|d| d.message()),
            },
            StatusCode::NOT_FOUND => ApiError::NotFound {
                detail: detail.and_then(|d| d.message()),
            },
            StatusCode::UNPROCESSABLE_ENTITY => match detail {
                Some(ErrorDetail::Fields(fields)) => ApiError::Validation {
                    messages: fields.into_iter().map(|f| f.msg).collect(),
                },
                Some(ErrorDetail::Message(msg)) => ApiError::Validation {
                    messages: vec![msg],
                },
                _ => ApiError::Validation { messages: Vec::new() },
            },
            _ => ApiError::Request {
                status: status.as_u16(),
                detail: detail.and_then(|d| d.message()),
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Auth { .. })
    }

    /// Server-provided human readable detail, if any.
    pub fn detail(&self) -> Option<String> {
        match self {
            ApiError::Auth { message } => message.clone(),
            ApiError::NotFound { detail } | ApiError::Request { detail, .. } => detail.clone(),
            ApiError::Validation { messages } if !messages.is_empty() => {
                Some(format!("Validation error: {}", messages.join(", ")))
            }
            _ => None,
        }
    }

    /// Banner text for a failed page action.
    pub fn user_message(&self, fallback: &str) -> String {
        if let ApiError::Network(_) = self {
            return NETWORK_MESSAGE.to_string();
        }
        self.detail().unwrap_or_else(|| fallback.to_string())
    }

    /// Folds credential rejections into `Auth` so the login form can show
    /// the server's reason.
    pub fn into_login_error(self) -> Self {
        match self {
            ApiError::Validation { messages } if !messages.is_empty() => ApiError::Auth {
                message: Some(format!("Validation error: {}", messages.join(", "))),
            },
            ApiError::Validation { .. } => ApiError::Auth {
                message: Some(INVALID_CREDENTIALS_MESSAGE.to_string()),
            },
            ApiError::Request {
                status: 400 | 403,
                detail,
            } => ApiError::Auth {
                message: Some(detail.unwrap_or_else(|| INVALID_CREDENTIALS_MESSAGE.to_string())),
            },
            ApiError::Auth { message } => ApiError::Auth {
                message: Some(message.unwrap_or_else(|| INVALID_CREDENTIALS_MESSAGE.to_string())),
            },
            other => other,
        }
    }
}
