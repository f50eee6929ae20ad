use thiserror::Error;

use crate::settings::Provider;

/// Every way a single explain/chat request can fail.
///
/// None of these are fatal to the process: the coordinator turns each one into
/// an `{"error": ...}` response and the modal renders it inline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExplainError {
    #[error("{0}")]
    Validation(String),

    #[error("unsupported action")]
    UnsupportedAction,

    #[error("malformed request: {0}")]
    Malformed(String),

    #[error("{0} key not configured")]
    MissingKey(Provider),

    #[error("{provider} HTTP {status}: {status_text}")]
    Http {
        provider: Provider,
        status: u16,
        status_text: String,
    },

    #[error("{0}")]
    Transport(String),

    #[error("{0}")]
    Provider(String),

    #[error("{0} returned an empty answer")]
    EmptyAnswer(Provider),
}

impl ExplainError {
    pub fn validation(message: impl Into<String>) -> Self {
        ExplainError::Validation(message.into())
    }
}

/// Maps a reqwest failure into a user-facing transport message.
pub(crate) fn describe_request_error(e: &reqwest::Error) -> ExplainError {
    if e.is_timeout() {
        ExplainError::Transport("Request timeout - please try again".to_string())
    } else if e.is_connect() {
        ExplainError::Transport("Network error - please check your connection".to_string())
    } else {
        ExplainError::Transport(format!("Request failed: {}", e))
    }
}
