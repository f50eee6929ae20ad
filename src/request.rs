use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ExplainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Explain,
    Chat,
}

impl Action {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "explain" => Some(Action::Explain),
            "chat" => Some(Action::Chat),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Explain => "explain",
            Action::Chat => "chat",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request as it arrives over the bridge, before any validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl RawRequest {
    pub fn explain(text: impl Into<String>) -> Self {
        Self {
            action: Some(Action::Explain.as_str().to_string()),
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn chat(context: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            action: Some(Action::Chat.as_str().to_string()),
            context: Some(context.into()),
            query: Some(query.into()),
            ..Default::default()
        }
    }

    /// The action this request asks for, if it is one we support.
    pub fn action(&self) -> Result<Action, ExplainError> {
        self.action
            .as_deref()
            .and_then(Action::parse)
            .ok_or(ExplainError::UnsupportedAction)
    }
}

/// A request whose fields are trimmed and satisfy its action's requirements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedRequest {
    Explain { text: String },
    Chat { context: String, query: String },
}

impl NormalizedRequest {
    pub fn action(&self) -> Action {
        match self {
            NormalizedRequest::Explain { .. } => Action::Explain,
            NormalizedRequest::Chat { .. } => Action::Chat,
        }
    }
}

fn trimmed(field: &Option<String>) -> String {
    field.as_deref().unwrap_or_default().trim().to_string()
}

/// Trims the request fields and checks the ones `action` requires.
pub fn normalize_request(
    action: Action,
    request: &RawRequest,
) -> Result<NormalizedRequest, ExplainError> {
    match action {
        Action::Explain => {
            let text = trimmed(&request.text);
            if text.is_empty() {
                return Err(ExplainError::validation(
                    "please select some text to explain",
                ));
            }
            Ok(NormalizedRequest::Explain { text })
        }
        Action::Chat => {
            let context = trimmed(&request.context);
            if context.is_empty() {
                return Err(ExplainError::validation("missing conversation context"));
            }
            let query = trimmed(&request.query);
            if query.is_empty() {
                return Err(ExplainError::validation(
                    "please enter a question to continue the chat",
                ));
            }
            Ok(NormalizedRequest::Chat { context, query })
        }
    }
}

/// The uniform reply shape: exactly one of `result` or `error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    #[serde(rename = "result")]
    Result(String),
    #[serde(rename = "error")]
    Error(String),
}

impl Response {
    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error(_))
    }
}

impl From<Result<String, ExplainError>> for Response {
    fn from(result: Result<String, ExplainError>) -> Self {
        match result {
            Ok(answer) => Response::Result(answer),
            Err(e) => Response::Error(e.to_string()),
        }
    }
}

impl From<ExplainError> for Response {
    fn from(e: ExplainError) -> Self {
        Response::Error(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explain_text_is_trimmed() {
        let request = RawRequest::explain("  serendipity \n");
        assert_eq!(
            normalize_request(Action::Explain, &request),
            Ok(NormalizedRequest::Explain {
                text: "serendipity".to_string()
            })
        );
    }

    #[test]
    fn explain_rejects_blank_text() {
        for text in ["", "   ", "\n\t"] {
            let err = normalize_request(Action::Explain, &RawRequest::explain(text)).unwrap_err();
            assert!(matches!(err, ExplainError::Validation(_)));
        }
    }

    #[test]
    fn explain_rejects_missing_text() {
        let request = RawRequest {
            action: Some("explain".to_string()),
            ..Default::default()
        };
        assert!(normalize_request(Action::Explain, &request).is_err());
    }

    #[test]
    fn chat_requires_context_and_query() {
        let err = normalize_request(Action::Chat, &RawRequest::chat(" ", "why?")).unwrap_err();
        assert_eq!(err.to_string(), "missing conversation context");

        let err = normalize_request(Action::Chat, &RawRequest::chat("word", "  ")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "please enter a question to continue the chat"
        );
    }

    #[test]
    fn chat_ignores_text_field() {
        let mut request = RawRequest::chat(" ephemeral ", " give an example ");
        request.text = Some("unused".to_string());
        assert_eq!(
            normalize_request(Action::Chat, &request),
            Ok(NormalizedRequest::Chat {
                context: "ephemeral".to_string(),
                query: "give an example".to_string(),
            })
        );
    }

    #[test]
    fn unknown_action_is_unsupported() {
        let request = RawRequest {
            action: Some("summarize".to_string()),
            ..Default::default()
        };
        assert_eq!(request.action(), Err(ExplainError::UnsupportedAction));
        assert_eq!(RawRequest::default().action(), Err(ExplainError::UnsupportedAction));
    }

    #[test]
    fn response_wire_shape() {
        assert_eq!(
            serde_json::to_value(Response::Result("hi".to_string())).unwrap(),
            serde_json::json!({ "result": "hi" })
        );
        assert_eq!(
            serde_json::to_value(Response::Error("boom".to_string())).unwrap(),
            serde_json::json!({ "error": "boom" })
        );
        let parsed: Response = serde_json::from_str(r#"{"error":"x"}"#).unwrap();
        assert!(parsed.is_error());
    }
}
