//! Message bridge between page-side code and the coordinator.
//!
//! One JSON request frame in, one JSON response frame out:
//! `{"action":"explain","text":...}` or `{"action":"chat","context":...,"query":...}`
//! answered by `{"result":...}` or `{"error":...}`.

pub mod server;

use crate::dispatch::Dispatcher;
use crate::error::ExplainError;
use crate::request::{Action, RawRequest, Response};

pub use server::MessageBridge;

pub const DEFAULT_BRIDGE_PORT: u16 = 9876;

/// Decodes one frame, checking `action` before anything else so unsupported
/// actions never reach the dispatcher.
pub fn parse_message(text: &str) -> Result<(Action, RawRequest), ExplainError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| ExplainError::Malformed(e.to_string()))?;

    if !value.is_object() {
        return Err(ExplainError::Malformed("expected a JSON object".to_string()));
    }

    let action = value
        .get("action")
        .and_then(|a| a.as_str())
        .and_then(Action::parse)
        .ok_or(ExplainError::UnsupportedAction)?;

    let request = serde_json::from_value::<RawRequest>(value)
        .map_err(|e| ExplainError::Malformed(e.to_string()))?;

    Ok((action, request))
}

/// Answers one frame. Always produces a response.
pub async fn handle_message(dispatcher: &Dispatcher, text: &str) -> Response {
    match parse_message(text) {
        Ok((action, request)) => dispatcher.handle_action(action, &request).await.into(),
        Err(e) => e.into(),
    }
}

pub fn encode_response(response: &Response) -> String {
    // A two-variant enum of strings always serializes.
    serde_json::to_string(response).unwrap_or_else(|_| r#"{"error":"internal error"}"#.to_string())
}
