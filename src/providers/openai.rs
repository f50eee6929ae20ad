use log::{debug, error, info};
use serde::{Deserialize, Serialize};

use super::{read_success_body, TEMPERATURE};
use crate::error::{describe_request_error, ExplainError};
use crate::request::NormalizedRequest;
use crate::settings::Provider;

pub const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

const EXPLAIN_SYSTEM_PROMPT: &str =
    "You are a dictionary and vocabulary assistant that explains words and passages.";
const CHAT_SYSTEM_PROMPT: &str =
    "You are a friendly explanation assistant. Keep answers short and clear.";

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Option<Vec<Choice>>,
    error: Option<OpenAIError>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIError {
    message: String,
}

/// Suggested in `options show`; any chat-completions model id is accepted.
pub const OPENAI_MODELS: &[&str] = &["gpt-3.5-turbo", "gpt-4o-mini", "gpt-4o"];

pub fn build_messages(request: &NormalizedRequest) -> Vec<ChatMessage> {
    match request {
        NormalizedRequest::Explain { text } => vec![
            ChatMessage::system(EXPLAIN_SYSTEM_PROMPT),
            ChatMessage::user(format!("Briefly explain the meaning of: \"{}\".", text)),
        ],
        NormalizedRequest::Chat { context, query } => vec![
            ChatMessage::system(CHAT_SYSTEM_PROMPT),
            ChatMessage::user(format!(
                "Context: \"{}\".\nQuestion: \"{}\"",
                context, query
            )),
        ],
    }
}

pub struct OpenAIClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl OpenAIClient {
    pub fn with_url(http: reqwest::Client, api_key: String, model: String, api_url: String) -> Self {
        Self {
            http,
            api_url,
            api_key,
            model,
        }
    }

    pub async fn complete(&self, request: &NormalizedRequest) -> Result<String, ExplainError> {
        info!(
            "OpenAI request: action={}, model={}",
            request.action(),
            self.model
        );

        let messages = build_messages(request);
        debug!("OpenAI request carries {} messages", messages.len());

        let body = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: TEMPERATURE,
        };

        let response = self
            .http
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("OpenAI API request failed: {}", e);
                describe_request_error(&e)
            })?;

        let response_text = read_success_body(Provider::OpenAI, response).await?;
        let answer = extract_answer(&response_text)?;
        info!("OpenAI answer received: {} chars", answer.len());
        Ok(answer)
    }
}

fn extract_answer(response_text: &str) -> Result<String, ExplainError> {
    let completion: ChatCompletionResponse = serde_json::from_str(response_text)
        .map_err(|e| ExplainError::Transport(format!("Failed to parse response: {}", e)))?;

    if let Some(error) = completion.error {
        return Err(ExplainError::Provider(error.message));
    }

    let answer = completion
        .choices
        .and_then(|c| c.into_iter().next())
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .unwrap_or_default();

    let answer = answer.trim();
    if answer.is_empty() {
        return Err(ExplainError::EmptyAnswer(Provider::OpenAI));
    }
    Ok(answer.to_string())
}
