use log::{debug, error, info};
use serde::{Deserialize, Serialize};

use super::{read_success_body, TEMPERATURE};
use crate::error::{describe_request_error, ExplainError};
use crate::request::NormalizedRequest;
use crate::settings::Provider;

pub const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const GEMINI_MODEL: &str = "gemini-1.5-flash";
const TOP_P: f64 = 0.9;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    top_p: f64,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    error: Option<GeminiError>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}

pub fn build_prompt(request: &NormalizedRequest) -> String {
    match request {
        NormalizedRequest::Explain { text } => format!(
            "Briefly explain the meaning of the following word or passage \
             (give its part of speech and an example if possible): \"{}\"",
            text
        ),
        NormalizedRequest::Chat { context, query } => format!(
            "Context: \"{}\".\nUser Question: \"{}\"\nAnswer concisely and keep the explanation easy to follow.",
            context, query
        ),
    }
}

pub struct GeminiClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl GeminiClient {
    /// `api_url` is the models collection URL; the model name and method are appended.
    pub fn with_url(http: reqwest::Client, api_key: String, api_url: String) -> Self {
        Self {
            http,
            api_url,
            api_key,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.api_url.trim_end_matches('/'),
            GEMINI_MODEL
        )
    }

    pub async fn complete(&self, request: &NormalizedRequest) -> Result<String, ExplainError> {
        info!(
            "Gemini request: action={}, model={}",
            request.action(),
            GEMINI_MODEL
        );

        let prompt = build_prompt(request);
        debug!("Gemini prompt length: {} chars", prompt.len());

        let body = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                top_p: TOP_P,
            },
        };

        let response = self
            .http
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("Gemini API request failed: {}", e);
                describe_request_error(&e)
            })?;

        let response_text = read_success_body(Provider::Gemini, response).await?;
        let answer = extract_answer(&response_text)?;
        info!("Gemini answer received: {} chars", answer.len());
        Ok(answer)
    }
}

fn extract_answer(response_text: &str) -> Result<String, ExplainError> {
    let gemini_response: GeminiResponse = serde_json::from_str(response_text)
        .map_err(|e| ExplainError::Transport(format!("Failed to parse response: {}", e)))?;

    if let Some(error) = gemini_response.error {
        return Err(ExplainError::Provider(error.message));
    }

    let answer = gemini_response
        .candidates
        .and_then(|c| c.into_iter().next())
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .map(|p| p.text.unwrap_or_default())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default();

    let answer = answer.trim();
    if answer.is_empty() {
        return Err(ExplainError::EmptyAnswer(Provider::Gemini));
    }
    Ok(answer.to_string())
}
