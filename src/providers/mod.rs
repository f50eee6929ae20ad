pub mod gemini;
pub mod openai;

use std::time::Duration;

use crate::error::ExplainError;
use crate::request::NormalizedRequest;
use crate::settings::Provider;

pub const REQUEST_TIMEOUT_SECS: u64 = 60;
pub const TEMPERATURE: f64 = 0.7;

#[derive(Debug, Clone)]
pub struct ProviderInfo {
    pub id: Provider,
    pub models: &'static [&'static str],
    pub api_key_url: &'static str,
}

pub fn get_available_providers() -> Vec<ProviderInfo> {
    vec![
        ProviderInfo {
            id: Provider::Gemini,
            models: &[gemini::GEMINI_MODEL],
            api_key_url: "https://aistudio.google.com/apikey",
        },
        ProviderInfo {
            id: Provider::OpenAI,
            models: openai::OPENAI_MODELS,
            api_key_url: "https://platform.openai.com/api-keys",
        },
    ]
}

/// Where each adapter sends its requests. Overridden in tests to hit a mock server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub gemini_models_url: String,
    pub openai_chat_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            gemini_models_url: gemini::GEMINI_API_URL.to_string(),
            openai_chat_url: openai::OPENAI_API_URL.to_string(),
        }
    }
}

pub fn build_http_client() -> Result<reqwest::Client, ExplainError> {
    build_http_client_with_timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
}

/// Every request made through the client, body included, must finish within `timeout`.
pub fn build_http_client_with_timeout(timeout: Duration) -> Result<reqwest::Client, ExplainError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ExplainError::Transport(format!("Failed to create HTTP client: {}", e)))
}

/// Both adapters behind one closed enum, so adding a provider is a compile-time change.
pub enum ProviderClient {
    Gemini(gemini::GeminiClient),
    OpenAI(openai::OpenAIClient),
}

impl ProviderClient {
    pub fn provider(&self) -> Provider {
        match self {
            ProviderClient::Gemini(_) => Provider::Gemini,
            ProviderClient::OpenAI(_) => Provider::OpenAI,
        }
    }

    pub async fn complete(&self, request: &NormalizedRequest) -> Result<String, ExplainError> {
        match self {
            ProviderClient::Gemini(client) => client.complete(request).await,
            ProviderClient::OpenAI(client) => client.complete(request).await,
        }
    }
}

/// Maps a non-2xx status to `ExplainError::Http` before touching the body, then
/// reads the body of a successful response.
pub(crate) async fn read_success_body(
    provider: Provider,
    response: reqwest::Response,
) -> Result<String, ExplainError> {
    let status = response.status();
    log::debug!("{} API response status: {}", provider, status);

    if !status.is_success() {
        // Body is only logged; a failed read must not hide the status.
        let body = response.text().await.unwrap_or_default();
        log::error!("{} API error: status={}, body={}", provider, status, body);
        return Err(ExplainError::Http {
            provider,
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
        });
    }

    response
        .text()
        .await
        .map_err(|e| ExplainError::Transport(format!("Failed to read response: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_entry_per_provider() {
        let providers = get_available_providers();
        assert_eq!(providers.len(), 2);
        assert!(providers.iter().any(|p| p.id == Provider::Gemini));
        assert!(providers.iter().any(|p| p.id == Provider::OpenAI));
        for provider in &providers {
            assert!(!provider.models.is_empty());
            assert!(provider.api_key_url.starts_with("https://"));
        }
        let openai = providers
            .iter()
            .find(|p| p.id == Provider::OpenAI)
            .unwrap();
        assert!(openai
            .models
            .contains(&crate::settings::DEFAULT_OPENAI_MODEL));
    }

    #[test]
    fn default_endpoints_are_production() {
        let endpoints = Endpoints::default();
        assert_eq!(
            endpoints.gemini_models_url,
            "https://generativelanguage.googleapis.com/v1beta/models"
        );
        assert_eq!(
            endpoints.openai_chat_url,
            "https://api.openai.com/v1/chat/completions"
        );
    }

    mod http_tests {
        use super::*;
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        fn explain(text: &str) -> NormalizedRequest {
            NormalizedRequest::Explain {
                text: text.to_string(),
            }
        }

        #[test]
        fn default_client_builds() {
            assert!(build_http_client().is_ok());
        }

        #[tokio::test]
        async fn slow_provider_times_out() {
            let mock_server = MockServer::start().await;

            Mock::given(wiremock::matchers::method("POST"))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_json(serde_json::json!({
                            "candidates": [{ "content": { "parts": [{ "text": "late" }] } }]
                        }))
                        .set_delay(Duration::from_millis(500)),
                )
                .mount(&mock_server)
                .await;

            let http = build_http_client_with_timeout(Duration::from_millis(100)).unwrap();
            let client = ProviderClient::Gemini(gemini::GeminiClient::with_url(
                http,
                "test-key".to_string(),
                format!("{}/v1beta/models", mock_server.uri()),
            ));

            let err = client.complete(&explain("hello")).await.unwrap_err();
            assert_eq!(
                err,
                ExplainError::Transport("Request timeout - please try again".to_string())
            );
        }

        /// Answers the first request with `head` and then closes the socket.
        async fn serve_once(head: &'static str) -> String {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut received = Vec::new();
                let mut buf = [0u8; 4096];
                loop {
                    let n = socket.read(&mut buf).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    received.extend_from_slice(&buf[..n]);
                    let text = String::from_utf8_lossy(&received);
                    if let Some(end) = text.find("\r\n\r\n") {
                        let length = text[..end]
                            .lines()
                            .find_map(|line| {
                                let (name, value) = line.split_once(':')?;
                                name.eq_ignore_ascii_case("content-length")
                                    .then(|| value.trim().parse::<usize>().ok())
                                    .flatten()
                            })
                            .unwrap_or(0);
                        if received.len() >= end + 4 + length {
                            break;
                        }
                    }
                }
                socket.write_all(head.as_bytes()).await.unwrap();
                socket.shutdown().await.unwrap();
            });
            format!("http://{}", addr)
        }

        #[tokio::test]
        async fn error_status_survives_truncated_body() {
            let base = serve_once(
                "HTTP/1.1 502 Bad Gateway\r\nContent-Length: 100\r\nConnection: close\r\n\r\npartial",
            )
            .await;
            let client = ProviderClient::OpenAI(openai::OpenAIClient::with_url(
                reqwest::Client::new(),
                "sk-test".to_string(),
                "gpt-3.5-turbo".to_string(),
                format!("{}/v1/chat/completions", base),
            ));

            let err = client.complete(&explain("hello")).await.unwrap_err();
            assert_eq!(err.to_string(), "OpenAI HTTP 502: Bad Gateway");
        }
    }
}
