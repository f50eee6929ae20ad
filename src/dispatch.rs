use log::{debug, info, warn};
use std::sync::Arc;

use crate::error::ExplainError;
use crate::providers::gemini::GeminiClient;
use crate::providers::openai::OpenAIClient;
use crate::providers::{build_http_client, Endpoints, ProviderClient};
use crate::request::{normalize_request, Action, RawRequest, Response};
use crate::settings::{Provider, Settings, SettingsStore};

/// Validates requests, picks the configured provider and forwards to its adapter.
pub struct Dispatcher {
    settings: Arc<SettingsStore>,
    http: reqwest::Client,
    endpoints: Endpoints,
}

impl Dispatcher {
    pub fn new(settings: Arc<SettingsStore>) -> Result<Self, ExplainError> {
        Ok(Self::with_endpoints(
            settings,
            build_http_client()?,
            Endpoints::default(),
        ))
    }

    pub fn with_endpoints(
        settings: Arc<SettingsStore>,
        http: reqwest::Client,
        endpoints: Endpoints,
    ) -> Self {
        Self {
            settings,
            http,
            endpoints,
        }
    }

    /// Full request path for one bridge message. Never fails; every error becomes
    /// a `Response::Error`.
    pub async fn handle(&self, request: &RawRequest) -> Response {
        let action = match request.action() {
            Ok(action) => action,
            Err(e) => {
                warn!("Rejected request with action {:?}", request.action);
                return e.into();
            }
        };
        self.handle_action(action, request).await.into()
    }

    pub async fn handle_action(
        &self,
        action: Action,
        request: &RawRequest,
    ) -> Result<String, ExplainError> {
        let normalized = normalize_request(action, request).map_err(|e| {
            debug!("Request failed validation: {}", e);
            e
        })?;

        let settings = self.settings.get_settings().await;
        let client = self.client_for(&settings)?;
        info!(
            "Dispatching {} request to {}",
            normalized.action(),
            client.provider()
        );
        client.complete(&normalized).await
    }

    /// Builds the adapter for the configured provider, refusing when its key is blank.
    pub fn client_for(&self, settings: &Settings) -> Result<ProviderClient, ExplainError> {
        let provider = settings.provider;
        let api_key = settings
            .api_key(provider)
            .ok_or(ExplainError::MissingKey(provider))?
            .to_string();

        Ok(match provider {
            Provider::Gemini => ProviderClient::Gemini(GeminiClient::with_url(
                self.http.clone(),
                api_key,
                self.endpoints.gemini_models_url.clone(),
            )),
            Provider::OpenAI => ProviderClient::OpenAI(OpenAIClient::with_url(
                self.http.clone(),
                api_key,
                settings.openai_model().to_string(),
                self.endpoints.openai_chat_url.clone(),
            )),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

    fn dispatcher(server: &MockServer, settings: Settings) -> Dispatcher {
        Dispatcher::with_endpoints(
            Arc::new(SettingsStore::in_memory(settings)),
            reqwest::Client::new(),
            Endpoints {
                gemini_models_url: format!("{}/gemini", server.uri()),
                openai_chat_url: format!("{}/openai", server.uri()),
            },
        )
    }

    async fn no_calls_expected() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(matchers::any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn blank_explain_text_makes_no_http_call() {
        let server = no_calls_expected().await;
        let settings = Settings {
            gemini_key: "key".to_string(),
            ..Default::default()
        };
        let response = dispatcher(&server, settings)
            .handle(&RawRequest::explain("   "))
            .await;
        assert!(response.is_error());
    }

    #[tokio::test]
    async fn incomplete_chat_makes_no_http_call() {
        let server = no_calls_expected().await;
        let settings = Settings {
            gemini_key: "key".to_string(),
            ..Default::default()
        };
        let dispatcher = dispatcher(&server, settings);
        assert!(dispatcher.handle(&RawRequest::chat("", "why")).await.is_error());
        assert!(dispatcher.handle(&RawRequest::chat("word", " ")).await.is_error());
    }

    #[tokio::test]
    async fn missing_gemini_key_is_configuration_error() {
        let server = no_calls_expected().await;
        let response = dispatcher(&server, Settings::default())
            .handle(&RawRequest::explain("word"))
            .await;
        assert_eq!(
            response,
            Response::Error("Gemini key not configured".to_string())
        );
    }

    #[tokio::test]
    async fn missing_openai_key_is_configuration_error() {
        let server = no_calls_expected().await;
        let settings = Settings {
            provider: Provider::OpenAI,
            gemini_key: "unused".to_string(),
            ..Default::default()
        };
        let response = dispatcher(&server, settings)
            .handle(&RawRequest::explain("word"))
            .await;
        assert_eq!(
            response,
            Response::Error("OpenAI key not configured".to_string())
        );
    }

    #[tokio::test]
    async fn unsupported_action_makes_no_http_call() {
        let server = no_calls_expected().await;
        let request = RawRequest {
            action: Some("translate".to_string()),
            text: Some("word".to_string()),
            ..Default::default()
        };
        let response = dispatcher(&server, Settings::default()).handle(&request).await;
        assert_eq!(response, Response::Error("unsupported action".to_string()));
    }

    #[tokio::test]
    async fn routes_to_gemini() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/gemini/gemini-1.5-flash:generateContent"))
            .and(matchers::query_param("key", "g-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{ "content": { "parts": [{ "text": "hello" }] } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let settings = Settings {
            gemini_key: " g-key ".to_string(),
            ..Default::default()
        };
        let response = dispatcher(&server, settings)
            .handle(&RawRequest::explain(" hi "))
            .await;
        assert_eq!(response, Response::Result("hello".to_string()));
    }

    #[tokio::test]
    async fn routes_to_openai_with_configured_model() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/openai"))
            .and(matchers::header("Authorization", "Bearer o-key"))
            .and(matchers::body_partial_json(
                serde_json::json!({ "model": "gpt-4o-mini" }),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "role": "assistant", "content": " world " } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let settings = Settings {
            provider: Provider::OpenAI,
            openai_key: "o-key".to_string(),
            openai_model: "gpt-4o-mini".to_string(),
            ..Default::default()
        };
        let response = dispatcher(&server, settings)
            .handle(&RawRequest::chat("idiom", "origin?"))
            .await;
        assert_eq!(response, Response::Result("world".to_string()));
    }

    #[tokio::test]
    async fn adapter_error_is_returned_unmodified() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let settings = Settings {
            gemini_key: "g-key".to_string(),
            ..Default::default()
        };
        let response = dispatcher(&server, settings)
            .handle(&RawRequest::explain("word"))
            .await;
        assert_eq!(
            response,
            Response::Error("Gemini HTTP 503: Service Unavailable".to_string())
        );
    }
}
