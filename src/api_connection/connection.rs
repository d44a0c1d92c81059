use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use thiserror::Error;

use super::endpoints::{ChatCompletionRequest, ChatCompletionResponse, Provider};

#[derive(Debug, Error)]
pub enum ApiConnectionError {
    #[error("API key not found in environment: {0}")]
    MissingApiKey(String),
    #[error("Network error: {0}")]
    NetworkError(#[source] reqwest::Error),
    #[error("Request timed out")]
    Timeout,
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("API error {status}: {error_body}")]
    ApiError {
        status: reqwest::StatusCode,
        error_body: String,
    },
    #[error("Completion contained no message content")]
    EmptyCompletion,
}

impl From<reqwest::Error> for ApiConnectionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiConnectionError::Timeout
        } else {
            ApiConnectionError::NetworkError(err)
        }
    }
}

/// A synchronous-looking text completion endpoint: one request in, one text
/// out. Every pipeline stage goes through this seam.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, request: ChatCompletionRequest) -> Result<String, ApiConnectionError>;
}

// Compile-time assertion: CompletionService must be usable as `dyn`.
const _: () = {
    fn _assert_object_safe(_: &dyn CompletionService) {}
};

/// HTTP client bound to one provider.
#[derive(Clone, Debug)]
pub struct ApiClient {
    provider: Provider,
    http: Client,
}

impl ApiClient {
    pub fn new(provider: Provider, timeout: Duration) -> Result<Self, ApiConnectionError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { provider, http })
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    pub async fn call_chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ApiConnectionError> {
        let key_var = self.provider.api_key_env_var();
        let api_key = env::var(key_var)
            .map_err(|_| ApiConnectionError::MissingApiKey(key_var.to_string()))?;

        let mut request_payload = serde_json::to_value(request)?;

        let mut builder = self.http.post(self.provider.url()).bearer_auth(api_key);

        if let Provider::OpenRouter { .. } = self.provider {
            if let Some(obj) = request_payload.as_object_mut() {
                obj.insert("provider".to_string(), json!({ "only": ["Cerebras"] }));
            }
            let site_url =
                env::var("SITE_URL").unwrap_or_else(|_| "http://localhost:8000".to_string());
            let app_name = env::var("APP_NAME").unwrap_or_else(|_| "RecipeAdapt".to_string());
            builder = builder
                .header("HTTP-Referer", site_url)
                .header("X-Title", app_name);
        }

        tracing::debug!(provider = self.provider.name(), model = %request.model, "sending chat completion");

        let response = builder.json(&request_payload).send().await?;

        if response.status().is_success() {
            Ok(response.json::<ChatCompletionResponse>().await?)
        } else {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            Err(ApiConnectionError::ApiError { status, error_body })
        }
    }
}

#[async_trait]
impl CompletionService for ApiClient {
    async fn complete(&self, request: ChatCompletionRequest) -> Result<String, ApiConnectionError> {
        let response = self.call_chat_completion(&request).await?;
        response
            .first_content()
            .map(str::to_string)
            .ok_or(ApiConnectionError::EmptyCompletion)
    }
}
