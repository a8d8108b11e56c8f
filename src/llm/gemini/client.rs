//! Gemini client implementation

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::RETRY_AFTER, Client, StatusCode};

use crate::config::GeminiConfig;
use crate::llm::core::{
    error::LlmError,
    provider::LlmProvider,
    types::{GenerateRequest, GenerateResponse},
};

use super::mapper::{from_gemini_response, to_gemini_request};
use super::types::GenerateContentResponse;

/// Gemini model identifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeminiModel {
    Gemini20Flash,
    Gemini25Flash,
    Gemini25Pro,
    /// Any other model id accepted by the API
    Other(String),
}

impl GeminiModel {
    /// Get the model identifier string
    pub fn as_str(&self) -> &str {
        match self {
            GeminiModel::Gemini20Flash => "gemini-2.0-flash",
            GeminiModel::Gemini25Flash => "gemini-2.5-flash",
            GeminiModel::Gemini25Pro => "gemini-2.5-pro",
            GeminiModel::Other(id) => id,
        }
    }
}

impl Default for GeminiModel {
    fn default() -> Self {
        GeminiModel::Gemini20Flash
    }
}

impl fmt::Display for GeminiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GeminiModel {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "gemini-2.0-flash" => GeminiModel::Gemini20Flash,
            "gemini-2.5-flash" => GeminiModel::Gemini25Flash,
            "gemini-2.5-pro" => GeminiModel::Gemini25Pro,
            other => GeminiModel::Other(other.to_string()),
        })
    }
}

/// Client for the Gemini API, authenticated with an API key
pub struct GeminiClient {
    http_client: Client,
    api_key: String,
    /// Base URL up to and including the API version, e.g. `.../v1beta`
    endpoint: String,
    model: GeminiModel,
}

impl GeminiClient {
    /// Create a new Gemini client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &GeminiConfig) -> Result<Self, LlmError> {
        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| LlmError::HttpError {
                status: 0,
                body: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http_client,
            api_key: config.api_key.clone(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &GeminiModel {
        &self.model
    }

    fn build_endpoint_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model.as_str())
    }

    async fn make_request(&self, request: GenerateRequest) -> Result<GenerateResponse, LlmError> {
        let gemini_request = to_gemini_request(request);

        let url = self.build_endpoint_url();
        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", self.api_key.as_str())
            .json(&gemini_request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(model = %self.model, status = status.as_u16(), "Gemini request failed");
            return Err(map_error_status(status, body, retry_after));
        }

        let body: GenerateContentResponse = response.json().await?;
        let turn = from_gemini_response(body)?;
        tracing::debug!(
            model = %self.model,
            blocks = turn.content.len(),
            finish_reason = ?turn.finish_reason,
            "Gemini turn received"
        );
        Ok(turn)
    }
}

fn map_error_status(status: StatusCode, body: String, retry_after: Option<Duration>) -> LlmError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::AuthenticationError(body),
        StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimitExceeded { retry_after },
        StatusCode::BAD_REQUEST => LlmError::InvalidRequest(body),
        _ => LlmError::HttpError {
            status: status.as_u16(),
            body,
        },
    }
}

#[async_trait]
impl LlmProvider for GeminiClient {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, LlmError> {
        self.make_request(request).await
    }
}
