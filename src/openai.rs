use crate::config::redacted;
use crate::error::CriticError;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const MAX_TOKENS: u32 = 4000;
pub const TEMPERATURE: f32 = 0.3;
pub const TOP_P: f32 = 0.9;

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelResponse {
    data: Vec<Model>,
}

#[derive(Debug, Deserialize)]
struct Model {
    id: String,
}

/// Client for an OpenAI-compatible chat-completion endpoint.
///
/// Issues exactly one request per [`ChatClient::complete`] call; retries are
/// left to the caller.
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatClient")
            .field("api_url", &self.api_url)
            .field("api_key", &redacted(&self.api_key))
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl ChatClient {
    pub fn new(
        api_url: &str,
        api_key: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, CriticError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CriticError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends the system and user messages and returns the first choice's text.
    pub async fn complete(&self, system: &str, user: &str) -> Result<String, CriticError> {
        let endpoint = format!("{}/chat/completions", self.api_url);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            top_p: TOP_P,
            stream: false,
        };

        info!("Sending chat completion request to {}", endpoint);
        let resp = self
            .client
            .post(&endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            error!("Model API error response ({}): {}", status, text);
            return Err(CriticError::api(
                status.as_u16(),
                format!("Model API error: {}", upstream_message(status, &text)),
            ));
        }

        let response_text = resp.text().await.map_err(transport_error)?;
        debug!("Model API response: {}", response_text);
        let chat_resp: ChatResponse = serde_json::from_str(&response_text).map_err(|e| {
            CriticError::api(500, format!("Failed to decode model API response: {}", e))
        })?;

        let content = chat_resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CriticError::api(500, "No response from model"))?
            .message
            .content
            .unwrap_or_default();
        Ok(content)
    }

    /// Lists the model ids the provider exposes.
    pub async fn list_models(&self) -> Result<Vec<String>, CriticError> {
        let resp = self
            .client
            .get(format!("{}/models", self.api_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .timeout(HEALTH_CHECK_TIMEOUT)
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(CriticError::api(
                status.as_u16(),
                format!("Failed to get models: {}", upstream_message(status, &text)),
            ));
        }

        let model_response: ModelResponse = resp
            .json()
            .await
            .map_err(|e| CriticError::api(500, format!("Failed to decode model list: {}", e)))?;
        Ok(model_response.data.into_iter().map(|m| m.id).collect())
    }

    /// True only when the provider answers the model listing with HTTP 200.
    pub async fn health_check(&self) -> bool {
        let result = self
            .client
            .get(format!("{}/models", self.api_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .timeout(HEALTH_CHECK_TIMEOUT)
            .send()
            .await;
        match result {
            Ok(resp) => resp.status() == StatusCode::OK,
            Err(e) => {
                warn!("Health check failed: {}", e);
                false
            }
        }
    }
}

fn transport_error(e: reqwest::Error) -> CriticError {
    let status = e.status().map(|s| s.as_u16()).unwrap_or(500);
    if e.is_timeout() {
        error!("Model API request timed out: {}", e);
        CriticError::api(status, format!("Model API request timed out: {}", e))
    } else {
        error!("Model API request failed: {}", e);
        CriticError::api(status, format!("Model API request failed: {}", e))
    }
}

/// Prefers the provider's `error.message`, then the raw body, then the status.
fn upstream_message(status: StatusCode, body: &str) -> String {
    if let Ok(ErrorEnvelope {
        error: Some(ErrorBody {
            message: Some(message),
        }),
    }) = serde_json::from_str::<ErrorEnvelope>(body)
    {
        return message;
    }
    let body = body.trim();
    if body.is_empty() {
        format!("Request failed with status code {}", status.as_u16())
    } else {
        body.to_string()
    }
}
