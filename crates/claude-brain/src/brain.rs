//! ClaudeBrain implementation using the Anthropic Messages API.

use brain_core::{async_trait, hash_prompt, Brain, BrainError, ChatTurn, Prompt};
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::api_types::{ApiError, ApiMessage, MessagesRequest, MessagesResponse};
use crate::config::ClaudeBrainConfig;

/// Anthropic API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// A brain that forwards prompts to Anthropic's Messages API.
///
/// ClaudeBrain is stateless: the caller supplies the whole conversation in
/// every [`Prompt`].
pub struct ClaudeBrain {
    client: Client,
    config: ClaudeBrainConfig,
}

impl ClaudeBrain {
    /// Create a new ClaudeBrain with the given configuration.
    pub fn new(config: ClaudeBrainConfig) -> Result<Self, BrainError> {
        if config.api_key.is_empty() {
            return Err(BrainError::Configuration("API key is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BrainError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            "ClaudeBrain initialized with model: {}, timeout: {:?}",
            config.model, config.timeout
        );

        Ok(Self { client, config })
    }

    /// Create a ClaudeBrain from environment variables.
    ///
    /// See [`ClaudeBrainConfig::from_env`] for required environment variables.
    pub fn from_env() -> Result<Self, BrainError> {
        Self::new(ClaudeBrainConfig::from_env()?)
    }

    /// Get the configuration.
    pub fn config(&self) -> &ClaudeBrainConfig {
        &self.config
    }

    /// Build the request body for a prompt.
    fn build_request(&self, prompt: &Prompt) -> MessagesRequest {
        let model = prompt
            .model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(&self.config.model);

        MessagesRequest {
            model: model.to_string(),
            max_tokens: self.config.max_tokens,
            system: Some(prompt.system.clone()).filter(|s| !s.is_empty()),
            messages: build_messages(&prompt.turns),
            temperature: self.config.temperature,
        }
    }
}

/// Convert turns to API messages, merging adjacent turns of the same role.
///
/// The Messages API rejects two consecutive messages from the same role.
fn build_messages(turns: &[ChatTurn]) -> Vec<ApiMessage> {
    let mut messages: Vec<ApiMessage> = Vec::with_capacity(turns.len());

    for turn in turns {
        let role = turn.role.as_str();
        match messages.last_mut() {
            Some(last) if last.role == role => {
                last.content.push_str("\n\n");
                last.content.push_str(&turn.content);
            }
            _ => messages.push(ApiMessage {
                role: role.to_string(),
                content: turn.content.clone(),
            }),
        }
    }

    messages
}

#[async_trait]
impl Brain for ClaudeBrain {
    async fn generate(&self, prompt: &Prompt) -> Result<String, BrainError> {
        let url = format!("{}/v1/messages", self.config.api_url.trim_end_matches('/'));
        let request = self.build_request(prompt);

        debug!(
            model = %request.model,
            turns = request.messages.len(),
            system_prompt_hash = %hash_prompt(&prompt.system),
            "Sending request to Anthropic API"
        );

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BrainError::Timeout
                } else {
                    BrainError::Network(format!("Failed to send request: {}", e))
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            // Try to parse as API error
            let detail = serde_json::from_str::<ApiError>(&error_text)
                .map(|api_error| api_error.error.message)
                .unwrap_or(error_text);

            if status.as_u16() == 529 || status.is_server_error() {
                return Err(BrainError::Unavailable(format!(
                    "API error ({}): {}",
                    status.as_u16(),
                    detail
                )));
            }

            return Err(BrainError::ProcessingFailed(format!(
                "API error ({}): {}",
                status.as_u16(),
                detail
            )));
        }

        let completion: MessagesResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                BrainError::Timeout
            } else {
                BrainError::ProcessingFailed(format!("Failed to parse response: {}", e))
            }
        })?;

        if let Some(usage) = &completion.usage {
            debug!(
                "Token usage - input: {}, output: {}",
                usage.input_tokens, usage.output_tokens
            );
        }

        let text = completion.text();
        if text.is_empty() {
            warn!(
                stop_reason = ?completion.stop_reason,
                "Anthropic response had no text content"
            );
        }

        Ok(text)
    }

    fn name(&self) -> &str {
        "ClaudeBrain"
    }

    async fn is_ready(&self) -> bool {
        !self.config.api_key.is_empty()
    }
}
