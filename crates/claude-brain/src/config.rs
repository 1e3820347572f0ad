//! Configuration for ClaudeBrain.

use brain_core::BrainError;
use std::env;
use std::time::Duration;

/// Default Anthropic API URL.
pub const DEFAULT_API_URL: &str = "https://api.anthropic.com";

/// Default model name.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";

/// Configuration for ClaudeBrain.
#[derive(Debug, Clone)]
pub struct ClaudeBrainConfig {
    /// Anthropic API URL.
    pub api_url: String,

    /// API key for authentication.
    pub api_key: String,

    /// Model used when the prompt carries no override.
    pub model: String,

    /// Maximum tokens for the reply.
    pub max_tokens: u32,

    /// Temperature for generation (0.0 - 1.0).
    pub temperature: Option<f32>,

    /// Upper bound on a single request, connection included.
    pub timeout: Duration,
}

impl Default for ClaudeBrainConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 2048,
            temperature: None,
            timeout: Duration::from_secs(45),
        }
    }
}

impl ClaudeBrainConfig {
    /// Create configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `ANTHROPIC_API_KEY` - API key for authentication
    ///
    /// Optional environment variables:
    /// - `ANTHROPIC_API_URL` - API URL (default: https://api.anthropic.com)
    /// - `ANTHROPIC_MODEL` - Model name (default: claude-sonnet-4-5-20250929)
    /// - `ANTHROPIC_MAX_TOKENS` - Max tokens (default: 2048)
    /// - `ANTHROPIC_TEMPERATURE` - Temperature (default: provider default)
    /// - `ANTHROPIC_TIMEOUT_SECS` - Request timeout in seconds (default: 45)
    pub fn from_env() -> Result<Self, BrainError> {
        let api_key = env::var("ANTHROPIC_API_KEY")
            .map_err(|_| BrainError::Configuration("ANTHROPIC_API_KEY not set".to_string()))?;

        let defaults = Self::default();

        let api_url = env::var("ANTHROPIC_API_URL").unwrap_or(defaults.api_url);

        let model = env::var("ANTHROPIC_MODEL").unwrap_or(defaults.model);

        let max_tokens = env::var("ANTHROPIC_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_tokens);

        let temperature = env::var("ANTHROPIC_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse().ok());

        let timeout = env::var("ANTHROPIC_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        Ok(Self {
            api_url,
            api_key,
            model,
            max_tokens,
            temperature,
            timeout,
        })
    }

    /// Create a new config builder.
    pub fn builder() -> ClaudeBrainConfigBuilder {
        ClaudeBrainConfigBuilder::default()
    }
}

/// Builder for ClaudeBrainConfig.
#[derive(Debug, Default)]
pub struct ClaudeBrainConfigBuilder {
    config: ClaudeBrainConfig,
}

impl ClaudeBrainConfigBuilder {
    /// Set the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    /// Set the API URL.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    /// Set the model name.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the max tokens.
    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.config.max_tokens = tokens;
        self
    }

    /// Set the temperature.
    pub fn temperature(mut self, temp: f32) -> Self {
        self.config.temperature = Some(temp);
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> ClaudeBrainConfig {
        self.config
    }
}
