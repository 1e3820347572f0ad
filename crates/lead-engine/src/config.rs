//! Engine configuration.

use std::env;
use std::time::Duration;

use crate::prompt::{load_system_prompt, DEFAULT_BOT_SYSTEM_PROMPT};

/// Default base URL for property links.
pub const DEFAULT_SITE_URL: &str = "https://seu-site.com";

/// Default reply sent when the model cannot be reached.
pub const DEFAULT_FALLBACK_REPLY: &str =
    "Desculpe, estou com dificuldades para responder agora. Pode tentar novamente em instantes?";

/// Default due offset, in hours, for tasks created without a date.
pub const DEFAULT_TASK_DUE_HOURS: i64 = 2;

/// Largest accepted task due offset (one year).
pub const MAX_TASK_DUE_HOURS: i64 = 8760;

/// Configuration for the conversation engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum catalog entries included in a prompt.
    pub catalog_limit: u32,

    /// Upper bound on a single model call.
    pub llm_timeout: Duration,

    /// Base URL for property links shown to the customer.
    pub site_url: String,

    /// Reply used when the model fails or times out.
    pub fallback_reply: String,

    /// Due offset for tasks created without an explicit date.
    pub task_due_hours: i64,

    /// System prompt for bots without their own.
    pub system_prompt: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            catalog_limit: 50,
            llm_timeout: Duration::from_secs(45),
            site_url: DEFAULT_SITE_URL.to_string(),
            fallback_reply: DEFAULT_FALLBACK_REPLY.to_string(),
            task_due_hours: DEFAULT_TASK_DUE_HOURS,
            system_prompt: DEFAULT_BOT_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl EngineConfig {
    /// Create configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `BOT_CATALOG_LIMIT` - Catalog entries per prompt (default: 50)
    /// - `BOT_LLM_TIMEOUT_SECS` - Model call timeout in seconds (default: 45)
    /// - `BOT_SITE_URL` - Base URL for property links
    /// - `BOT_FALLBACK_REPLY` - Reply used when the model fails
    /// - `BOT_TASK_DUE_HOURS` - Default task due offset, 1 to 8760 (default: 2)
    /// - `BOT_SYSTEM_PROMPT` / `BOT_PROMPT_FILE` - See [`load_system_prompt`]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let catalog_limit = env::var("BOT_CATALOG_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.catalog_limit);

        let llm_timeout = env::var("BOT_LLM_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.llm_timeout);

        let site_url = env::var("BOT_SITE_URL").unwrap_or(defaults.site_url);

        let fallback_reply = env::var("BOT_FALLBACK_REPLY")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.fallback_reply);

        let task_due_hours = env::var("BOT_TASK_DUE_HOURS")
            .ok()
            .and_then(|v| parse_task_due_hours(&v))
            .unwrap_or(defaults.task_due_hours);

        Self {
            catalog_limit,
            llm_timeout,
            site_url,
            fallback_reply,
            task_due_hours,
            system_prompt: load_system_prompt(),
        }
    }

    /// Set the model call timeout.
    pub fn with_llm_timeout(mut self, timeout: Duration) -> Self {
        self.llm_timeout = timeout;
        self
    }

    /// Set the base URL for property links.
    pub fn with_site_url(mut self, site_url: impl Into<String>) -> Self {
        self.site_url = site_url.into();
        self
    }
}

fn parse_task_due_hours(value: &str) -> Option<i64> {
    value
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|hours| (1..=MAX_TASK_DUE_HOURS).contains(hours))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.catalog_limit, 50);
        assert_eq!(config.llm_timeout, Duration::from_secs(45));
        assert_eq!(config.task_due_hours, 2);
        assert_eq!(config.system_prompt, DEFAULT_BOT_SYSTEM_PROMPT);
    }

    #[test]
    fn test_builders() {
        let config = EngineConfig::default()
            .with_llm_timeout(Duration::from_millis(10))
            .with_site_url("https://imobiliaria.com.br");
        assert_eq!(config.llm_timeout, Duration::from_millis(10));
        assert_eq!(config.site_url, "https://imobiliaria.com.br");
    }

    #[test]
    fn test_task_due_hours_bounds() {
        assert_eq!(parse_task_due_hours("24"), Some(24));
        assert_eq!(parse_task_due_hours(" 8760 "), Some(MAX_TASK_DUE_HOURS));
        assert_eq!(parse_task_due_hours("8761"), None);
        assert_eq!(parse_task_due_hours("0"), None);
        assert_eq!(parse_task_due_hours("-3"), None);
        assert_eq!(parse_task_due_hours("9223372036854775807"), None);
        assert_eq!(parse_task_due_hours("duas"), None);
    }
}
