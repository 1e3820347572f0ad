//! Request types passed to a brain.

use serde::{Deserialize, Serialize};

/// Who authored a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// The customer talking to the bot.
    User,
    /// The bot itself.
    Assistant,
}

impl ChatRole {
    /// Wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// A single turn of conversation sent to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    /// Create a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// A complete single-shot request: system prompt plus ordered turns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    /// System-level behavioral instructions.
    pub system: String,
    /// Conversation turns, oldest first. The last turn is normally the user's.
    pub turns: Vec<ChatTurn>,
    /// Model override for backends that serve several models.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl Prompt {
    /// Create a prompt with the given system instructions and turns.
    pub fn new(system: impl Into<String>, turns: Vec<ChatTurn>) -> Self {
        Self {
            system: system.into(),
            turns,
            model: None,
        }
    }

    /// Set the model override.
    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    /// Content of the final user turn, if any.
    pub fn last_user_text(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.role == ChatRole::User)
            .map(|t| t.content.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serialization() {
        let turn = ChatTurn::assistant("oi");
        let json = serde_json::to_string(&turn).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"oi"}"#);
    }

    #[test]
    fn test_last_user_text() {
        let prompt = Prompt::new(
            "sys",
            vec![
                ChatTurn::user("first"),
                ChatTurn::assistant("reply"),
                ChatTurn::user("second"),
            ],
        );
        assert_eq!(prompt.last_user_text(), Some("second"));
        assert_eq!(Prompt::default().last_user_text(), None);
    }
}
