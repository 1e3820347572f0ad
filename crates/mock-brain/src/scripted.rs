//! Scripted brain - replays canned completions in order.

use std::collections::VecDeque;

use brain_core::{async_trait, Brain, BrainError, Prompt};
use tokio::sync::Mutex;

/// A brain that answers with pre-recorded completions.
///
/// Replies are consumed in order; once only one remains it is repeated for
/// every further call. Every prompt received is recorded so tests can assert
/// on what the caller sent.
#[derive(Debug, Default)]
pub struct ScriptedBrain {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<Prompt>>,
}

impl ScriptedBrain {
    /// Create a brain that answers with the given replies, in order.
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Queue another reply.
    pub async fn push_reply(&self, reply: impl Into<String>) {
        self.replies.lock().await.push_back(reply.into());
    }

    /// All prompts received so far, oldest first.
    pub async fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().await.clone()
    }

    /// The most recent prompt, if any.
    pub async fn last_prompt(&self) -> Option<Prompt> {
        self.prompts.lock().await.last().cloned()
    }
}

#[async_trait]
impl Brain for ScriptedBrain {
    async fn generate(&self, prompt: &Prompt) -> Result<String, BrainError> {
        self.prompts.lock().await.push(prompt.clone());

        let mut replies = self.replies.lock().await;
        let reply = if replies.len() > 1 {
            replies.pop_front()
        } else {
            replies.front().cloned()
        };

        reply.ok_or_else(|| BrainError::Unavailable("no scripted reply left".to_string()))
    }

    fn name(&self) -> &str {
        "ScriptedBrain"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brain_core::ChatTurn;

    #[tokio::test]
    async fn test_replies_in_order_then_repeat_last() {
        let brain = ScriptedBrain::new(["one", "two"]);
        let prompt = Prompt::default();

        assert_eq!(brain.generate(&prompt).await.unwrap(), "one");
        assert_eq!(brain.generate(&prompt).await.unwrap(), "two");
        assert_eq!(brain.generate(&prompt).await.unwrap(), "two");
    }

    #[tokio::test]
    async fn test_empty_script_is_unavailable() {
        let brain = ScriptedBrain::default();
        let result = brain.generate(&Prompt::default()).await;
        assert!(matches!(result, Err(BrainError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_records_prompts() {
        let brain = ScriptedBrain::new(["ok"]);
        let prompt = Prompt::new("system", vec![ChatTurn::user("olá")]);
        brain.generate(&prompt).await.unwrap();

        let recorded = brain.last_prompt().await.unwrap();
        assert_eq!(recorded.system, "system");
        assert_eq!(recorded.last_user_text(), Some("olá"));
    }

    #[tokio::test]
    async fn test_push_reply() {
        let brain = ScriptedBrain::default();
        brain.push_reply("late").await;
        assert_eq!(brain.generate(&Prompt::default()).await.unwrap(), "late");
    }
}
