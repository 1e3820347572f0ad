//! One conversation turn: prompt, model call, parse, merge.
//!
//! The orchestrator never writes to a store. It returns the reply, the
//! merged context and the actions to dispatch.

use brain_core::{hash_prompt, Brain, ChatTurn, Prompt};
use database::Property;
use tracing::{debug, info, trace, warn};

use crate::actions::{BotAction, LeadDraft};
use crate::config::EngineConfig;
use crate::context::{merge, BotContext};
use crate::error::EngineError;
use crate::extract::{parse_model_reply, ModelReply};
use crate::prompt::build_turn_input;
use crate::session::BotSession;
use crate::store::BotProfile;

/// Result of processing one inbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// Text to send back to the customer.
    pub reply_text: String,
    /// Actions to dispatch, synthesized `create_lead` first.
    pub actions: Vec<BotAction>,
    /// Context after merging this turn's extraction.
    pub context: BotContext,
    /// False when the model reply was not a usable JSON object.
    pub parsed: bool,
}

/// Drives the language model for a conversation turn.
pub struct Orchestrator<B> {
    brain: B,
    config: EngineConfig,
}

impl<B: Brain> Orchestrator<B> {
    pub fn new(brain: B, config: EngineConfig) -> Self {
        info!(
            "Orchestrator using {} (default prompt fingerprint: {})",
            brain.name(),
            hash_prompt(&config.system_prompt)
        );
        Self { brain, config }
    }

    pub fn brain(&self) -> &B {
        &self.brain
    }

    /// Build the model request for a turn.
    ///
    /// Prior transcript messages become turns; the last user turn carries the
    /// history, context, catalog, new message and reply instructions.
    pub fn build_prompt(
        &self,
        bot: &BotProfile,
        session: &BotSession,
        inbound_text: &str,
        catalog: &[Property],
    ) -> Prompt {
        let system = bot
            .system_prompt
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(self.config.system_prompt.as_str());

        let mut turns: Vec<ChatTurn> = session.messages.iter().map(|m| m.to_turn()).collect();
        turns.push(ChatTurn::user(build_turn_input(
            &session.messages,
            &session.context,
            catalog,
            &self.config.site_url,
            inbound_text,
        )));

        let model = bot.ai_model.clone().filter(|m| !m.trim().is_empty());
        Prompt::new(system, turns).with_model(model)
    }

    /// Process one inbound message.
    ///
    /// Unparseable model output is recovered here: the raw text becomes the
    /// reply, the context is unchanged and no actions are returned. Model
    /// failures and timeouts are returned as errors.
    pub async fn process_turn(
        &self,
        bot: &BotProfile,
        session: &BotSession,
        inbound_text: &str,
        catalog: &[Property],
    ) -> Result<TurnOutcome, EngineError> {
        let prompt = self.build_prompt(bot, session, inbound_text, catalog);

        debug!(
            session = %session.session_id,
            prompt_fingerprint = %hash_prompt(&prompt.system),
            turns = prompt.turns.len(),
            catalog = catalog.len(),
            "Calling brain"
        );
        trace!(prompt = ?prompt, "BOT_PROMPT");

        let raw = tokio::time::timeout(self.config.llm_timeout, self.brain.generate(&prompt))
            .await
            .map_err(|_| EngineError::Timeout(self.config.llm_timeout))??;

        trace!(raw_response = %raw, "BOT_RAW_RESPONSE");

        match parse_model_reply(&raw) {
            Ok(reply) => Ok(self.assemble(session, reply)),
            Err(e) => {
                warn!(
                    session = %session.session_id,
                    error = %e,
                    "Model reply not parseable, using raw text"
                );
                Ok(TurnOutcome {
                    reply_text: raw.trim().to_string(),
                    actions: Vec::new(),
                    context: session.context.clone(),
                    parsed: false,
                })
            }
        }
    }

    fn assemble(&self, session: &BotSession, reply: ModelReply) -> TurnOutcome {
        let context = merge(&session.context, &reply.context);

        let mut actions = Vec::with_capacity(reply.actions.len() + 1);
        if reply.should_create_lead && !session.has_lead() {
            actions.push(synthesize_lead(&reply.context, session, &context));
        }
        actions.extend(reply.actions);

        info!(
            session = %session.session_id,
            actions = ?actions.iter().map(BotAction::kind).collect::<Vec<_>>(),
            "Turn processed"
        );

        TurnOutcome {
            reply_text: reply.message,
            actions,
            context,
            parsed: true,
        }
    }
}

/// Build the `create_lead` action for a turn.
///
/// Identity comes from this turn's extraction first, then the session's
/// context; the phone falls back to the channel ID.
fn synthesize_lead(fresh: &BotContext, session: &BotSession, merged: &BotContext) -> BotAction {
    let previous = &session.context;

    BotAction::CreateLead {
        data: LeadDraft {
            name: fresh
                .customer_name
                .clone()
                .or_else(|| previous.customer_name.clone()),
            email: fresh
                .customer_email
                .clone()
                .or_else(|| previous.customer_email.clone()),
            phone: fresh
                .customer_phone
                .clone()
                .or_else(|| previous.customer_phone.clone())
                .or_else(|| Some(session.channel_id.clone())),
            preferences: merged.preferences.clone(),
        },
    }
}
