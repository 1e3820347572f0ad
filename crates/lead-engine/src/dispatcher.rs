//! Executes the actions of a turn against the lead store.

use std::sync::Arc;

use chrono::{Duration, Utc};
use database::{NewLead, NewTask};
use tracing::{debug, info, warn};

use crate::actions::{BotAction, LeadDraft, TaskDraft};
use crate::config::DEFAULT_TASK_DUE_HOURS;
use crate::context::{merge_preferences, BotContext};
use crate::error::EngineError;
use crate::scoring::ScoreCalculator;
use crate::session::BotSession;
use crate::store::LeadStore;

/// Source tag of leads captured by the bot.
pub const LEAD_SOURCE: &str = "whatsapp_bot";

/// Pipeline stage of a freshly captured lead.
pub const INITIAL_STAGE: &str = "captado";

/// Name used when the customer never gave one.
pub const DEFAULT_LEAD_NAME: &str = "Cliente Bot";

pub const DEFAULT_TASK_TITLE: &str = "Contatar lead do WhatsApp";
pub const DEFAULT_TASK_TYPE: &str = "follow_up";
pub const DEFAULT_TASK_PRIORITY: &str = "medium";

/// What a dispatch did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// The session's lead, existing or created by this dispatch.
    pub lead_id: Option<String>,
    /// True when this dispatch created the lead.
    pub lead_created: bool,
    pub tasks_created: usize,
    /// Tasks whose write failed; the lead link is kept regardless.
    pub tasks_failed: usize,
    /// Catalog entries selected by `send_properties`, in order, without duplicates.
    pub property_ids: Vec<String>,
}

/// Runs actions in order with per-session idempotency for lead creation.
pub struct ActionDispatcher<S> {
    store: Arc<S>,
    scorer: ScoreCalculator<S>,
    task_due: Duration,
}

impl<S: LeadStore> ActionDispatcher<S> {
    /// An out-of-range `task_due_hours` falls back to the default offset.
    pub fn new(store: Arc<S>, task_due_hours: i64) -> Self {
        let task_due = Duration::try_hours(task_due_hours).unwrap_or_else(|| {
            warn!("Task due offset of {} hours is out of range", task_due_hours);
            Duration::hours(DEFAULT_TASK_DUE_HOURS)
        });

        Self {
            scorer: ScoreCalculator::new(store.clone()),
            store,
            task_due,
        }
    }

    pub fn scorer(&self) -> &ScoreCalculator<S> {
        &self.scorer
    }

    /// Execute `actions` for `session`, using the merged `context`.
    ///
    /// A store failure while creating the lead is returned. Once the session
    /// has a lead, task and scoring failures are logged and counted instead,
    /// so the caller always gets the lead back to persist on the session.
    pub async fn execute(
        &self,
        actions: &[BotAction],
        session: &BotSession,
        context: &BotContext,
    ) -> Result<DispatchOutcome, EngineError> {
        let mut outcome = DispatchOutcome {
            lead_id: session.lead_id.clone(),
            ..Default::default()
        };

        for action in actions {
            match action {
                BotAction::CreateLead { data } => {
                    if let Some(lead_id) = &outcome.lead_id {
                        debug!("Session {} already has lead {}", session.session_id, lead_id);
                        continue;
                    }

                    let lead_id = self.create_lead(data, session, context).await?;
                    outcome.lead_id = Some(lead_id.clone());
                    outcome.lead_created = true;
                    self.score_best_effort(&lead_id).await;
                }

                BotAction::CreateTask { data } => {
                    let Some(lead_id) = &outcome.lead_id else {
                        warn!(
                            "Skipping create_task for session {}: no lead",
                            session.session_id
                        );
                        continue;
                    };

                    match self.create_task(data, lead_id).await {
                        Ok(()) => outcome.tasks_created += 1,
                        Err(e) => {
                            warn!("Failed to create task for lead {}: {}", lead_id, e);
                            outcome.tasks_failed += 1;
                        }
                    }
                }

                BotAction::SendProperties { data } => {
                    for id in &data.property_ids {
                        if !outcome.property_ids.contains(id) {
                            outcome.property_ids.push(id.clone());
                        }
                    }
                }

                BotAction::CalculateScore => match &outcome.lead_id {
                    Some(lead_id) => self.score_best_effort(lead_id).await,
                    None => debug!(
                        "Skipping calculate_score for session {}: no lead",
                        session.session_id
                    ),
                },
            }
        }

        Ok(outcome)
    }

    async fn create_lead(
        &self,
        data: &LeadDraft,
        session: &BotSession,
        context: &BotContext,
    ) -> Result<String, EngineError> {
        let preferences = merge_preferences(&context.preferences, &data.preferences);
        let preferences_json =
            serde_json::to_string_pretty(&preferences).unwrap_or_else(|_| "{}".to_string());

        let new_lead = NewLead {
            name: data
                .name
                .clone()
                .or_else(|| context.customer_name.clone())
                .unwrap_or_else(|| DEFAULT_LEAD_NAME.to_string()),
            email: data.email.clone().or_else(|| context.customer_email.clone()),
            phone: data
                .phone
                .clone()
                .or_else(|| context.customer_phone.clone())
                .or_else(|| Some(session.channel_id.clone())),
            source: LEAD_SOURCE.to_string(),
            current_stage: INITIAL_STAGE.to_string(),
            message: Some(format!(
                "Lead capturado via Bot WhatsApp\n\nPreferências:\n{}",
                preferences_json
            )),
            property_id: context.interested_property_id.clone(),
            preferred_type: preferences.listing_type.clone(),
            preferred_category: preferences.category.clone(),
            preferred_city: preferences.city.clone(),
            preferred_bedrooms: preferences.bedrooms.map(i64::from),
            preferred_price_min: preferences.min_price,
            preferred_price_max: preferences.max_price,
        };

        let lead = self.store.create_lead(&new_lead).await?;
        info!(
            "Created lead {} ({}) for session {}",
            lead.id, lead.name, session.session_id
        );
        Ok(lead.id)
    }

    async fn create_task(&self, data: &TaskDraft, lead_id: &str) -> Result<(), EngineError> {
        let due_date = data.due_date.unwrap_or_else(|| {
            let now = Utc::now();
            now.checked_add_signed(self.task_due)
                .or_else(|| now.checked_add_signed(Duration::hours(DEFAULT_TASK_DUE_HOURS)))
                .unwrap_or(now)
        });

        let new_task = NewTask {
            lead_id: lead_id.to_string(),
            title: data
                .title
                .clone()
                .unwrap_or_else(|| DEFAULT_TASK_TITLE.to_string()),
            description: data.description.clone(),
            task_type: data
                .task_type
                .clone()
                .unwrap_or_else(|| DEFAULT_TASK_TYPE.to_string()),
            priority: data
                .priority
                .clone()
                .unwrap_or_else(|| DEFAULT_TASK_PRIORITY.to_string()),
            due_date: due_date.to_rfc3339(),
            automated: true,
        };

        let task = self.store.create_task(&new_task).await?;
        info!("Created task {} for lead {}", task.id, lead_id);
        Ok(())
    }

    async fn score_best_effort(&self, lead_id: &str) {
        if let Err(e) = self.scorer.calculate(lead_id).await {
            warn!("Failed to score lead {}: {}", lead_id, e);
        }
    }
}
