//! Database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A customer inquiry record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Lead {
    /// UUID assigned on insert.
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Where the lead came from (e.g., "whatsapp_bot", "site").
    pub source: String,
    /// Pipeline stage (e.g., "captado").
    pub current_stage: String,
    /// Free-text summary for humans.
    pub message: Option<String>,
    /// Property the customer showed interest in, if any.
    pub property_id: Option<String>,
    /// "venda" or "aluguel".
    pub preferred_type: Option<String>,
    pub preferred_category: Option<String>,
    pub preferred_city: Option<String>,
    pub preferred_bedrooms: Option<i64>,
    pub preferred_price_min: Option<f64>,
    pub preferred_price_max: Option<f64>,
    pub created_at: String,
}

/// Fields supplied when inserting a lead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewLead {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub source: String,
    pub current_stage: String,
    pub message: Option<String>,
    pub property_id: Option<String>,
    pub preferred_type: Option<String>,
    pub preferred_category: Option<String>,
    pub preferred_city: Option<String>,
    pub preferred_bedrooms: Option<i64>,
    pub preferred_price_min: Option<f64>,
    pub preferred_price_max: Option<f64>,
}

/// The current score of a lead (one row per lead).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct LeadScore {
    pub lead_id: String,
    /// Clamped to 0..=100.
    pub total_score: i64,
    pub profile_score: i64,
    pub engagement_score: i64,
    pub intent_score: i64,
    /// Reserved for property matching; always 0 for now.
    pub match_score: i64,
    /// "cold", "warm", "hot" or "very_hot".
    pub classification: String,
    /// RFC 3339 timestamp.
    pub last_calculated_at: String,
    /// JSON array of past calculations.
    pub score_history: String,
}

/// A follow-up work item attached to a lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: String,
    pub lead_id: String,
    pub title: String,
    pub description: Option<String>,
    pub task_type: String,
    pub priority: String,
    /// RFC 3339 timestamp.
    pub due_date: String,
    pub automated: bool,
    pub status: String,
    pub created_at: String,
}

/// Fields supplied when inserting a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub lead_id: String,
    pub title: String,
    pub description: Option<String>,
    pub task_type: String,
    pub priority: String,
    pub due_date: String,
    pub automated: bool,
}

/// A configured scoring rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct LeadScoreRule {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Named predicate tag (e.g., "has_phone").
    pub condition: String,
    /// "profile", "engagement" or "intent".
    pub category: String,
    /// Signed contribution when the condition holds.
    pub points: i64,
    /// Display order only.
    pub priority: i64,
    pub active: bool,
}

/// Fields supplied when inserting a scoring rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLeadScoreRule {
    pub name: String,
    pub description: Option<String>,
    pub condition: String,
    pub category: String,
    pub points: i64,
    pub priority: i64,
    pub active: bool,
}

/// A listing in the property catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Property {
    pub id: String,
    pub title: String,
    pub slug: String,
    /// "venda" or "aluguel".
    pub property_type: String,
    pub category: String,
    pub price: f64,
    pub bedrooms: Option<i64>,
    pub bathrooms: Option<i64>,
    pub area: Option<f64>,
    pub city: String,
    pub state: String,
    pub address: Option<String>,
    pub description: Option<String>,
    /// "disponivel" when the listing can be offered.
    pub status: String,
}

/// A configured conversational bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Bot {
    pub id: String,
    pub name: String,
    /// Replaces the default system prompt when set.
    pub system_prompt: Option<String>,
    /// Model override forwarded to the brain.
    pub ai_model: Option<String>,
    /// JSON array of channel names (e.g., `["whatsapp"]`).
    pub channels: String,
    pub active: bool,
    pub conversations_count: i64,
    pub leads_created_count: i64,
    pub created_at: String,
}

/// Fields supplied when inserting a bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBot {
    pub name: String,
    pub system_prompt: Option<String>,
    pub ai_model: Option<String>,
    pub channels: String,
    pub active: bool,
}

/// A stored conversation between a bot and one remote party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct BotSessionRecord {
    pub id: String,
    pub bot_id: String,
    pub channel: String,
    /// Opaque identifier of the remote party (e.g., phone number).
    pub channel_id: String,
    /// "active" or "closed".
    pub status: String,
    /// JSON array of transcript messages.
    pub messages: String,
    /// JSON object of accumulated context.
    pub context: String,
    pub lead_id: Option<String>,
    pub lead_created: bool,
    pub started_at: String,
    pub last_message_at: String,
}
