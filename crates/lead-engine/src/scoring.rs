//! Rule-based lead scoring.
//!
//! [`calculate`] is a pure function of a lead and a rule set.
//! [`ScoreCalculator`] loads both from a [`LeadStore`], persists the result
//! and keeps a bounded history of past calculations.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use database::{Lead, LeadScore, LeadScoreRule};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::store::LeadStore;

/// Maximum number of snapshots kept in a score's history.
pub const SCORE_HISTORY_LIMIT: usize = 50;

/// Lead sources that come from a conversational bot.
const BOT_SOURCES: &[&str] = &["chatbot", "whatsapp_bot"];

const URGENCY_WORDS: &[&str] = &["urgente", "rápido", "logo", "imediato", "agora"];

/// A named predicate over a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreCondition {
    HasPhone,
    HasEmail,
    /// Name, phone and email all present.
    ProfileComplete,
    /// A price bound or a category is set.
    HasPreferences,
    /// The lead came from a bot conversation.
    ChatbotInteraction,
    /// The lead references a property.
    ViewedProperty,
    AskedFinancing,
    HasUrgency,
}

impl ScoreCondition {
    /// Look up a condition by its rule tag. Unknown tags yield `None`.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "has_phone" => Some(Self::HasPhone),
            "has_email" => Some(Self::HasEmail),
            "profile_complete" => Some(Self::ProfileComplete),
            "has_preferences" => Some(Self::HasPreferences),
            "chatbot_interaction" => Some(Self::ChatbotInteraction),
            "viewed_property" => Some(Self::ViewedProperty),
            "asked_financing" => Some(Self::AskedFinancing),
            "has_urgency" => Some(Self::HasUrgency),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HasPhone => "has_phone",
            Self::HasEmail => "has_email",
            Self::ProfileComplete => "profile_complete",
            Self::HasPreferences => "has_preferences",
            Self::ChatbotInteraction => "chatbot_interaction",
            Self::ViewedProperty => "viewed_property",
            Self::AskedFinancing => "asked_financing",
            Self::HasUrgency => "has_urgency",
        }
    }

    /// Evaluate the predicate against a lead.
    pub fn applies(&self, lead: &Lead) -> bool {
        match self {
            Self::HasPhone => is_present(&lead.phone),
            Self::HasEmail => is_present(&lead.email),
            Self::ProfileComplete => {
                !lead.name.trim().is_empty() && is_present(&lead.phone) && is_present(&lead.email)
            }
            Self::HasPreferences => {
                lead.preferred_price_min.is_some()
                    || lead.preferred_price_max.is_some()
                    || is_present(&lead.preferred_category)
            }
            Self::ChatbotInteraction => BOT_SOURCES.contains(&lead.source.as_str()),
            Self::ViewedProperty => is_present(&lead.property_id),
            Self::AskedFinancing => message_mentions(lead, &["financiamento"]),
            Self::HasUrgency => message_mentions(lead, URGENCY_WORDS),
        }
    }
}

fn is_present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

fn message_mentions(lead: &Lead, words: &[&str]) -> bool {
    lead.message
        .as_deref()
        .map(str::to_lowercase)
        .is_some_and(|message| words.iter().any(|word| message.contains(word)))
}

/// Bucket a rule's points are added to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreCategory {
    Profile,
    Engagement,
    Intent,
    /// Counted in the total only.
    Other,
}

impl ScoreCategory {
    pub fn parse(tag: &str) -> Self {
        match tag {
            "profile" => Self::Profile,
            "engagement" => Self::Engagement,
            "intent" => Self::Intent,
            _ => Self::Other,
        }
    }
}

/// Temperature of a lead derived from its total score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Cold,
    Warm,
    Hot,
    VeryHot,
}

impl Classification {
    /// Classify a (clamped) total score.
    pub fn from_total(total: i64) -> Self {
        if total >= 80 {
            Self::VeryHot
        } else if total >= 60 {
            Self::Hot
        } else if total >= 40 {
            Self::Warm
        } else {
            Self::Cold
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cold => "cold",
            Self::Warm => "warm",
            Self::Hot => "hot",
            Self::VeryHot => "very_hot",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rule that contributed to a score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedRule {
    pub rule: String,
    pub points: i64,
    pub category: String,
}

/// Outcome of scoring one lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    /// Clamped to 0..=100.
    pub total_score: i64,
    pub profile_score: i64,
    pub engagement_score: i64,
    pub intent_score: i64,
    /// Reserved for property matching; always 0.
    pub match_score: i64,
    pub classification: Classification,
    pub applied_rules: Vec<AppliedRule>,
}

/// Score a lead against a rule set.
///
/// Every active rule is evaluated; priority only orders `applied_rules`.
/// Rules with an unknown condition never apply.
pub fn calculate(lead: &Lead, rules: &[LeadScoreRule]) -> ScoreResult {
    let mut total = 0i64;
    let mut profile = 0i64;
    let mut engagement = 0i64;
    let mut intent = 0i64;
    let mut applied_rules = Vec::new();

    for rule in rules.iter().filter(|r| r.active) {
        let Some(condition) = ScoreCondition::parse(&rule.condition) else {
            warn!(
                "Unknown score condition '{}' in rule '{}', skipping",
                rule.condition, rule.name
            );
            continue;
        };

        if !condition.applies(lead) {
            continue;
        }

        match ScoreCategory::parse(&rule.category) {
            ScoreCategory::Profile => profile = profile.saturating_add(rule.points),
            ScoreCategory::Engagement => engagement = engagement.saturating_add(rule.points),
            ScoreCategory::Intent => intent = intent.saturating_add(rule.points),
            ScoreCategory::Other => {}
        }
        total = total.saturating_add(rule.points);

        applied_rules.push(AppliedRule {
            rule: rule.name.clone(),
            points: rule.points,
            category: rule.category.clone(),
        });
    }

    let total_score = total.clamp(0, 100);

    ScoreResult {
        total_score,
        profile_score: profile,
        engagement_score: engagement,
        intent_score: intent,
        match_score: 0,
        classification: Classification::from_total(total_score),
        applied_rules,
    }
}

/// One entry of a lead's score history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSnapshot {
    pub date: String,
    #[serde(flatten)]
    pub result: ScoreResult,
}

/// Totals of a bulk recalculation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecalculationReport {
    pub scored: usize,
    pub failed: usize,
}

/// Loads leads and rules, scores, and persists.
pub struct ScoreCalculator<S> {
    store: Arc<S>,
}

impl<S> Clone for ScoreCalculator<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: LeadStore> ScoreCalculator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Score a lead and upsert its score row.
    pub async fn calculate(&self, lead_id: &str) -> Result<LeadScore, EngineError> {
        let lead = self
            .store
            .get_lead(lead_id)
            .await?
            .ok_or_else(|| EngineError::LeadNotFound(lead_id.to_string()))?;
        let rules = self.store.list_active_rules().await?;

        let result = calculate(&lead, &rules);
        let now = Utc::now().to_rfc3339();

        let mut history = match self.store.get_lead_score(lead_id).await? {
            Some(existing) => parse_history(&existing.score_history),
            None => Vec::new(),
        };
        history.push(ScoreSnapshot {
            date: now.clone(),
            result: result.clone(),
        });
        if history.len() > SCORE_HISTORY_LIMIT {
            let excess = history.len() - SCORE_HISTORY_LIMIT;
            history.drain(..excess);
        }

        let score = LeadScore {
            lead_id: lead_id.to_string(),
            total_score: result.total_score,
            profile_score: result.profile_score,
            engagement_score: result.engagement_score,
            intent_score: result.intent_score,
            match_score: result.match_score,
            classification: result.classification.as_str().to_string(),
            last_calculated_at: now,
            score_history: serde_json::to_string(&history)
                .map_err(crate::store::StoreError::from)?,
        };
        self.store.upsert_lead_score(&score).await?;

        info!(
            "Scored lead {}: {} ({}), {} rules applied",
            lead_id,
            score.total_score,
            score.classification,
            result.applied_rules.len()
        );

        Ok(score)
    }

    /// Rescore every lead. Failures are logged and counted.
    pub async fn recalculate_all(&self) -> Result<RecalculationReport, EngineError> {
        let leads = self.store.list_leads().await?;
        let mut report = RecalculationReport::default();

        for lead in leads {
            match self.calculate(&lead.id).await {
                Ok(_) => report.scored += 1,
                Err(e) => {
                    warn!("Failed to score lead {}: {}", lead.id, e);
                    report.failed += 1;
                }
            }
        }

        info!(
            "Recalculated scores: {} scored, {} failed",
            report.scored, report.failed
        );
        Ok(report)
    }
}

fn parse_history(raw: &str) -> Vec<ScoreSnapshot> {
    match serde_json::from_str(raw) {
        Ok(history) => history,
        Err(e) => {
            debug!("Discarding unreadable score history: {}", e);
            Vec::new()
        }
    }
}
