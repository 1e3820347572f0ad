//! Side-effecting actions declared by the model or synthesized per turn.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::context::Preferences;
use crate::lenient;

/// A single action for the [`ActionDispatcher`](crate::ActionDispatcher).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BotAction {
    /// Persist a lead for this session (at most once).
    CreateLead {
        #[serde(default, deserialize_with = "lenient::or_default")]
        data: LeadDraft,
    },

    /// Attach a follow-up task to the session's lead.
    CreateTask {
        #[serde(default, deserialize_with = "lenient::or_default")]
        data: TaskDraft,
    },

    /// Show catalog entries to the customer. Nothing is persisted.
    SendProperties {
        #[serde(default, deserialize_with = "lenient::or_default")]
        data: PropertySelection,
    },

    /// Recalculate the score of the session's lead.
    CalculateScore,
}

impl BotAction {
    /// Wire tag of the action.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreateLead { .. } => "create_lead",
            Self::CreateTask { .. } => "create_task",
            Self::SendProperties { .. } => "send_properties",
            Self::CalculateScore => "calculate_score",
        }
    }

    /// Convenience constructor for a task with all defaults.
    pub fn follow_up_task() -> Self {
        Self::CreateTask {
            data: TaskDraft::default(),
        }
    }
}

/// Identity and preferences of a lead about to be created.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeadDraft {
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::or_default",
        skip_serializing_if = "Preferences::is_empty"
    )]
    pub preferences: Preferences,
}

/// Optional overrides for a follow-up task; missing fields take defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub task_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "lenient_date", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
}

fn lenient_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient::string(deserializer)?
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|d| d.with_timezone(&Utc)))
}

/// Catalog entries picked by the model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySelection {
    #[serde(rename = "propertyIds", default, deserialize_with = "lenient::id_list")]
    pub property_ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_send_properties() {
        let json = r#"{"type": "send_properties", "data": {"propertyIds": ["p1", "p2"]}}"#;
        let action: BotAction = serde_json::from_str(json).unwrap();
        assert_eq!(
            action,
            BotAction::SendProperties {
                data: PropertySelection {
                    property_ids: vec!["p1".to_string(), "p2".to_string()],
                },
            }
        );
    }

    #[test]
    fn test_parse_create_task_without_data() {
        let action: BotAction = serde_json::from_str(r#"{"type": "create_task"}"#).unwrap();
        assert_eq!(action, BotAction::follow_up_task());

        let action: BotAction =
            serde_json::from_str(r#"{"type": "create_task", "data": null}"#).unwrap();
        assert_eq!(action, BotAction::follow_up_task());
    }

    #[test]
    fn test_parse_create_task_with_overrides() {
        let json = r#"{"type": "create_task", "data": {
            "title": "Agendar visita",
            "type": "visit",
            "priority": "high",
            "dueDate": "2030-05-01T14:00:00Z"
        }}"#;

        let action: BotAction = serde_json::from_str(json).unwrap();
        let BotAction::CreateTask { data } = action else {
            panic!("Expected CreateTask action");
        };
        assert_eq!(data.title.as_deref(), Some("Agendar visita"));
        assert_eq!(data.task_type.as_deref(), Some("visit"));
        assert_eq!(data.priority.as_deref(), Some("high"));
        assert_eq!(
            data.due_date.map(|d| d.to_rfc3339()),
            Some("2030-05-01T14:00:00+00:00".to_string())
        );
    }

    #[test]
    fn test_unparseable_due_date_is_dropped() {
        let json = r#"{"type": "create_task", "data": {"dueDate": "amanhã"}}"#;
        let action: BotAction = serde_json::from_str(json).unwrap();
        assert_eq!(action, BotAction::follow_up_task());
    }

    #[test]
    fn test_parse_calculate_score_ignores_data() {
        let json = r#"{"type": "calculate_score", "data": {"leadId": "x"}}"#;
        let action: BotAction = serde_json::from_str(json).unwrap();
        assert_eq!(action, BotAction::CalculateScore);
    }

    #[test]
    fn test_unknown_action_is_an_error() {
        let result = serde_json::from_str::<BotAction>(r#"{"type": "schedule_visit"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_tag() {
        let json = serde_json::to_string(&BotAction::CalculateScore).unwrap();
        assert_eq!(json, r#"{"type":"calculate_score"}"#);
        assert_eq!(BotAction::follow_up_task().kind(), "create_task");
    }
}
