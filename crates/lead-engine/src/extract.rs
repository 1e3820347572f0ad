//! Best-effort extraction of the structured model reply.
//!
//! The model is asked for a bare JSON object but may wrap it in prose or a
//! code fence. The first balanced `{...}` is extracted and parsed; fields
//! are validated individually so one bad action does not discard the reply.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::actions::BotAction;
use crate::context::BotContext;
use crate::lenient;

/// A parsed and validated model reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelReply {
    /// Text to show the customer.
    pub message: String,
    /// Fields newly identified in this turn.
    pub context: BotContext,
    pub actions: Vec<BotAction>,
    pub should_create_lead: bool,
}

/// Why a reply could not be extracted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("no JSON object found")]
    NoJsonObject,

    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("reply has no message")]
    MissingMessage,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReply {
    #[serde(default, deserialize_with = "lenient::string")]
    message: Option<String>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    context: BotContext,
    #[serde(default, deserialize_with = "lenient::or_default")]
    actions: Vec<Value>,
    #[serde(default, deserialize_with = "lenient::flag")]
    should_create_lead: bool,
}

/// Parse a raw model response into a [`ModelReply`].
pub fn parse_model_reply(raw: &str) -> Result<ModelReply, ExtractError> {
    let json = extract_json_object(raw).ok_or(ExtractError::NoJsonObject)?;

    let reply: RawReply =
        serde_json::from_str(json).map_err(|e| ExtractError::InvalidJson(e.to_string()))?;

    let message = reply.message.ok_or(ExtractError::MissingMessage)?;

    let actions = reply
        .actions
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<BotAction>(value.clone()) {
            Ok(action) => Some(action),
            Err(e) => {
                warn!(error = %e, action = %value, "Dropping invalid action");
                None
            }
        })
        .collect::<Vec<_>>();

    debug!(
        "Parsed model reply: {} actions, shouldCreateLead={}",
        actions.len(),
        reply.should_create_lead
    );

    Ok(ModelReply {
        message,
        context: reply.context,
        actions,
        should_create_lead: reply.should_create_lead,
    })
}

/// Find the first balanced JSON object in `response`.
///
/// Looks inside a ```json (or generic) code fence first, then anywhere in
/// the text. Returns `None` when no complete object exists.
pub fn extract_json_object(response: &str) -> Option<&str> {
    let trimmed = response.trim();

    if let Some(start) = trimmed.find("```json") {
        let body = &trimmed[start + 7..];
        if let Some(end) = body.find("```") {
            if let Some(json) = first_balanced_object(&body[..end]) {
                return Some(json);
            }
        }
    } else if let Some(start) = trimmed.find("```") {
        let after_backticks = &trimmed[start + 3..];
        // Skip optional language identifier
        let body_start = after_backticks.find('\n').map(|i| i + 1).unwrap_or(0);
        let body = &after_backticks[body_start..];
        if let Some(end) = body.find("```") {
            if let Some(json) = first_balanced_object(&body[..end]) {
                return Some(json);
            }
        }
    }

    first_balanced_object(trimmed)
}

fn first_balanced_object(s: &str) -> Option<&str> {
    let start = s.find('{')?;
    balanced_prefix(&s[start..])
}

/// The balanced object at the start of `s` (which begins with '{').
///
/// Braces inside string literals are ignored, so a trailing `}}` the model
/// sometimes emits is cut off.
fn balanced_prefix(s: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in s.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => {
                escape_next = true;
            }
            '"' => {
                in_string = !in_string;
            }
            '{' if !in_string => {
                depth += 1;
            }
            '}' if !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&s[..=i]);
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::PropertySelection;

    const ANA_REPLY: &str = r#"{
        "message": "Prazer, Ana! Tenho ótimas opções.",
        "context": {
            "customerName": "Ana",
            "customerPhone": "48999998888",
            "preferences": {"category": "apartamento", "city": "Florianópolis", "maxPrice": 500000}
        },
        "actions": [{"type": "send_properties", "data": {"propertyIds": ["p1"]}}],
        "shouldCreateLead": true
    }"#;

    #[test]
    fn test_extract_clean_object() {
        let input = r#"{"message": "oi"}"#;
        assert_eq!(extract_json_object(input), Some(input));
    }

    #[test]
    fn test_extract_with_surrounding_prose() {
        let input = r#"Claro! Aqui está: {"message": "oi"} Espero ter ajudado."#;
        assert_eq!(extract_json_object(input), Some(r#"{"message": "oi"}"#));
    }

    #[test]
    fn test_extract_trailing_braces() {
        let input = r#"{"message": "oi", "context": {}}}}"#;
        assert_eq!(
            extract_json_object(input),
            Some(r#"{"message": "oi", "context": {}}"#)
        );
    }

    #[test]
    fn test_extract_braces_in_strings() {
        let input = r#"{"message": "use {chaves} e \"aspas\"", "nested": {"k": "}"}}"#;
        assert_eq!(extract_json_object(input), Some(input));
    }

    #[test]
    fn test_extract_from_code_fence() {
        let input = "Segue:\n```json\n{\"message\": \"oi\"}\n```\n";
        assert_eq!(extract_json_object(input), Some(r#"{"message": "oi"}"#));

        let input = "```\n{\"message\": \"oi\"}\n```";
        assert_eq!(extract_json_object(input), Some(r#"{"message": "oi"}"#));
    }

    #[test]
    fn test_extract_none() {
        assert_eq!(extract_json_object("Olá, tudo bem?"), None);
        assert_eq!(extract_json_object(r#"{"message": "cortado"#), None);
    }

    #[test]
    fn test_parse_full_reply() {
        let reply = parse_model_reply(ANA_REPLY).unwrap();
        assert_eq!(reply.message, "Prazer, Ana! Tenho ótimas opções.");
        assert_eq!(reply.context.customer_name.as_deref(), Some("Ana"));
        assert_eq!(reply.context.preferences.max_price, Some(500000.0));
        assert!(reply.should_create_lead);
        assert_eq!(
            reply.actions,
            vec![BotAction::SendProperties {
                data: PropertySelection {
                    property_ids: vec!["p1".to_string()],
                },
            }]
        );
    }

    #[test]
    fn test_invalid_actions_are_dropped() {
        let raw = r#"{"message": "ok", "actions": [
            {"type": "schedule_visit"},
            "create_task",
            {"type": "calculate_score"}
        ]}"#;
        let reply = parse_model_reply(raw).unwrap();
        assert_eq!(reply.actions, vec![BotAction::CalculateScore]);
        assert!(!reply.should_create_lead);
    }

    #[test]
    fn test_malformed_sections_default() {
        let raw = r#"{"message": "ok", "context": "nada", "actions": null, "shouldCreateLead": "sim"}"#;
        let reply = parse_model_reply(raw).unwrap();
        assert!(reply.context.is_empty());
        assert!(reply.actions.is_empty());
        assert!(!reply.should_create_lead);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_model_reply("só texto"), Err(ExtractError::NoJsonObject));
        assert_eq!(
            parse_model_reply(r#"{"context": {}}"#),
            Err(ExtractError::MissingMessage)
        );
        assert!(matches!(
            parse_model_reply(r#"{"message": "oi",}"#),
            Err(ExtractError::InvalidJson(_))
        ));
    }
}
