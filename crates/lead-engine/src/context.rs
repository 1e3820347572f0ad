//! Accumulated customer context and the field-level merge.

use serde::{Deserialize, Serialize};

use crate::lenient;

/// How close the customer is to a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    High,
    Medium,
    Low,
}

impl Intent {
    /// Parse a tag case-insensitively.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

fn lenient_intent<'de, D>(deserializer: D) -> Result<Option<Intent>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(lenient::string(deserializer)?.and_then(|tag| Intent::parse(&tag)))
}

/// What the customer is looking for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    /// "venda" (sale) or "aluguel" (rental).
    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub listing_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "lenient::count", skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<u32>,
    #[serde(default, deserialize_with = "lenient::amount", skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::amount", skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
}

impl Preferences {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Everything learned about the customer so far.
///
/// Serialized with the camelCase names the model is asked to produce. The
/// older `userName`/`userEmail`/`userPhone` spellings are accepted as well.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotContext {
    #[serde(
        alias = "userName",
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub customer_name: Option<String>,
    #[serde(
        alias = "userEmail",
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub customer_email: Option<String>,
    #[serde(
        alias = "userPhone",
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub customer_phone: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::or_default",
        skip_serializing_if = "Preferences::is_empty"
    )]
    pub preferences: Preferences,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub interested_property_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_intent", skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
}

impl BotContext {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Merge the newest extraction into the accumulated context.
///
/// A field present (and non-blank) in `delta` replaces the previous value;
/// a field absent from `delta` keeps the previous value. Preferences merge
/// field by field under the same rule.
pub fn merge(previous: &BotContext, delta: &BotContext) -> BotContext {
    BotContext {
        customer_name: pick_text(&previous.customer_name, &delta.customer_name),
        customer_email: pick_text(&previous.customer_email, &delta.customer_email),
        customer_phone: pick_text(&previous.customer_phone, &delta.customer_phone),
        preferences: merge_preferences(&previous.preferences, &delta.preferences),
        interested_property_id: pick_text(
            &previous.interested_property_id,
            &delta.interested_property_id,
        ),
        intent: delta.intent.or(previous.intent),
    }
}

/// Field-by-field merge of two preference groups.
pub fn merge_preferences(previous: &Preferences, delta: &Preferences) -> Preferences {
    Preferences {
        listing_type: pick_text(&previous.listing_type, &delta.listing_type),
        category: pick_text(&previous.category, &delta.category),
        city: pick_text(&previous.city, &delta.city),
        bedrooms: delta.bedrooms.or(previous.bedrooms),
        max_price: delta.max_price.or(previous.max_price),
        min_price: delta.min_price.or(previous.min_price),
    }
}

fn pick_text(previous: &Option<String>, delta: &Option<String>) -> Option<String> {
    delta
        .as_deref()
        .and_then(lenient::non_blank)
        .or_else(|| previous.as_deref().and_then(lenient::non_blank))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ana() -> BotContext {
        BotContext {
            customer_name: Some("Ana".to_string()),
            customer_phone: Some("48999998888".to_string()),
            preferences: Preferences {
                category: Some("apartamento".to_string()),
                city: Some("Florianópolis".to_string()),
                max_price: Some(500000.0),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_merge_keeps_previous_when_delta_silent() {
        let delta = BotContext {
            preferences: Preferences {
                bedrooms: Some(2),
                ..Default::default()
            },
            ..Default::default()
        };

        let merged = merge(&ana(), &delta);
        assert_eq!(merged.customer_name.as_deref(), Some("Ana"));
        assert_eq!(merged.preferences.city.as_deref(), Some("Florianópolis"));
        assert_eq!(merged.preferences.max_price, Some(500000.0));
        assert_eq!(merged.preferences.bedrooms, Some(2));
    }

    #[test]
    fn test_merge_overrides_with_new_value() {
        let delta = BotContext {
            customer_name: Some("Ana Souza".to_string()),
            intent: Some(Intent::High),
            ..Default::default()
        };

        let merged = merge(&ana(), &delta);
        assert_eq!(merged.customer_name.as_deref(), Some("Ana Souza"));
        assert_eq!(merged.intent, Some(Intent::High));
    }

    #[test]
    fn test_blank_delta_does_not_clear() {
        let delta = BotContext {
            customer_name: Some("   ".to_string()),
            ..Default::default()
        };

        let merged = merge(&ana(), &delta);
        assert_eq!(merged.customer_name.as_deref(), Some("Ana"));
    }

    #[test]
    fn test_merge_with_empty_is_identity() {
        let merged = merge(&ana(), &BotContext::default());
        assert_eq!(merged, ana());
    }

    #[test]
    fn test_parse_model_context() {
        let json = r#"{
            "userName": "Ana",
            "customerPhone": 48999998888,
            "preferences": {"type": "venda", "bedrooms": "2", "maxPrice": "preço máximo se mencionado"},
            "intent": "HIGH"
        }"#;

        let context: BotContext = serde_json::from_str(json).unwrap();
        assert_eq!(context.customer_name.as_deref(), Some("Ana"));
        assert_eq!(context.customer_phone.as_deref(), Some("48999998888"));
        assert_eq!(context.preferences.listing_type.as_deref(), Some("venda"));
        assert_eq!(context.preferences.bedrooms, Some(2));
        assert!(context.preferences.max_price.is_none());
        assert_eq!(context.intent, Some(Intent::High));
    }

    #[test]
    fn test_parse_null_preferences() {
        let context: BotContext =
            serde_json::from_str(r#"{"preferences": null, "intent": "unsure"}"#).unwrap();
        assert!(context.is_empty());
    }

    #[test]
    fn test_serialize_skips_empty_fields() {
        let json = serde_json::to_string(&BotContext::default()).unwrap();
        assert_eq!(json, "{}");

        let json = serde_json::to_string(&ana()).unwrap();
        assert!(json.contains("\"customerName\":\"Ana\""));
        assert!(json.contains("\"maxPrice\":500000.0"));
        assert!(!json.contains("customerEmail"));
    }
}
