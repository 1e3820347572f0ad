//! Default scoring rules and bot.
//!
//! Seeding is idempotent: existing rules and bots (matched by name) are left
//! untouched.

use sqlx::SqlitePool;

use crate::models::{NewBot, NewLeadScoreRule};
use crate::{bot, rule, Result};

/// Name of the bot created by [`seed_defaults`].
pub const DEFAULT_BOT_NAME: &str = "Bot de Captação - WhatsApp";

const DEFAULT_BOT_PROMPT: &str = "Você é um assistente virtual especializado em imóveis.
Seu objetivo é ajudar clientes a encontrar o imóvel ideal e captar suas informações.

SEMPRE:
- Seja educado e prestativo
- Faça perguntas para entender as necessidades
- Capture: nome, telefone, faixa de preço, tipo de imóvel desejado
- Sugira imóveis do banco de dados quando possível

NUNCA:
- Invente imóveis que não existem
- Seja agressivo ou insistente
- Forneça informações falsas";

/// (name, description, condition, category, points)
const DEFAULT_RULES: &[(&str, &str, &str, &str, i64)] = &[
    ("Tem telefone", "Lead forneceu número de telefone", "has_phone", "profile", 10),
    ("Tem email", "Lead forneceu email", "has_email", "profile", 5),
    ("Perfil completo", "Lead tem nome, telefone E email", "profile_complete", "profile", 15),
    ("Preferências definidas", "Lead definiu faixa de preço e tipo de imóvel", "has_preferences", "profile", 10),
    ("Conversou no chatbot", "Lead interagiu com o chatbot", "chatbot_interaction", "engagement", 10),
    ("Múltiplas conversas", "Lead conversou mais de 3 vezes", "chatbot_interaction", "engagement", 10),
    ("Respondeu rapidamente", "Lead responde em menos de 5 minutos", "response_time", "engagement", 5),
    ("Clicou em imóvel", "Lead visualizou página de imóvel", "viewed_property", "engagement", 5),
    ("Pediu visita", "Lead solicitou agendamento de visita", "requested_visit", "intent", 15),
    ("Perguntou sobre financiamento", "Lead perguntou sobre opções de financiamento", "asked_financing", "intent", 10),
    ("Urgência mencionada", "Lead mencionou urgência (palavras: urgente, rápido, logo)", "has_urgency", "intent", 10),
    ("Interesse em múltiplos imóveis", "Lead demonstrou interesse em mais de um imóvel", "interested_properties", "intent", 5),
    ("Imóvel perfeito disponível", "Temos imóvel que atende 100% das preferências", "perfect_match", "match", 20),
    ("Bom match disponível", "Temos imóvel que atende 80%+ das preferências", "good_match", "match", 10),
];

/// Counts of records created by a seeding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub rules_created: usize,
    pub bot_created: bool,
}

/// Insert the default scoring rules and the default WhatsApp bot.
pub async fn seed_defaults(pool: &SqlitePool) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    for (index, (name, description, condition, category, points)) in
        DEFAULT_RULES.iter().enumerate()
    {
        if rule::find_rule_by_name(pool, name).await?.is_some() {
            continue;
        }

        rule::create_rule(
            pool,
            &NewLeadScoreRule {
                name: name.to_string(),
                description: Some(description.to_string()),
                condition: condition.to_string(),
                category: category.to_string(),
                points: *points,
                priority: index as i64 + 1,
                active: true,
            },
        )
        .await?;
        report.rules_created += 1;
    }

    if bot::find_bot_by_name(pool, DEFAULT_BOT_NAME).await?.is_none() {
        bot::create_bot(
            pool,
            &NewBot {
                name: DEFAULT_BOT_NAME.to_string(),
                system_prompt: Some(DEFAULT_BOT_PROMPT.to_string()),
                ai_model: None,
                channels: r#"["whatsapp"]"#.to_string(),
                active: true,
            },
        )
        .await?;
        report.bot_created = true;
    }

    tracing::info!(
        "Seed complete: {} rules created, bot created: {}",
        report.rules_created,
        report.bot_created
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_db;

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let db = test_db().await;

        let first = seed_defaults(db.pool()).await.unwrap();
        assert_eq!(first.rules_created, DEFAULT_RULES.len());
        assert!(first.bot_created);

        let second = seed_defaults(db.pool()).await.unwrap();
        assert_eq!(second, SeedReport::default());

        let rules = rule::list_active_rules(db.pool()).await.unwrap();
        assert_eq!(rules.len(), DEFAULT_RULES.len());
        assert_eq!(rules[0].condition, "has_phone");

        let bot = bot::find_active_bot(db.pool(), "whatsapp").await.unwrap().unwrap();
        assert_eq!(bot.name, DEFAULT_BOT_NAME);
        assert!(bot.system_prompt.is_some());
    }
}
