//! Prompt assembly for the conversation model.

use std::env;
use std::path::Path;

use database::Property;
use tracing::info;

use crate::context::BotContext;
use crate::session::{BotMessage, MessageRole};

/// Default path for the bot prompt file.
pub const DEFAULT_BOT_PROMPT_FILE: &str = "BOT_PROMPT.md";

/// Default bot system prompt (fallback if no env var or file).
pub const DEFAULT_BOT_SYSTEM_PROMPT: &str = r#"Você é um assistente virtual de vendas imobiliárias.

SEU OBJETIVO:
- Ajudar o cliente a encontrar o imóvel ideal
- Capturar informações: nome, telefone, email, preferências
- Qualificar o lead (intenção de compra)

REGRAS:
1. NUNCA invente imóveis que não estão na lista
2. SEMPRE sugira até 3 imóveis que correspondam às preferências
3. Se não houver imóveis adequados, seja honesto e pergunte se quer ver opções similares
4. Quando cliente demonstrar interesse forte, peça nome e email
5. Seja amigável mas profissional"#;

/// Reply contract appended to every turn.
pub const RESPONSE_FORMAT_INSTRUCTIONS: &str = r#"INSTRUÇÕES:
Analise a mensagem e responda ao cliente de forma natural.
Use somente imóveis da lista acima e cite-os pelo ID.

Retorne APENAS um JSON válido neste formato exato:
{
  "message": "sua resposta completa ao cliente aqui",
  "context": {
    "customerName": "nome se fornecido",
    "customerEmail": "email se fornecido",
    "customerPhone": "telefone se fornecido",
    "preferences": {
      "type": "venda ou aluguel se mencionado",
      "category": "apartamento/casa/etc se mencionado",
      "city": "cidade se mencionada",
      "bedrooms": numero_quartos_se_mencionado,
      "maxPrice": preco_maximo_se_mencionado,
      "minPrice": preco_minimo_se_mencionado
    },
    "interestedPropertyId": "id do imóvel se cliente demonstrou interesse específico",
    "intent": "high se cliente quer visitar/comprar, medium se está pesquisando, low se só perguntando"
  },
  "actions": [
    {"type": "send_properties", "data": {"propertyIds": ["id1", "id2"]}}
  ],
  "shouldCreateLead": true ou false (true se tem nome E (telefone OU email))
}

Inclua em "context" apenas o que foi identificado nesta mensagem.

IMPORTANTE: Retorne APENAS o JSON, sem texto adicional antes ou depois."#;

/// Load the default bot system prompt.
///
/// Priority:
/// 1. `BOT_SYSTEM_PROMPT` env var (if set)
/// 2. Contents of prompt file (`BOT_PROMPT_FILE` or default `BOT_PROMPT.md`)
/// 3. Embedded default prompt
pub fn load_system_prompt() -> String {
    if let Ok(prompt) = env::var("BOT_SYSTEM_PROMPT") {
        if !prompt.trim().is_empty() {
            info!("Using bot prompt from BOT_SYSTEM_PROMPT env var");
            return prompt;
        }
    }

    let prompt_file =
        env::var("BOT_PROMPT_FILE").unwrap_or_else(|_| DEFAULT_BOT_PROMPT_FILE.to_string());

    if let Some(prompt) = load_prompt_file(&prompt_file) {
        info!("Loaded bot prompt from {}", prompt_file);
        return prompt;
    }

    info!("Using embedded default bot prompt");
    DEFAULT_BOT_SYSTEM_PROMPT.to_string()
}

/// Load a prompt from a file path.
///
/// Returns `Some(content)` if the file exists and is not blank.
fn load_prompt_file(path: impl AsRef<Path>) -> Option<String> {
    let content = std::fs::read_to_string(path.as_ref()).ok()?;
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Format a price the way Brazilian customers read it: `500.000`, `1.234,5`.
pub fn format_brl(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    if fraction != 0 {
        let decimals = format!("{:02}", fraction);
        grouped.push(',');
        grouped.push_str(decimals.trim_end_matches('0'));
    }

    if value < 0.0 && cents > 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

fn or_na<T: ToString>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

/// Render the catalog as a numbered list.
pub fn format_catalog(properties: &[Property], site_url: &str) -> String {
    if properties.is_empty() {
        return "Nenhum imóvel disponível no momento.".to_string();
    }

    let base = site_url.trim_end_matches('/');

    properties
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let kind = if p.property_type == "venda" {
                "Venda"
            } else {
                "Aluguel"
            };
            format!(
                "{}. {}\n   - ID: {}\n   - Tipo: {}\n   - Categoria: {}\n   - Preço: R$ {}\n   - Quartos: {}\n   - Banheiros: {}\n   - Área: {} m²\n   - Localização: {} - {}\n   - Link: {}/imovel/{}",
                i + 1,
                p.title,
                p.id,
                kind,
                p.category,
                format_brl(p.price),
                or_na(p.bedrooms),
                or_na(p.bathrooms),
                or_na(p.area),
                p.city,
                p.state,
                base,
                p.slug
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Render the transcript with speaker labels.
pub fn format_history(messages: &[BotMessage]) -> String {
    if messages.is_empty() {
        return "(nenhuma mensagem anterior)".to_string();
    }

    messages
        .iter()
        .map(|m| {
            let speaker = match m.role {
                MessageRole::Customer => "CLIENTE",
                MessageRole::Assistant => "BOT",
            };
            format!("{}: {}", speaker, m.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the final user turn: history, context, catalog, new message and
/// the reply contract.
pub fn build_turn_input(
    messages: &[BotMessage],
    context: &BotContext,
    catalog: &[Property],
    site_url: &str,
    inbound_text: &str,
) -> String {
    let context_json = serde_json::to_string_pretty(context).unwrap_or_else(|_| "{}".to_string());

    format!(
        "HISTÓRICO DA CONVERSA:\n{}\n\nCONTEXTO ATUAL:\n{}\n\nIMÓVEIS DISPONÍVEIS:\n{}\n\nNOVA MENSAGEM DO CLIENTE:\n\"{}\"\n\n{}",
        format_history(messages),
        context_json,
        format_catalog(catalog, site_url),
        inbound_text,
        RESPONSE_FORMAT_INSTRUCTIONS
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn property() -> Property {
        Property {
            id: "p1".to_string(),
            title: "Apartamento no Centro".to_string(),
            slug: "apartamento-no-centro".to_string(),
            property_type: "venda".to_string(),
            category: "apartamento".to_string(),
            price: 450000.0,
            bedrooms: Some(2),
            bathrooms: None,
            area: Some(70.5),
            city: "Florianópolis".to_string(),
            state: "SC".to_string(),
            address: None,
            description: None,
            status: "disponivel".to_string(),
        }
    }

    #[test]
    fn test_format_brl() {
        assert_eq!(format_brl(500000.0), "500.000");
        assert_eq!(format_brl(1234.5), "1.234,5");
        assert_eq!(format_brl(999.0), "999");
        assert_eq!(format_brl(1500.25), "1.500,25");
        assert_eq!(format_brl(1_000_000.0), "1.000.000");
        assert_eq!(format_brl(0.0), "0");
        assert_eq!(format_brl(-2500.0), "-2.500");
    }

    #[test]
    fn test_format_catalog_entry() {
        let text = format_catalog(&[property()], "https://imobiliaria.com.br/");
        assert_eq!(
            text,
            "1. Apartamento no Centro\n   - ID: p1\n   - Tipo: Venda\n   - Categoria: apartamento\n   - Preço: R$ 450.000\n   - Quartos: 2\n   - Banheiros: N/A\n   - Área: 70.5 m²\n   - Localização: Florianópolis - SC\n   - Link: https://imobiliaria.com.br/imovel/apartamento-no-centro"
        );
    }

    #[test]
    fn test_rental_label() {
        let mut rental = property();
        rental.property_type = "aluguel".to_string();
        assert!(format_catalog(&[rental], "https://x").contains("Tipo: Aluguel"));
    }

    #[test]
    fn test_empty_catalog_and_history() {
        assert_eq!(format_catalog(&[], "https://x"), "Nenhum imóvel disponível no momento.");
        assert_eq!(format_history(&[]), "(nenhuma mensagem anterior)");
    }

    #[test]
    fn test_format_history_labels() {
        let history = vec![BotMessage::customer("Oi"), BotMessage::assistant("Olá!")];
        assert_eq!(format_history(&history), "CLIENTE: Oi\nBOT: Olá!");
    }

    #[test]
    fn test_build_turn_input_sections() {
        let context = BotContext {
            customer_name: Some("Ana".to_string()),
            ..Default::default()
        };
        let input = build_turn_input(&[], &context, &[property()], "https://x", "quero 2 quartos");

        assert!(input.starts_with("HISTÓRICO DA CONVERSA:\n(nenhuma mensagem anterior)"));
        assert!(input.contains("\"customerName\": \"Ana\""));
        assert!(input.contains("1. Apartamento no Centro"));
        assert!(input.contains("NOVA MENSAGEM DO CLIENTE:\n\"quero 2 quartos\""));
        assert!(input.ends_with(RESPONSE_FORMAT_INSTRUCTIONS));
    }

    #[test]
    fn test_load_prompt_file_missing() {
        assert!(load_prompt_file("/nonexistent/BOT_PROMPT.md").is_none());
    }
}
