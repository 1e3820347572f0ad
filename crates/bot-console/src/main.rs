//! Console front end for the lead capture bot.
//!
//! `chat` runs the same turn pipeline as the WhatsApp webhook, reading
//! customer messages from stdin. `rescore` recalculates every lead score and
//! `seed` installs the default rule set and bot.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use claude_brain::ClaudeBrain;
use database::Database;
use lead_engine::{BotEngine, BotService, EngineConfig, ScoreCalculator, SqliteStore};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_DATABASE_URL: &str = "sqlite:leads.db?mode=rwc";

#[derive(Debug, Parser)]
#[command(name = "bot-console")]
#[command(about = "Chat with the lead capture bot and maintain lead scores")]
struct Args {
    /// SQLite connection string
    #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Talk to the active bot, one customer message per line
    Chat {
        /// Customer identifier on the channel (phone number for WhatsApp)
        #[arg(long, default_value = "console")]
        channel_id: String,

        /// Channel the bot must be enabled for
        #[arg(long, default_value = "whatsapp")]
        channel: String,
    },

    /// Recalculate the score of every lead
    Rescore,

    /// Insert the default scoring rules and bot when missing
    Seed,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    // stdout carries the conversation, logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let db = Database::connect(&args.database_url).await?;
    db.migrate().await?;
    info!(url = %args.database_url, "Database ready");

    match args.command {
        Command::Chat {
            channel_id,
            channel,
        } => chat(db, &channel, &channel_id).await?,
        Command::Rescore => rescore(db).await?,
        Command::Seed => seed(db).await?,
    }

    Ok(())
}

async fn chat(
    db: Database,
    channel: &str,
    channel_id: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let brain = ClaudeBrain::from_env()?;
    let store = Arc::new(SqliteStore::with_channel(db, channel));
    let engine = BotEngine::new(brain, store, EngineConfig::from_env());
    let service = BotService::new(engine);

    info!(channel, channel_id, "Chat started, Ctrl-D to quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }

        match service.receive(channel_id, text).await {
            Ok(reply) => {
                stdout
                    .write_all(format!("bot> {}\n", reply.reply_text).as_bytes())
                    .await?;
                if !reply.property_ids.is_empty() {
                    stdout
                        .write_all(
                            format!("     [imóveis: {}]\n", reply.property_ids.join(", "))
                                .as_bytes(),
                        )
                        .await?;
                }
                if reply.lead_created {
                    info!(
                        lead_id = reply.session.lead_id.as_deref().unwrap_or_default(),
                        "Lead captured"
                    );
                }
                stdout.flush().await?;
            }
            Err(e) => warn!("Turn failed: {}", e),
        }
    }

    Ok(())
}

async fn rescore(db: Database) -> Result<(), Box<dyn std::error::Error>> {
    let calculator = ScoreCalculator::new(Arc::new(SqliteStore::new(db)));
    let report = calculator.recalculate_all().await?;
    info!(
        scored = report.scored,
        failed = report.failed,
        "Recalculation finished"
    );
    Ok(())
}

async fn seed(db: Database) -> Result<(), Box<dyn std::error::Error>> {
    let report = database::seed_defaults(db.pool()).await?;
    info!(
        rules_created = report.rules_created,
        bot_created = report.bot_created,
        "Seed finished"
    );
    Ok(())
}
