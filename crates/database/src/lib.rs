//! SQLite persistence layer for the lead capture bot.
//!
//! This crate provides async database operations for leads, scores, tasks,
//! scoring rules, the property catalog and bot sessions using SQLx with SQLite.
//!
//! # Example
//!
//! ```no_run
//! use database::{lead, models::NewLead, Database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:leads.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     // Create a lead
//!     let new_lead = NewLead {
//!         name: "Ana".to_string(),
//!         phone: Some("48999998888".to_string()),
//!         source: "whatsapp_bot".to_string(),
//!         current_stage: "captado".to_string(),
//!         ..Default::default()
//!     };
//!     let lead = lead::create_lead(db.pool(), &new_lead).await?;
//!     println!("created {}", lead.id);
//!
//!     Ok(())
//! }
//! ```

pub mod bot;
pub mod bot_session;
pub mod error;
pub mod lead;
pub mod lead_score;
pub mod models;
pub mod property;
pub mod rule;
pub mod seed;
pub mod task;

pub use error::{DatabaseError, Result};
pub use models::{
    Bot, BotSessionRecord, Lead, LeadScore, LeadScoreRule, NewBot, NewLead, NewLeadScoreRule,
    NewTask, Property, Task,
};
pub use seed::{seed_defaults, SeedReport, DEFAULT_BOT_NAME};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    const DEFAULT_POOL_SIZE: u32 = 10;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// let db = database::Database::connect("sqlite:data/leads.db?mode=rwc").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    ///
    /// In-memory databases (`sqlite::memory:`) are per connection, so use a
    /// pool size of 1 for them.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
pub(crate) async fn test_db() -> Database {
    let db = Database::connect_with_pool_size("sqlite::memory:", 1)
        .await
        .unwrap();
    db.migrate().await.unwrap();
    db
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrate_twice() {
        let db = test_db().await;
        db.migrate().await.unwrap();
        assert!(lead::list_leads(db.pool()).await.unwrap().is_empty());
    }
}
