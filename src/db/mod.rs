pub mod migrations;
pub mod models;
pub mod tables;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{path::Path, time::Duration};
use thiserror::Error;
use tracing::info;

use self::{
    migrations::{MigrationError, MigrationScript, MigrationStore},
    models::Config,
    tables::{ConfigTable, TicketsTable, TABLES},
};

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("failed to connect to the database: {0}")]
    Connect(#[source] DatabaseError),
    #[error("failed to set up table {table}: {source}")]
    Table {
        table: &'static str,
        #[source]
        source: DatabaseError,
    },
    #[error(transparent)]
    Migration(#[from] MigrationError),
    #[error("failed to record login: {0}")]
    Login(#[source] DatabaseError),
}

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn connect(url: &str) -> Result<Self, DatabaseError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect(url)
            .await?;

        Ok(Self { pool })
    }

    /// Connects and brings the schema up to date: tables, then migrations, then the
    /// login timestamp. Any failure aborts the whole sequence.
    pub async fn setup(
        url: &str,
        bot_id: i64,
        migrations_dir: &Path,
    ) -> Result<Self, BootstrapError> {
        info!("Setting up the database...");
        let db = Self::connect(url).await.map_err(BootstrapError::Connect)?;

        db.setup_tables().await?;
        let scripts = migrations::discover(migrations_dir).await?;
        migrations::run(&db, bot_id, &scripts).await?;
        db.record_login(bot_id).await.map_err(BootstrapError::Login)?;

        info!("Connected to the database.");
        Ok(db)
    }

    async fn setup_tables(&self) -> Result<(), BootstrapError> {
        for table in TABLES {
            sqlx::query(table.create)
                .execute(&self.pool)
                .await
                .map_err(|why| BootstrapError::Table {
                    table: table.name,
                    source: why.into(),
                })?;
            info!(table = table.name, "Loaded table");
        }

        Ok(())
    }

    async fn record_login(&self, bot_id: i64) -> Result<(), DatabaseError> {
        let config = self.config();
        let mut record = config.get(bot_id).await?;
        record.last_login = Utc::now().naive_utc();
        config.update(&record).await
    }

    pub fn config(&self) -> ConfigTable<'_> {
        ConfigTable::new(&self.pool)
    }

    pub fn tickets(&self) -> TicketsTable<'_> {
        TicketsTable::new(&self.pool)
    }

    /// Round trip time of a trivial query.
    pub async fn ping(&self) -> Result<Duration, DatabaseError> {
        let start = std::time::Instant::now();
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(start.elapsed())
    }

    pub async fn close(&self) {
        info!("Closing the database connection...");
        self.pool.close().await;
    }
}

#[async_trait]
impl MigrationStore for Database {
    async fn load_config(&self, bot_id: i64) -> Result<Config, DatabaseError> {
        ConfigTable::new(&self.pool).get(bot_id).await
    }

    async fn apply(&self, bot_id: i64, script: &MigrationScript) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        // Plain-text execution, so a script may hold several statements
        sqlx::Executor::execute(&mut *tx, script.sql.as_str()).await?;
        sqlx::query(tables::APPEND_MIGRATION)
            .bind(&script.name)
            .bind(bot_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(())
    }
}
