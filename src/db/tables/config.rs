use chrono::Utc;
use sqlx::PgPool;

use super::TableSetup;
use crate::db::{models::Config, DatabaseError};

pub(super) const SETUP: TableSetup = TableSetup {
    name: "config",
    create: "CREATE TABLE IF NOT EXISTS config (\
             bot_id BIGINT, \
             migrations TEXT [] NOT NULL DEFAULT '{}', \
             last_login TIMESTAMP NOT NULL, \
             PRIMARY KEY (bot_id))",
};

pub struct ConfigTable<'a> {
    pool: &'a PgPool,
}

impl<'a> ConfigTable<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Returns the row for `bot_id`, creating a fresh one first if there is none.
    pub async fn get(&self, bot_id: i64) -> Result<Config, DatabaseError> {
        sqlx::query(
            "INSERT INTO config (bot_id, migrations, last_login) VALUES ($1, '{}', $2) \
             ON CONFLICT (bot_id) DO NOTHING",
        )
        .bind(bot_id)
        .bind(Utc::now().naive_utc())
        .execute(self.pool)
        .await?;

        let config = sqlx::query_as::<_, Config>(
            "SELECT bot_id, migrations, last_login FROM config WHERE bot_id = $1",
        )
        .bind(bot_id)
        .fetch_one(self.pool)
        .await?;

        Ok(config)
    }

    pub async fn update(&self, record: &Config) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE config SET migrations = $1, last_login = $2 WHERE bot_id = $3")
            .bind(&record.migrations)
            .bind(record.last_login)
            .bind(record.bot_id)
            .execute(self.pool)
            .await?;

        Ok(())
    }
}

/// Records one applied migration. Run inside the migration's own transaction.
pub(crate) const APPEND_MIGRATION: &str =
    "UPDATE config SET migrations = array_append(migrations, $1) WHERE bot_id = $2";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migration_name_binds_before_bot_id() {
        assert!(APPEND_MIGRATION.contains("array_append(migrations, $1)"));
        assert!(APPEND_MIGRATION.ends_with("WHERE bot_id = $2"));
    }
}
