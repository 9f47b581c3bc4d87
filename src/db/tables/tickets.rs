use sqlx::PgPool;

use super::TableSetup;
use crate::db::{models::TicketSystem, DatabaseError};

pub(super) const SETUP: TableSetup = TableSetup {
    name: "tickets",
    create: "CREATE TABLE IF NOT EXISTS tickets (\
             guild_id BIGINT, \
             channel_id BIGINT NOT NULL, \
             archive_channel_id BIGINT NOT NULL, \
             roles BIGINT [] NOT NULL DEFAULT '{}', \
             PRIMARY KEY (guild_id))",
};

pub struct TicketsTable<'a> {
    pool: &'a PgPool,
}

impl<'a> TicketsTable<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, guild_id: i64) -> Result<Option<TicketSystem>, DatabaseError> {
        let system = sqlx::query_as::<_, TicketSystem>(
            "SELECT guild_id, channel_id, archive_channel_id, roles FROM tickets WHERE guild_id = $1",
        )
        .bind(guild_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(system)
    }

    pub async fn create(&self, system: &TicketSystem) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO tickets (guild_id, channel_id, archive_channel_id, roles) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(system.guild_id)
        .bind(system.channel_id)
        .bind(system.archive_channel_id)
        .bind(&system.roles)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    pub async fn update(&self, system: &TicketSystem) -> Result<(), DatabaseError> {
        sqlx::query(
            "UPDATE tickets SET channel_id = $1, archive_channel_id = $2, roles = $3 \
             WHERE guild_id = $4",
        )
        .bind(system.channel_id)
        .bind(system.archive_channel_id)
        .bind(&system.roles)
        .bind(system.guild_id)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Returns whether a row was removed.
    pub async fn delete(&self, guild_id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM tickets WHERE guild_id = $1")
            .bind(guild_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
