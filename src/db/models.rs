use chrono::NaiveDateTime;

/// Per-bot bookkeeping row.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Config {
    pub bot_id: i64,
    /// Names of applied migrations. Only ever appended to.
    pub migrations: Vec<String>,
    pub last_login: NaiveDateTime,
}

impl Config {
    pub fn is_applied(&self, name: &str) -> bool {
        self.migrations.iter().any(|m| m == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct TicketSystem {
    pub guild_id: i64,
    /// Channel holding the ticket panel.
    pub channel_id: i64,
    pub archive_channel_id: i64,
    /// Staff roles added to every ticket.
    pub roles: Vec<i64>,
}

impl TicketSystem {
    /// Adds `role` to the staff roles, or removes it if already there. Returns whether it
    /// was added.
    pub fn toggle_role(&mut self, role: i64) -> bool {
        match self.roles.iter().position(|r| *r == role) {
            Some(i) => {
                self.roles.remove(i);
                false
            }
            None => {
                self.roles.push(role);
                true
            }
        }
    }
}
