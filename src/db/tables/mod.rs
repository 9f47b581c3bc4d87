mod config;
mod tickets;

pub(crate) use config::APPEND_MIGRATION;
pub use config::ConfigTable;
pub use tickets::TicketsTable;

/// One table's idempotent setup statement.
pub struct TableSetup {
    pub name: &'static str,
    pub create: &'static str,
}

/// Every table the bot owns, created in this order before migrations run.
pub const TABLES: &[TableSetup] = &[config::SETUP, tickets::SETUP];
