pub const BOT_ID: i64 = 925_605_671_997_681_674;
pub const LOG_CHANNEL: u64 = 1_085_144_172_064_948_285;

pub const INVITE: &str = "rGM9tDxR6Y";
pub const WEBSITE: &str = "https://example.com";
pub const GITHUB: &str = "https://github.com/";

pub const MIGRATIONS_DIR: &str = "migrations";

pub const TIPS: &[&str] = &["Add some cool tips here!"];

pub const ERROR_TITLES: &[&str] = &[
    "Oops! Something went wrong.",
    "Oh no! An error occurred.",
    "Sorry, an error occurred.",
    "Whoops, there was a problem.",
    "Oof, an error has occurred.",
    "Yikes, something went wrong.",
    "Bummer, there was a problem.",
    "Shoot, something went wrong.",
];

/// Seconds a paginator stays interactive without input.
pub const PAGINATOR_TIMEOUT: u64 = 180;

/// Seconds between presence updates.
pub const PRESENCE_INTERVAL: u64 = 10;

/// Whether guilds failing the spam thresholds are left on join.
pub const SPAM_CHECK: bool = false;
/// Guilds below this member count are treated as spam.
pub const SPAM_THRESHOLD: usize = 20;
/// Guilds where bots make up at least this share are treated as spam.
pub const SPAM_BOT_THRESHOLD: f64 = 0.5;

pub mod colors {
    pub const RED: u32 = 0xe7_4c_3c;
    pub const GREEN: u32 = 0x2e_cc_71;
    pub const BLUE: u32 = 0x34_98_db;
    pub const YELLOW: u32 = 0xf1_c4_0f;
}

pub mod emojis {
    pub const FIRST: &str = "⏮️";
    pub const PREVIOUS: &str = "◀️";
    pub const STOP: &str = "🗑️";
    pub const NEXT: &str = "▶️";
    pub const LAST: &str = "⏭️";
    pub const UNKNOWN: &str = "❓";

    /// Emoji shown next to a help category in the select menu.
    pub fn category(name: &str) -> &'static str {
        match name {
            "Home" => "🏠",
            "Utility" => "🛠️",
            "Tickets" => "🎫",
            _ => UNKNOWN,
        }
    }
}
