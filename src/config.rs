use crate::constants::{BOT_ID, LOG_CHANNEL, MIGRATIONS_DIR};
use std::{env, num::NonZeroU64, path::PathBuf, str::FromStr};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    Missing(&'static str),
    #[error("Failed to convert {name} from {value:?}: {reason}")]
    Conversion {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Environment {
    pub token: String,
    pub pg_url: String,
    pub bot_id: i64,
    /// Commands are registered to this guild only when set.
    pub dev_guild: Option<u64>,
    pub log_channel: u64,
    pub migrations_dir: PathBuf,
}

impl Environment {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::Missing(name));

        Ok(Self {
            token: required("TOKEN")?,
            pg_url: required("PGURL")?,
            bot_id: parse(&lookup, "BOT_ID")?.unwrap_or(BOT_ID),
            dev_guild: parse::<NonZeroU64>(&lookup, "DEV_GUILD")?.map(NonZeroU64::get),
            log_channel: parse::<NonZeroU64>(&lookup, "LOG_CHANNEL")?
                .map_or(LOG_CHANNEL, NonZeroU64::get),
            migrations_dir: lookup("MIGRATIONS_DIR")
                .map_or_else(|| PathBuf::from(MIGRATIONS_DIR), PathBuf::from),
        })
    }
}

fn parse<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(name)
        .map(|value| {
            value.parse().map_err(|why: T::Err| ConfigError::Conversion {
                name,
                reason: why.to_string(),
                value,
            })
        })
        .transpose()
}
