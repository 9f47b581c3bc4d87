#![warn(clippy::pedantic)]

mod ansi;
mod commands;
mod config;
mod constants;
mod db;
mod embeds;
mod error;
mod handler;
mod manager;
mod page;
mod reporter;
mod views;

use anyhow::Context as _;
use config::Environment;
use db::Database;
use dotenv::dotenv;
use handler::Handler;
use manager::Manager;
use serenity::prelude::*;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warden=info,serenity=warn")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let env = Environment::from_env().context("Invalid environment")?;
    let db = Database::setup(&env.pg_url, env.bot_id, &env.migrations_dir)
        .await
        .context("Failed to set up the database")?;

    let intents =
        GatewayIntents::GUILDS | GatewayIntents::GUILD_MEMBERS | GatewayIntents::GUILD_MESSAGES;
    let mut client = Client::builder(&env.token, intents)
        .event_handler(Handler::new(Manager::new(db.clone(), env)))
        .await
        .context("Error creating client")?;

    let shard_manager = Arc::clone(&client.shard_manager);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutting down...");
            shard_manager.shutdown_all().await;
        }
    });

    if let Err(why) = client.start().await {
        error!("Client error: {:?}", why);
    }
    db.close().await;

    Ok(())
}
