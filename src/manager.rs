use serenity::{
    http::Http,
    model::{
        application::{Command as RegisteredCommand, CommandInteraction},
        id::{ChannelId, CommandId},
    },
    prelude::*,
};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::sync::RwLock;

use crate::{
    config::Environment,
    constants::PAGINATOR_TIMEOUT,
    db::Database,
    error::CommandError,
    reporter::LogChannelReporter,
    views::{
        registry::SessionRegistry,
        session::PaginatorSession,
        targets::{Responder, ResponseTarget},
        Paginator,
    },
};

/// State shared by every event and command.
pub struct Manager {
    db: Database,
    env: Environment,
    sessions: SessionRegistry,
    command_ids: RwLock<HashMap<String, CommandId>>,
}

impl Manager {
    pub fn new(db: Database, env: Environment) -> Self {
        Self {
            db,
            env,
            sessions: SessionRegistry::new(),
            command_ids: RwLock::new(HashMap::new()),
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn reporter(&self, http: &Arc<Http>) -> Arc<LogChannelReporter> {
        Arc::new(LogChannelReporter::new(
            Arc::clone(http),
            ChannelId::new(self.env.log_channel),
        ))
    }

    pub async fn set_commands(&self, commands: &[RegisteredCommand]) {
        let mut ids = self.command_ids.write().await;
        ids.clear();
        ids.extend(commands.iter().map(|c| (c.name.clone(), c.id)));
    }

    /// A clickable mention of `/name`, or plain text before commands are registered.
    /// `name` may include a subcommand, as in `ticket create`.
    pub async fn mention(&self, name: &str) -> String {
        let root = name.split(' ').next().unwrap_or(name);
        match self.command_ids.read().await.get(root) {
            Some(id) => format!("</{}:{}>", name, id),
            None => format!("`/{}`", name),
        }
    }

    /// Sends `paginator` as the response to `command` and keeps it interactive.
    pub async fn paginate(
        &self,
        ctx: &Context,
        command: &CommandInteraction,
        paginator: Paginator,
    ) -> Result<(), CommandError> {
        let target = ResponseTarget::new(
            Arc::clone(&ctx.http),
            Responder::Command(command.clone()),
        );
        let session = PaginatorSession::new(
            paginator,
            Box::new(target),
            self.reporter(&ctx.http),
            Duration::from_secs(PAGINATOR_TIMEOUT),
        );
        self.sessions.start(session).await?;

        Ok(())
    }
}
