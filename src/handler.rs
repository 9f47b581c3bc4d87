use crate::{
    commands,
    constants::{PRESENCE_INTERVAL, SPAM_CHECK},
    embeds::{self, GuildSummary},
    error::CommandError,
    manager::Manager,
    page::Page,
    views::{
        link_row,
        registry::parse_custom_id,
        targets::{Responder, ResponseTarget},
        ticket::{self, TicketAction},
        Action, EXPIRED,
    },
};
use serenity::{
    async_trait,
    builder::{
        CreateInteractionResponse, CreateInteractionResponseFollowup,
        CreateInteractionResponseMessage, CreateMessage, EditInteractionResponse,
    },
    gateway::ActivityData,
    model::{
        application::{Command, ComponentInteraction, ComponentInteractionDataKind, Interaction},
        channel::ChannelType,
        gateway::Ready,
        guild::{Guild, UnavailableGuild},
        id::{ChannelId, GuildId},
    },
    prelude::*,
};
use slotmap::DefaultKey;
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use tracing::{error, info, warn};

/// Channel names a welcome message is preferably sent to.
const WELCOME_NAMES: [&str; 4] = ["general", "lounge", "chat", "welcome"];

pub struct Handler {
    manager: Manager,
    presence_started: AtomicBool,
}

impl Handler {
    pub fn new(manager: Manager) -> Self {
        Self {
            manager,
            presence_started: AtomicBool::new(false),
        }
    }

    /// Tells the developers about errors the user can't do anything about.
    async fn report(&self, ctx: &Context, title: &str, why: &CommandError) {
        match why {
            // Update failures already went through the session's reporter
            CommandError::View(_) => warn!("{}: {}", title, why),
            _ if why.is_unexpected() => {
                self.manager
                    .reporter(&ctx.http)
                    .log(title, &format!("{:?}", why))
                    .await;
            }
            _ => {}
        }
    }

    async fn log(&self, ctx: &Context, page: &Page) {
        let channel = ChannelId::new(self.manager.env().log_channel);
        if let Err(why) = channel
            .send_message(ctx, CreateMessage::new().embed(page.to_embed()))
            .await
        {
            error!("Failed to send to the log channel: {}", why);
        }
    }

    async fn component(&self, ctx: &Context, component: &ComponentInteraction) {
        let custom_id = component.data.custom_id.as_str();
        let result = if let Some(action) = TicketAction::parse(custom_id) {
            ticket::handle(ctx, &self.manager, component, action).await
        } else if let Some((kind, key)) = parse_custom_id(custom_id) {
            self.paginator(ctx, component, kind, key).await
        } else {
            warn!(custom_id, "Unknown component");
            return;
        };

        if let Err(why) = result {
            let followup = CreateInteractionResponseFollowup::new()
                .embed(why.to_page().to_embed())
                .ephemeral(true);
            if let Err(e) = component.create_followup(ctx, followup).await {
                warn!("Cannot report component error: {}", e);
            }
            self.report(ctx, &format!("An error occurred in component {}.", custom_id), &why)
                .await;
        }
    }

    async fn paginator(
        &self,
        ctx: &Context,
        component: &ComponentInteraction,
        kind: &str,
        key: DefaultKey,
    ) -> Result<(), CommandError> {
        let values = match &component.data.kind {
            ComponentInteractionDataKind::StringSelect { values } => values.as_slice(),
            _ => &[],
        };
        let Some(action) = Action::from_component(kind, values) else {
            warn!(kind, "Unknown paginator action");
            return Ok(());
        };

        let sessions = self.manager.sessions();
        let Some(session) = sessions.get(key).await else {
            return reply(ctx, component, EXPIRED).await;
        };
        let mut session = session.lock().await;
        // The watcher may have ended it while we waited for the lock
        if let Some(notice) = session.refusal(component.user.id) {
            return reply(ctx, component, notice).await;
        }

        component
            .create_response(ctx, CreateInteractionResponse::Acknowledge)
            .await?;
        session.set_response(Box::new(ResponseTarget::new(
            Arc::clone(&ctx.http),
            Responder::Component(component.clone()),
        )));
        let result = session.handle(component.user.id, action).await;
        let terminal = session.is_terminal();
        drop(session);

        if terminal {
            sessions.remove(key).await;
        }
        Ok(result?)
    }

    fn start_presence(ctx: Context) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(PRESENCE_INTERVAL));
            for turn in 0_usize.. {
                interval.tick().await;
                let text = presence(turn, ctx.cache.guild_count(), ctx.cache.user_count());
                ctx.set_activity(Some(ActivityData::watching(text)));
            }
        });
    }
}

async fn reply(ctx: &Context, component: &ComponentInteraction, content: &str) -> Result<(), CommandError> {
    component
        .create_response(
            ctx,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(content)
                    .ephemeral(true),
            ),
        )
        .await?;
    Ok(())
}

/// Alternates between the server and user counts.
pub fn presence(turn: usize, guilds: usize, users: usize) -> String {
    let count = if turn % 2 == 0 {
        format!("{} servers", guilds)
    } else {
        format!("{} users", users)
    };
    format!("{} | Use /help", count)
}

/// Picks the channel to greet a new guild in: one with a common name if there is one,
/// otherwise the topmost.
pub fn welcome_channel<'a>(
    channels: impl IntoIterator<Item = (ChannelId, &'a str, u16)>,
) -> Option<ChannelId> {
    let mut channels = channels.into_iter().collect::<Vec<_>>();
    channels.sort_by_key(|(id, _, position)| (*position, *id));
    let common = |name: &str| WELCOME_NAMES.iter().any(|n| name.contains(n));
    channels
        .iter()
        .find(|(_, name, _)| common(name))
        .or_else(|| channels.first())
        .map(|(id, _, _)| *id)
}

fn format_created(unix: i64) -> String {
    chrono::DateTime::from_timestamp(unix, 0)
        .map(|time| time.format("%m/%d/%Y %H:%M:%S").to_string())
        .unwrap_or_default()
}

fn summarize(guild: &Guild) -> GuildSummary {
    GuildSummary {
        id: guild.id.get(),
        name: guild.name.clone(),
        owner_id: guild.owner_id.get(),
        members: guild.member_count,
        bots: guild.members.values().filter(|m| m.user.bot).count() as u64,
        created_at: format_created(guild.id.created_at().unix_timestamp()),
        icon_url: guild.icon_url(),
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::Command(command) => {
                let Some(handler) = commands::find(&command.data.name) else {
                    warn!(name = %command.data.name, "Unknown command");
                    return;
                };
                let defer = CreateInteractionResponse::Defer(
                    CreateInteractionResponseMessage::new().ephemeral(handler.ephemeral()),
                );
                if let Err(why) = command.create_response(&ctx, defer).await {
                    warn!("Cannot respond to slash command: {}", why);
                    return;
                }

                if let Err(why) = handler.handle(&ctx, &self.manager, &command).await {
                    let edit = EditInteractionResponse::new()
                        .embed(why.to_page().to_embed())
                        .components(Vec::new());
                    if let Err(e) = command.edit_response(&ctx, edit).await {
                        warn!("Cannot report command error: {}", e);
                    }
                    self.report(&ctx, &format!("An error occurred in /{}.", handler.name()), &why)
                        .await;
                }
            }
            Interaction::Autocomplete(command) => {
                if let Some(handler) = commands::find(&command.data.name) {
                    if let Err(why) = handler.autocomplete(&ctx, &self.manager, &command).await {
                        warn!("Autocomplete for /{} failed: {}", handler.name(), why);
                    }
                }
            }
            Interaction::Component(component) => self.component(&ctx, &component).await,
            _ => {}
        }
    }

    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("{} is connected!", ready.user.name);

        let commands = commands::create_all();
        let registered = match self.manager.env().dev_guild {
            Some(guild) => GuildId::new(guild).set_commands(&ctx, commands).await,
            None => Command::set_global_commands(&ctx, commands).await,
        };
        match registered {
            Ok(registered) => {
                info!(count = registered.len(), "Registered commands");
                self.manager.set_commands(&registered).await;
            }
            Err(why) => error!("Error creating commands: {}", why),
        }

        if !self.presence_started.swap(true, Ordering::SeqCst) {
            Self::start_presence(ctx);
        }
    }

    async fn guild_create(&self, ctx: Context, guild: Guild, is_new: Option<bool>) {
        if is_new != Some(true) {
            return;
        }

        let summary = summarize(&guild);
        let (bot_id, avatar) = {
            let user = ctx.cache.current_user();
            (user.id, user.face())
        };
        let me = guild.members.get(&bot_id);
        let channel = welcome_channel(
            guild
                .channels
                .values()
                .filter(|c| c.kind == ChannelType::Text)
                .filter(|c| me.map_or(true, |me| guild.user_permissions_in(c, me).send_messages()))
                .map(|c| (c.id, c.name.as_str(), c.position)),
        );

        if SPAM_CHECK && embeds::is_spam(summary.members, summary.bots) {
            let page = embeds::spam_guild(&summary, Some(avatar));
            if let Some(channel) = channel {
                if let Err(why) = channel
                    .send_message(&ctx, CreateMessage::new().embed(page.to_embed()))
                    .await
                {
                    warn!("Cannot warn spam guild: {}", why);
                }
            }
            if let Err(why) = guild.id.leave(&ctx).await {
                error!(guild = %guild.id, "Failed to leave spam guild: {}", why);
            }
            warn!(guild = %guild.id, members = summary.members, bots = summary.bots, "Left spam guild");
            self.log(&ctx, &page).await;
            return;
        }

        info!("Joined guild {} with {} members.", guild.name, summary.members);
        match channel {
            Some(channel) => {
                let message = CreateMessage::new()
                    .embed(embeds::welcome(&guild.name, Some(avatar.clone())).to_embed())
                    .components(vec![link_row(&embeds::invite_links(bot_id.get()))]);
                if let Err(why) = channel.send_message(&ctx, message).await {
                    warn!(guild = %guild.id, "Cannot send the welcome message: {}", why);
                }
            }
            None => warn!(
                "Unable to find a channel to send the welcome message in {} ({})",
                guild.name, guild.id
            ),
        }
        self.log(&ctx, &embeds::guild_join(&summary, Some(avatar))).await;
    }

    async fn guild_delete(&self, ctx: Context, incomplete: UnavailableGuild, full: Option<Guild>) {
        if incomplete.unavailable {
            return;
        }

        let summary = full.as_ref().map_or_else(
            || GuildSummary {
                id: incomplete.id.get(),
                name: "Unknown".to_string(),
                owner_id: 0,
                members: 0,
                bots: 0,
                created_at: format_created(incomplete.id.created_at().unix_timestamp()),
                icon_url: None,
            },
            summarize,
        );
        info!("Left guild {} with {} members.", summary.name, summary.members);
        let avatar = ctx.cache.current_user().face();
        self.log(&ctx, &embeds::guild_leave(&summary, Some(avatar))).await;
    }
}
