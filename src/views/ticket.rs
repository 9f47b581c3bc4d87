use serenity::{
    builder::{
        CreateActionRow, CreateButton, CreateChannel, CreateInteractionResponse,
        CreateInteractionResponseFollowup, CreateInteractionResponseMessage, CreateMessage,
        EditMessage,
    },
    model::{
        application::{ButtonStyle, ComponentInteraction},
        channel::{ChannelType, PermissionOverwrite, PermissionOverwriteType, ReactionType},
        id::{ChannelId, GuildId, RoleId, UserId},
        Permissions,
    },
    prelude::*,
};
use std::time::Duration;
use tracing::info;

use super::NOT_ALLOWED;
use crate::{embeds, error::CommandError, manager::Manager, page::Page};

/// Seconds between announcing a ticket's deletion and deleting it.
const DELETE_DELAY: u64 = 5;

/// Buttons of the ticket messages. Their ids are fixed, so they keep working across
/// restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketAction {
    Create,
    Cancel,
    Close,
    Reopen,
    Delete,
}

impl TicketAction {
    const PREFIX: &'static str = "ticket";
    const ALL: [TicketAction; 5] = [
        TicketAction::Create,
        TicketAction::Cancel,
        TicketAction::Close,
        TicketAction::Reopen,
        TicketAction::Delete,
    ];

    fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Cancel => "cancel",
            Self::Close => "close",
            Self::Reopen => "reopen",
            Self::Delete => "delete",
        }
    }

    pub fn custom_id(self) -> String {
        format!("{}-{}", Self::PREFIX, self.as_str())
    }

    pub fn parse(custom_id: &str) -> Option<Self> {
        let action = custom_id.strip_prefix(Self::PREFIX)?.strip_prefix('-')?;
        Self::ALL.into_iter().find(|a| a.as_str() == action)
    }

    /// Everything but opening a ticket is for staff only.
    pub fn needs_staff(self) -> bool {
        self != Self::Create
    }

    fn button(self) -> CreateButton {
        let (label, emoji, style) = match self {
            Self::Create => ("Create Ticket", "🎫", ButtonStyle::Success),
            Self::Cancel => ("Cancel", "🗑️", ButtonStyle::Danger),
            Self::Close => ("Close", "🔒", ButtonStyle::Danger),
            Self::Reopen => ("Re-open", "🔓", ButtonStyle::Success),
            Self::Delete => ("Delete", "🗑️", ButtonStyle::Danger),
        };
        CreateButton::new(self.custom_id())
            .label(label)
            .emoji(ReactionType::Unicode(emoji.to_string()))
            .style(style)
    }
}

fn row(actions: &[TicketAction]) -> Vec<CreateActionRow> {
    vec![CreateActionRow::Buttons(
        actions.iter().map(|a| a.button()).collect(),
    )]
}

/// Under the panel message of a ticket system.
pub fn panel_components() -> Vec<CreateActionRow> {
    row(&[TicketAction::Create, TicketAction::Cancel])
}

/// Under the first message of an open ticket.
pub fn open_components() -> Vec<CreateActionRow> {
    row(&[TicketAction::Close])
}

pub fn closed_components() -> Vec<CreateActionRow> {
    row(&[TicketAction::Reopen, TicketAction::Delete])
}

pub fn is_staff(permissions: Option<Permissions>) -> bool {
    permissions.map_or(false, |p| p.administrator() || p.manage_guild())
}

/// One ticket channel per user, named after them.
pub fn channel_name(username: &str) -> String {
    let name = username
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '-' })
        .collect::<String>();
    format!("ticket-{}", name)
}

fn access(kind: PermissionOverwriteType, open: bool) -> PermissionOverwrite {
    let permissions = Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES;
    let (allow, deny) = if open {
        (permissions, Permissions::empty())
    } else {
        (Permissions::empty(), permissions)
    };
    PermissionOverwrite { allow, deny, kind }
}

/// Hidden from everyone but the user and the staff roles.
pub fn overwrites(guild_id: GuildId, user_id: UserId, staff: &[RoleId]) -> Vec<PermissionOverwrite> {
    let everyone = PermissionOverwrite {
        allow: Permissions::empty(),
        deny: Permissions::VIEW_CHANNEL,
        kind: PermissionOverwriteType::Role(RoleId::new(guild_id.get())),
    };
    std::iter::once(everyone)
        .chain(std::iter::once(access(PermissionOverwriteType::Member(user_id), true)))
        .chain(
            staff
                .iter()
                .map(|role| access(PermissionOverwriteType::Role(*role), true)),
        )
        .collect()
}

async fn notify(ctx: &Context, component: &ComponentInteraction, page: &Page) -> Result<(), CommandError> {
    component
        .create_followup(
            ctx,
            CreateInteractionResponseFollowup::new()
                .embed(page.to_embed())
                .ephemeral(true),
        )
        .await?;
    Ok(())
}

/// Opens or closes the ticket for every member it was shared with.
async fn set_member_access(ctx: &Context, channel_id: ChannelId, open: bool) -> Result<(), CommandError> {
    let channel = channel_id
        .to_channel(ctx)
        .await?
        .guild()
        .ok_or_else(|| CommandError::ChannelNotFound(channel_id.to_string()))?;
    for overwrite in &channel.permission_overwrites {
        if let PermissionOverwriteType::Member(_) = overwrite.kind {
            channel_id
                .create_permission(ctx, access(overwrite.kind, open))
                .await?;
        }
    }
    Ok(())
}

pub async fn handle(
    ctx: &Context,
    manager: &Manager,
    component: &ComponentInteraction,
    action: TicketAction,
) -> Result<(), CommandError> {
    let permissions = component.member.as_ref().and_then(|m| m.permissions);
    if action.needs_staff() && !is_staff(permissions) {
        component
            .create_response(
                ctx,
                CreateInteractionResponse::Message(
                    CreateInteractionResponseMessage::new()
                        .content(NOT_ALLOWED)
                        .ephemeral(true),
                ),
            )
            .await?;
        return Ok(());
    }

    let response = match action {
        TicketAction::Create | TicketAction::Cancel => CreateInteractionResponse::Defer(
            CreateInteractionResponseMessage::new().ephemeral(true),
        ),
        _ => CreateInteractionResponse::Acknowledge,
    };
    component.create_response(ctx, response).await?;

    let guild_id = component
        .guild_id
        .ok_or_else(|| CommandError::BadArgument("Tickets only exist in servers.".to_string()))?;
    let mention = component.user.mention().to_string();

    match action {
        TicketAction::Create => create(ctx, manager, component, guild_id).await,
        TicketAction::Cancel => {
            manager.db().tickets().delete(guild_id.get() as i64).await?;
            info!(guild = %guild_id, "Ticket system removed");
            let page = embeds::yes("Ticket system", "✅ Successfully deleted the ticket system.", None);
            notify(ctx, component, &page).await?;
            component.message.delete(ctx).await?;
            Ok(())
        }
        TicketAction::Close => {
            let mut message = component.message.clone();
            message
                .edit(ctx, EditMessage::new().components(Vec::new()))
                .await?;
            set_member_access(ctx, component.channel_id, false).await?;
            component
                .channel_id
                .send_message(
                    ctx,
                    CreateMessage::new()
                        .embed(embeds::ticket_closed(&mention).to_embed())
                        .components(closed_components()),
                )
                .await?;
            Ok(())
        }
        TicketAction::Reopen => {
            set_member_access(ctx, component.channel_id, true).await?;
            let mut message = component.message.clone();
            message
                .edit(
                    ctx,
                    EditMessage::new()
                        .embed(embeds::ticket_reopened(&mention).to_embed())
                        .components(open_components()),
                )
                .await?;
            Ok(())
        }
        TicketAction::Delete => {
            let mut message = component.message.clone();
            message
                .edit(ctx, EditMessage::new().components(Vec::new()))
                .await?;
            let page = embeds::no(
                "Ticket",
                &format!("Deleting the ticket in {} seconds...", DELETE_DELAY),
                None,
            );
            notify(ctx, component, &page).await?;
            tokio::time::sleep(Duration::from_secs(DELETE_DELAY)).await;
            component.channel_id.delete(ctx).await?;
            info!(guild = %guild_id, channel = %component.channel_id, "Ticket deleted");
            Ok(())
        }
    }
}

async fn create(
    ctx: &Context,
    manager: &Manager,
    component: &ComponentInteraction,
    guild_id: GuildId,
) -> Result<(), CommandError> {
    let system = manager
        .db()
        .tickets()
        .get(guild_id.get() as i64)
        .await?
        .ok_or_else(|| CommandError::BadArgument("This server has no ticket system.".to_string()))?;

    let user = &component.user;
    let name = channel_name(&user.name);
    let channels = guild_id.channels(ctx).await?;
    if let Some(existing) = channels.values().find(|c| c.name == name) {
        let page = embeds::no(
            "Ticket",
            &format!(
                "You already have an open ticket. Please head towards {}.",
                existing.id.mention()
            ),
            None,
        );
        return notify(ctx, component, &page).await;
    }

    let staff = guild_id
        .roles(ctx)
        .await?
        .into_values()
        .filter(|r| r.permissions.manage_roles() || system.roles.contains(&(r.id.get() as i64)))
        .map(|r| r.id)
        .collect::<Vec<_>>();
    let mut builder = CreateChannel::new(name)
        .kind(ChannelType::Text)
        .permissions(overwrites(guild_id, user.id, &staff));
    if let Some(parent) = channels.get(&component.channel_id).and_then(|c| c.parent_id) {
        builder = builder.category(parent);
    }
    let channel = guild_id.create_channel(ctx, builder).await?;
    info!(guild = %guild_id, channel = %channel.id, user = %user.id, "Ticket opened");

    let page = embeds::yes(
        "Ticket",
        &format!("✅ Created ticket. Please head towards {}.", channel.id.mention()),
        None,
    );
    notify(ctx, component, &page).await?;

    let opened = embeds::ticket_opened(
        &user.tag(),
        Some(user.face()),
        channel.id.created_at().unix_timestamp(),
    );
    let message = channel
        .id
        .send_message(
            ctx,
            CreateMessage::new()
                .content(user.mention().to_string())
                .embed(opened.to_embed())
                .components(open_components()),
        )
        .await?;
    message.pin(ctx).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_ids_round_trip() {
        for action in TicketAction::ALL {
            assert_eq!(TicketAction::parse(&action.custom_id()), Some(action));
        }
        assert_eq!(TicketAction::parse("ticket-transcript"), None);
        assert_eq!(TicketAction::parse("paginator-next-{}"), None);
    }

    #[test]
    fn only_creating_is_open_to_everyone() {
        assert!(!TicketAction::Create.needs_staff());
        assert!(TicketAction::Close.needs_staff());
        assert!(TicketAction::Cancel.needs_staff());
    }

    #[test]
    fn staff_needs_manage_server() {
        assert!(is_staff(Some(Permissions::MANAGE_GUILD)));
        assert!(is_staff(Some(Permissions::ADMINISTRATOR)));
        assert!(!is_staff(Some(Permissions::MANAGE_MESSAGES)));
        assert!(!is_staff(None));
    }

    #[test]
    fn channel_names_are_sanitized() {
        assert_eq!(channel_name("Ferris.The Crab"), "ticket-ferris-the-crab");
    }

    #[test]
    fn ticket_is_hidden_from_everyone_else() {
        let guild = GuildId::new(10);
        let user = UserId::new(20);
        let staff = [RoleId::new(30)];

        let overwrites = overwrites(guild, user, &staff);

        assert_eq!(overwrites.len(), 3);
        assert_eq!(overwrites[0].kind, PermissionOverwriteType::Role(RoleId::new(10)));
        assert!(overwrites[0].deny.view_channel());
        assert_eq!(overwrites[1].kind, PermissionOverwriteType::Member(user));
        assert!(overwrites[1].allow.send_messages());
        assert!(overwrites[2].allow.view_channel());
    }

    #[test]
    fn closing_denies_what_opening_allows() {
        let kind = PermissionOverwriteType::Member(UserId::new(1));
        let open = access(kind, true);
        let closed = access(kind, false);
        assert_eq!(open.allow, closed.deny);
        assert!(open.deny.is_empty() && closed.allow.is_empty());
    }
}
