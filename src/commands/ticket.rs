use super::*;
use serenity::{
    builder::CreateMessage,
    model::{
        channel::{ChannelType, PermissionOverwrite, PermissionOverwriteType},
        id::{GuildId, RoleId},
    },
};
use tracing::info;

use crate::{db::models::TicketSystem, views::ticket::panel_components};

const CHANNEL: Argument = Argument {
    name: "channel",
    description: "The channel the ticket panel is sent to.",
};

const ARCHIVE_CHANNEL: Argument = Argument {
    name: "archive_channel",
    description: "The channel closed tickets are archived in.",
};

const ROLE: Argument = Argument {
    name: "role",
    description: "The staff role to add or remove.",
};

const SUBCOMMANDS: &[Subcommand] = &[
    Subcommand {
        name: "create",
        description: "Create a ticket system in this server.",
        arguments: &[CHANNEL, ARCHIVE_CHANNEL],
    },
    Subcommand {
        name: "delete",
        description: "Delete the ticket system of this server.",
        arguments: &[],
    },
    Subcommand {
        name: "role",
        description: "Toggle a role that can see and manage every ticket.",
        arguments: &[ROLE],
    },
];

pub struct Ticket;

fn guild(command: &CommandInteraction) -> Result<GuildId, CommandError> {
    command
        .guild_id
        .ok_or_else(|| CommandError::BadArgument("Tickets only exist in servers.".to_string()))
}

fn sub_option(sub: &Subcommand) -> CreateCommandOption {
    sub.arguments.iter().fold(
        CreateCommandOption::new(CommandOptionType::SubCommand, sub.name, sub.description),
        |option, argument| {
            let kind = if argument.name == ROLE.name {
                CreateCommandOption::new(CommandOptionType::Role, argument.name, argument.description)
            } else {
                CreateCommandOption::new(CommandOptionType::Channel, argument.name, argument.description)
                    .channel_types(vec![ChannelType::Text])
            };
            option.add_sub_option(kind.required(true))
        },
    )
}

#[async_trait]
impl Command for Ticket {
    fn name(&self) -> &'static str {
        "ticket"
    }

    fn description(&self) -> &'static str {
        "Manage the ticket system of this server."
    }

    fn category(&self) -> Category {
        Category::Tickets
    }

    fn subcommands(&self) -> &'static [Subcommand] {
        SUBCOMMANDS
    }

    fn create(&self) -> CreateCommand {
        SUBCOMMANDS.iter().fold(
            CreateCommand::new(self.name())
                .description(self.description())
                .default_member_permissions(Permissions::MANAGE_GUILD),
            |command, sub| command.add_option(sub_option(sub)),
        )
    }

    async fn handle(
        &self,
        ctx: &Context,
        manager: &Manager,
        command: &CommandInteraction,
    ) -> Result<(), CommandError> {
        require(command, Permissions::MANAGE_GUILD)?;

        let options = command.data.options();
        match options.first() {
            Some(ResolvedOption {
                name: "create",
                value: ResolvedValue::SubCommand(args),
                ..
            }) => create(ctx, manager, command, args).await,
            Some(ResolvedOption {
                name: "delete",
                value: ResolvedValue::SubCommand(_),
                ..
            }) => delete(ctx, manager, command).await,
            Some(ResolvedOption {
                name: "role",
                value: ResolvedValue::SubCommand(args),
                ..
            }) => role(ctx, manager, command, args).await,
            _ => Err(CommandError::BadArgument("Unknown subcommand.".to_string())),
        }
    }
}

async fn create(
    ctx: &Context,
    manager: &Manager,
    command: &CommandInteraction,
    args: &[ResolvedOption<'_>],
) -> Result<(), CommandError> {
    require_bot(command, Permissions::MANAGE_CHANNELS | Permissions::MANAGE_ROLES)?;
    let guild_id = guild(command)?;

    let channel = match option(args, CHANNEL.name) {
        Some(ResolvedValue::Channel(c)) => c.id,
        _ => return Err(CommandError::ChannelNotFound(CHANNEL.name.to_string())),
    };
    let archive = match option(args, ARCHIVE_CHANNEL.name) {
        Some(ResolvedValue::Channel(c)) => c.id,
        _ => return Err(CommandError::ChannelNotFound(ARCHIVE_CHANNEL.name.to_string())),
    };

    let tickets = manager.db().tickets();
    if tickets.get(guild_id.get() as i64).await?.is_some() {
        return Err(CommandError::BadArgument(
            "A ticket system already exists in this server.".to_string(),
        ));
    }

    let roles = guild_id
        .roles(ctx)
        .await?
        .into_values()
        .filter(|r| r.permissions.manage_channels())
        .map(|r| r.id.get() as i64)
        .collect();

    archive
        .create_permission(
            ctx,
            PermissionOverwrite {
                allow: Permissions::empty(),
                deny: Permissions::VIEW_CHANNEL,
                kind: PermissionOverwriteType::Role(RoleId::new(guild_id.get())),
            },
        )
        .await?;

    let icon = ctx.cache.guild(guild_id).and_then(|g| g.icon_url());
    channel
        .send_message(
            ctx,
            CreateMessage::new()
                .embed(embeds::ticket_panel(icon).to_embed())
                .components(panel_components()),
        )
        .await?;

    tickets
        .create(&TicketSystem {
            guild_id: guild_id.get() as i64,
            channel_id: channel.get() as i64,
            archive_channel_id: archive.get() as i64,
            roles,
        })
        .await?;
    info!(guild = %guild_id, channel = %channel, "Ticket system created");

    let page = embeds::yes(
        "Created ticket system",
        "✅ The ticket system has been created.",
        Some(command.user.face()),
    );
    respond(ctx, command, &page).await
}

async fn delete(
    ctx: &Context,
    manager: &Manager,
    command: &CommandInteraction,
) -> Result<(), CommandError> {
    let guild_id = guild(command)?;
    if !manager.db().tickets().delete(guild_id.get() as i64).await? {
        return Err(CommandError::BadArgument(
            "This server has no ticket system.".to_string(),
        ));
    }
    info!(guild = %guild_id, "Ticket system removed");

    let page = embeds::yes(
        "Deleted ticket system",
        "✅ Successfully deleted the ticket system.",
        Some(command.user.face()),
    );
    respond(ctx, command, &page).await
}

async fn role(
    ctx: &Context,
    manager: &Manager,
    command: &CommandInteraction,
    args: &[ResolvedOption<'_>],
) -> Result<(), CommandError> {
    let guild_id = guild(command)?;
    let role = match option(args, ROLE.name) {
        Some(ResolvedValue::Role(r)) => r.id,
        _ => return Err(CommandError::RoleNotFound(ROLE.name.to_string())),
    };

    let tickets = manager.db().tickets();
    let mut system = tickets
        .get(guild_id.get() as i64)
        .await?
        .ok_or_else(|| CommandError::BadArgument("This server has no ticket system.".to_string()))?;
    let added = system.toggle_role(role.get() as i64);
    tickets.update(&system).await?;

    let text = if added {
        format!("✅ {} can now see every ticket.", role.mention())
    } else {
        format!("✅ {} can no longer see new tickets.", role.mention())
    };
    let page = embeds::yes("Ticket staff", &text, Some(command.user.face()));
    respond(ctx, command, &page).await
}
