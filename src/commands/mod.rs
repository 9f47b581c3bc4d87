use crate::{
    ansi::{ansi, ansi_bold, Colors},
    constants::colors,
    embeds,
    error::CommandError,
    manager::Manager,
    page::Page,
};
use serenity::{
    async_trait,
    builder::{CreateCommand, CreateCommandOption, EditInteractionResponse},
    model::{
        application::{CommandInteraction, CommandOptionType, ResolvedOption, ResolvedValue},
        Permissions,
    },
    prelude::*,
};

mod botinfo;
mod clear;
mod command;
mod help;
mod invite;
mod ping;
mod ticket;

pub use botinfo::BotInfo;
pub use clear::Clear;
pub use command::{Argument, Category, Command, Subcommand};
use command::{option, respond};
pub use help::Help;
pub use invite::Invite;
pub use ping::Ping;
pub use ticket::Ticket;

static COMMANDS: &[&dyn Command] = &[&Help, &Ping, &Invite, &BotInfo, &Clear, &Ticket];

/// Every command the bot registers, in help order.
pub fn all() -> &'static [&'static dyn Command] {
    COMMANDS
}

pub fn find(name: &str) -> Option<&'static dyn Command> {
    COMMANDS.iter().copied().find(|c| c.name() == name)
}

pub fn create_all() -> Vec<CreateCommand> {
    COMMANDS.iter().map(|c| c.create()).collect()
}

/// Fails unless the invoking member has every permission in `needed`.
pub fn require(command: &CommandInteraction, needed: Permissions) -> Result<(), CommandError> {
    let has = command
        .member
        .as_ref()
        .and_then(|m| m.permissions)
        .unwrap_or_else(Permissions::empty);
    if has.administrator() || has.contains(needed) {
        Ok(())
    } else {
        Err(CommandError::MissingPermissions(needed.difference(has)))
    }
}

/// Fails unless the bot has every permission in `needed` where the command ran.
pub fn require_bot(command: &CommandInteraction, needed: Permissions) -> Result<(), CommandError> {
    let has = command.app_permissions.unwrap_or_else(Permissions::empty);
    if has.administrator() || has.contains(needed) {
        Ok(())
    } else {
        Err(CommandError::BotMissingPermissions(needed.difference(has)))
    }
}
