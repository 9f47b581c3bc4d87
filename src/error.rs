use rand::seq::SliceRandom;
use serenity::{http::HttpError, model::Permissions};
use thiserror::Error;

use crate::{
    ansi::{ansi, Colors},
    constants::{colors, ERROR_TITLES},
    db::DatabaseError,
    page::Page,
    views::ViewError,
};

/// Failures a command handler can end with. Each one maps to a message shown to the
/// invoking user.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("missing permissions: {0:?}")]
    MissingPermissions(Permissions),
    #[error("bot missing permissions: {0:?}")]
    BotMissingPermissions(Permissions),
    #[error("channel not found: {0}")]
    ChannelNotFound(String),
    #[error("role not found: {0}")]
    RoleNotFound(String),
    #[error("{0}")]
    BadArgument(String),
    #[error(transparent)]
    View(#[from] ViewError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Discord(#[from] serenity::Error),
}

/// How a [`CommandError`] is presented.
enum Response {
    /// Pick one of these templates.
    Canned(&'static [&'static str]),
    /// The error's own message is shown as-is.
    Custom,
    /// Not something the user caused; developers are told.
    Unknown,
}

const UNKNOWN: &[&str] = &[
    "Sorry but something went wrong and I don't know what it is. I have notified my developers about this.",
    "I'm sorry but I don't know what happened. I have notified my developers about this.",
    "I don't know what happened but I have notified my developers about this.",
];

const MISSING_PERMISSIONS: &[&str] = &[
    "You need the following permission(s) to use this command:\n`{missing_perms}`",
    "Fam I'm sorry but this is the list of things you need for me to let you do this:\n{missing_perms}",
];

const BOT_MISSING_PERMISSIONS: &[&str] = &[
    "Bot needs the following permission(s) to perform this command:\n`{missing_perms}`",
    "Sorry mate I can't do this without these permissions:\n{missing_perms}",
    "You sure i'm allowed to do this? Cause it seems like I don't have these permissions:\n{missing_perms}",
];

const CHANNEL_NOT_FOUND: &[&str] = &[
    "Channel '{argument}' does not exist.",
    "{argument} may be a road runner cause he pulled a fast one on me",
    "I don't know what universe you think {argument} exists in but, it's definitely not here",
];

const ROLE_NOT_FOUND: &[&str] = &[
    "Role '{argument}' does not exist.",
    "I might be blind or stupid but I don't see a role named {argument} anywhere",
    "Who keeps giving me roles that don't exists???",
];

const NOT_FOUND: &[&str] = &[
    "Bot was unable to locate required message",
    "Sorry fam but I can't look for things that don't exist",
    "I searched the entire universe and still can't find that message",
];

const FORBIDDEN: &[&str] = &[
    "Bot does not have permission to do this. It is probably missing one of required permissions, \
     check that the bot has all required permissions in this channel",
];

pub(crate) fn http_status(why: &serenity::Error) -> Option<u16> {
    match why {
        serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) => {
            Some(response.status_code.as_u16())
        }
        _ => None,
    }
}

fn permission_names(permissions: Permissions) -> String {
    permissions
        .get_permission_names()
        .join(", ")
}

fn pick(messages: &[&'static str]) -> &'static str {
    messages
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(UNKNOWN[0])
}

impl CommandError {
    fn response(&self) -> Response {
        match self {
            Self::MissingPermissions(_) => Response::Canned(MISSING_PERMISSIONS),
            Self::BotMissingPermissions(_) => Response::Canned(BOT_MISSING_PERMISSIONS),
            Self::ChannelNotFound(_) => Response::Canned(CHANNEL_NOT_FOUND),
            Self::RoleNotFound(_) => Response::Canned(ROLE_NOT_FOUND),
            Self::BadArgument(_) => Response::Custom,
            Self::Discord(why) => match http_status(why) {
                Some(404) => Response::Canned(NOT_FOUND),
                Some(403) => Response::Canned(FORBIDDEN),
                _ => Response::Unknown,
            },
            // Misuse of a menu, shown as-is and never escalated
            Self::View(ViewError::Paginator(_)) => Response::Custom,
            Self::View(_) | Self::Database(_) => Response::Unknown,
        }
    }

    /// Whether developers should hear about this error.
    pub fn is_unexpected(&self) -> bool {
        matches!(self.response(), Response::Unknown)
    }

    /// The text shown to the user who triggered the error.
    pub fn user_message(&self) -> String {
        let template = match self.response() {
            Response::Custom => return self.to_string(),
            Response::Unknown => pick(UNKNOWN),
            Response::Canned(messages) => pick(messages),
        };
        let (missing_perms, argument) = match self {
            Self::MissingPermissions(p) | Self::BotMissingPermissions(p) => {
                (permission_names(*p), String::new())
            }
            Self::ChannelNotFound(a) | Self::RoleNotFound(a) => {
                (String::new(), a.clone())
            }
            _ => (String::new(), String::new()),
        };
        template
            .replace("{missing_perms}", &missing_perms)
            .replace("{argument}", &argument)
    }

    /// The embed that replaces the deferred command response.
    pub fn to_page(&self) -> Page {
        let title = pick(ERROR_TITLES);
        Page::new()
            .title(title)
            .description(ansi(self.user_message(), Colors::Red))
            .color(colors::RED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::{Button, PaginatorError};

    #[test]
    fn custom_errors_show_their_own_message() {
        let err = CommandError::BadArgument("A ticket system already exists".to_string());
        assert_eq!(err.user_message(), "A ticket system already exists");
        assert!(!err.is_unexpected());
    }

    #[test]
    fn canned_messages_are_formatted() {
        let err = CommandError::MissingPermissions(Permissions::MANAGE_MESSAGES);
        let message = err.user_message();
        assert!(message.contains("Manage Messages"), "{message}");
        assert!(!message.contains("{missing_perms}"));
    }

    #[test]
    fn argument_is_substituted() {
        let err = CommandError::ChannelNotFound("#nowhere".to_string());
        let message = err.user_message();
        assert!(message.contains("#nowhere"), "{message}");
    }

    #[test]
    fn non_http_discord_errors_are_unexpected() {
        let err = CommandError::Discord(serenity::Error::Other("boom"));
        assert!(err.is_unexpected());
        assert!(UNKNOWN.contains(&err.user_message().as_str()));
    }

    #[test]
    fn menu_misuse_is_not_escalated() {
        let err = CommandError::View(ViewError::Paginator(PaginatorError::Disabled(Button::Next)));
        assert!(!err.is_unexpected());
        assert_eq!(err.user_message(), "The next button is disabled right now.");
        assert!(!UNKNOWN.contains(&err.user_message().as_str()));

        let stopped = CommandError::View(ViewError::Unreachable);
        assert!(stopped.is_unexpected());
    }

    #[test]
    fn error_page_is_red_ansi() {
        let page = CommandError::BadArgument("nope".to_string()).to_page();
        assert_eq!(page.color, Some(colors::RED));
        assert!(page
            .description
            .as_deref()
            .is_some_and(|d| d.starts_with("```ansi")));
        assert!(ERROR_TITLES.contains(&page.title.as_deref().unwrap_or_default()));
    }
}
