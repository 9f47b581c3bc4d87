pub mod paginator;
pub mod registry;
pub mod session;
pub mod targets;
pub mod ticket;

use async_trait::async_trait;
use serenity::{
    builder::{
        CreateActionRow, CreateButton, CreateSelectMenu, CreateSelectMenuKind,
        CreateSelectMenuOption,
    },
    model::{
        application::ButtonStyle,
        channel::ReactionType,
        id::{ChannelId, MessageId},
    },
};
use thiserror::Error;
use tracing::debug;

use crate::{
    constants::emojis,
    page::{Attachment, Page},
};
pub use paginator::{Paginator, PaginatorError};

/// Shown to anyone pressing a view they may not use.
pub const NOT_ALLOWED: &str = "You are not allowed to use this view.";
/// Shown when a paginator's session no longer exists.
pub const EXPIRED: &str = "This menu has expired.";

/// Lifecycle of an interactive view. Both non-active states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Active,
    Expired,
    Stopped,
}

impl ViewState {
    pub fn is_terminal(self) -> bool {
        self != Self::Active
    }
}

#[derive(Debug, Error)]
pub enum ViewError {
    #[error(transparent)]
    Paginator(#[from] PaginatorError),
    #[error("failed to update {component}: {error}")]
    Update { component: String, error: String },
    #[error("no update target is reachable anymore")]
    Unreachable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    First,
    Previous,
    Stop,
    Next,
    Last,
}

impl Button {
    pub const ALL: [Button; 5] = [
        Button::First,
        Button::Previous,
        Button::Stop,
        Button::Next,
        Button::Last,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Previous => "previous",
            Self::Stop => "stop",
            Self::Next => "next",
            Self::Last => "last",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Self::First => emojis::FIRST,
            Self::Previous => emojis::PREVIOUS,
            Self::Stop => emojis::STOP,
            Self::Next => emojis::NEXT,
            Self::Last => emojis::LAST,
        }
    }

    fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.as_str() == s)
    }
}

/// What a user asked a view to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Press(Button),
    Select(String),
}

impl Action {
    const SELECT: &'static str = "select";

    /// Rebuilds an action from the `kind` segment of a custom id and the selected
    /// values of the interaction.
    pub fn from_component(kind: &str, values: &[String]) -> Option<Self> {
        if kind == Self::SELECT {
            values.first().cloned().map(Self::Select)
        } else {
            Button::parse(kind).map(Self::Press)
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Press(button) => button.as_str().to_string(),
            Self::Select(category) => format!("select {}", category),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Select {
    pub options: Vec<String>,
    pub selected: usize,
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub label: String,
    pub url: String,
    pub emoji: Option<String>,
}

/// The component set of a paginator message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Controls {
    id: String,
    buttons: Vec<(Button, bool)>,
    select: Option<Select>,
    links: Vec<Link>,
}

impl Controls {
    pub const PREFIX: &'static str = "paginator";

    pub fn navigation() -> Self {
        Self {
            id: String::new(),
            buttons: Button::ALL.into_iter().map(|b| (b, false)).collect(),
            select: None,
            links: Vec::new(),
        }
    }

    pub fn with_select(mut self, options: Vec<String>) -> Self {
        self.select = Some(Select {
            options,
            selected: 0,
            disabled: false,
        });
        self
    }

    pub fn with_links(mut self, links: Vec<Link>) -> Self {
        self.links = links;
        self
    }

    /// Sets the session id embedded in every custom id.
    pub fn bind(&mut self, id: String) {
        self.id = id;
    }

    pub fn custom_id(&self, kind: &str) -> String {
        format!("{}-{}-{}", Self::PREFIX, kind, self.id)
    }

    pub fn is_disabled(&self, button: Button) -> bool {
        self.buttons
            .iter()
            .find(|(b, _)| *b == button)
            .map_or(true, |(_, disabled)| *disabled)
    }

    pub fn set_disabled(&mut self, button: Button, disabled: bool) {
        if let Some(entry) = self.buttons.iter_mut().find(|(b, _)| *b == button) {
            entry.1 = disabled;
        }
    }

    pub fn select(&self) -> Option<&Select> {
        self.select.as_ref()
    }

    pub fn set_selected(&mut self, index: usize) {
        if let Some(select) = &mut self.select {
            select.selected = index;
        }
    }

    /// Marks every navigable control disabled. Safe to call any number of times.
    pub fn disable_all(&mut self) {
        for (_, disabled) in &mut self.buttons {
            *disabled = true;
        }
        if let Some(select) = &mut self.select {
            select.disabled = true;
        }
    }

    pub fn all_disabled(&self) -> bool {
        self.buttons.iter().all(|(_, disabled)| *disabled)
            && self.select.as_ref().map_or(true, |s| s.disabled)
    }

    pub fn components(&self) -> Vec<CreateActionRow> {
        let mut rows = vec![CreateActionRow::Buttons(
            self.buttons
                .iter()
                .map(|(button, disabled)| {
                    CreateButton::new(self.custom_id(button.as_str()))
                        .style(ButtonStyle::Primary)
                        .emoji(ReactionType::Unicode(button.emoji().to_string()))
                        .disabled(*disabled)
                })
                .collect(),
        )];

        if let Some(select) = &self.select {
            let options = select
                .options
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    CreateSelectMenuOption::new(name, name)
                        .emoji(ReactionType::Unicode(emojis::category(name).to_string()))
                        .default_selection(i == select.selected)
                })
                .collect();
            rows.push(CreateActionRow::SelectMenu(
                CreateSelectMenu::new(
                    self.custom_id(Action::SELECT),
                    CreateSelectMenuKind::String { options },
                )
                .placeholder("Select a category")
                .disabled(select.disabled),
            ));
        }

        if !self.links.is_empty() {
            rows.push(link_row(&self.links));
        }

        rows
    }
}

/// A row of URL buttons.
pub fn link_row(links: &[Link]) -> CreateActionRow {
    CreateActionRow::Buttons(
        links
            .iter()
            .map(|link| {
                let button = CreateButton::new_link(&link.url).label(&link.label);
                match &link.emoji {
                    Some(emoji) => button.emoji(ReactionType::Unicode(emoji.clone())),
                    None => button,
                }
            })
            .collect(),
    )
}

/// Everything pushed to the message on one update.
#[derive(Debug, Clone)]
pub struct ViewUpdate {
    pub page: Page,
    /// Uploaded with this update, replacing any previous attachment.
    pub upload: Option<Attachment>,
    pub controls: Controls,
}

/// What a successful push tells us about the message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushReceipt {
    /// URL the platform assigned to the embed image, if any.
    pub image_url: Option<String>,
    pub message: Option<(ChannelId, MessageId)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    /// The message or interaction no longer exists, or we lost access to it.
    #[error("target is gone: {0}")]
    Gone(String),
    #[error("{0}")]
    Failed(String),
}

/// A channel through which a view's message can be changed.
#[async_trait]
pub trait UpdateTarget: Send + Sync {
    fn describe(&self) -> String;

    async fn push(&self, update: &ViewUpdate) -> Result<PushReceipt, SurfaceError>;

    async fn delete(&self) -> Result<(), SurfaceError>;

    /// A more direct target for the message a push landed on.
    fn follow(&self, _receipt: &PushReceipt) -> Option<Box<dyn UpdateTarget>> {
        None
    }
}

/// Context for an error nobody on the user side can fix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub action: String,
    pub component: String,
    pub error: String,
}

#[async_trait]
pub trait ErrorReporter: Send + Sync {
    async fn report(&self, report: ErrorReport);
}

/// Pushes `update` through the first target that still exists.
///
/// Only [`SurfaceError::Gone`] moves on to the next target. Any other failure, or
/// running out of targets, is reported and returned.
pub async fn safe_update(
    targets: &[&dyn UpdateTarget],
    update: &ViewUpdate,
    reporter: &dyn ErrorReporter,
    action: &str,
) -> Result<PushReceipt, ViewError> {
    let mut gone = Vec::new();
    for target in targets {
        match target.push(update).await {
            Ok(receipt) => return Ok(receipt),
            Err(SurfaceError::Gone(why)) => {
                debug!(target = %target.describe(), %why, "Update target gone, falling back");
                gone.push(format!("{}: {}", target.describe(), why));
            }
            Err(SurfaceError::Failed(error)) => {
                let component = target.describe();
                reporter
                    .report(ErrorReport {
                        action: action.to_string(),
                        component: component.clone(),
                        error: error.clone(),
                    })
                    .await;
                return Err(ViewError::Update { component, error });
            }
        }
    }

    reporter
        .report(ErrorReport {
            action: action.to_string(),
            component: "view".to_string(),
            error: if gone.is_empty() {
                "no update targets".to_string()
            } else {
                gone.join("; ")
            },
        })
        .await;
    Err(ViewError::Unreachable)
}
