use super::*;

/// Groups commands in the help menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Utility,
    Tickets,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Utility, Category::Tickets];

    pub fn name(self) -> &'static str {
        match self {
            Self::Utility => "Utility",
            Self::Tickets => "Tickets",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Utility => "Utility commands for the bot displaying information about the bot.",
            Self::Tickets => "Ticket system commands",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(name))
    }
}

/// A command option as described in help.
pub struct Argument {
    pub name: &'static str,
    pub description: &'static str,
}

pub struct Subcommand {
    pub name: &'static str,
    pub description: &'static str,
    pub arguments: &'static [Argument],
}

#[async_trait]
pub trait Command: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn category(&self) -> Category;

    fn arguments(&self) -> &'static [Argument] {
        &[]
    }

    fn subcommands(&self) -> &'static [Subcommand] {
        &[]
    }

    /// Whether the deferred response is only shown to the invoking user.
    fn ephemeral(&self) -> bool {
        false
    }

    fn create(&self) -> CreateCommand;

    /// Runs after the interaction has been deferred.
    async fn handle(
        &self,
        ctx: &Context,
        manager: &Manager,
        command: &CommandInteraction,
    ) -> Result<(), CommandError>;

    async fn autocomplete(
        &self,
        _ctx: &Context,
        _manager: &Manager,
        _command: &CommandInteraction,
    ) -> Result<(), CommandError> {
        Ok(())
    }
}

/// Replaces the deferred response with `page`.
pub async fn respond(
    ctx: &Context,
    command: &CommandInteraction,
    page: &Page,
) -> Result<(), CommandError> {
    command
        .edit_response(ctx, EditInteractionResponse::new().embed(page.to_embed()))
        .await?;
    Ok(())
}

pub fn option<'a>(options: &'a [ResolvedOption<'a>], name: &str) -> Option<&'a ResolvedValue<'a>> {
    options.iter().find(|o| o.name == name).map(|o| &o.value)
}
