use super::*;

pub struct BotInfo;

#[async_trait]
impl Command for BotInfo {
    fn name(&self) -> &'static str {
        "botinfo"
    }

    fn description(&self) -> &'static str {
        "Information about the bot."
    }

    fn category(&self) -> Category {
        Category::Utility
    }

    fn create(&self) -> CreateCommand {
        CreateCommand::new(self.name()).description(self.description())
    }

    async fn handle(
        &self,
        ctx: &Context,
        _manager: &Manager,
        command: &CommandInteraction,
    ) -> Result<(), CommandError> {
        let me = ctx.cache.current_user().clone();
        let page = embeds::botinfo(
            &me.name,
            Some(me.face()),
            ctx.cache.guild_count(),
            ctx.cache.user_count(),
        );
        respond(ctx, command, &page).await
    }
}
