use super::*;
use crate::views::link_row;

pub struct Invite;

#[async_trait]
impl Command for Invite {
    fn name(&self) -> &'static str {
        "invite"
    }

    fn description(&self) -> &'static str {
        "Returns the bot's invite and related urls."
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
        let page = embeds::invite(&me.name, Some(me.face()));

        command
            .edit_response(
                ctx,
                EditInteractionResponse::new()
                    .embed(page.to_embed())
                    .components(vec![link_row(&embeds::invite_links(me.id.get()))]),
            )
            .await?;
        Ok(())
    }
}
