use super::*;
use std::time::Instant;

pub struct Ping;

#[async_trait]
impl Command for Ping {
    fn name(&self) -> &'static str {
        "ping"
    }

    fn description(&self) -> &'static str {
        "Returns the bot's latency."
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
        manager: &Manager,
        command: &CommandInteraction,
    ) -> Result<(), CommandError> {
        let start = Instant::now();
        let me = ctx.http.get_current_user().await?;
        let rest = start.elapsed();
        let database = manager.db().ping().await?;

        let page = embeds::ping(
            rest.as_secs_f64() * 1000.0,
            database.as_secs_f64() * 1000.0,
            Some(me.face()),
        );
        respond(ctx, command, &page).await
    }
}
