use super::*;
use serenity::builder::GetMessages;

const AMOUNT: Argument = Argument {
    name: "amount",
    description: "The amount of messages to clear.",
};

pub struct Clear;

#[async_trait]
impl Command for Clear {
    fn name(&self) -> &'static str {
        "clear"
    }

    fn description(&self) -> &'static str {
        "Clear a certain amount of messages."
    }

    fn category(&self) -> Category {
        Category::Utility
    }

    fn arguments(&self) -> &'static [Argument] {
        &[AMOUNT]
    }

    fn ephemeral(&self) -> bool {
        true
    }

    fn create(&self) -> CreateCommand {
        CreateCommand::new(self.name())
            .description(self.description())
            .default_member_permissions(Permissions::MANAGE_MESSAGES)
            .add_option(
                CreateCommandOption::new(CommandOptionType::Integer, AMOUNT.name, AMOUNT.description)
                    .min_int_value(1)
                    .max_int_value(100)
                    .required(true),
            )
    }

    async fn handle(
        &self,
        ctx: &Context,
        _manager: &Manager,
        command: &CommandInteraction,
    ) -> Result<(), CommandError> {
        require(command, Permissions::MANAGE_MESSAGES)?;
        require_bot(command, Permissions::MANAGE_MESSAGES | Permissions::READ_MESSAGE_HISTORY)?;

        let options = command.data.options();
        let amount = match option(&options, AMOUNT.name) {
            Some(ResolvedValue::Integer(n)) if (1..=100).contains(n) => *n as u8,
            _ => return Err(CommandError::BadArgument("Amount must be between 1 and 100.".to_string())),
        };

        let messages = command
            .channel_id
            .messages(ctx, GetMessages::new().limit(amount))
            .await?;
        let ids = messages.iter().map(|m| m.id).collect::<Vec<_>>();
        match ids.as_slice() {
            [] => {}
            [id] => command.channel_id.delete_message(ctx, *id).await?,
            _ => command.channel_id.delete_messages(ctx, &ids).await?,
        }

        let page = embeds::yes(
            "Purged",
            &format!("Purged {} messages.", ids.len()),
            Some(ctx.cache.current_user().face()),
        );
        respond(ctx, command, &page).await
    }
}
