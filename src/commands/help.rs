use super::*;
use crate::{
    ansi::{AnsiBuilder, Styles},
    views::{Link, Paginator, ViewError},
};
use serenity::builder::{CreateAutocompleteResponse, CreateInteractionResponse};
use std::collections::HashMap;

const ARGUMENT: Argument = Argument {
    name: "argument",
    description: "The command or category to get help about.",
};

/// Commands listed on one category page.
const COMMANDS_PER_PAGE: usize = 10;
/// Discord's cap on autocomplete choices.
const MAX_SUGGESTIONS: usize = 25;

pub struct Help;

/// What a help argument refers to.
enum Topic {
    Home,
    Category(Category),
    Command(&'static dyn Command),
    Subcommand(&'static dyn Command, &'static Subcommand),
    Invalid(String),
}

fn resolve(argument: Option<&str>) -> Topic {
    let argument = match argument.map(str::trim) {
        None | Some("") => return Topic::Home,
        Some(argument) => argument,
    };
    if let Some(category) = Category::parse(argument) {
        return Topic::Category(category);
    }

    let mut words = argument.split_whitespace();
    let command = words
        .next()
        .and_then(|name| all().iter().copied().find(|c| c.name().eq_ignore_ascii_case(name)));
    match (command, words.next(), words.next()) {
        (Some(command), None, _) => Topic::Command(command),
        (Some(command), Some(name), None) => command
            .subcommands()
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .map_or_else(
                || Topic::Invalid(argument.to_string()),
                |sub| Topic::Subcommand(command, sub),
            ),
        _ => Topic::Invalid(argument.to_string()),
    }
}

/// Every command name, subcommands spelled `command sub`.
fn command_names() -> Vec<String> {
    all()
        .iter()
        .flat_map(|c| {
            c.subcommands()
                .iter()
                .map(move |s| format!("{} {}", c.name(), s.name))
                .chain(std::iter::once(c.name().to_string()))
        })
        .collect()
}

fn suggestions(input: &str) -> Vec<String> {
    let input = input.to_lowercase();
    Category::ALL
        .iter()
        .map(|c| c.name().to_string())
        .chain(command_names())
        .filter(|name| name.to_lowercase().contains(&input))
        .take(MAX_SUGGESTIONS)
        .collect()
}

/// Display names of everything mentionable, resolved ahead of rendering.
type Mentions = HashMap<String, String>;

fn mention(mentions: &Mentions, name: &str) -> String {
    mentions
        .get(name)
        .cloned()
        .unwrap_or_else(|| format!("`/{}`", name))
}

fn category_pages(
    category: Category,
    mentions: &Mentions,
    user_avatar: Option<String>,
    bot_avatar: Option<String>,
) -> Vec<Page> {
    let entries = all()
        .iter()
        .filter(|c| c.category() == category)
        .flat_map(|c| {
            let subs = c
                .subcommands()
                .iter()
                .map(move |s| (format!("{} {}", c.name(), s.name), s.description));
            let own = c
                .subcommands()
                .is_empty()
                .then(|| (c.name().to_string(), c.description()));
            own.into_iter().chain(subs)
        })
        .map(|(name, description)| {
            format!(
                "- **{}**\n{}\n",
                mention(mentions, &name),
                ansi(description, Colors::Green)
            )
        })
        .collect::<Vec<_>>();

    let header = AnsiBuilder::new(category.description())
        .style(Styles::Bold)
        .style(Colors::Blue)
        .to_string();
    let page = |text: String| {
        Page::with_tip(user_avatar.clone())
            .description(format!("{}\n**Commands Info.**\n{}", header, text))
            .color(colors::BLUE)
            .author(format!("{} Commands", category.name()), bot_avatar.clone())
    };

    if entries.is_empty() {
        return vec![page("No commands yet.".to_string())];
    }
    entries
        .chunks(COMMANDS_PER_PAGE)
        .map(|chunk| page(chunk.concat()))
        .collect()
}

fn home_page(user_avatar: Option<String>, bot_avatar: Option<String>) -> Page {
    let mut page = Page::with_tip(user_avatar)
        .description("**Welcome to the help menu!**")
        .color(colors::GREEN);
    if let Some(avatar) = bot_avatar {
        page = page.thumbnail(avatar);
    }
    for category in Category::ALL {
        let names = all()
            .iter()
            .filter(|c| c.category() == category)
            .map(|c| c.name())
            .collect::<Vec<_>>()
            .join(", ");
        page = page.field(
            format!("{} Commands", category.name()),
            ansi(names, Colors::Yellow),
            false,
        );
    }
    page
}

fn describe_arguments(arguments: &[Argument]) -> String {
    arguments
        .iter()
        .map(|arg| {
            format!(
                "{}{}",
                ansi_bold(format!("{}: ", arg.name), Colors::Red),
                ansi(arg.description, Colors::Yellow)
            )
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn usage_page(
    name: &str,
    description: &str,
    arguments: &[Argument],
    requested_by: &str,
    user_avatar: Option<String>,
    bot_avatar: Option<String>,
) -> Page {
    let mut text = ansi(description, Colors::Blue);
    if !arguments.is_empty() {
        text.push_str("**Command Arguments:**\n");
        text.push_str(&describe_arguments(arguments));
    }

    let mut page = Page::with_tip(user_avatar)
        .author(format!("{} Command", title_case(name)), None)
        .description(text)
        .color(colors::GREEN);
    if let Some(avatar) = bot_avatar {
        page = page.thumbnail(avatar);
    }
    page.add_footer(&format!("Requested by: {}", requested_by), None);
    page
}

fn group_page(command: &dyn Command, user_avatar: Option<String>) -> Page {
    let mut text = format!("{} **Subcommands:**\n", ansi(command.description(), Colors::Blue));
    for sub in command.subcommands() {
        text.push_str(&ansi_bold(format!("{}: ", sub.name), Colors::Red));
        text.push_str(&ansi(sub.description, Colors::Yellow));
        text.push('\n');
    }
    Page::with_tip(user_avatar)
        .author(format!("{} Commands", title_case(command.name())), None)
        .description(text)
        .color(colors::GREEN)
}

fn title_case(name: &str) -> String {
    name.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn links(bot_id: u64) -> Vec<Link> {
    embeds::invite_links(bot_id)
        .into_iter()
        .filter(|link| link.label != "Website")
        .collect()
}

#[async_trait]
impl Command for Help {
    fn name(&self) -> &'static str {
        "help"
    }

    fn description(&self) -> &'static str {
        "Get help about a command or category."
    }

    fn category(&self) -> Category {
        Category::Utility
    }

    fn arguments(&self) -> &'static [Argument] {
        &[ARGUMENT]
    }

    fn create(&self) -> CreateCommand {
        CreateCommand::new(self.name())
            .description(self.description())
            .add_option(
                CreateCommandOption::new(CommandOptionType::String, ARGUMENT.name, ARGUMENT.description)
                    .set_autocomplete(true),
            )
    }

    async fn handle(
        &self,
        ctx: &Context,
        manager: &Manager,
        command: &CommandInteraction,
    ) -> Result<(), CommandError> {
        let options = command.data.options();
        let argument = match option(&options, ARGUMENT.name) {
            Some(ResolvedValue::String(s)) => Some(*s),
            _ => None,
        };

        let mut mentions = Mentions::new();
        for name in command_names() {
            let text = manager.mention(&name).await;
            mentions.insert(name, text);
        }
        let user = &command.user;
        let user_avatar = Some(user.face());
        let (bot_id, bot_avatar) = {
            let me = ctx.cache.current_user();
            (me.id.get(), Some(me.face()))
        };

        match resolve(argument) {
            Topic::Home => {
                let mut categories = vec![(
                    "Home".to_string(),
                    vec![home_page(user_avatar.clone(), bot_avatar.clone())],
                )];
                for category in Category::ALL {
                    categories.push((
                        category.name().to_string(),
                        category_pages(category, &mentions, user_avatar.clone(), bot_avatar.clone()),
                    ));
                }
                let paginator = Paginator::with_categories(user.id, categories)
                    .map_err(ViewError::from)?
                    .footer_icon(user_avatar)
                    .links(links(bot_id));
                manager.paginate(ctx, command, paginator).await
            }
            Topic::Category(category) => {
                let pages = category_pages(category, &mentions, user_avatar.clone(), bot_avatar);
                let paginator = Paginator::new(user.id, pages)
                    .map_err(ViewError::from)?
                    .footer_icon(user_avatar)
                    .links(links(bot_id));
                manager.paginate(ctx, command, paginator).await
            }
            Topic::Command(found) if !found.subcommands().is_empty() => {
                respond(ctx, command, &group_page(found, user_avatar)).await
            }
            Topic::Command(found) => {
                let page = usage_page(
                    found.name(),
                    found.description(),
                    found.arguments(),
                    &user.tag(),
                    user_avatar,
                    bot_avatar,
                );
                respond(ctx, command, &page).await
            }
            Topic::Subcommand(found, sub) => {
                let page = usage_page(
                    &format!("{} {}", found.name(), sub.name),
                    sub.description,
                    sub.arguments,
                    &user.tag(),
                    user_avatar,
                    bot_avatar,
                );
                respond(ctx, command, &page).await
            }
            Topic::Invalid(argument) => {
                let page = Page::with_tip(user_avatar)
                    .description(format!("`{}` is an invalid help argument.", argument));
                respond(ctx, command, &page).await
            }
        }
    }

    async fn autocomplete(
        &self,
        ctx: &Context,
        _manager: &Manager,
        command: &CommandInteraction,
    ) -> Result<(), CommandError> {
        let input = command.data.autocomplete().map_or("", |o| o.value);
        let response = suggestions(input)
            .into_iter()
            .fold(CreateAutocompleteResponse::new(), |response, name| {
                response.add_string_choice(name.clone(), name)
            });
        command
            .create_response(ctx, CreateInteractionResponse::Autocomplete(response))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_every_kind_of_topic() {
        assert!(matches!(resolve(None), Topic::Home));
        assert!(matches!(resolve(Some("  ")), Topic::Home));
        assert!(matches!(resolve(Some("utility")), Topic::Category(Category::Utility)));
        assert!(matches!(resolve(Some("ping")), Topic::Command(c) if c.name() == "ping"));
        assert!(matches!(
            resolve(Some("ticket create")),
            Topic::Subcommand(c, s) if c.name() == "ticket" && s.name == "create"
        ));
        assert!(matches!(resolve(Some("ticket nope")), Topic::Invalid(_)));
        assert!(matches!(resolve(Some("nope")), Topic::Invalid(a) if a == "nope"));
    }

    #[test]
    fn suggestions_filter_and_cap() {
        let tickets = suggestions("tick");
        assert!(tickets.contains(&"Tickets".to_string()));
        assert!(tickets.contains(&"ticket create".to_string()));
        assert!(!tickets.contains(&"ping".to_string()));
        assert!(suggestions("").len() <= MAX_SUGGESTIONS);
    }

    #[test]
    fn category_pages_list_their_commands() {
        let mut mentions = Mentions::new();
        mentions.insert("ping".to_string(), "</ping:1>".to_string());

        let pages = category_pages(Category::Utility, &mentions, None, None);

        let text = pages[0].description.clone().unwrap_or_default();
        assert!(text.contains("</ping:1>"));
        assert!(text.contains("`/help`"));
        assert!(!text.contains("ticket"));
    }

    #[test]
    fn ticket_category_lists_subcommands() {
        let pages = category_pages(Category::Tickets, &Mentions::new(), None, None);
        let text = pages[0].description.clone().unwrap_or_default();
        assert!(text.contains("`/ticket create`"));
        assert!(!text.contains("`/ticket`\n"));
    }

    #[test]
    fn home_has_a_field_per_category() {
        let page = home_page(None, None);
        assert_eq!(page.fields.len(), Category::ALL.len());
        assert_eq!(page.fields[0].name, "Utility Commands");
    }

    #[test]
    fn usage_lists_arguments() {
        let page = usage_page("clear", "Clear messages.", &[AMOUNT_DOC], "user#0", None, None);
        assert_eq!(page.author.as_ref().map(|a| a.0.as_str()), Some("Clear Command"));
        let text = page.description.unwrap_or_default();
        assert!(text.contains("**Command Arguments:**"));
        assert!(text.contains("amount: "));
        assert!(page.footer.unwrap().text.starts_with("Requested by: user#0"));
    }

    const AMOUNT_DOC: Argument = Argument {
        name: "amount",
        description: "How many.",
    };

    #[test]
    fn title_cases_each_word() {
        assert_eq!(title_case("ticket create"), "Ticket Create");
    }
}
