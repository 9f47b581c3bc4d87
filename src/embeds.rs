use crate::{
    ansi::{ansi, ansi_bold, AnsiBuilder, BackgroundColors, Colors, Styles},
    constants::{colors, GITHUB, INVITE, SPAM_BOT_THRESHOLD, SPAM_THRESHOLD, WEBSITE},
    page::Page,
    views::Link,
};

/// Longest run of lines packed into one error page.
const CHUNK_SIZE: usize = 1024;

/// What the log embeds need to know about a guild.
#[derive(Debug, Clone)]
pub struct GuildSummary {
    pub id: u64,
    pub name: String,
    pub owner_id: u64,
    pub members: u64,
    pub bots: u64,
    pub created_at: String,
    pub icon_url: Option<String>,
}

pub fn invite_url(bot_id: u64) -> String {
    format!(
        "https://discord.com/oauth2/authorize?client_id={}\
         &scope=applications.commands%20bot&permissions=277025778760",
        bot_id
    )
}

pub fn server_url() -> String {
    format!("https://discord.gg/{}", INVITE)
}

/// URL buttons shown under help and invite messages.
pub fn invite_links(bot_id: u64) -> Vec<Link> {
    vec![
        Link {
            label: "Invite Bot".to_string(),
            url: invite_url(bot_id),
            emoji: Some("ℹ️".to_string()),
        },
        Link {
            label: "Website".to_string(),
            url: WEBSITE.to_string(),
            emoji: Some("🌐".to_string()),
        },
        Link {
            label: "Support Server".to_string(),
            url: server_url(),
            emoji: Some("👥".to_string()),
        },
    ]
}

pub fn yes(title: &str, description: &str, icon: Option<String>) -> Page {
    Page::with_tip(icon)
        .title(title)
        .description(description)
        .color(colors::GREEN)
}

pub fn no(title: &str, description: &str, icon: Option<String>) -> Page {
    Page::with_tip(icon)
        .title(title)
        .description(description)
        .color(colors::RED)
}

/// Splits `text` into pages of at most [`CHUNK_SIZE`] bytes of output, newlines
/// included, breaking only between lines. A single longer line gets a page of its own.
pub fn error_pages(title: &str, text: &str, icon: Option<String>) -> Vec<Page> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut size = 0;
    for line in text.lines() {
        if !current.is_empty() && size + 1 + line.len() > CHUNK_SIZE {
            chunks.push(current.join("\n"));
            current.clear();
            size = 0;
        }
        if !current.is_empty() {
            size += 1;
        }
        size += line.len();
        current.push(line);
    }
    if !current.is_empty() {
        chunks.push(current.join("\n"));
    }
    if chunks.is_empty() {
        chunks.push("No output.".to_string());
    }

    chunks
        .into_iter()
        .map(|chunk| {
            Page::with_tip(icon.clone())
                .title(title)
                .description(format!("```\n{}```", chunk))
                .color(colors::RED)
        })
        .collect()
}

pub fn ping(rest_ms: f64, database_ms: f64, thumbnail: Option<String>) -> Page {
    let mut page = Page::new()
        .title("🏓 Pong!")
        .description(format!(
            "{}{}",
            ansi_bold(format!("Bot: {:.2}ms", rest_ms), Colors::Cyan),
            ansi_bold(format!("Database: {:.2}ms", database_ms), Colors::Magenta),
        ))
        .color(colors::GREEN);
    if let Some(thumbnail) = thumbnail {
        page = page.thumbnail(thumbnail);
    }
    page
}

pub fn invite(bot_name: &str, avatar: Option<String>) -> Page {
    let mut description = format!("Thank you for using **{}**\n\n", bot_name);
    for (head, value) in [
        (
            format!("[Website]({})", WEBSITE),
            "Please check out our website for detailed information on our bot.",
        ),
        (
            format!("[Support Server]({})", server_url()),
            "Feel free to check out our official server for updates on events and giveaways \
             and more.",
        ),
        (
            format!("[Source]({})", GITHUB),
            "The code behind the bot.",
        ),
    ] {
        description.push_str(&format!("**{}**\n{}\n\n", head, value));
    }

    let mut page = Page::new()
        .author(format!("Invite {}", bot_name), None)
        .description(description)
        .color(colors::RED);
    if let Some(avatar) = avatar {
        page = page.thumbnail(avatar);
    }
    page
}

pub fn botinfo(bot_name: &str, avatar: Option<String>, guilds: usize, users: usize) -> Page {
    Page::new()
        .author(bot_name, avatar)
        .description(ansi_bold(
            "Template discord bot. Planned to contain moderation, utility, fun, and music \
             commands.",
            Colors::Magenta,
        ))
        .color(colors::RED)
        .field("Servers", guilds.to_string(), true)
        .field("Users", users.to_string(), true)
}

pub fn guild_join(guild: &GuildSummary, icon: Option<String>) -> Page {
    let mut page = Page::with_tip(icon)
        .title("Joined a new guild!")
        .description(
            AnsiBuilder::new(format!("{} ({})", guild.name, guild.id))
                .style(Colors::Green)
                .style(Styles::Bold)
                .style(BackgroundColors::FireflyDarkBlue)
                .to_string(),
        )
        .color(colors::GREEN)
        .field("Owner", ansi(guild.owner_id.to_string(), Colors::Red), true)
        .field("Members", ansi(guild.members.to_string(), Colors::Magenta), true)
        .field("Created at", ansi(guild.created_at.clone(), Colors::Cyan), true);
    if let Some(icon_url) = &guild.icon_url {
        page = page.thumbnail(icon_url.clone());
    }
    page
}

pub fn guild_leave(guild: &GuildSummary, icon: Option<String>) -> Page {
    guild_join(guild, icon).title("Left a guild!")
}

/// Whether a guild looks like a bot farm or a throwaway.
pub fn is_spam(members: u64, bots: u64) -> bool {
    members < SPAM_THRESHOLD as u64 || bots as f64 / members as f64 >= SPAM_BOT_THRESHOLD
}

pub fn spam_guild(guild: &GuildSummary, icon: Option<String>) -> Page {
    let limits = format!(
        "Minimum members: {} | Bot threshold: {}",
        SPAM_THRESHOLD, SPAM_BOT_THRESHOLD
    );
    Page::with_tip(icon)
        .title("🚫 Unauthorized guild")
        .description(format!(
            "**This guild has been automatically removed from the bot because it is a spam \
             guild.**\n\n*If you think this is a mistake, please contact the bot owner.*\n\n{}\n\
             \n**👤 Members:** `{}` ◈ **🤖 Bots:** `{}`",
            ansi_bold(limits, Colors::Red),
            guild.members,
            guild.bots
        ))
        .color(colors::RED)
}

pub fn welcome(guild_name: &str, avatar: Option<String>) -> Page {
    let mut page = Page::with_tip(avatar.clone())
        .title("Welcome to Template Bot!")
        .description("Template Bot for ticket, moderation, fun, and more!")
        .url(WEBSITE)
        .color(colors::YELLOW);
    if let Some(avatar) = avatar {
        page = page.thumbnail(avatar);
    }
    page.add_footer(&format!("Thanks for adding me to {}!", guild_name), None);
    page
}

pub fn ticket_panel(guild_icon: Option<String>) -> Page {
    Page::new()
        .title("🎫 Support Ticket")
        .color(colors::BLUE)
        .thumbnail("https://i.imgur.com/iJFFLJ8.png")
        .footer(
            "➣ Opening tickets without reason will result in penalties.\n\
             ➣ Mention the reason you opened the ticket for right away.\n\
             ➣ Specify the reason descriptively.\n\
             ➣ Do not ping any staff or developers. Wait patiently as all tickets will be \
             attended.\n\n\n\
             Click the button below to open a ticket.",
            guild_icon,
        )
}

pub fn ticket_opened(user_tag: &str, avatar: Option<String>, opened_at: i64) -> Page {
    let mut page = Page::new()
        .title("Support Ticket")
        .color(colors::BLUE)
        .field("Time Opened", format!("<t:{}:F>", opened_at), true)
        .field("Opened For", user_tag, true)
        .footer("Please be patient while a staff member gets to this ticket.", None);
    if let Some(avatar) = avatar {
        page = page.thumbnail(avatar);
    }
    page
}

pub fn ticket_closed(mention: &str) -> Page {
    Page::new()
        .description(format!(
            "✅ The ticket has been closed by {}.\n\n\
             Click `🔓` to reopen the ticket.\n\
             Click `🗑️` to delete the ticket.",
            mention
        ))
        .color(colors::BLUE)
}

pub fn ticket_reopened(mention: &str) -> Page {
    Page::new()
        .description(format!(
            "✅ The ticket has been re-opened by {}.\n\nClick `🔒` to close the ticket.",
            mention
        ))
        .color(colors::GREEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_pages_split_between_lines() {
        let line = "x".repeat(600);
        let text = format!("{}\n{}\n{}", line, line, line);

        let pages = error_pages("Traceback", &text, None);

        assert_eq!(pages.len(), 3);
        for page in &pages {
            let description = page.description.as_deref().unwrap_or_default();
            assert!(description.starts_with("```\n"));
            assert!(description.len() <= CHUNK_SIZE + 8);
        }
    }

    #[test]
    fn newlines_count_towards_the_chunk() {
        let line = "x".repeat(CHUNK_SIZE / 2);
        let text = format!("{}\n{}", line, line);

        let pages = error_pages("Traceback", &text, None);

        assert_eq!(pages.len(), 2);
    }

    #[test]
    fn short_lines_share_a_page() {
        let pages = error_pages("Oops", "a\nb\nc", None);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].description.as_deref(), Some("```\na\nb\nc```"));
    }

    #[test]
    fn empty_output_still_has_a_page() {
        let pages = error_pages("Oops", "", None);
        assert_eq!(pages[0].description.as_deref(), Some("```\nNo output.```"));
    }

    #[test]
    fn spam_guilds() {
        assert!(is_spam(5, 0));
        assert!(is_spam(0, 0));
        assert!(is_spam(40, 20));
        assert!(!is_spam(40, 19));
    }

    #[test]
    fn leave_reuses_join_layout() {
        let guild = GuildSummary {
            id: 1,
            name: "Test".to_string(),
            owner_id: 2,
            members: 30,
            bots: 1,
            created_at: "01/01/2023 00:00:00".to_string(),
            icon_url: None,
        };
        let page = guild_leave(&guild, None);
        assert_eq!(page.title.as_deref(), Some("Left a guild!"));
        assert_eq!(page.fields.len(), 3);
    }

    #[test]
    fn welcome_footer_thanks_the_guild() {
        let page = welcome("Rustaceans", None);
        assert!(page.footer_text().starts_with("Thanks for adding me to Rustaceans!"));
    }
}
