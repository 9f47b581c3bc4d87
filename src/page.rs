use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use serenity::{
    builder::{CreateAttachment, CreateEmbed, CreateEmbedAuthor, CreateEmbedFooter},
    model::Timestamp,
};
use std::sync::Arc;

use crate::constants::TIPS;

/// Binary content shown as a page's image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub data: Arc<[u8]>,
}

impl Attachment {
    pub fn new(filename: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }

    /// A fresh upload of the same bytes.
    pub fn upload(&self) -> CreateAttachment {
        CreateAttachment::bytes(self.data.to_vec(), self.filename.clone())
    }

    pub fn url(&self) -> String {
        format!("attachment://{}", self.filename)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Footer {
    pub text: String,
    pub icon_url: Option<String>,
}

/// One fully rendered embed, optionally carrying an image attachment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub color: Option<u32>,
    pub author: Option<(String, Option<String>)>,
    pub thumbnail: Option<String>,
    pub image: Option<String>,
    pub fields: Vec<Field>,
    pub footer: Option<Footer>,
    pub timestamp: Option<DateTime<Utc>>,
    pub attachment: Option<Attachment>,
}

impl Page {
    pub fn new() -> Self {
        Self {
            timestamp: Some(Utc::now()),
            ..Self::default()
        }
    }

    /// A page with a random tip in its footer, signed with `icon_url`.
    pub fn with_tip(icon_url: Option<String>) -> Self {
        let tip = TIPS.choose(&mut rand::thread_rng()).copied().unwrap_or_default();
        Self::new().footer(tip, icon_url)
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }

    pub fn author(mut self, name: impl Into<String>, icon_url: Option<String>) -> Self {
        self.author = Some((name.into(), icon_url));
        self
    }

    pub fn thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail = Some(url.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(Field {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn footer(mut self, text: impl Into<String>, icon_url: Option<String>) -> Self {
        self.footer = Some(Footer {
            text: text.into(),
            icon_url,
        });
        self
    }

    pub fn attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    /// Prepends `text` to the current footer, keeping the old icon unless a new one is
    /// given.
    pub fn add_footer(&mut self, text: &str, icon_url: Option<String>) {
        let footer = self.footer.take().unwrap_or_default();
        let text = if footer.text.is_empty() {
            text.to_string()
        } else {
            format!("{} | {}", text, footer.text)
        };
        self.footer = Some(Footer {
            text,
            icon_url: icon_url.or(footer.icon_url),
        });
    }

    pub fn footer_text(&self) -> &str {
        self.footer.as_ref().map_or("", |f| f.text.as_str())
    }

    /// Characters Discord counts against a message's total embed text.
    pub fn text_len(&self) -> usize {
        let count = |text: &str| text.chars().count();
        self.title.as_deref().map_or(0, count)
            + self.description.as_deref().map_or(0, count)
            + self.author.as_ref().map_or(0, |(name, _)| count(name))
            + count(self.footer_text())
            + self
                .fields
                .iter()
                .map(|f| count(&f.name) + count(&f.value))
                .sum::<usize>()
    }

    pub fn to_embed(&self) -> CreateEmbed {
        let mut embed = CreateEmbed::new();
        if let Some(title) = &self.title {
            embed = embed.title(title);
        }
        if let Some(description) = &self.description {
            embed = embed.description(description);
        }
        if let Some(url) = &self.url {
            embed = embed.url(url);
        }
        if let Some(color) = self.color {
            embed = embed.colour(color);
        }
        if let Some((name, icon_url)) = &self.author {
            let mut author = CreateEmbedAuthor::new(name);
            if let Some(icon_url) = icon_url {
                author = author.icon_url(icon_url);
            }
            embed = embed.author(author);
        }
        if let Some(thumbnail) = &self.thumbnail {
            embed = embed.thumbnail(thumbnail);
        }
        if let Some(image) = &self.image {
            embed = embed.image(image);
        }
        for field in &self.fields {
            embed = embed.field(&field.name, &field.value, field.inline);
        }
        if let Some(footer) = &self.footer {
            let mut builder = CreateEmbedFooter::new(&footer.text);
            if let Some(icon_url) = &footer.icon_url {
                builder = builder.icon_url(icon_url);
            }
            embed = embed.footer(builder);
        }
        if let Some(timestamp) = self
            .timestamp
            .and_then(|t| Timestamp::from_unix_timestamp(t.timestamp()).ok())
        {
            embed = embed.timestamp(timestamp);
        }
        embed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_footer_prepends_and_keeps_icon() {
        let mut page = Page::new().footer("tip", Some("icon".to_string()));
        page.add_footer("Page 1/2", None);
        assert_eq!(page.footer_text(), "Page 1/2 | tip");
        assert_eq!(
            page.footer.as_ref().and_then(|f| f.icon_url.as_deref()),
            Some("icon")
        );
    }

    #[test]
    fn add_footer_on_empty_footer() {
        let mut page = Page::new();
        page.add_footer("Page 1/1", None);
        assert_eq!(page.footer_text(), "Page 1/1");
    }

    #[test]
    fn attachment_url_uses_filename() {
        let attachment = Attachment::new("chart.png", vec![1u8, 2, 3]);
        assert_eq!(attachment.url(), "attachment://chart.png");
    }
}
