use async_trait::async_trait;
use serenity::{builder::CreateMessage, http::Http, model::id::ChannelId};
use std::sync::Arc;
use tracing::error;

use crate::{
    embeds,
    page::Page,
    views::{ErrorReport, ErrorReporter},
};

/// Discord's limit of embeds per message.
const EMBEDS_PER_MESSAGE: usize = 10;
/// Discord's limit on the combined embed text of one message.
const MESSAGE_TEXT_LIMIT: usize = 6000;

/// Groups consecutive pages into messages within both Discord limits.
fn batches(pages: &[Page]) -> Vec<&[Page]> {
    let mut batches = Vec::new();
    let mut start = 0;
    let mut size = 0;
    for (i, page) in pages.iter().enumerate() {
        let len = page.text_len();
        if i > start && (i - start == EMBEDS_PER_MESSAGE || size + len > MESSAGE_TEXT_LIMIT) {
            batches.push(&pages[start..i]);
            start = i;
            size = 0;
        }
        size += len;
    }
    if start < pages.len() {
        batches.push(&pages[start..]);
    }

    batches
}

/// Logs errors and forwards them to the developers' log channel.
pub struct LogChannelReporter {
    http: Arc<Http>,
    channel: ChannelId,
}

impl LogChannelReporter {
    pub fn new(http: Arc<Http>, channel: ChannelId) -> Self {
        Self { http, channel }
    }

    /// Posts `text` to the log channel, split over as many embeds as it needs.
    pub async fn log(&self, title: &str, text: &str) {
        error!("{}\n{}", title, text);

        let pages = embeds::error_pages(title, text, None);
        for batch in batches(&pages) {
            let message = CreateMessage::new().embeds(batch.iter().map(Page::to_embed).collect());
            if let Err(why) = self.channel.send_message(self.http.as_ref(), message).await {
                error!("Failed to send the error log: {}", why);
                return;
            }
        }
    }
}

#[async_trait]
impl ErrorReporter for LogChannelReporter {
    async fn report(&self, report: ErrorReport) {
        self.log(
            &format!("An error occurred in {}.", report.action),
            &format!("component: {}\n{}", report.component, report.error),
        )
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(len: usize) -> Page {
        Page::new().description("x".repeat(len))
    }

    #[test]
    fn long_reports_stay_under_the_text_limit() {
        let text = vec!["y".repeat(1000); 12].join("\n");
        let pages = embeds::error_pages("Traceback", &text, None);

        let batches = batches(&pages);

        assert!(batches.len() > 1);
        for batch in &batches {
            let size: usize = batch.iter().map(Page::text_len).sum();
            assert!(size <= MESSAGE_TEXT_LIMIT, "{} chars in one message", size);
        }
        assert_eq!(batches.iter().map(|b| b.len()).sum::<usize>(), pages.len());
    }

    #[test]
    fn short_pages_fill_ten_per_message() {
        let pages = (0..12).map(|_| page(10)).collect::<Vec<_>>();

        let sizes = batches(&pages).iter().map(|b| b.len()).collect::<Vec<_>>();

        assert_eq!(sizes, vec![10, 2]);
    }
}
