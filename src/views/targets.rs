use async_trait::async_trait;
use serenity::{
    builder::{EditInteractionResponse, EditMessage},
    http::Http,
    model::{
        application::{CommandInteraction, ComponentInteraction},
        channel::Message,
        id::{ChannelId, MessageId},
    },
};
use std::sync::Arc;

use super::{PushReceipt, SurfaceError, UpdateTarget, ViewUpdate};
use crate::error::http_status;

fn classify(why: serenity::Error) -> SurfaceError {
    match http_status(&why) {
        Some(403 | 404) => SurfaceError::Gone(why.to_string()),
        _ => SurfaceError::Failed(why.to_string()),
    }
}

fn receipt(message: &Message) -> PushReceipt {
    PushReceipt {
        image_url: message
            .embeds
            .first()
            .and_then(|embed| embed.image.as_ref())
            .map(|image| image.url.clone()),
        message: Some((message.channel_id, message.id)),
    }
}

/// Edits a message directly through its channel.
pub struct MessageTarget {
    http: Arc<Http>,
    channel_id: ChannelId,
    message_id: MessageId,
}

impl MessageTarget {
    pub fn new(http: Arc<Http>, channel_id: ChannelId, message_id: MessageId) -> Self {
        Self {
            http,
            channel_id,
            message_id,
        }
    }
}

#[async_trait]
impl UpdateTarget for MessageTarget {
    fn describe(&self) -> String {
        format!("message {} in {}", self.message_id, self.channel_id)
    }

    async fn push(&self, update: &ViewUpdate) -> Result<PushReceipt, SurfaceError> {
        let mut edit = EditMessage::new()
            .embed(update.page.to_embed())
            .components(update.controls.components())
            .remove_all_attachments();
        if let Some(attachment) = &update.upload {
            edit = edit.new_attachment(attachment.upload());
        }

        let message = self
            .channel_id
            .edit_message(self.http.as_ref(), self.message_id, edit)
            .await
            .map_err(classify)?;
        Ok(receipt(&message))
    }

    async fn delete(&self) -> Result<(), SurfaceError> {
        self.channel_id
            .delete_message(self.http.as_ref(), self.message_id)
            .await
            .map_err(classify)
    }
}

/// An interaction whose original response can still be edited.
#[derive(Clone)]
pub enum Responder {
    Command(CommandInteraction),
    Component(ComponentInteraction),
}

/// Edits the original response of an interaction.
pub struct ResponseTarget {
    http: Arc<Http>,
    responder: Responder,
}

impl ResponseTarget {
    pub fn new(http: Arc<Http>, responder: Responder) -> Self {
        Self { http, responder }
    }
}

#[async_trait]
impl UpdateTarget for ResponseTarget {
    fn describe(&self) -> String {
        match &self.responder {
            Responder::Command(command) => format!("response to /{}", command.data.name),
            Responder::Component(component) => {
                format!("response to component {}", component.data.custom_id)
            }
        }
    }

    async fn push(&self, update: &ViewUpdate) -> Result<PushReceipt, SurfaceError> {
        let mut edit = EditInteractionResponse::new()
            .embed(update.page.to_embed())
            .components(update.controls.components())
            .clear_attachments();
        if let Some(attachment) = &update.upload {
            edit = edit.new_attachment(attachment.upload());
        }

        let http = self.http.as_ref();
        let message = match &self.responder {
            Responder::Command(command) => command.edit_response(http, edit).await,
            Responder::Component(component) => component.edit_response(http, edit).await,
        }
        .map_err(classify)?;
        Ok(receipt(&message))
    }

    async fn delete(&self) -> Result<(), SurfaceError> {
        let http = self.http.as_ref();
        match &self.responder {
            Responder::Command(command) => command.delete_response(http).await,
            Responder::Component(component) => component.delete_response(http).await,
        }
        .map_err(classify)
    }

    fn follow(&self, receipt: &PushReceipt) -> Option<Box<dyn UpdateTarget>> {
        let (channel_id, message_id) = receipt.message?;
        Some(Box::new(MessageTarget::new(
            Arc::clone(&self.http),
            channel_id,
            message_id,
        )))
    }
}
