//! Event routing: invites, media and text.

use crate::{
    AdminCommandHandler, ChatTransport, InboundEvent, MatrixConfig, MediaAttachment, MemberEvent,
    Membership, MessageContent, MessageEvent,
};
use photos_error::PhotosResult;
use photos_storage::{CaptionWriter, MediaStore, StoredMedia};
use rand::seq::SliceRandom;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Reply sent when an attachment is refused.
pub const REVOKED_REPLY: &str = "your file has been revoked.";

/// Why a media message was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Rejection {
    /// Declared size over `max_download_size_mb`
    #[strum(serialize = "max download size exceeded")]
    TooLarge,
    /// Sent without end-to-end encryption
    #[strum(serialize = "attachment is not encrypted")]
    Unencrypted,
}

/// What happened to an event.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Joined the invited room
    Joined(String),
    /// Media stored
    Stored(StoredMedia),
    /// Media refused and revoked
    Rejected(Rejection),
    /// Admin command answered
    Command(String),
    /// Caption written into this file
    Captioned(PathBuf),
    /// Nothing to do
    Ignored,
}

/// Reacts to chat events.
pub struct PhotosBot<T: ChatTransport> {
    config: MatrixConfig,
    transport: Arc<T>,
    store: MediaStore,
    captions: CaptionWriter,
    admin: Option<AdminCommandHandler>,
}

impl<T: ChatTransport> PhotosBot<T> {
    /// Create a bot storing media in `store`.
    ///
    /// Admin commands are only available when an admin user is configured.
    pub fn new(config: MatrixConfig, transport: Arc<T>, store: MediaStore) -> Self {
        let captions = store.caption_writer();
        let admin = config
            .admin_user()
            .map(|_| AdminCommandHandler::new(store.clone()));
        Self {
            config,
            transport,
            store,
            captions,
            admin,
        }
    }

    /// The media store.
    pub fn store(&self) -> &MediaStore {
        &self.store
    }

    /// Handle one event, logging instead of returning failures.
    pub async fn handle_event(&self, event: &InboundEvent) -> Outcome {
        let result = match event {
            InboundEvent::Member(member) => self.handle_member(member).await,
            InboundEvent::Message(message) => self.handle_message(message).await,
        };

        match result {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, room_id = event.room_id(), "Failed to handle event");
                Outcome::Ignored
            }
        }
    }

    /// Join rooms the bot is invited to by trusted users.
    #[instrument(skip(self, event), fields(room_id = %event.room_id, sender = %event.sender))]
    pub async fn handle_member(&self, event: &MemberEvent) -> PhotosResult<Outcome> {
        if event.membership != Membership::Invite || event.state_key != *self.config.user_id() {
            return Ok(Outcome::Ignored);
        }

        if !self.config.is_trusted_user(&event.sender) {
            warn!("Ignoring invite from untrusted user");
            return Ok(Outcome::Ignored);
        }

        self.transport.join_room(&event.room_id).await?;
        info!("Accepted invite");
        Ok(Outcome::Joined(event.room_id.clone()))
    }

    /// Route a room message.
    #[instrument(skip(self, event), fields(room_id = %event.room_id, event_id = %event.event_id))]
    pub async fn handle_message(&self, event: &MessageEvent) -> PhotosResult<Outcome> {
        match &event.content {
            MessageContent::Text { body } => self.handle_text(event, body).await,
            MessageContent::Media(attachment) => self.handle_media(event, attachment).await,
        }
    }

    async fn handle_text(&self, event: &MessageEvent, body: &str) -> PhotosResult<Outcome> {
        let admin = self
            .admin
            .as_ref()
            .filter(|_| self.config.is_admin_user(&event.sender));
        if let Some(admin) = admin.filter(|_| AdminCommandHandler::is_admin_command(body)) {
            let Some(reply) = admin.handle(body).await else {
                return Ok(Outcome::Ignored);
            };
            self.transport
                .send_text(&event.room_id, &event.event_id, &reply)
                .await?;
            return Ok(Outcome::Command(reply));
        }

        if event.sender == *self.config.user_id() || !self.captions.enabled() {
            return Ok(Outcome::Ignored);
        }

        let after_media = self
            .transport
            .preceded_by_media(&event.room_id, &event.sender, &event.event_id)
            .await?;
        if !after_media {
            debug!("Text not preceded by media, no caption");
            return Ok(Outcome::Ignored);
        }

        Ok(match self.captions.handle(body).await? {
            Some(path) => Outcome::Captioned(path),
            None => Outcome::Ignored,
        })
    }

    async fn handle_media(
        &self,
        event: &MessageEvent,
        attachment: &MediaAttachment,
    ) -> PhotosResult<Outcome> {
        let mimetype = attachment.mimetype.as_deref().unwrap_or_default();
        if !self.config.is_allowed_mimetype(mimetype) {
            warn!(mimetype, "Mimetype not allowed");
            return Ok(Outcome::Ignored);
        }

        if let Some(rejection) = self.check_attachment(attachment) {
            warn!(%rejection, filename = %attachment.body, "Rejecting attachment");
            self.transport
                .send_text(&event.room_id, &event.event_id, REVOKED_REPLY)
                .await?;
            return Ok(Outcome::Rejected(rejection));
        }

        let data = self.transport.download_media(attachment).await?;
        let stored = self.store.store(&data, &attachment.body).await?;
        info!(path = %stored.path.display(), sender = %event.sender, "Stored attachment");

        if let Some(response) = self.random_response() {
            self.transport
                .send_text(&event.room_id, &event.event_id, &response)
                .await?;
        }
        Ok(Outcome::Stored(stored))
    }

    fn check_attachment(&self, attachment: &MediaAttachment) -> Option<Rejection> {
        let size = attachment.size.unwrap_or_default();
        if self.config.max_download_size_exceeded(size) {
            return Some(Rejection::TooLarge);
        }
        if !attachment.encrypted {
            return Some(Rejection::Unencrypted);
        }
        None
    }

    fn random_response(&self) -> Option<String> {
        let mut rng = rand::thread_rng();
        self.config
            .random_response_messages()
            .choose(&mut rng)
            .cloned()
    }
}
