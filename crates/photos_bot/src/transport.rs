//! Chat transport seam.
//!
//! The bot never talks to a homeserver directly. Everything network
//! related (login, decryption, history, replies) sits behind
//! [`ChatTransport`], and inbound traffic arrives as [`InboundEvent`]s.

use async_trait::async_trait;
use photos_error::PhotosResult;
use serde::{Deserialize, Serialize};

/// Identity reported by the server after login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Logged-in user
    pub user_id: String,
    /// Logged-in device, if the server reports one
    #[serde(default)]
    pub device_id: Option<String>,
}

/// Room membership states carried by member events.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Membership {
    /// Pending invitation
    Invite,
    /// Joined
    Join,
    /// Left or kicked
    Leave,
    /// Banned
    Ban,
}

/// Membership change addressed to some user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberEvent {
    /// Room the membership applies to
    pub room_id: String,
    /// User who sent the event
    pub sender: String,
    /// User whose membership changes
    pub state_key: String,
    /// New membership
    pub membership: Membership,
}

/// Attachment metadata of a media message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAttachment {
    /// Suggested filename
    pub body: String,
    /// Declared MIME type
    #[serde(default)]
    pub mimetype: Option<String>,
    /// Declared size in bytes
    #[serde(default)]
    pub size: Option<u64>,
    /// Where the transport fetches the bytes from
    pub url: String,
    /// Whether the attachment was sent end-to-end encrypted
    #[serde(default)]
    pub encrypted: bool,
}

/// Content of a room message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "msgtype", rename_all = "snake_case")]
pub enum MessageContent {
    /// Plain text
    Text {
        /// Message text
        body: String,
    },
    /// Image, video, audio or file
    Media(MediaAttachment),
}

impl MessageContent {
    /// Whether this is a media message.
    pub fn is_media(&self) -> bool {
        matches!(self, MessageContent::Media(_))
    }
}

/// A room message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEvent {
    /// Room the message was sent to
    pub room_id: String,
    /// Unique id of the message
    pub event_id: String,
    /// Author
    pub sender: String,
    /// Payload
    pub content: MessageContent,
}

/// Anything the bot reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    /// Membership change, relevant for invites
    Member(MemberEvent),
    /// Room message
    Message(MessageEvent),
}

impl InboundEvent {
    /// Room the event belongs to.
    pub fn room_id(&self) -> &str {
        match self {
            InboundEvent::Member(event) => &event.room_id,
            InboundEvent::Message(event) => &event.room_id,
        }
    }
}

/// Connection to a chat network.
///
/// Implementations handle login, encryption and history; the bot only sees
/// decrypted events and plain byte payloads.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Log in and report the identity the server sees.
    async fn connect(&self) -> PhotosResult<SessionInfo>;

    /// Join a room.
    async fn join_room(&self, room_id: &str) -> PhotosResult<()>;

    /// Fetch (and decrypt) an attachment.
    async fn download_media(&self, attachment: &MediaAttachment) -> PhotosResult<Vec<u8>>;

    /// Send a text reply to `reply_to` in `room_id`.
    async fn send_text(&self, room_id: &str, reply_to: &str, body: &str) -> PhotosResult<()>;

    /// Whether the message `sender` sent before `event_id` was media.
    async fn preceded_by_media(
        &self,
        room_id: &str,
        sender: &str,
        event_id: &str,
    ) -> PhotosResult<bool>;

    /// Close the connection.
    async fn shutdown(&self) -> PhotosResult<()>;
}
