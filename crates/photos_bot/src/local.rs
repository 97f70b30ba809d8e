//! Offline transport for running the bot against recorded events.
//!
//! Events are read from a JSON-lines file, media is fetched from local
//! paths (`file://` URLs or plain paths) and replies are logged and kept
//! in memory instead of being sent anywhere.

use crate::{ChatTransport, InboundEvent, MediaAttachment, SessionInfo};
use async_trait::async_trait;
use parking_lot::Mutex;
use photos_error::{PhotosError, PhotosResult, TransportError, TransportErrorKind};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A reply the bot sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    /// Room the reply went to
    pub room_id: String,
    /// Event being replied to
    pub reply_to: String,
    /// Reply text
    pub body: String,
}

#[derive(Debug, Clone)]
struct HistoryEntry {
    event_id: String,
    sender: String,
    media: bool,
}

/// Transport backed by local files.
#[derive(Debug)]
pub struct LocalTransport {
    session: SessionInfo,
    history: Mutex<HashMap<String, Vec<HistoryEntry>>>,
    joined: Mutex<Vec<String>>,
    sent: Mutex<Vec<SentMessage>>,
}

impl LocalTransport {
    /// Create a transport that reports the given identity on connect.
    pub fn new(user_id: impl Into<String>, device_id: Option<String>) -> Self {
        Self {
            session: SessionInfo {
                user_id: user_id.into(),
                device_id,
            },
            history: Mutex::new(HashMap::new()),
            joined: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Parse a JSON-lines event file. Blank lines and `#` comments are skipped.
    #[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn read_events(path: impl AsRef<Path>) -> PhotosResult<Vec<InboundEvent>> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            TransportError::new(TransportErrorKind::InvalidEvent(format!(
                "{}: {}",
                path.display(),
                e
            )))
        })?;
        parse_events(&content)
    }

    /// Remember a message so later history lookups can see it.
    ///
    /// Call this for every event before handing it to the bot, the same way
    /// a homeserver's timeline would contain it.
    pub fn record(&self, event: &InboundEvent) {
        if let InboundEvent::Message(message) = event {
            self.history
                .lock()
                .entry(message.room_id.clone())
                .or_default()
                .push(HistoryEntry {
                    event_id: message.event_id.clone(),
                    sender: message.sender.clone(),
                    media: message.content.is_media(),
                });
        }
    }

    /// Rooms joined so far.
    pub fn joined_rooms(&self) -> Vec<String> {
        self.joined.lock().clone()
    }

    /// Replies sent so far.
    pub fn sent_messages(&self) -> Vec<SentMessage> {
        self.sent.lock().clone()
    }
}

/// Parse JSON-lines text into events.
pub fn parse_events(content: &str) -> PhotosResult<Vec<InboundEvent>> {
    content
        .lines()
        .enumerate()
        .map(|(number, line)| (number + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(number, line)| {
            serde_json::from_str::<InboundEvent>(line).map_err(|e| {
                PhotosError::from(TransportError::new(TransportErrorKind::InvalidEvent(
                    format!("line {}: {}", number, e),
                )))
            })
        })
        .collect()
}

fn local_path(url: &str) -> PathBuf {
    PathBuf::from(url.strip_prefix("file://").unwrap_or(url))
}

#[async_trait]
impl ChatTransport for LocalTransport {
    async fn connect(&self) -> PhotosResult<SessionInfo> {
        tracing::debug!(user_id = %self.session.user_id, "Local transport connected");
        Ok(self.session.clone())
    }

    async fn join_room(&self, room_id: &str) -> PhotosResult<()> {
        tracing::info!(room_id, "Joined room");
        self.joined.lock().push(room_id.to_string());
        Ok(())
    }

    async fn download_media(&self, attachment: &MediaAttachment) -> PhotosResult<Vec<u8>> {
        let path = local_path(&attachment.url);
        let data = tokio::fs::read(&path).await.map_err(|e| {
            TransportError::new(TransportErrorKind::Download(format!(
                "{}: {}",
                path.display(),
                e
            )))
        })?;
        tracing::debug!(path = %path.display(), bytes = data.len(), "Read local media");
        Ok(data)
    }

    async fn send_text(&self, room_id: &str, reply_to: &str, body: &str) -> PhotosResult<()> {
        tracing::info!(room_id, reply_to, body, "Reply");
        self.sent.lock().push(SentMessage {
            room_id: room_id.to_string(),
            reply_to: reply_to.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }

    async fn preceded_by_media(
        &self,
        room_id: &str,
        sender: &str,
        event_id: &str,
    ) -> PhotosResult<bool> {
        let history = self.history.lock();
        let Some(timeline) = history.get(room_id) else {
            return Ok(false);
        };

        let end = timeline
            .iter()
            .position(|entry| entry.event_id == event_id)
            .unwrap_or(timeline.len());

        Ok(timeline[..end]
            .iter()
            .rev()
            .find(|entry| entry.sender == sender)
            .is_some_and(|entry| entry.media))
    }

    async fn shutdown(&self) -> PhotosResult<()> {
        tracing::debug!("Local transport closed");
        Ok(())
    }
}
