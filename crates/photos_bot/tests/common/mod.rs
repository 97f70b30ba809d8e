//! Shared fixtures for bot tests.

#![allow(dead_code)]

use async_trait::async_trait;
use photos_bot::{
    BotConfig, ChatTransport, InboundEvent, MediaAttachment, MemberEvent, Membership,
    MessageContent, MessageEvent, SessionInfo,
};
use photos_error::{PhotosResult, TransportError, TransportErrorKind};
use photos_storage::{Conversion, Converter, MediaStore, SpaceProbe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const BOT: &str = "@photos:example.org";
pub const ALICE: &str = "@alice:example.org";
pub const MALLORY: &str = "@mallory:example.org";
pub const ADMIN: &str = "@admin:example.org";
pub const ROOM: &str = "!family:example.org";

/// Converter call captured by [`RecordingConverter`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub path: PathBuf,
    pub caption: Option<String>,
}

#[derive(Debug, Default)]
pub struct RecordingConverter {
    calls: Mutex<Vec<RecordedCall>>,
}

impl RecordingConverter {
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Converter for RecordingConverter {
    async fn convert(&self, path: &Path, conversion: Conversion<'_>) {
        self.calls.lock().unwrap().push(RecordedCall {
            path: path.to_path_buf(),
            caption: conversion.caption.map(|c| c.text.to_string()),
        });
    }
}

pub struct AmpleProbe;

impl SpaceProbe for AmpleProbe {
    fn available_bytes(&self, _path: &Path) -> PhotosResult<u64> {
        Ok(500 * 1024 * 1024 * 1024)
    }
}

/// Options varied between tests.
pub struct Settings<'a> {
    pub admin_user: Option<&'a str>,
    pub responses: &'a [&'a str],
    pub max_download_size_mb: u64,
    pub write_text_messages: bool,
}

impl Default for Settings<'_> {
    fn default() -> Self {
        Self {
            admin_user: Some(ADMIN),
            responses: &["Thanks!"],
            max_download_size_mb: 1,
            write_text_messages: true,
        }
    }
}

fn toml_list(items: &[&str]) -> String {
    let quoted: Vec<String> = items.iter().map(|i| format!("'{}'", i)).collect();
    format!("[{}]", quoted.join(", "))
}

/// Configuration with media and ledgers inside `temp_dir`.
pub fn bot_config(temp_dir: &TempDir, settings: Settings<'_>) -> BotConfig {
    let media = temp_dir.path().join("media");
    let admin = settings
        .admin_user
        .map(|a| format!("admin_user = '{}'", a))
        .unwrap_or_default();
    let text = format!(
        r#"
[matrix]
user_id = '{bot}'
user_password = 'secret'
device_id = 'PHOTOS'
base_url = 'https://matrix.example.org'
database_url = 'sqlite://crypto.db'
{admin}
trusted_users = ['{alice}']
allowed_mimetypes = ['image/jpeg', 'image/png']
max_download_size_mb = {max_mb}
random_response_messages = {responses}
connect_retries = 3
connect_backoff_ms = 1

[storage]
media_path = '{media}'
media_file = '{recent}'
complete_media_file = '{all}'
max_file_count = 10

[storage.convert]
convert_binary = '/usr/bin/convert'

[storage.message_convert]
write_text_messages = {write_text}
convert_binary = '/usr/bin/convert'
convert_text_parameter = '-annotate'
"#,
        bot = BOT,
        admin = admin,
        alice = ALICE,
        max_mb = settings.max_download_size_mb,
        responses = toml_list(settings.responses),
        media = media.display(),
        recent = media.join("recent.txt").display(),
        all = media.join("all.txt").display(),
        write_text = settings.write_text_messages,
    );
    BotConfig::from_toml(&text).unwrap()
}

/// Store with a recording converter and plenty of free space.
pub fn recording_store(config: &BotConfig) -> (MediaStore, Arc<RecordingConverter>) {
    let converter = Arc::new(RecordingConverter::default());
    let store = MediaStore::with_parts(
        config.storage().clone(),
        converter.clone(),
        Arc::new(AmpleProbe),
    )
    .unwrap();
    (store, converter)
}

/// Write an incoming file and describe it as an attachment.
pub fn attachment(temp_dir: &TempDir, name: &str, data: &[u8]) -> MediaAttachment {
    let incoming = temp_dir.path().join("incoming");
    std::fs::create_dir_all(&incoming).unwrap();
    let path = incoming.join(name);
    std::fs::write(&path, data).unwrap();
    MediaAttachment {
        body: name.to_string(),
        mimetype: Some("image/jpeg".to_string()),
        size: Some(data.len() as u64),
        url: format!("file://{}", path.display()),
        encrypted: true,
    }
}

pub fn media_event(event_id: &str, sender: &str, attachment: MediaAttachment) -> MessageEvent {
    MessageEvent {
        room_id: ROOM.to_string(),
        event_id: event_id.to_string(),
        sender: sender.to_string(),
        content: MessageContent::Media(attachment),
    }
}

pub fn text_event(event_id: &str, sender: &str, body: &str) -> MessageEvent {
    MessageEvent {
        room_id: ROOM.to_string(),
        event_id: event_id.to_string(),
        sender: sender.to_string(),
        content: MessageContent::Text {
            body: body.to_string(),
        },
    }
}

pub fn invite(sender: &str, state_key: &str) -> MemberEvent {
    MemberEvent {
        room_id: ROOM.to_string(),
        sender: sender.to_string(),
        state_key: state_key.to_string(),
        membership: Membership::Invite,
    }
}

pub fn message(event: MessageEvent) -> InboundEvent {
    InboundEvent::Message(event)
}

/// Transport whose `connect` fails a set number of times first.
pub struct FlakyTransport {
    failures_left: AtomicUsize,
    attempts: AtomicUsize,
    failure: TransportErrorKind,
    session: SessionInfo,
}

impl FlakyTransport {
    pub fn new(failures: usize, failure: TransportErrorKind, session: SessionInfo) -> Self {
        Self {
            failures_left: AtomicUsize::new(failures),
            attempts: AtomicUsize::new(0),
            failure,
            session,
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatTransport for FlakyTransport {
    async fn connect(&self) -> PhotosResult<SessionInfo> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(TransportError::new(self.failure.clone()).into());
        }
        Ok(self.session.clone())
    }

    async fn join_room(&self, _room_id: &str) -> PhotosResult<()> {
        Ok(())
    }

    async fn download_media(&self, _attachment: &MediaAttachment) -> PhotosResult<Vec<u8>> {
        Ok(Vec::new())
    }

    async fn send_text(&self, _room_id: &str, _reply_to: &str, _body: &str) -> PhotosResult<()> {
        Ok(())
    }

    async fn preceded_by_media(
        &self,
        _room_id: &str,
        _sender: &str,
        _event_id: &str,
    ) -> PhotosResult<bool> {
        Ok(false)
    }

    async fn shutdown(&self) -> PhotosResult<()> {
        Ok(())
    }
}

pub fn session(user_id: &str, device_id: Option<&str>) -> SessionInfo {
    SessionInfo {
        user_id: user_id.to_string(),
        device_id: device_id.map(String::from),
    }
}
