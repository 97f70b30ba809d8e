//! Tests for event routing.

mod common;

use common::{
    attachment, bot_config, invite, media_event, message, recording_store, text_event, Settings,
    ADMIN, ALICE, BOT, MALLORY, ROOM,
};
use photos_bot::{
    InboundEvent, LocalTransport, Membership, Outcome, PhotosBot, Rejection, REREAD_REPLY,
    REVOKED_REPLY,
};
use std::sync::Arc;
use tempfile::TempDir;

struct Harness {
    temp_dir: TempDir,
    transport: Arc<LocalTransport>,
    bot: PhotosBot<LocalTransport>,
    converter: Arc<common::RecordingConverter>,
}

impl Harness {
    fn new(settings: Settings<'_>) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let config = bot_config(&temp_dir, settings);
        let (store, converter) = recording_store(&config);
        let transport = Arc::new(LocalTransport::new(BOT, Some("PHOTOS".to_string())));
        let bot = PhotosBot::new(config.matrix().clone(), transport.clone(), store);
        Self {
            temp_dir,
            transport,
            bot,
            converter,
        }
    }

    /// Record the event in the room history, then handle it.
    async fn deliver(&self, event: InboundEvent) -> Outcome {
        self.transport.record(&event);
        self.bot.handle_event(&event).await
    }

    fn replies(&self) -> Vec<String> {
        self.transport
            .sent_messages()
            .into_iter()
            .map(|m| m.body)
            .collect()
    }
}

#[tokio::test]
async fn test_trusted_invite_is_accepted() {
    let harness = Harness::new(Settings::default());

    let outcome = harness
        .deliver(InboundEvent::Member(invite(ALICE, BOT)))
        .await;

    assert_eq!(outcome, Outcome::Joined(ROOM.to_string()));
    assert_eq!(harness.transport.joined_rooms(), vec![ROOM.to_string()]);
}

#[tokio::test]
async fn test_untrusted_invite_is_ignored() {
    let harness = Harness::new(Settings::default());

    let outcome = harness
        .deliver(InboundEvent::Member(invite(MALLORY, BOT)))
        .await;

    assert_eq!(outcome, Outcome::Ignored);
    assert!(harness.transport.joined_rooms().is_empty());
}

#[tokio::test]
async fn test_invite_for_someone_else_is_ignored() {
    let harness = Harness::new(Settings::default());

    let outcome = harness
        .deliver(InboundEvent::Member(invite(ALICE, "@other:example.org")))
        .await;

    assert_eq!(outcome, Outcome::Ignored);
}

#[tokio::test]
async fn test_membership_other_than_invite_is_ignored() {
    let harness = Harness::new(Settings::default());
    let mut event = invite(ALICE, BOT);
    event.membership = Membership::Join;

    let outcome = harness.deliver(InboundEvent::Member(event)).await;

    assert_eq!(outcome, Outcome::Ignored);
}

#[tokio::test]
async fn test_media_is_stored_and_acknowledged() {
    let harness = Harness::new(Settings::default());
    let media = attachment(&harness.temp_dir, "beach.jpg", b"jpeg bytes");

    let outcome = harness
        .deliver(message(media_event("$1", ALICE, media)))
        .await;

    let Outcome::Stored(stored) = outcome else {
        panic!("expected stored outcome, got {:?}", outcome);
    };
    assert_eq!(std::fs::read(&stored.path).unwrap(), b"jpeg bytes");
    assert_eq!(
        harness.bot.store().index().last_entry().await.unwrap(),
        Some(stored.path)
    );
    assert_eq!(harness.replies(), vec!["Thanks!".to_string()]);
    assert_eq!(harness.transport.sent_messages()[0].reply_to, "$1");
}

#[tokio::test]
async fn test_no_reply_without_response_messages() {
    let harness = Harness::new(Settings {
        responses: &[],
        ..Settings::default()
    });
    let media = attachment(&harness.temp_dir, "beach.jpg", b"jpeg bytes");

    let outcome = harness
        .deliver(message(media_event("$1", ALICE, media)))
        .await;

    assert!(matches!(outcome, Outcome::Stored(_)));
    assert!(harness.replies().is_empty());
}

#[tokio::test]
async fn test_oversized_media_is_revoked() {
    let harness = Harness::new(Settings::default());
    let mut media = attachment(&harness.temp_dir, "huge.jpg", b"not really huge");
    media.size = Some(2 * 1024 * 1024);

    let outcome = harness
        .deliver(message(media_event("$1", ALICE, media)))
        .await;

    assert_eq!(outcome, Outcome::Rejected(Rejection::TooLarge));
    assert_eq!(harness.replies(), vec![REVOKED_REPLY.to_string()]);
    assert_eq!(harness.bot.store().index().last_entry().await.unwrap(), None);
}

#[tokio::test]
async fn test_unencrypted_media_is_revoked() {
    let harness = Harness::new(Settings::default());
    let mut media = attachment(&harness.temp_dir, "plain.jpg", b"bytes");
    media.encrypted = false;

    let outcome = harness
        .deliver(message(media_event("$1", ALICE, media)))
        .await;

    assert_eq!(outcome, Outcome::Rejected(Rejection::Unencrypted));
    assert_eq!(harness.replies(), vec![REVOKED_REPLY.to_string()]);
}

#[tokio::test]
async fn test_disallowed_mimetype_is_ignored_silently() {
    let harness = Harness::new(Settings::default());
    let mut media = attachment(&harness.temp_dir, "clip.mp4", b"video");
    media.mimetype = Some("video/mp4".to_string());

    let outcome = harness
        .deliver(message(media_event("$1", ALICE, media)))
        .await;

    assert_eq!(outcome, Outcome::Ignored);
    assert!(harness.replies().is_empty());
    assert!(!harness.temp_dir.path().join("media/clip.mp4").exists());
}

#[tokio::test]
async fn test_failed_download_is_logged_not_stored() {
    let harness = Harness::new(Settings::default());
    let mut media = attachment(&harness.temp_dir, "gone.jpg", b"bytes");
    media.url = format!("file://{}", harness.temp_dir.path().join("nope.jpg").display());

    let outcome = harness
        .deliver(message(media_event("$1", ALICE, media)))
        .await;

    assert_eq!(outcome, Outcome::Ignored);
    assert_eq!(harness.bot.store().index().last_entry().await.unwrap(), None);
    assert!(harness.replies().is_empty());
}

#[tokio::test]
async fn test_text_after_media_becomes_caption() {
    let harness = Harness::new(Settings::default());
    let media = attachment(&harness.temp_dir, "beach.jpg", b"jpeg bytes");
    let Outcome::Stored(stored) = harness
        .deliver(message(media_event("$1", ALICE, media)))
        .await
    else {
        panic!("media not stored");
    };

    let outcome = harness
        .deliver(message(text_event("$2", ALICE, "Sunset at the beach")))
        .await;

    assert_eq!(outcome, Outcome::Captioned(stored.path.clone()));
    let calls = harness.converter.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].path, stored.path);
    assert_eq!(calls[0].caption.as_deref(), Some("Sunset at the beach"));
}

#[tokio::test]
async fn test_text_without_preceding_media_is_ignored() {
    let harness = Harness::new(Settings::default());
    let media = attachment(&harness.temp_dir, "beach.jpg", b"jpeg bytes");
    harness
        .deliver(message(media_event("$1", ALICE, media)))
        .await;
    harness
        .deliver(message(text_event("$2", ALICE, "first")))
        .await;

    let outcome = harness
        .deliver(message(text_event("$3", ALICE, "second")))
        .await;

    assert_eq!(outcome, Outcome::Ignored);
    assert_eq!(harness.converter.calls().len(), 1);
}

#[tokio::test]
async fn test_media_from_another_sender_does_not_count() {
    let harness = Harness::new(Settings::default());
    let media = attachment(&harness.temp_dir, "beach.jpg", b"jpeg bytes");
    harness
        .deliver(message(media_event("$1", ALICE, media)))
        .await;

    let outcome = harness
        .deliver(message(text_event("$2", MALLORY, "not my picture")))
        .await;

    assert_eq!(outcome, Outcome::Ignored);
    assert!(harness.converter.calls().is_empty());
}

#[tokio::test]
async fn test_captions_disabled() {
    let harness = Harness::new(Settings {
        write_text_messages: false,
        ..Settings::default()
    });
    let media = attachment(&harness.temp_dir, "beach.jpg", b"jpeg bytes");
    harness
        .deliver(message(media_event("$1", ALICE, media)))
        .await;

    let outcome = harness
        .deliver(message(text_event("$2", ALICE, "caption")))
        .await;

    assert_eq!(outcome, Outcome::Ignored);
    assert!(harness.converter.calls().is_empty());
}

#[tokio::test]
async fn test_admin_reread() {
    let harness = Harness::new(Settings::default());
    let media_dir = harness.temp_dir.path().join("media");
    std::fs::write(media_dir.join("copied-in.jpg"), b"manual copy").unwrap();

    let outcome = harness
        .deliver(message(text_event("$1", ADMIN, "!reread")))
        .await;

    assert_eq!(outcome, Outcome::Command(REREAD_REPLY.to_string()));
    assert_eq!(harness.replies(), vec![REREAD_REPLY.to_string()]);
    assert_eq!(
        harness.bot.store().index().last_entry().await.unwrap(),
        Some(media_dir.join("copied-in.jpg"))
    );
}

#[tokio::test]
async fn test_admin_stats_and_help() {
    let harness = Harness::new(Settings::default());

    harness
        .deliver(message(text_event("$1", ADMIN, "!stats")))
        .await;
    harness
        .deliver(message(text_event("$2", ADMIN, "!help")))
        .await;

    let replies = harness.replies();
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0], "Free disk space (Gb): 500.00");
    assert_eq!(replies[1].lines().count(), 3);
    assert!(replies[1].contains("!reread - "));
}

#[tokio::test]
async fn test_unknown_admin_command_gets_no_reply() {
    let harness = Harness::new(Settings::default());

    let outcome = harness
        .deliver(message(text_event("$1", ADMIN, "!dance")))
        .await;

    assert_eq!(outcome, Outcome::Ignored);
    assert!(harness.replies().is_empty());
}

#[tokio::test]
async fn test_commands_from_non_admin_are_not_executed() {
    let harness = Harness::new(Settings::default());
    let media = attachment(&harness.temp_dir, "beach.jpg", b"jpeg bytes");
    harness
        .deliver(message(media_event("$1", ALICE, media)))
        .await;

    let outcome = harness
        .deliver(message(text_event("$2", ALICE, "!reread")))
        .await;

    // Not a command, and the caption handler refuses `!` text
    assert_eq!(outcome, Outcome::Ignored);
    assert_eq!(harness.replies(), vec!["Thanks!".to_string()]);
    assert!(harness.converter.calls().is_empty());
}

#[tokio::test]
async fn test_without_admin_user_commands_are_disabled() {
    let harness = Harness::new(Settings {
        admin_user: None,
        ..Settings::default()
    });

    let outcome = harness
        .deliver(message(text_event("$1", ADMIN, "!stats")))
        .await;

    assert_eq!(outcome, Outcome::Ignored);
    assert!(harness.replies().is_empty());
}

#[tokio::test]
async fn test_own_messages_are_never_captions() {
    let harness = Harness::new(Settings::default());
    let media = attachment(&harness.temp_dir, "beach.jpg", b"jpeg bytes");
    harness
        .deliver(message(media_event("$1", BOT, media)))
        .await;

    let outcome = harness
        .deliver(message(text_event("$2", BOT, "Thanks!")))
        .await;

    assert_eq!(outcome, Outcome::Ignored);
    assert!(harness.converter.calls().is_empty());
}
