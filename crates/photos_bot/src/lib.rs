//! Chat bot layer for the photos media store.
//!
//! The bot joins rooms it is invited to by trusted users, stores incoming
//! attachments through [`photos_storage::MediaStore`], burns follow-up text
//! into the latest picture and answers a few `!` commands from its admin.
//!
//! - **PhotosClient**: connect with retry, verify identity, run, stop
//! - **EventWorker**: single consumer so stores never interleave
//! - **PhotosBot**: routing of invites, media and text
//! - **ChatTransport**: the network seam; [`LocalTransport`] replays JSON lines

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod admin;
mod client;
mod config;
mod handler;
mod local;
mod transport;
mod worker;

pub use admin::{parse_command, AdminCommand, AdminCommandHandler, REREAD_REPLY};
pub use client::{verify_identity, PhotosClient};
pub use config::{BotConfig, LoggingConfig, MatrixConfig};
pub use handler::{Outcome, PhotosBot, Rejection, REVOKED_REPLY};
pub use local::{parse_events, LocalTransport, SentMessage};
pub use transport::{
    ChatTransport, InboundEvent, MediaAttachment, MemberEvent, Membership, MessageContent,
    MessageEvent, SessionInfo,
};
pub use worker::{EventSender, EventWorker, WorkerMessage, QUEUE_CAPACITY};
