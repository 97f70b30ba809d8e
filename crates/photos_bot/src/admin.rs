//! `!` commands available to the admin user.

use photos_error::PhotosResult;
use photos_storage::{MediaStore, COMMAND_PREFIX};
use std::str::FromStr;
use strum::IntoEnumIterator;

/// Reply to a successful `!reread`.
pub const REREAD_REPLY: &str = "Done reread files";

/// Commands the admin can issue.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
pub enum AdminCommand {
    /// List commands
    #[strum(serialize = "!help")]
    Help,
    /// Rebuild the ledgers from the media directory
    #[strum(serialize = "!reread")]
    Reread,
    /// Show free disk space
    #[strum(serialize = "!stats")]
    Stats,
}

impl AdminCommand {
    /// One-line description shown by `!help`.
    pub fn description(&self) -> &'static str {
        match self {
            AdminCommand::Help => "shows this message",
            AdminCommand::Reread => "reread directory with images and create image text files",
            AdminCommand::Stats => "show various statistics like free diskspace",
        }
    }

    /// Full `!help` text, one command per line.
    pub fn help_message() -> String {
        AdminCommand::iter()
            .map(|command| format!("{} - {}", command, command.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Split a message body into command word and parameters.
///
/// Returns `None` unless the first word starts with `!`.
pub fn parse_command(body: &str) -> Option<(&str, Vec<&str>)> {
    let mut words = body.split(' ');
    let command = words.next()?;
    if !command.starts_with(COMMAND_PREFIX) {
        return None;
    }
    Some((command, words.collect()))
}

/// Executes admin commands against the media store.
#[derive(Debug, Clone)]
pub struct AdminCommandHandler {
    store: MediaStore,
}

impl AdminCommandHandler {
    /// Create a handler operating on `store`.
    pub fn new(store: MediaStore) -> Self {
        Self { store }
    }

    /// Whether `body` is shaped like a command.
    pub fn is_admin_command(body: &str) -> bool {
        parse_command(body).is_some()
    }

    /// Run the command in `body` and produce the reply text.
    ///
    /// Unknown commands and non-commands produce no reply. Failures are
    /// reported as their display string.
    #[tracing::instrument(skip(self))]
    pub async fn handle(&self, body: &str) -> Option<String> {
        let (word, params) = parse_command(body)?;
        let command = match AdminCommand::from_str(word) {
            Ok(command) => command,
            Err(_) => {
                tracing::debug!(command = word, "Unknown admin command");
                return None;
            }
        };
        tracing::debug!(%command, ?params, "Admin command");

        let reply = match self.execute(command).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(error = %e, %command, "Admin command failed");
                e.to_string()
            }
        };
        Some(reply)
    }

    async fn execute(&self, command: AdminCommand) -> PhotosResult<String> {
        match command {
            AdminCommand::Help => Ok(AdminCommand::help_message()),
            AdminCommand::Reread => {
                let report = self.store.rebuild_index().await?;
                tracing::info!(files_found = report.files_found, "Reread media directory");
                Ok(REREAD_REPLY.to_string())
            }
            AdminCommand::Stats => {
                let free_gb = self.store.retention().free_space_gb()?;
                Ok(format!("Free disk space (Gb): {:.2}", free_gb))
            }
        }
    }
}
