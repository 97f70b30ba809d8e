//! Bot replay command handler.

use photos::{BotConfig, LocalTransport, PhotosClient, PhotosResult};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Run the bot over a JSON-lines event file using the local transport.
#[tracing::instrument(skip_all, fields(events = %events.display()))]
pub async fn run_bot(config: BotConfig, events: &Path) -> PhotosResult<()> {
    let events = LocalTransport::read_events(events).await?;
    info!(count = events.len(), "Loaded events");

    let transport = Arc::new(LocalTransport::new(
        config.matrix().user_id().clone(),
        Some(config.matrix().device_id().clone()),
    ));
    // The room timeline holds every replayed message up front
    for event in &events {
        transport.record(event);
    }

    let mut client = PhotosClient::new(config, Arc::clone(&transport))?;
    client.initialize().await?;
    let handled = client.run(events).await?;

    for reply in transport.sent_messages() {
        println!("{} <- {}: {}", reply.room_id, reply.reply_to, reply.body);
    }
    println!("Handled {} events", handled);
    Ok(())
}
