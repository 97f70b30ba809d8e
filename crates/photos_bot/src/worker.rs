//! Single-worker event queue.
//!
//! Every event goes through one task, one at a time, in arrival order. That
//! keeps store sequences (evict, write, convert, append) from interleaving
//! on the shared media directory and ledgers.

use crate::{ChatTransport, InboundEvent, Outcome, PhotosBot};
use photos_error::{PhotosResult, TransportError, TransportErrorKind};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, instrument};

/// Queue capacity before senders wait.
pub const QUEUE_CAPACITY: usize = 32;

/// Messages accepted by the worker.
#[derive(Debug)]
pub enum WorkerMessage {
    /// Handle an event, optionally reporting the outcome
    Event {
        /// The event
        event: InboundEvent,
        /// Receives the outcome once handled
        done: Option<oneshot::Sender<Outcome>>,
    },
    /// Finish queued events, then stop
    Shutdown,
}

/// Owns the bot and drains the queue.
pub struct EventWorker<T: ChatTransport> {
    bot: PhotosBot<T>,
    rx: mpsc::Receiver<WorkerMessage>,
}

impl<T: ChatTransport> EventWorker<T> {
    /// Creates a worker and the handle feeding it.
    pub fn new(bot: PhotosBot<T>) -> (Self, EventSender) {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        (Self { bot, rx }, EventSender { tx })
    }

    /// Runs until a shutdown message arrives or every sender is gone.
    #[instrument(skip(self))]
    pub async fn run(mut self) -> usize {
        info!("Event worker started");
        let mut handled = 0;

        while let Some(msg) = self.rx.recv().await {
            match msg {
                WorkerMessage::Event { event, done } => {
                    let outcome = self.bot.handle_event(&event).await;
                    debug!(?outcome, "Event handled");
                    handled += 1;
                    if let Some(done) = done {
                        // Caller may have stopped waiting
                        let _ = done.send(outcome);
                    }
                }
                WorkerMessage::Shutdown => {
                    info!("Event worker shutting down");
                    break;
                }
            }
        }

        info!(handled, "Event worker stopped");
        handled
    }
}

/// Cloneable handle for queueing events.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::Sender<WorkerMessage>,
}

impl EventSender {
    /// Queue an event without waiting for it to be handled.
    pub async fn send(&self, event: InboundEvent) -> PhotosResult<()> {
        self.push(WorkerMessage::Event { event, done: None }).await
    }

    /// Queue an event and wait for its outcome.
    pub async fn dispatch(&self, event: InboundEvent) -> PhotosResult<Outcome> {
        let (done, outcome) = oneshot::channel();
        self.push(WorkerMessage::Event {
            event,
            done: Some(done),
        })
        .await?;
        outcome.await.map_err(|_| closed().into())
    }

    /// Ask the worker to stop after the events queued so far.
    pub async fn shutdown(&self) -> PhotosResult<()> {
        self.push(WorkerMessage::Shutdown).await
    }

    async fn push(&self, msg: WorkerMessage) -> PhotosResult<()> {
        self.tx.send(msg).await.map_err(|_| closed())?;
        Ok(())
    }
}

fn closed() -> TransportError {
    TransportError::new(TransportErrorKind::Closed(
        "event worker is not running".to_string(),
    ))
}
