//! Bot lifecycle: connect, run the event worker, shut down.

use crate::{
    BotConfig, ChatTransport, EventSender, EventWorker, InboundEvent, MatrixConfig, PhotosBot,
    SessionInfo,
};
use photos_error::{
    PhotosError, PhotosErrorKind, PhotosResult, TransportError, TransportErrorKind,
};
use photos_storage::MediaStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Longest pause between connection attempts.
const MAX_CONNECT_DELAY: Duration = Duration::from_secs(60);

/// Owns the transport, the media store and the event worker.
///
/// # Example
///
/// ```rust,no_run
/// use photos_bot::{BotConfig, LocalTransport, PhotosClient};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = BotConfig::from_file("photos.toml")?;
/// let transport = Arc::new(LocalTransport::new(config.matrix().user_id().clone(), None));
/// let events = LocalTransport::read_events("events.jsonl").await?;
///
/// let mut client = PhotosClient::new(config, transport)?;
/// client.initialize().await?;
/// client.run(events).await?;
/// # Ok(())
/// # }
/// ```
pub struct PhotosClient<T: ChatTransport + 'static> {
    config: BotConfig,
    transport: Arc<T>,
    store: MediaStore,
    session: Option<SessionInfo>,
    sender: Option<EventSender>,
    worker: Option<JoinHandle<usize>>,
}

impl<T: ChatTransport + 'static> PhotosClient<T> {
    /// Validate configuration and open the media store.
    pub fn new(config: BotConfig, transport: Arc<T>) -> PhotosResult<Self> {
        config.validate()?;
        let store = MediaStore::new(config.storage().clone())?;
        Ok(Self::with_store(config, transport, store))
    }

    /// Create a client around an existing store.
    pub fn with_store(config: BotConfig, transport: Arc<T>, store: MediaStore) -> Self {
        Self {
            config,
            transport,
            store,
            session: None,
            sender: None,
            worker: None,
        }
    }

    /// The media store.
    pub fn store(&self) -> &MediaStore {
        &self.store
    }

    /// The transport.
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Identity confirmed by [`initialize`](Self::initialize).
    pub fn session(&self) -> Option<&SessionInfo> {
        self.session.as_ref()
    }

    /// Connect with exponential backoff and confirm the server's view of us.
    ///
    /// Transient connection failures are retried up to `connect_retries`
    /// times. An identity mismatch fails immediately.
    #[instrument(skip(self), fields(user_id = %self.config.matrix().user_id()))]
    pub async fn initialize(&mut self) -> PhotosResult<SessionInfo> {
        use tokio_retry2::{Retry, RetryError, strategy::ExponentialBackoff, strategy::jitter};

        let matrix = self.config.matrix();
        let retry_strategy = ExponentialBackoff::from_millis(*matrix.connect_backoff_ms())
            .factor(2)
            .max_delay(MAX_CONNECT_DELAY)
            .map(jitter)
            .take(*matrix.connect_retries());

        let transport = Arc::clone(&self.transport);
        let session = Retry::spawn(retry_strategy, || {
            let transport = Arc::clone(&transport);
            async move {
                match transport.connect().await {
                    Ok(session) => Ok(session),
                    Err(e) => {
                        if is_retryable(&e) {
                            warn!(error = %e, "Failed to connect to homeserver, will retry");
                            Err(RetryError::Transient {
                                err: e,
                                retry_after: None,
                            })
                        } else {
                            warn!(error = %e, "Permanent connection error, failing immediately");
                            Err(RetryError::Permanent(e))
                        }
                    }
                }
            }
        })
        .await?;

        verify_identity(matrix, &session)?;
        debug!(
            user_id = %session.user_id,
            device_id = ?session.device_id,
            "Confirmed connection"
        );
        self.session = Some(session.clone());
        Ok(session)
    }

    /// Spawn the event worker and return the handle feeding it.
    ///
    /// Calling this again while the worker runs returns the same handle.
    pub fn start(&mut self) -> PhotosResult<EventSender> {
        if self.session.is_none() {
            return Err(TransportError::new(TransportErrorKind::ConnectionFailed(
                "client not initialized".to_string(),
            ))
            .into());
        }
        if let Some(sender) = &self.sender {
            return Ok(sender.clone());
        }

        let bot = PhotosBot::new(
            self.config.matrix().clone(),
            Arc::clone(&self.transport),
            self.store.clone(),
        );
        let (worker, sender) = EventWorker::new(bot);
        self.worker = Some(tokio::spawn(worker.run()));
        self.sender = Some(sender.clone());
        info!("Client started");
        Ok(sender)
    }

    /// Feed `events` through the worker in order, then stop.
    ///
    /// Returns how many events the worker handled.
    #[instrument(skip_all)]
    pub async fn run(
        &mut self,
        events: impl IntoIterator<Item = InboundEvent>,
    ) -> PhotosResult<usize> {
        let sender = self.start()?;
        for event in events {
            sender.send(event).await?;
        }
        self.stop().await
    }

    /// Drain the worker and close the transport.
    ///
    /// Returns how many events the worker handled; zero if it never ran.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> PhotosResult<usize> {
        let mut handled = 0;
        if let Some(sender) = self.sender.take() {
            // Worker may already be gone
            if let Err(e) = sender.shutdown().await {
                debug!(error = %e, "Worker already stopped");
            }
        }
        if let Some(worker) = self.worker.take() {
            handled = worker.await.map_err(|e| {
                TransportError::new(TransportErrorKind::Closed(format!(
                    "event worker failed: {}",
                    e
                )))
            })?;
        }

        self.transport.shutdown().await?;
        self.session = None;
        info!(handled, "Client stopped");
        Ok(handled)
    }
}

/// Fail unless the server reports the configured user and device.
///
/// A missing device id on either side is not a mismatch.
pub fn verify_identity(config: &MatrixConfig, session: &SessionInfo) -> PhotosResult<()> {
    if session.user_id != *config.user_id() {
        return Err(TransportError::new(TransportErrorKind::IdentityMismatch {
            configured: config.user_id().clone(),
            reported: session.user_id.clone(),
        })
        .into());
    }

    let reported = session.device_id.as_deref().unwrap_or_default();
    if !reported.is_empty() && !config.device_id().is_empty() && reported != config.device_id() {
        return Err(TransportError::new(TransportErrorKind::IdentityMismatch {
            configured: config.device_id().clone(),
            reported: reported.to_string(),
        })
        .into());
    }
    Ok(())
}

fn is_retryable(err: &PhotosError) -> bool {
    matches!(err.kind(), PhotosErrorKind::Transport(e) if e.kind.is_retryable())
}
