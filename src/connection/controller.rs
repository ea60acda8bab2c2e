//! Connection controller

use std::sync::Arc;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::shared::Shared;
use crate::decoder::{Decoder, JsonDecoder};
use crate::driver::{Driver, WriteRequest};
use crate::stream::EventReceiver;
use crate::transport::{Connector, Transport};
use crate::types::{ConnectionState, DataSample, ErrorReason};
use crate::{LinkConfig, LinkError, Result};

/// One connect attempt and, once established, its read loop.
struct Session {
    /// Cancelled by `disconnect()` or controller drop. Doubles as the
    /// "shutdown was requested" flag checked before reporting a lost link.
    closing: CancellationToken,
    reader: Option<tokio::task::JoinHandle<()>>,
    writes: Option<mpsc::Sender<WriteRequest>>,
}

struct Inner<C: Connector, D: Decoder> {
    connector: C,
    decoder: Arc<D>,
    config: LinkConfig,
    shared: Arc<Shared<D::Output>>,
    /// Serializes lifecycle operations.
    session: Mutex<Option<Session>>,
    /// Parent of every session token; cancelled when the controller is dropped.
    shutdown: CancellationToken,
}

/// Owns the transport lifecycle and drives framing and decoding on a live link.
///
/// Construction returns the controller together with the [`EventReceiver`]
/// that the observer drains. Lifecycle rules:
///
/// - `connect()` is accepted from `Disconnected` or `Error`; from any other
///   state it fails with [`LinkError::AlreadyConnected`]
/// - `disconnect()` always leaves the controller `Disconnected` and is a no-op
///   when already there
/// - a failing link moves to `Error(ConnectionLost)`; nothing reconnects
///   automatically
///
/// # Example
///
/// ```rust,no_run
/// use thermolink::{ConnectionController, LinkConfig, SampleStreamExt, TcpConnector};
/// use futures::StreamExt;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> thermolink::Result<()> {
/// let (controller, events) =
///     ConnectionController::json(TcpConnector::new("127.0.0.1:4001"), LinkConfig::default())?;
/// controller.connect().await?;
///
/// let mut samples = events.samples();
/// while let Some(sample) = samples.next().await {
///     println!("{}", sample);
/// }
/// # Ok(())
/// # }
/// ```
pub struct ConnectionController<C: Connector, D: Decoder = JsonDecoder<DataSample>> {
    inner: Arc<Inner<C, D>>,
}

impl<C: Connector> ConnectionController<C, JsonDecoder<DataSample>> {
    /// Controller decoding the stock JSON telemetry format.
    pub fn json(connector: C, config: LinkConfig) -> Result<(Self, EventReceiver<DataSample>)> {
        Self::new(connector, JsonDecoder::new(), config)
    }
}

impl<C: Connector, D: Decoder> ConnectionController<C, D> {
    /// Create a disconnected controller.
    pub fn new(
        connector: C,
        decoder: D,
        config: LinkConfig,
    ) -> Result<(Self, EventReceiver<D::Output>)> {
        config.validate()?;

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let inner = Inner {
            connector,
            decoder: Arc::new(decoder),
            config,
            shared: Arc::new(Shared::new(event_tx)),
            session: Mutex::new(None),
            shutdown: CancellationToken::new(),
        };

        Ok((Self { inner: Arc::new(inner) }, EventReceiver::new(event_rx)))
    }

    /// Open the transport and start the read loop.
    ///
    /// The handshake runs on its own task, so dropping this future does not
    /// abandon the attempt half-way. Returns [`LinkError::Cancelled`] when a
    /// `disconnect()` aborts the attempt.
    pub async fn connect(&self) -> Result<()> {
        let closing = {
            let mut session = self.inner.session.lock().await;
            let state = self.inner.shared.state();
            if !state.can_connect() {
                warn!("connect() ignored: already {}", state);
                return Err(LinkError::AlreadyConnected { state });
            }

            if let Some(previous) = session.take() {
                Inner::<C, D>::finish(previous).await;
            }

            let closing = self.inner.shutdown.child_token();
            *session = Some(Session { closing: closing.clone(), reader: None, writes: None });
            self.inner.shared.transition_if(ConnectionState::can_connect, ConnectionState::Connecting);
            closing
        };

        info!("Connecting to {}", self.inner.connector.describe());
        let attempt = tokio::spawn(Arc::clone(&self.inner).establish(closing.clone()));
        match attempt.await {
            Ok(result) => result,
            Err(e) => {
                warn!("Connect task failed: {}", e);
                let mut session = self.inner.session.lock().await;
                // A cancelled token means disconnect() already reset the session.
                if !closing.is_cancelled() {
                    *session = None;
                    self.inner.shared.transition_if(
                        |s| *s == ConnectionState::Connecting,
                        ConnectionState::Error(ErrorReason::ConnectFailed),
                    );
                }
                Err(LinkError::connect_failed_with_source("connect task failed", e))
            }
        }
    }

    /// Stop the read loop, close the transport and return to `Disconnected`.
    ///
    /// Calling this while already disconnected does nothing.
    pub async fn disconnect(&self) -> Result<()> {
        let mut session = self.inner.session.lock().await;
        self.disconnect_locked(&mut session).await;
        Ok(())
    }

    async fn disconnect_locked(&self, session: &mut Option<Session>) {
        if self.inner.shared.state() == ConnectionState::Disconnected && session.is_none() {
            debug!("disconnect() while already disconnected");
            return;
        }

        if let Some(active) = session.take() {
            Inner::<C, D>::finish(active).await;
        }

        if self.inner.shared.transition_if(|_| true, ConnectionState::Disconnected) {
            info!("Disconnected");
        }
    }

    /// Disconnect after holding the lifecycle lock for `hold`, as a slow
    /// concurrent lifecycle call would.
    #[cfg(test)]
    pub(super) async fn disconnect_after(&self, hold: std::time::Duration) {
        let mut session = self.inner.session.lock().await;
        tokio::time::sleep(hold).await;
        self.disconnect_locked(&mut session).await;
    }

    /// Send bytes to the peer over the live transport.
    pub async fn write(&self, bytes: &[u8]) -> Result<()> {
        let writes = {
            let session = self.inner.session.lock().await;
            session.as_ref().and_then(|s| s.writes.clone()).ok_or(LinkError::NotConnected)?
        };

        let (reply, response) = oneshot::channel();
        writes
            .send(WriteRequest { bytes: bytes.to_vec(), reply })
            .await
            .map_err(|_| LinkError::NotConnected)?;
        response.await.map_err(|_| LinkError::NotConnected)?.map_err(LinkError::Io)
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        self.inner.shared.state()
    }

    /// True while the read loop is running on an open transport.
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Stream of states: the current one first, then every change.
    ///
    /// Intermediate states may be skipped if the consumer falls behind; use the
    /// `StateChanged` events for an exact history.
    pub fn state_updates(&self) -> WatchStream<ConnectionState> {
        WatchStream::new(self.inner.shared.subscribe())
    }

    /// Configuration the controller was built with.
    pub fn config(&self) -> &LinkConfig {
        &self.inner.config
    }
}

impl<C: Connector, D: Decoder> Inner<C, D> {
    /// Handshake, then either start the read loop or record the failure.
    async fn establish(self: Arc<Self>, closing: CancellationToken) -> Result<()> {
        let handshake = async {
            let attempt = self.connector.connect();
            match self.config.connect_timeout() {
                Some(limit) => match tokio::time::timeout(limit, attempt).await {
                    Ok(result) => result,
                    Err(_) => Err(std::io::Error::new(
                        std::io::ErrorKind::TimedOut,
                        format!("no connection after {:?}", limit),
                    )),
                },
                None => attempt.await,
            }
        };

        let outcome = tokio::select! {
            biased;
            _ = closing.cancelled() => None,
            result = handshake => Some(result),
        };

        let mut session = self.session.lock().await;

        if closing.is_cancelled() {
            if let Some(Ok(mut transport)) = outcome {
                debug!("Connect completed after cancellation, closing transport");
                if let Err(e) = transport.close().await {
                    warn!("Error closing transport: {}", e);
                }
            }
            info!("Connect attempt cancelled");
            return Err(LinkError::Cancelled);
        }

        match outcome {
            Some(Ok(transport)) => {
                self.shared.transition_if(
                    |s| *s == ConnectionState::Connecting,
                    ConnectionState::Connected,
                );
                let handle = Driver::spawn(
                    transport,
                    Arc::clone(&self.decoder),
                    Arc::clone(&self.shared),
                    closing,
                    &self.config,
                );

                if let Some(active) = session.as_mut() {
                    active.reader = Some(handle.task);
                    active.writes = Some(handle.writes);
                }
                info!("Connected to {}", self.connector.describe());
                Ok(())
            }
            Some(Err(e)) => {
                warn!("Connect to {} failed: {}", self.connector.describe(), e);
                *session = None;
                self.shared.transition_if(
                    |s| *s == ConnectionState::Connecting,
                    ConnectionState::Error(ErrorReason::ConnectFailed),
                );
                Err(LinkError::connect_failed_with_source(self.connector.describe(), e))
            }
            None => Err(LinkError::Cancelled),
        }
    }

    /// Cancel a session and wait until its transport is closed.
    async fn finish(session: Session) {
        session.closing.cancel();
        drop(session.writes);
        if let Some(reader) = session.reader {
            if let Err(e) = reader.await {
                warn!("Read loop task failed: {}", e);
            }
        }
    }
}

impl<C: Connector, D: Decoder> Drop for ConnectionController<C, D> {
    fn drop(&mut self) {
        debug!("Dropping connection controller");
        self.inner.shutdown.cancel();
    }
}
