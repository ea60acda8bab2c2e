//! Transport traits for byte-stream links
//!
//! The controller never talks to a radio directly. A [`Connector`] performs
//! the handshake and hands back a fresh [`Transport`] for every connection
//! attempt; the read loop then owns that transport until it closes it.

use std::io;
use std::sync::Arc;

/// Serial Port Profile service class UUID used for RFCOMM sockets.
pub const SPP_SERVICE_UUID: &str = "00001101-0000-1000-8000-00805F9B34FB";

/// Size of the buffer handed to each read when nothing else is configured.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 1024;

/// An open bidirectional byte stream.
///
/// `read` must be cancel-safe: the read loop drops a pending read when the
/// link is shut down or a write is queued, and no received bytes may be lost
/// when that happens.
#[async_trait::async_trait]
pub trait Transport: Send + 'static {
    /// Read into `buf`.
    ///
    /// Returns:
    /// - `Ok(n)` with `n > 0` - bytes received
    /// - `Ok(0)` - the peer closed the stream
    /// - `Err(e)` - the link failed
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write all of `bytes`.
    async fn write(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Close the stream. Called exactly once, by whoever owns the transport last.
    async fn close(&mut self) -> io::Result<()>;
}

/// Opens transports.
#[async_trait::async_trait]
pub trait Connector: Send + Sync + 'static {
    type Transport: Transport;

    /// Perform the handshake and return a connected transport.
    ///
    /// Dropping the returned future must abandon the attempt; the controller
    /// does so on `disconnect()` and when a connect timeout elapses.
    async fn connect(&self) -> io::Result<Self::Transport>;

    /// Human-readable peer name for logs.
    fn describe(&self) -> String {
        "transport".to_string()
    }
}

#[async_trait::async_trait]
impl<C: Connector> Connector for Arc<C> {
    type Transport = C::Transport;

    async fn connect(&self) -> io::Result<Self::Transport> {
        C::connect(self).await
    }

    fn describe(&self) -> String {
        C::describe(self)
    }
}
