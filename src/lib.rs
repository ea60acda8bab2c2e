//! Line-framed telemetry link for Bluetooth SPP humidity/temperature sensors.
//!
//! A sensor streams newline-terminated JSON objects over an RFCOMM socket.
//! Thermolink owns that link: it opens the transport, reassembles frames from
//! arbitrarily fragmented reads, decodes each frame independently and reports
//! samples, decode failures, link loss and state changes to a single consumer
//! in arrival order.
//!
//! # Features
//!
//! - **Fragment-safe framing**: frames split across reads or packed into one
//!   read come out identical
//! - **Isolated decoding**: a malformed frame produces a `DecodeError` event and
//!   the link keeps reading
//! - **Explicit lifecycle**: `Disconnected`, `Connecting`, `Connected` and
//!   `Error(reason)`, with caller-initiated shutdown never reported as a loss
//! - **Pluggable transports**: anything implementing [`Connector`] and
//!   [`Transport`]; TCP and generic `AsyncRead + AsyncWrite` adapters included
//!
//! ## Example
//!
//! ```rust,no_run
//! use thermolink::{ConnectionEvent, LinkConfig, ThermoLink};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (link, mut events) = ThermoLink::tcp("127.0.0.1:4001", LinkConfig::default())?;
//!     link.connect().await?;
//!
//!     while let Some(event) = events.recv().await {
//!         match event {
//!             ConnectionEvent::Sample(sample) => println!("{}", sample),
//!             ConnectionEvent::DecodeError { raw, cause } => eprintln!("{:?}: {}", raw, cause),
//!             ConnectionEvent::ConnectionLost { cause } => {
//!                 eprintln!("link lost: {}", cause);
//!                 break;
//!             }
//!             ConnectionEvent::StateChanged { old, new } => println!("{} -> {}", old, new),
//!         }
//!     }
//!     Ok(())
//! }
//! ```

// Core types and error handling
pub mod config;
mod error;
#[cfg_attr(any(test, feature = "benchmark"), path = "test_utils.rs")]
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Framing and decoding
pub mod decoder;
pub mod frame_reader;

// Link lifecycle
pub mod connection;
mod driver;
pub mod stream;
pub mod transport;
pub mod transports;

// Core exports
pub use config::LinkConfig;
pub use error::*;
pub use types::*;

pub use decoder::{Decoder, JsonDecoder};
pub use frame_reader::{DELIMITER, FrameReader};

pub use connection::ConnectionController;
pub use stream::{ConnectionEvent, EventReceiver, Observer, SampleStreamExt, Samples};
pub use transport::{Connector, DEFAULT_READ_BUFFER_SIZE, SPP_SERVICE_UUID, Transport};
pub use transports::{IoTransport, TcpConnector};

/// Unified entry point for sensor links.
///
/// Shorthand for building a [`ConnectionController`] with the stock JSON
/// decoder over one of the bundled transports.
///
/// # Examples
///
/// ```rust,no_run
/// use thermolink::{LinkConfig, ThermoLink};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> thermolink::Result<()> {
/// let (link, _events) = ThermoLink::tcp("192.168.4.1:4001", LinkConfig::default())?;
/// link.connect().await?;
/// # Ok(())
/// # }
/// ```
pub struct ThermoLink;

impl ThermoLink {
    /// Controller for a sensor bridged to TCP.
    ///
    /// Nothing is opened until `connect()` is called.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Config`] if `config` fails validation.
    pub fn tcp(
        addr: impl Into<String>,
        config: LinkConfig,
    ) -> Result<(ConnectionController<TcpConnector>, EventReceiver)> {
        ConnectionController::json(TcpConnector::new(addr), config)
    }

    /// Controller over any connector, decoding the stock JSON format.
    pub fn with_connector<C: Connector>(
        connector: C,
        config: LinkConfig,
    ) -> Result<(ConnectionController<C>, EventReceiver)> {
        ConnectionController::json(connector, config)
    }
}
