//! TCP connector
//!
//! Serial-over-TCP gateways and Bluetooth bridges expose the sensor's SPP
//! stream as a plain TCP socket; the byte stream is identical.

use std::io;
use tokio::net::TcpStream;
use tracing::debug;

use super::IoTransport;
use crate::transport::Connector;

/// Opens a new TCP connection for every connect attempt.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    addr: String,
}

impl TcpConnector {
    /// `addr` is anything `TcpStream::connect` accepts, e.g. `"10.0.0.5:4001"`.
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    /// Address passed to every connect attempt.
    pub fn addr(&self) -> &str {
        &self.addr
    }
}

#[async_trait::async_trait]
impl Connector for TcpConnector {
    type Transport = IoTransport<TcpStream>;

    async fn connect(&self) -> io::Result<Self::Transport> {
        let stream = TcpStream::connect(&self.addr).await?;
        stream.set_nodelay(true)?;
        debug!("TCP connected to {} (local {:?})", self.addr, stream.local_addr().ok());
        Ok(IoTransport::new(stream))
    }

    fn describe(&self) -> String {
        format!("tcp://{}", self.addr)
    }
}
