//! Transport over any tokio byte stream

use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::transport::Transport;

/// Adapts an `AsyncRead + AsyncWrite` stream (TCP socket, serial port, duplex
/// pipe, RFCOMM stream) to [`Transport`].
#[derive(Debug)]
pub struct IoTransport<S> {
    stream: S,
}

impl<S> IoTransport<S> {
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

#[async_trait::async_trait]
impl<S> Transport for IoTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf).await
    }

    async fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        trace!("Writing {} bytes", bytes.len());
        self.stream.write_all(bytes).await?;
        self.stream.flush().await
    }

    async fn close(&mut self) -> io::Result<()> {
        self.stream.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_and_writes_through_duplex() {
        let (near, mut far) = tokio::io::duplex(64);
        let mut transport = IoTransport::new(near);

        far.write_all(b"{\"humidity\":40}\n").await.unwrap();
        let mut buf = [0u8; 64];
        let n = transport.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"{\"humidity\":40}\n");

        transport.write(b"ping\n").await.unwrap();
        let n = far.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"ping\n");
    }

    #[tokio::test]
    async fn close_signals_eof_to_peer() {
        let (near, mut far) = tokio::io::duplex(64);
        let mut transport = IoTransport::new(near);

        transport.close().await.unwrap();
        let mut buf = [0u8; 8];
        assert_eq!(far.read(&mut buf).await.unwrap(), 0);
    }
}
