//! Driver spawns and runs the per-connection read loop

use std::io;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::connection::shared::Shared;
use crate::decoder::Decoder;
use crate::frame_reader::FrameReader;
use crate::stream::ConnectionEvent;
use crate::transport::Transport;
use crate::types::RawFrame;
use crate::{LinkConfig, LinkError};

/// Outbound bytes queued for the transport owned by the read loop.
pub(crate) struct WriteRequest {
    pub(crate) bytes: Vec<u8>,
    pub(crate) reply: oneshot::Sender<io::Result<()>>,
}

/// Handles to a running read loop.
pub(crate) struct DriverHandle {
    pub(crate) task: JoinHandle<()>,
    pub(crate) writes: mpsc::Sender<WriteRequest>,
}

enum Step {
    Closing,
    Write(WriteRequest),
    Read(io::Result<usize>),
}

/// Driver owns one connected transport until it closes it.
///
/// The loop ends on cancellation of `closing` (caller shutdown), on a read
/// error, on end-of-stream, or on a frame exceeding the configured bound. On
/// every path the transport is closed before the loop reports anything.
pub(crate) struct Driver<T: Transport, D: Decoder> {
    transport: T,
    decoder: Arc<D>,
    shared: Arc<Shared<D::Output>>,
    closing: CancellationToken,
    writes: mpsc::Receiver<WriteRequest>,
    reader: FrameReader,
    read_buffer_size: usize,
}

impl<T: Transport, D: Decoder> Driver<T, D> {
    /// Spawn the read loop for a freshly connected transport.
    pub(crate) fn spawn(
        transport: T,
        decoder: Arc<D>,
        shared: Arc<Shared<D::Output>>,
        closing: CancellationToken,
        config: &LinkConfig,
    ) -> DriverHandle {
        let (write_tx, write_rx) = mpsc::channel(16);

        let driver = Driver {
            transport,
            decoder,
            shared,
            closing,
            writes: write_rx,
            reader: FrameReader::with_max_frame_len(config.max_frame_len),
            read_buffer_size: config.read_buffer_size,
        };

        let task = tokio::spawn(driver.run());
        DriverHandle { task, writes: write_tx }
    }

    async fn run(mut self) {
        info!("Read loop started");
        let mut buf = vec![0u8; self.read_buffer_size];
        let mut frames = Vec::new();
        let mut frame_count = 0u64;
        let mut decode_errors = 0u64;

        let lost = loop {
            let step = tokio::select! {
                biased;
                _ = self.closing.cancelled() => Step::Closing,
                Some(request) = self.writes.recv() => Step::Write(request),
                result = self.transport.read(&mut buf) => Step::Read(result),
            };

            match step {
                Step::Closing => {
                    debug!("Read loop cancelled");
                    break None;
                }
                Step::Write(request) => {
                    // A peer that stops reading can stall the write; shutdown must still win.
                    let written = tokio::select! {
                        biased;
                        _ = self.closing.cancelled() => None,
                        result = self.transport.write(&request.bytes) => Some(result),
                    };

                    match written {
                        Some(result) => {
                            let _ = request.reply.send(result);
                        }
                        None => {
                            debug!("Write interrupted by shutdown");
                            let _ = request.reply.send(Err(io::Error::new(
                                io::ErrorKind::Interrupted,
                                "link closed during write",
                            )));
                            break None;
                        }
                    }
                }
                Step::Read(Ok(0)) => {
                    break Some(LinkError::connection_lost("peer closed the stream"));
                }
                Step::Read(Ok(n)) => {
                    trace!("Read {} bytes", n);
                    let fed = self.reader.feed_into(&buf[..n], &mut frames);

                    for frame in frames.drain(..) {
                        frame_count += 1;
                        if !self.dispatch(frame) {
                            decode_errors += 1;
                        }
                    }

                    if let Err(e) = fed {
                        break Some(e);
                    }
                }
                Step::Read(Err(e)) => {
                    break Some(LinkError::connection_lost_with_source("read failed", e));
                }
            }
        };

        if !self.reader.is_empty() {
            debug!("Discarding {} bytes of unterminated frame", self.reader.buffered_len());
            self.reader.reset();
        }

        if let Err(e) = self.transport.close().await {
            warn!("Error closing transport: {}", e);
        }

        if let Some(cause) = lost {
            self.shared.connection_lost(&self.closing, cause);
        }

        info!(
            "Read loop ended (processed {} frames, {} decode errors)",
            frame_count, decode_errors
        );
    }

    /// Decode one frame and queue the resulting event. Returns false on decode failure.
    fn dispatch(&self, frame: RawFrame) -> bool {
        match self.decoder.decode(&frame) {
            Ok(value) => {
                self.shared.emit(ConnectionEvent::Sample(value));
                true
            }
            Err(cause) => {
                let raw = frame.as_text().into_owned();
                warn!("Failed to decode frame {:?}: {}", raw, cause);
                self.shared.emit(ConnectionEvent::DecodeError { raw, cause });
                false
            }
        }
    }
}
