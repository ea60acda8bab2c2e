//! Scripted transports and wire helpers for tests and benchmarks
//!
//! [`ScriptedConnector`] hands out [`ScriptedTransport`]s whose reads follow a
//! fixed script, and records how often each one was closed so tests can check
//! that every exit path closes its transport exactly once.

#![cfg(any(test, feature = "benchmark"))]

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::transport::{Connector, Transport};
use crate::types::DataSample;

/// One scripted read result.
#[derive(Debug, Clone)]
pub enum ReadStep {
    /// Deliver these bytes.
    Data(Vec<u8>),
    /// Fail the read with this error kind.
    Fail(io::ErrorKind),
    /// Report end-of-stream.
    Eof,
}

impl ReadStep {
    pub fn data(bytes: impl AsRef<[u8]>) -> Self {
        ReadStep::Data(bytes.as_ref().to_vec())
    }
}

/// Shared view of what happened to a scripted transport.
#[derive(Debug, Clone, Default)]
pub struct TransportProbe {
    closes: Arc<AtomicUsize>,
    written: Arc<Mutex<Vec<u8>>>,
}

impl TransportProbe {
    /// Number of `close()` calls so far.
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Everything written to the transport so far.
    pub fn written(&self) -> Vec<u8> {
        self.written.lock().map(|w| w.clone()).unwrap_or_default()
    }
}

/// Transport that replays a script of reads, then blocks forever.
#[derive(Debug)]
pub struct ScriptedTransport {
    steps: VecDeque<ReadStep>,
    probe: TransportProbe,
}

impl ScriptedTransport {
    pub fn new(steps: impl IntoIterator<Item = ReadStep>) -> Self {
        Self { steps: steps.into_iter().collect(), probe: TransportProbe::default() }
    }

    pub fn probe(&self) -> TransportProbe {
        self.probe.clone()
    }
}

#[async_trait::async_trait]
impl Transport for ScriptedTransport {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.steps.pop_front() {
            Some(ReadStep::Data(mut bytes)) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                if n < bytes.len() {
                    self.steps.push_front(ReadStep::Data(bytes.split_off(n)));
                }
                Ok(n)
            }
            Some(ReadStep::Fail(kind)) => Err(io::Error::new(kind, "scripted failure")),
            Some(ReadStep::Eof) => Ok(0),
            None => std::future::pending().await,
        }
    }

    async fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        let mut written =
            self.probe.written.lock().map_err(|_| io::Error::other("probe poisoned"))?;
        written.extend_from_slice(bytes);
        Ok(())
    }

    async fn close(&mut self) -> io::Result<()> {
        self.probe.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// How a scripted connect attempt behaves.
#[derive(Debug)]
pub enum ConnectStep {
    Succeed(ScriptedTransport),
    Fail(io::ErrorKind),
    /// Never completes.
    Hang,
    /// Succeeds after a delay.
    Delayed(Duration, ScriptedTransport),
}

/// Connector that plays back one [`ConnectStep`] per attempt.
///
/// Attempts beyond the script fail with `NotFound`.
#[derive(Debug, Default)]
pub struct ScriptedConnector {
    steps: Mutex<VecDeque<ConnectStep>>,
    attempts: AtomicUsize,
}

impl ScriptedConnector {
    pub fn new(steps: impl IntoIterator<Item = ConnectStep>) -> Self {
        Self { steps: Mutex::new(steps.into_iter().collect()), attempts: AtomicUsize::new(0) }
    }

    /// Connector whose single attempt succeeds with `transport`.
    pub fn once(transport: ScriptedTransport) -> Self {
        Self::new([ConnectStep::Succeed(transport)])
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Connector for ScriptedConnector {
    type Transport = ScriptedTransport;

    async fn connect(&self) -> io::Result<ScriptedTransport> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let step = self.steps.lock().map_err(|_| io::Error::other("script poisoned"))?.pop_front();

        match step {
            Some(ConnectStep::Succeed(transport)) => Ok(transport),
            Some(ConnectStep::Fail(kind)) => Err(io::Error::new(kind, "scripted connect failure")),
            Some(ConnectStep::Hang) => std::future::pending().await,
            Some(ConnectStep::Delayed(delay, transport)) => {
                tokio::time::sleep(delay).await;
                Ok(transport)
            }
            None => Err(io::Error::new(io::ErrorKind::NotFound, "no scripted device")),
        }
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}

/// Serialize a sample the way the sensor firmware does, newline included.
pub fn wire_line(sample: &DataSample) -> Vec<u8> {
    let mut line = serde_json::to_vec(sample).unwrap_or_default();
    line.push(b'\n');
    line
}

/// `count` consecutive samples as one byte stream.
pub fn wire_stream(count: usize) -> Vec<u8> {
    (0..count)
        .flat_map(|i| {
            wire_line(&DataSample::new(
                Some(40.0 + (i % 20) as f64),
                Some(18.0 + (i % 10) as f64 * 0.5),
                Some(1_700_000_000 + i as i64),
            ))
        })
        .collect()
}

/// Install a fmt subscriber for test output; safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
