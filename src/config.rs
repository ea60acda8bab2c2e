//! Link configuration
//!
//! ```rust
//! use thermolink::LinkConfig;
//!
//! let config = LinkConfig::from_yaml("read_buffer_size: 512\nmax_frame_len: 4096\n").unwrap();
//! assert_eq!(config.read_buffer_size, 512);
//! assert_eq!(config.max_frame_len, Some(4096));
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::transport::DEFAULT_READ_BUFFER_SIZE;
use crate::{LinkError, Result};

/// Tunables for a [`ConnectionController`](crate::ConnectionController).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Size of the buffer handed to each transport read.
    pub read_buffer_size: usize,

    /// Longest frame accepted before the link is dropped. `None` means unbounded.
    pub max_frame_len: Option<usize>,

    /// Handshake deadline in milliseconds. `None` waits for the connector.
    pub connect_timeout_ms: Option<u64>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            max_frame_len: None,
            connect_timeout_ms: None,
        }
    }
}

impl LinkConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    pub fn with_max_frame_len(mut self, max_frame_len: Option<usize>) -> Self {
        self.max_frame_len = max_frame_len;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout_ms = timeout.map(|t| t.as_millis().min(u64::MAX as u128) as u64);
        self
    }

    /// Handshake deadline as a [`Duration`].
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }

    /// Reject values the controller cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.read_buffer_size == 0 {
            return Err(LinkError::config("read_buffer_size must be greater than zero"));
        }
        if self.max_frame_len == Some(0) {
            return Err(LinkError::config("max_frame_len must be greater than zero when set"));
        }
        Ok(())
    }

    /// Parse and validate a YAML document. Missing keys take their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: LinkConfig = serde_yaml_ng::from_str(yaml)
            .map_err(|e| LinkError::config(format!("invalid YAML: {}", e)))?;
        config.validate()?;
        debug!("Loaded link config: {:?}", config);
        Ok(config)
    }

    /// Read a YAML config file from disk.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("reading link config {}", path.display()))?;
        Self::from_yaml(&yaml).with_context(|| format!("parsing link config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_one_kilobyte_reads() {
        let config = LinkConfig::default();
        assert_eq!(config.read_buffer_size, 1024);
        assert_eq!(config.max_frame_len, None);
        assert_eq!(config.connect_timeout(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_yaml_uses_defaults() {
        let config = LinkConfig::from_yaml("{}").unwrap();
        assert_eq!(config, LinkConfig::default());
    }

    #[test]
    fn yaml_overrides() {
        let config = LinkConfig::from_yaml("connect_timeout_ms: 2500\nmax_frame_len: 256\n").unwrap();
        assert_eq!(config.connect_timeout(), Some(Duration::from_millis(2500)));
        assert_eq!(config.max_frame_len, Some(256));
        assert_eq!(config.read_buffer_size, 1024);
    }

    #[test]
    fn zero_sizes_are_rejected() {
        assert!(matches!(
            LinkConfig::new().with_read_buffer_size(0).validate(),
            Err(LinkError::Config { .. })
        ));
        assert!(matches!(LinkConfig::from_yaml("max_frame_len: 0"), Err(LinkError::Config { .. })));
    }

    #[test]
    fn malformed_yaml_is_a_config_error() {
        assert!(matches!(
            LinkConfig::from_yaml("read_buffer_size: [1, 2]"),
            Err(LinkError::Config { .. })
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = LinkConfig::from_yaml_file("/nonexistent/thermolink.yaml").unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/thermolink.yaml"));
    }

    #[test]
    fn builder_round_trips_timeout() {
        let config = LinkConfig::new().with_connect_timeout(Some(Duration::from_secs(3)));
        assert_eq!(config.connect_timeout_ms, Some(3000));
    }
}
