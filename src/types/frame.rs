//! Raw frame type produced by the frame reader

use std::borrow::Cow;
use std::fmt;

/// One newline-delimited unit of the wire protocol, before decoding.
///
/// The delimiter is already stripped and surrounding ASCII whitespace trimmed.
/// A `RawFrame` never contains a `\n` byte.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct RawFrame {
    bytes: Vec<u8>,
}

impl RawFrame {
    /// Create a frame from bytes that are already delimited and trimmed.
    pub(crate) fn new(bytes: Vec<u8>) -> Self {
        debug_assert!(!bytes.contains(&b'\n'));
        Self { bytes }
    }

    /// Build a frame from an untrimmed line, trimming as the reader would.
    ///
    /// Only the bytes before the first `\n` are kept, so the result is always a
    /// frame the reader could have produced from `line`.
    pub fn from_line(line: &[u8]) -> Self {
        let end = line.iter().position(|&b| b == b'\n').unwrap_or(line.len());
        Self::new(line[..end].trim_ascii().to_vec())
    }

    /// Frame content.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Lossy UTF-8 view, used when reporting frames that failed to decode.
    pub fn as_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Consume the frame and return its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl AsRef<[u8]> for RawFrame {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for RawFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawFrame").field(&self.as_text()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_line_trims_whitespace() {
        let frame = RawFrame::from_line(b"  {\"a\":1}\r\n");
        assert_eq!(frame.as_bytes(), b"{\"a\":1}");
        assert_eq!(frame.as_text(), "{\"a\":1}");
    }

    #[test]
    fn from_line_stops_at_first_delimiter() {
        let frame = RawFrame::from_line(b"{\"a\":1}\n{\"b\":2}\n");
        assert_eq!(frame.as_bytes(), b"{\"a\":1}");
    }

    #[test]
    fn lossy_text_for_invalid_utf8() {
        let frame = RawFrame::from_line(&[0xff, b'x']);
        assert_eq!(frame.len(), 2);
        assert!(frame.as_text().ends_with('x'));
    }
}
