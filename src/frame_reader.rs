//! Newline framing for chunked byte streams.
//!
//! The transport hands over bytes in whatever chunks the radio produced: half a
//! message, three messages, or nothing at all. [`FrameReader`] accumulates those
//! chunks and cuts them at every `\n`, so the frames it yields do not depend on
//! read granularity.
//!
//! ```rust
//! use thermolink::FrameReader;
//!
//! let mut reader = FrameReader::new();
//! assert!(reader.feed(b"{\"temperature\":21.5,\"hum").unwrap().is_empty());
//!
//! let frames = reader.feed(b"idity\":55}\n{\"timestamp\":9}\n").unwrap();
//! assert_eq!(frames.len(), 2);
//! assert_eq!(frames[1].as_bytes(), b"{\"timestamp\":9}");
//! ```

use tracing::{debug, trace};

use crate::types::RawFrame;
use crate::{LinkError, Result};

/// Frame delimiter byte.
pub const DELIMITER: u8 = b'\n';

/// Incremental line framer.
///
/// Bytes without a delimiter stay buffered until one arrives. A trailing
/// partial frame is never emitted; call [`reset`](Self::reset) when the
/// underlying stream ends to drop it.
#[derive(Debug, Clone, Default)]
pub struct FrameReader {
    buffer: Vec<u8>,
    max_frame_len: Option<usize>,
}

impl FrameReader {
    /// Create an unbounded reader.
    pub fn new() -> Self {
        Self { buffer: Vec::with_capacity(1024), max_frame_len: None }
    }

    /// Create a reader that rejects frames longer than `max_frame_len` bytes.
    ///
    /// `None` keeps the buffer unbounded.
    pub fn with_max_frame_len(max_frame_len: Option<usize>) -> Self {
        Self { max_frame_len, ..Self::new() }
    }

    /// Append `chunk` and return every frame it completed, in arrival order.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<RawFrame>> {
        let mut frames = Vec::new();
        self.feed_into(chunk, &mut frames)?;
        Ok(frames)
    }

    /// Append `chunk` and push every completed frame onto `out`.
    ///
    /// Frames completed before a [`LinkError::FrameTooLong`] are still pushed.
    /// On that error the reader is reset and the rest of `chunk` is dropped.
    pub fn feed_into(&mut self, chunk: &[u8], out: &mut Vec<RawFrame>) -> Result<()> {
        let mut rest = chunk;

        while let Some(pos) = rest.iter().position(|&b| b == DELIMITER) {
            let line = &rest[..pos];
            self.check_len(self.buffer.len() + line.len())?;

            let frame = if self.buffer.is_empty() {
                RawFrame::new(line.trim_ascii().to_vec())
            } else {
                self.buffer.extend_from_slice(line);
                let frame = RawFrame::new(self.buffer.trim_ascii().to_vec());
                self.buffer.clear();
                frame
            };

            trace!("Frame complete: {} bytes", frame.len());
            out.push(frame);
            rest = &rest[pos + 1..];
        }

        self.check_len(self.buffer.len() + rest.len())?;
        self.buffer.extend_from_slice(rest);
        Ok(())
    }

    fn check_len(&mut self, observed: usize) -> Result<()> {
        match self.max_frame_len {
            Some(limit) if observed > limit => {
                debug!("Frame of {} bytes exceeds limit {}, resetting reader", observed, limit);
                self.buffer.clear();
                Err(LinkError::FrameTooLong { limit, observed })
            }
            _ => Ok(()),
        }
    }

    /// Drop any buffered partial frame.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Bytes buffered after the last delimiter.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// True when no partial frame is buffered.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Configured frame bound, `None` when unbounded.
    pub fn max_frame_len(&self) -> Option<usize> {
        self.max_frame_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn contents(frames: &[RawFrame]) -> Vec<&[u8]> {
        frames.iter().map(RawFrame::as_bytes).collect()
    }

    #[test]
    fn split_message_is_reassembled() {
        let mut reader = FrameReader::new();
        assert!(reader.feed(b"{\"temperature\":21.5,\"hum").unwrap().is_empty());
        assert_eq!(reader.buffered_len(), 24);

        let frames = reader.feed(b"idity\":55}\n{\"timestamp\":9}\n").unwrap();
        assert_eq!(
            contents(&frames),
            vec![&b"{\"temperature\":21.5,\"humidity\":55}"[..], &b"{\"timestamp\":9}"[..]]
        );
        assert!(reader.is_empty());
    }

    #[test]
    fn empty_chunk_is_a_no_op() {
        let mut reader = FrameReader::new();
        reader.feed(b"abc").unwrap();
        assert!(reader.feed(b"").unwrap().is_empty());
        assert_eq!(reader.buffered_len(), 3);
    }

    #[test]
    fn lone_delimiter_yields_empty_frame() {
        let mut reader = FrameReader::new();
        let frames = reader.feed(b"\n").unwrap();
        assert_eq!(frames.len(), 1);
        assert!(frames[0].is_empty());
    }

    #[test]
    fn whitespace_and_crlf_are_trimmed() {
        let mut reader = FrameReader::new();
        let frames = reader.feed(b"  {\"a\":1} \r\n\t{\"b\":2}\n").unwrap();
        assert_eq!(contents(&frames), vec![&b"{\"a\":1}"[..], &b"{\"b\":2}"[..]]);
    }

    #[test]
    fn trailing_partial_frame_is_held_and_reset_drops_it() {
        let mut reader = FrameReader::new();
        let frames = reader.feed(b"one\ntw").unwrap();
        assert_eq!(contents(&frames), vec![&b"one"[..]]);
        assert_eq!(reader.buffered_len(), 2);

        reader.reset();
        let frames = reader.feed(b"o\n").unwrap();
        assert_eq!(contents(&frames), vec![&b"o"[..]]);
    }

    #[test]
    fn bound_rejects_long_buffered_run() {
        let mut reader = FrameReader::with_max_frame_len(Some(8));
        reader.feed(b"12345").unwrap();
        let err = reader.feed(b"6789").unwrap_err();
        assert!(matches!(err, LinkError::FrameTooLong { limit: 8, observed: 9 }));
        assert!(reader.is_empty());
    }

    #[test]
    fn bound_keeps_frames_before_the_offending_run() {
        let mut reader = FrameReader::with_max_frame_len(Some(4));
        let mut out = Vec::new();
        let result = reader.feed_into(b"ok\nwaytoolong\nlater\n", &mut out);

        assert!(matches!(result, Err(LinkError::FrameTooLong { limit: 4, .. })));
        assert_eq!(contents(&out), vec![&b"ok"[..]]);
    }

    #[test]
    fn bound_allows_frames_at_the_limit() {
        let mut reader = FrameReader::with_max_frame_len(Some(4));
        let frames = reader.feed(b"abcd\n").unwrap();
        assert_eq!(contents(&frames), vec![&b"abcd"[..]]);
    }

    // Line content without delimiters; may include spaces so trimming is exercised.
    fn arb_line() -> impl Strategy<Value = Vec<u8>> {
        prop::collection::vec(prop::sample::select(b"{}\":,.0123456789abc \t\r".to_vec()), 0..40)
    }

    fn split_at_points(stream: &[u8], mut points: Vec<usize>) -> Vec<&[u8]> {
        points.iter_mut().for_each(|p| *p %= stream.len() + 1);
        points.sort_unstable();
        points.dedup();

        let mut chunks = Vec::new();
        let mut start = 0;
        for p in points {
            chunks.push(&stream[start..p]);
            start = p;
        }
        chunks.push(&stream[start..]);
        chunks
    }

    proptest! {
        #[test]
        fn prop_framing_recovers_input_lines(
            lines in prop::collection::vec(arb_line(), 0..12),
            remainder in arb_line(),
            cuts in prop::collection::vec(any::<usize>(), 0..20),
        ) {
            let mut stream = Vec::new();
            for line in &lines {
                stream.extend_from_slice(line);
                stream.push(DELIMITER);
            }
            stream.extend_from_slice(&remainder);

            let mut reader = FrameReader::new();
            let mut frames = Vec::new();
            for chunk in split_at_points(&stream, cuts) {
                frames.extend(reader.feed(chunk).unwrap());
            }

            let expected: Vec<&[u8]> = lines.iter().map(|l| l.trim_ascii()).collect();
            prop_assert_eq!(contents(&frames), expected);
            prop_assert_eq!(reader.buffered_len(), remainder.len());
        }

        #[test]
        fn prop_chunk_boundaries_do_not_change_frames(
            stream in prop::collection::vec(prop::sample::select(b"ab \n{}".to_vec()), 0..200),
            cuts_a in prop::collection::vec(any::<usize>(), 0..30),
            cuts_b in prop::collection::vec(any::<usize>(), 0..30),
        ) {
            let run = |cuts: Vec<usize>| {
                let mut reader = FrameReader::new();
                let mut frames = Vec::new();
                for chunk in split_at_points(&stream, cuts) {
                    frames.extend(reader.feed(chunk).unwrap());
                }
                frames
            };

            let frames_a = run(cuts_a);
            let frames_b = run(cuts_b);
            prop_assert!(frames_a.iter().all(|f| !f.as_bytes().contains(&DELIMITER)));
            prop_assert_eq!(frames_a, frames_b);
        }

        #[test]
        fn prop_bound_violation_is_split_invariant(
            stream in prop::collection::vec(prop::sample::select(b"abc\n".to_vec()), 0..120),
            cuts_a in prop::collection::vec(any::<usize>(), 0..20),
            cuts_b in prop::collection::vec(any::<usize>(), 0..20),
            limit in 1usize..12,
        ) {
            let run = |cuts: Vec<usize>| {
                let mut reader = FrameReader::with_max_frame_len(Some(limit));
                let mut frames = Vec::new();
                for chunk in split_at_points(&stream, cuts) {
                    if reader.feed_into(chunk, &mut frames).is_err() {
                        return (frames, true);
                    }
                }
                (frames, false)
            };

            prop_assert_eq!(run(cuts_a), run(cuts_b));
        }
    }
}
