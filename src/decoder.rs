//! Frame decoders
//!
//! A [`Decoder`] turns one [`RawFrame`] into an application value. It is invoked
//! once per frame and has no access to neighbouring frames, so a bad frame can
//! only ever fail itself.

use serde::de::DeserializeOwned;
use std::fmt;
use std::marker::PhantomData;

use crate::error::DecodeError;
use crate::types::{DataSample, RawFrame};

/// Per-frame decoder plugged into the connection controller.
pub trait Decoder: Send + Sync + 'static {
    /// Value produced for each successfully decoded frame.
    type Output: Send + 'static;

    /// Decode a single frame.
    fn decode(&self, frame: &RawFrame) -> Result<Self::Output, DecodeError>;
}

/// Decodes each frame as one JSON document.
///
/// Unknown fields are ignored by the target type's `Deserialize` impl; for
/// [`DataSample`] missing and `null` fields both map to `None`.
pub struct JsonDecoder<T = DataSample> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonDecoder<T> {
    pub fn new() -> Self {
        Self { _marker: PhantomData }
    }
}

impl<T> Default for JsonDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonDecoder<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for JsonDecoder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonDecoder").field("target", &std::any::type_name::<T>()).finish()
    }
}

impl<T> Decoder for JsonDecoder<T>
where
    T: DeserializeOwned + Send + 'static,
{
    type Output = T;

    fn decode(&self, frame: &RawFrame) -> Result<T, DecodeError> {
        if frame.is_empty() {
            return Err(DecodeError::Empty);
        }
        let text = std::str::from_utf8(frame.as_bytes())?;
        Ok(serde_json::from_str(text)?)
    }
}
