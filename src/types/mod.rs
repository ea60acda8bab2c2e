//! Core value types.
//!
//! - [`RawFrame`] is one delimited unit of the byte stream, prior to decoding
//! - [`DataSample`] is the decoded humidity/temperature reading
//! - [`ConnectionState`] and [`ErrorReason`] describe the controller lifecycle
//!
//! ## Usage Example
//!
//! ```rust
//! use thermolink::types::{ConnectionState, DataSample, ErrorReason};
//!
//! let sample = DataSample::new(Some(55.0), Some(21.5), None);
//! assert_eq!(sample.to_string(), "Timestamp: N/A\nTemperature: 21.5\nHumidity: 55");
//!
//! let state = ConnectionState::Error(ErrorReason::ConnectionLost);
//! assert!(state.can_connect());
//! ```

mod frame;
mod sample;
mod state;

pub use frame::RawFrame;
pub use sample::DataSample;
pub use state::{ConnectionState, ErrorReason};
