//! Event delivery and stream combinators

mod events;
mod samples;

pub use events::{ConnectionEvent, EventReceiver, Observer};
pub use samples::{SampleStreamExt, Samples};
