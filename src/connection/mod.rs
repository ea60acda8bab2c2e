//! Connection lifecycle: the controller and the state it shares with its read loop

mod controller;
pub(crate) mod shared;


pub use controller::ConnectionController;
