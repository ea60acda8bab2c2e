//! Stock transport implementations

pub mod io;
pub mod tcp;

pub use io::IoTransport;
pub use tcp::TcpConnector;
