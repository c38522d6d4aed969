//! Blocking TCP transport for the rewind drawing protocol.
//!
//! This is the lowest layer of the workspace. It owns socket lifecycle
//! (bind, accept, connect) and the one contract every upper layer relies on:
//! [`ByteSource::read_exact_bytes`] either delivers exactly the requested
//! number of bytes or fails.

pub mod error;
pub mod source;
pub mod tcp;
pub mod traits;

pub use error::{Result, TransportError};
pub use source::ByteSource;
pub use tcp::TcpTransport;
pub use traits::NetStream;
