//! Streaming decoder for the rewind-viewer drawing protocol.
//!
//! A simulation process streams tagged drawing primitives over TCP; this
//! workspace turns that stream back into frames for a renderer.
//!
//! # Crate Structure
//!
//! - [`transport`]: TCP sockets and the exact-read byte source
//! - [`frame`]: Tag grammar, envelope framing, frame assembly and the producer-side writer
//! - [`listener`]: Single-connection decode loop (behind `listener` feature)

/// Re-export transport types.
pub mod transport {
    pub use rewind_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use rewind_frame::*;
}

/// Re-export listener types (requires `listener` feature).
#[cfg(feature = "listener")]
pub mod listener {
    pub use rewind_listener::*;
}
