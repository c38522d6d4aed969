//! Connection loop for the rewind protocol.
//!
//! [`NetListener`] binds a TCP socket, accepts exactly one producer, and
//! decodes its envelopes into frames for a [`rewind_frame::SceneConsumer`]
//! until stopped or until the connection fails.

pub mod control;
pub mod error;
pub mod listener;

pub use control::{ConnectionStatus, ListenerHandle};
pub use error::{ListenerError, Result};
pub use listener::{ListenerConfig, ListenerThread, NetListener, SessionSummary};
