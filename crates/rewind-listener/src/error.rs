/// Errors that end a listener session.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    /// Transport-level error (bind, accept, socket setup).
    #[error("transport error: {0}")]
    Transport(#[from] rewind_transport::TransportError),

    /// Decode or read failure on the established connection.
    #[error("frame error: {0}")]
    Frame(#[from] rewind_frame::FrameError),

    /// `run` was called on a listener that already served its session.
    #[error("listener already started; one session per listener")]
    AlreadyStarted,

    /// The spawned listener thread panicked.
    #[error("listener thread panicked")]
    ThreadPanicked,
}

impl ListenerError {
    /// True if the producer went away (cleanly or mid-envelope).
    pub fn is_disconnect(&self) -> bool {
        match self {
            ListenerError::Transport(err) => err.is_disconnect(),
            ListenerError::Frame(rewind_frame::FrameError::Transport(err)) => err.is_disconnect(),
            _ => false,
        }
    }

    /// True for malformed-stream errors.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, ListenerError::Frame(err) if err.is_protocol_violation())
    }
}

pub type Result<T> = std::result::Result<T, ListenerError>;
