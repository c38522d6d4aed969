use rewind_transport::TransportError;

/// Errors that can occur while framing or decoding the primitive stream.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// An envelope started with something other than the `b` tag.
    #[error("unexpected envelope tag 0x{found:02x} (expected 'b')")]
    UnexpectedEnvelopeTag { found: u8 },

    /// A record tag byte does not name any primitive.
    #[error("unknown primitive tag 0x{byte:02x} at body offset {offset}")]
    UnknownTag { byte: u8, offset: usize },

    /// A record claims more bytes than the body has left.
    #[error("truncated record at body offset {offset}: need {needed} bytes, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// The declared body length exceeds the configured maximum.
    #[error("envelope body too large ({size} bytes, max {max})")]
    BodyTooLarge { size: usize, max: usize },

    /// A message or body does not fit the 32-bit length field.
    #[error("length {size} does not fit a u32 length field")]
    LengthOverflow { size: usize },

    /// The underlying byte source failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl FrameError {
    /// True for malformed-stream errors, false for transport failures.
    pub fn is_protocol_violation(&self) -> bool {
        !matches!(self, FrameError::Transport(_))
    }
}

impl From<std::io::Error> for FrameError {
    fn from(err: std::io::Error) -> Self {
        FrameError::Transport(TransportError::Io(err))
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
