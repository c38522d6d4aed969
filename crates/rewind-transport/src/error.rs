/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to bind to the specified address.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    /// Failed to connect to the specified address.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    /// Failed to accept an incoming connection.
    #[error("failed to accept connection: {0}")]
    Accept(std::io::Error),

    /// An I/O error occurred on the transport stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The source ran dry before a byte-exact read was satisfied.
    #[error("short read: expected {expected} bytes, received {received} before end of stream")]
    ShortRead { expected: usize, received: usize },

    /// The peer closed the connection before the first byte of a read.
    #[error("connection closed by peer")]
    ConnectionClosed,
}

impl TransportError {
    /// Returns true if the peer went away, cleanly or mid-read.
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            TransportError::ConnectionClosed | TransportError::ShortRead { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
