use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::NetStream;

/// TCP listening socket.
///
/// Provides bind/accept on the viewer side and `connect` for producers.
pub struct TcpTransport {
    listener: TcpListener,
    local_addr: SocketAddr,
    nodelay: bool,
}

impl TcpTransport {
    /// Bind and listen on `addr`. Port 0 picks an ephemeral port.
    pub fn bind(addr: impl ToSocketAddrs + std::fmt::Debug) -> Result<Self> {
        let listener = TcpListener::bind(&addr).map_err(|e| TransportError::Bind {
            addr: format!("{addr:?}"),
            source: e,
        })?;
        let local_addr = listener.local_addr().map_err(|e| TransportError::Bind {
            addr: format!("{addr:?}"),
            source: e,
        })?;

        info!(%local_addr, "listening on tcp socket");

        Ok(Self {
            listener,
            local_addr,
            nodelay: true,
        })
    }

    /// Whether accepted streams get `TCP_NODELAY`. Default: true.
    pub fn with_nodelay(mut self, nodelay: bool) -> Self {
        self.nodelay = nodelay;
        self
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<NetStream> {
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        stream
            .set_nodelay(self.nodelay)
            .map_err(TransportError::Accept)?;
        debug!(%peer, nodelay = self.nodelay, "accepted connection");
        Ok(NetStream::from_tcp(stream))
    }

    /// Connect to a listening socket (blocking).
    pub fn connect(addr: impl ToSocketAddrs + std::fmt::Debug) -> Result<NetStream> {
        let stream = TcpStream::connect(&addr).map_err(|e| TransportError::Connect {
            addr: format!("{addr:?}"),
            source: e,
        })?;
        stream.set_nodelay(true)?;
        debug!(?addr, "connected to tcp socket");
        Ok(NetStream::from_tcp(stream))
    }

    /// The address this socket is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ByteSource;
    use std::io::Write;

    #[test]
    fn test_bind_accept_connect() {
        let listener = TcpTransport::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr();
        assert_ne!(addr.port(), 0);

        let handle = std::thread::spawn(move || {
            let mut client = TcpTransport::connect(addr).unwrap();
            client.write_all(b"hello").unwrap();
        });

        let mut server = listener.accept().unwrap();
        assert!(server.peer_addr().is_some());
        let bytes = server.read_exact_bytes(5).unwrap();
        assert_eq!(bytes.as_ref(), b"hello");

        handle.join().unwrap();
    }

    #[test]
    fn test_peer_close_mid_read_is_short_read() {
        let listener = TcpTransport::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr();

        let handle = std::thread::spawn(move || {
            let mut client = TcpTransport::connect(addr).unwrap();
            client.write_all(b"abc").unwrap();
        });

        let mut server = listener.accept().unwrap();
        handle.join().unwrap();

        let err = server.read_exact_bytes(10).unwrap_err();
        assert!(matches!(
            err,
            TransportError::ShortRead {
                expected: 10,
                received: 3
            }
        ));
    }

    #[test]
    fn test_close_unblocks_cloned_reader() {
        let listener = TcpTransport::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr();
        let _client = std::thread::spawn(move || TcpTransport::connect(addr).unwrap())
            .join()
            .unwrap();

        let server = listener.accept().unwrap();
        let mut reader = server.try_clone().unwrap();
        server.close().unwrap();

        let err = reader.read_exact_bytes(1).unwrap_err();
        assert!(err.is_disconnect());
    }

    #[test]
    fn test_connect_refused() {
        let listener = TcpTransport::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr();
        drop(listener);

        let result = TcpTransport::connect(addr);
        assert!(matches!(result, Err(TransportError::Connect { .. })));
    }

    #[test]
    fn test_bind_address_in_use() {
        let first = TcpTransport::bind("127.0.0.1:0").unwrap();
        let result = TcpTransport::bind(first.local_addr());
        assert!(matches!(result, Err(TransportError::Bind { .. })));
    }
}
