use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};

use crate::error::{Result, TransportError};

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Ordered byte delivery with all-or-nothing reads.
///
/// Implemented for every blocking [`Read`]; upper layers only depend on this
/// trait, which keeps them testable over in-memory sources.
pub trait ByteSource {
    /// Read exactly `count` bytes, blocking until all of them arrived.
    ///
    /// A source that reaches end-of-stream first fails with
    /// [`TransportError::ConnectionClosed`] when nothing was read, and with
    /// [`TransportError::ShortRead`] otherwise. A truncated buffer is never
    /// returned.
    fn read_exact_bytes(&mut self, count: usize) -> Result<Bytes>;
}

impl<R: Read + ?Sized> ByteSource for R {
    fn read_exact_bytes(&mut self, count: usize) -> Result<Bytes> {
        let mut buf = BytesMut::zeroed(count);
        let mut offset = 0usize;

        while offset < count {
            let end = count.min(offset + READ_CHUNK_SIZE);
            let read = match self.read(&mut buf[offset..end]) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            };

            if read == 0 {
                return Err(if offset == 0 {
                    TransportError::ConnectionClosed
                } else {
                    TransportError::ShortRead {
                        expected: count,
                        received: offset,
                    }
                });
            }

            offset += read;
        }

        Ok(buf.freeze())
    }
}
