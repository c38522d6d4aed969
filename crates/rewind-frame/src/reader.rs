use bytes::{Buf, Bytes};
use rewind_transport::{ByteSource, NetStream, TransportError};
use tracing::debug;

use crate::codec::DecoderConfig;
use crate::error::{FrameError, Result};
use crate::signal::StopSignal;
use crate::tag::PrimitiveTag;

/// Result of one envelope read.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    /// A complete body.
    Envelope(Bytes),
    /// Stop was requested after the header; the body was left unread.
    ShutdownRequested,
}

/// Reads whole envelopes from a [`ByteSource`].
///
/// Each read is all-or-nothing: callers get a complete body or an error,
/// never a partial envelope.
pub struct EnvelopeReader<S> {
    inner: S,
    config: DecoderConfig,
}

impl<S: ByteSource> EnvelopeReader<S> {
    /// Create a new envelope reader with default configuration.
    pub fn new(inner: S) -> Self {
        Self::with_config(inner, DecoderConfig::default())
    }

    /// Create a new envelope reader with explicit configuration.
    pub fn with_config(inner: S, config: DecoderConfig) -> Self {
        Self { inner, config }
    }

    /// Read the next envelope (blocking).
    ///
    /// `stop` is checked between the length field and the body. A clean peer
    /// close before the tag byte surfaces as
    /// `FrameError::Transport(TransportError::ConnectionClosed)`; a close
    /// anywhere later is a `ShortRead`.
    pub fn read_envelope(&mut self, stop: &StopSignal) -> Result<ReadOutcome> {
        let tag = self.inner.read_exact_bytes(1)?[0];
        if PrimitiveTag::from_byte(tag) != PrimitiveTag::Begin {
            return Err(FrameError::UnexpectedEnvelopeTag { found: tag });
        }

        let mut header = self.read_within(4)?;
        let size = header.get_u32_le() as usize;
        if size > self.config.max_body_size {
            return Err(FrameError::BodyTooLarge {
                size,
                max: self.config.max_body_size,
            });
        }

        if stop.is_raised() {
            debug!(size, "stop requested; leaving envelope body unread");
            return Ok(ReadOutcome::ShutdownRequested);
        }

        let body = self.read_within(size)?;
        debug!(size, "received envelope");
        Ok(ReadOutcome::Envelope(body))
    }

    /// Reads after the tag byte are mid-envelope: running dry is never clean.
    fn read_within(&mut self, count: usize) -> Result<Bytes> {
        match self.inner.read_exact_bytes(count) {
            Ok(bytes) => Ok(bytes),
            Err(TransportError::ConnectionClosed) => Err(FrameError::Transport(
                TransportError::ShortRead {
                    expected: count,
                    received: 0,
                },
            )),
            Err(err) => Err(err.into()),
        }
    }

    /// Borrow the underlying source.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }
}

impl EnvelopeReader<NetStream> {
    /// Create a reader for `NetStream` and apply read timeout from config.
    pub fn with_config_net(inner: NetStream, config: DecoderConfig) -> Result<Self> {
        inner.set_read_timeout(config.read_timeout)?;
        Ok(Self::with_config(inner, config))
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};

    use bytes::{BufMut, BytesMut};

    use super::*;
    use crate::codec::encode_envelope;

    fn wire(bodies: &[&[u8]]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for body in bodies {
            encode_envelope(body, &mut buf).unwrap();
        }
        buf.to_vec()
    }

    #[test]
    fn reads_consecutive_envelopes() {
        let mut reader = EnvelopeReader::new(Cursor::new(wire(&[b"e", b"ce"])));
        let stop = StopSignal::new();

        let first = reader.read_envelope(&stop).unwrap();
        let second = reader.read_envelope(&stop).unwrap();

        assert_eq!(first, ReadOutcome::Envelope(Bytes::from_static(b"e")));
        assert_eq!(second, ReadOutcome::Envelope(Bytes::from_static(b"ce")));
    }

    #[test]
    fn rejects_non_begin_first_byte_without_reading_further() {
        let mut bytes = wire(&[b"e"]);
        bytes[0] = b'e';
        let mut reader = EnvelopeReader::new(Cursor::new(bytes));

        let err = reader.read_envelope(&StopSignal::new()).unwrap_err();
        assert!(matches!(err, FrameError::UnexpectedEnvelopeTag { found: b'e' }));
        assert!(err.is_protocol_violation());
        assert_eq!(reader.get_ref().position(), 1);
    }

    #[test]
    fn stop_between_length_and_body_skips_body() {
        let mut reader = EnvelopeReader::new(Cursor::new(wire(&[b"ce"])));
        let stop = StopSignal::new();
        stop.raise();

        let outcome = reader.read_envelope(&stop).unwrap();
        assert_eq!(outcome, ReadOutcome::ShutdownRequested);
        assert_eq!(reader.get_ref().position(), 5);
    }

    #[test]
    fn clean_close_at_boundary() {
        let mut reader = EnvelopeReader::new(Cursor::new(wire(&[b"e"])));
        let stop = StopSignal::new();
        reader.read_envelope(&stop).unwrap();

        let err = reader.read_envelope(&stop).unwrap_err();
        assert!(matches!(
            err,
            FrameError::Transport(TransportError::ConnectionClosed)
        ));
        assert!(!err.is_protocol_violation());
    }

    #[test]
    fn close_after_tag_is_short_read() {
        let mut reader = EnvelopeReader::new(Cursor::new(vec![b'b']));
        let err = reader.read_envelope(&StopSignal::new()).unwrap_err();
        assert!(matches!(
            err,
            FrameError::Transport(TransportError::ShortRead {
                expected: 4,
                received: 0
            })
        ));
    }

    #[test]
    fn truncated_body_is_short_read() {
        let mut partial = BytesMut::new();
        partial.put_u8(b'b');
        partial.put_u32_le(16);
        partial.put_slice(b"only-part");

        let mut reader = EnvelopeReader::new(Cursor::new(partial.to_vec()));
        let err = reader.read_envelope(&StopSignal::new()).unwrap_err();
        assert!(matches!(
            err,
            FrameError::Transport(TransportError::ShortRead {
                expected: 16,
                received: 9
            })
        ));
    }

    #[test]
    fn oversized_body_rejected_before_reading() {
        let mut bytes = BytesMut::new();
        bytes.put_u8(b'b');
        bytes.put_u32_le(1024);

        let config = DecoderConfig {
            max_body_size: 16,
            ..DecoderConfig::default()
        };
        let mut reader = EnvelopeReader::with_config(Cursor::new(bytes.to_vec()), config);
        let err = reader.read_envelope(&StopSignal::new()).unwrap_err();
        assert!(matches!(err, FrameError::BodyTooLarge { size: 1024, max: 16 }));
    }

    #[test]
    fn partial_read_handling() {
        let reader = ByteByByteReader {
            bytes: wire(&[b"slow-body"]),
            pos: 0,
        };
        let mut reader = EnvelopeReader::new(reader);
        let outcome = reader.read_envelope(&StopSignal::new()).unwrap();
        assert_eq!(outcome, ReadOutcome::Envelope(Bytes::from_static(b"slow-body")));
    }

    #[test]
    fn empty_body_is_valid() {
        let mut reader = EnvelopeReader::new(Cursor::new(wire(&[b""])));
        let outcome = reader.read_envelope(&StopSignal::new()).unwrap();
        assert_eq!(outcome, ReadOutcome::Envelope(Bytes::new()));
    }

    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }
}
