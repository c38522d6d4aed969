use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use rewind_transport::{NetStream, TransportError};

use crate::codec::{encode_envelope, encode_frame_body, BodyEncoder, ENVELOPE_HEADER_SIZE};
use crate::error::{FrameError, Result};
use crate::model::Frame;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Packed `0xRRGGBB` colors for producers.
pub mod palette {
    pub const RED: u32 = 0xFF0000;
    pub const GREEN: u32 = 0x00FF00;
    pub const BLUE: u32 = 0x0000FF;
    pub const GRAY: u32 = 0x273142;
}

/// Producer side of the protocol.
///
/// Primitive calls accumulate records for the current frame;
/// [`SceneWriter::end_frame`] appends `end` and sends everything as one
/// envelope. Nothing reaches the stream before `end_frame`.
pub struct SceneWriter<T> {
    inner: T,
    body: BodyEncoder,
    buf: BytesMut,
}

impl<T: Write> SceneWriter<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            body: BodyEncoder::new(),
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    pub fn circle(&mut self, x: f32, y: f32, r: f32, color: u32) -> &mut Self {
        self.body.circle(x, y, r, color);
        self
    }

    pub fn rect(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, color: u32) -> &mut Self {
        self.body.rect(x1, y1, x2, y2, color);
        self
    }

    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, color: u32) -> &mut Self {
        self.body.line(x1, y1, x2, y2, color);
        self
    }

    /// Circle with an HP bar.
    ///
    /// `enemy` is 1 for enemy, -1 for own, 0 for neutral. `course` only
    /// rotates textured units; `utype` selects the texture.
    #[allow(clippy::too_many_arguments)]
    pub fn living_unit(
        &mut self,
        x: f32,
        y: f32,
        r: f32,
        hp: u32,
        max_hp: u32,
        enemy: i16,
        course: f32,
        utype: i16,
    ) -> &mut Self {
        self.body.unit(x, y, r, hp, max_hp, utype, enemy, course);
        self
    }

    /// Text for the viewer's message window. The last one per frame wins.
    pub fn message(&mut self, text: &str) -> Result<&mut Self> {
        self.body.message(text)?;
        Ok(self)
    }

    /// Static map cell; shown by the viewer as soon as it arrives.
    pub fn area(&mut self, x: u32, y: u32, area_type: i16) -> &mut Self {
        self.body.area(x, y, area_type);
        self
    }

    /// Queue every primitive of a decoded frame, then send it.
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        encode_frame_body(frame, &mut self.body)?;
        self.flush_envelope()
    }

    /// Close the current frame and send it (blocking).
    pub fn end_frame(&mut self) -> Result<()> {
        self.body.end();
        self.flush_envelope()
    }

    /// Records queued since the last send.
    pub fn pending_bytes(&self) -> usize {
        self.body.len()
    }

    fn flush_envelope(&mut self) -> Result<()> {
        self.buf.clear();
        self.buf.reserve(ENVELOPE_HEADER_SIZE + self.body.len());
        let encoded = encode_envelope(self.body.as_bytes(), &mut self.buf);
        self.body.clear();
        encoded?;

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(TransportError::ConnectionClosed.into()),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::from(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::from(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl SceneWriter<NetStream> {
    /// Writer for a `NetStream` whose sends fail once blocked longer than
    /// `write_timeout`.
    pub fn with_timeout_net(
        inner: NetStream,
        write_timeout: Option<std::time::Duration>,
    ) -> Result<Self> {
        inner.set_write_timeout(write_timeout)?;
        Ok(Self::new(inner))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::time::Duration;

    use rewind_transport::TcpTransport;

    use super::*;
    use crate::assembler::FrameAssembler;
    use crate::consumer::SceneEvent;
    use crate::model::{AreaDesc, AreaType, Color, Line};
    use crate::reader::{EnvelopeReader, ReadOutcome};
    use crate::signal::StopSignal;

    #[test]
    fn nothing_is_written_before_end_frame() {
        let mut writer = SceneWriter::new(Vec::<u8>::new());
        writer.circle(0.0, 0.0, 1.0, palette::RED);
        assert!(writer.get_ref().is_empty());
        assert_eq!(writer.pending_bytes(), 17);

        writer.end_frame().unwrap();
        let wire = writer.into_inner();
        assert_eq!(wire[0], b'b');
        assert_eq!(&wire[1..5], &18u32.to_le_bytes());
        assert_eq!(*wire.last().unwrap(), b'e');
    }

    #[test]
    fn writer_output_decodes() {
        let mut writer = SceneWriter::new(Vec::<u8>::new());
        writer
            .circle(1.0, 1.0, 0.5, palette::GREEN)
            .area(3, 4, 3)
            .living_unit(2.0, 2.0, 1.0, 5, 10, -1, 0.0, 1);
        writer.message("hello").unwrap();
        writer.end_frame().unwrap();
        writer.end_frame().unwrap();

        let mut reader = EnvelopeReader::new(Cursor::new(writer.into_inner()));
        let mut assembler = FrameAssembler::new();
        let mut events = Vec::new();
        let stop = StopSignal::new();

        for _ in 0..2 {
            match reader.read_envelope(&stop).unwrap() {
                ReadOutcome::Envelope(body) => {
                    assembler.process_body(&body, &mut events, &stop).unwrap();
                }
                ReadOutcome::ShutdownRequested => panic!("stop was not raised"),
            }
        }

        assert_eq!(events.len(), 3);
        assert_eq!(
            events[0],
            SceneEvent::Area(AreaDesc {
                x: 3,
                y: 4,
                area_type: AreaType::Cloud
            })
        );
        match &events[1] {
            SceneEvent::Frame(frame) => {
                assert_eq!(frame.circles[0].color, Color::from_packed(0x00FF00));
                assert_eq!(frame.units[0].color, Color::BLUE);
                assert_eq!(frame.message.as_deref(), Some("hello"));
            }
            other => panic!("expected frame, got {other:?}"),
        }
        assert_eq!(events[2], SceneEvent::Frame(Frame::new()));
    }

    #[test]
    fn write_frame_round_trips() {
        let mut frame = Frame::new();
        frame
            .lines
            .push(Line::new(0.0, 0.0, 3.0, 4.0, Color::from_packed(palette::GRAY)));
        frame.message = Some("lines".into());

        let mut writer = SceneWriter::new(Vec::<u8>::new());
        writer.write_frame(&frame).unwrap();

        let mut reader = EnvelopeReader::new(Cursor::new(writer.into_inner()));
        let stop = StopSignal::new();
        let ReadOutcome::Envelope(body) = reader.read_envelope(&stop).unwrap() else {
            panic!("stop was not raised");
        };
        let mut events = Vec::new();
        FrameAssembler::new()
            .process_body(&body, &mut events, &stop)
            .unwrap();
        assert_eq!(events, vec![SceneEvent::Frame(frame)]);
    }

    #[test]
    fn zero_length_write_is_connection_closed() {
        let mut writer = SceneWriter::new(ZeroWriter);
        let err = writer.end_frame().unwrap_err();
        assert!(matches!(
            err,
            FrameError::Transport(TransportError::ConnectionClosed)
        ));
        assert_eq!(writer.pending_bytes(), 0);
    }

    #[test]
    fn timed_writer_sends_over_tcp() {
        let server = TcpTransport::bind("127.0.0.1:0").unwrap();
        let client = TcpTransport::connect(server.local_addr()).unwrap();
        let accepted = server.accept().unwrap();

        let mut writer =
            SceneWriter::with_timeout_net(client, Some(Duration::from_secs(2))).unwrap();
        writer.circle(1.0, 2.0, 3.0, palette::BLUE);
        writer.end_frame().unwrap();

        let mut reader = EnvelopeReader::new(accepted);
        let stop = StopSignal::new();
        let ReadOutcome::Envelope(body) = reader.read_envelope(&stop).unwrap() else {
            panic!("stop was not raised");
        };
        assert_eq!(body.len(), 18);
    }

    #[test]
    fn write_timeout_fires_when_peer_stops_reading() {
        let server = TcpTransport::bind("127.0.0.1:0").unwrap();
        let client = TcpTransport::connect(server.local_addr()).unwrap();
        let _accepted = server.accept().unwrap();

        let mut writer =
            SceneWriter::with_timeout_net(client, Some(Duration::from_millis(50))).unwrap();
        let chunk = "x".repeat(1024 * 1024);

        let err = (0..256)
            .find_map(|_| {
                writer.message(&chunk).unwrap();
                writer.end_frame().err()
            })
            .expect("socket buffers never filled");
        match err {
            FrameError::Transport(TransportError::Io(io)) => assert!(matches!(
                io.kind(),
                ErrorKind::WouldBlock | ErrorKind::TimedOut
            )),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
