use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::thread::JoinHandle;

use rewind_frame::{DecoderConfig, EnvelopeReader, FrameAssembler, ReadOutcome, SceneConsumer};
use rewind_transport::{NetStream, TcpTransport};
use tracing::{debug, info, warn};

use crate::control::{ConnectionStatus, ListenerHandle, Shared};
use crate::error::{ListenerError, Result};

/// Listener behavior knobs.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Disable Nagle's algorithm on the accepted stream. Default: true.
    pub nodelay: bool,
    /// Limits applied to every envelope.
    pub decoder: DecoderConfig,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            nodelay: true,
            decoder: DecoderConfig::default(),
        }
    }
}

/// What a session did before it stopped cleanly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub peer: Option<SocketAddr>,
    pub envelopes: u64,
    pub frames: u64,
    pub areas: u64,
    /// Records in frames that were never delivered: still pending when the
    /// session ended, or finished by an `end` that arrived after stop.
    pub discarded_records: usize,
}

/// Accepts one producer and decodes its stream.
pub struct NetListener {
    transport: TcpTransport,
    shared: Arc<Shared>,
    config: ListenerConfig,
}

impl NetListener {
    /// Bind to a TCP address. Port 0 picks an ephemeral port.
    pub fn bind(addr: impl ToSocketAddrs + std::fmt::Debug) -> Result<Self> {
        let transport = TcpTransport::bind(addr)?;
        Ok(Self {
            transport,
            shared: Arc::new(Shared::default()),
            config: ListenerConfig::default(),
        })
    }

    /// Override listener config.
    pub fn with_config(mut self, config: ListenerConfig) -> Self {
        self.transport = self.transport.with_nodelay(config.nodelay);
        self.config = config;
        self
    }

    /// Remote control for `stop`/`status` from other threads.
    pub fn handle(&self) -> ListenerHandle {
        ListenerHandle::new(Arc::clone(&self.shared))
    }

    /// Request cooperative shutdown.
    pub fn stop(&self) {
        self.handle().stop();
    }

    pub fn status(&self) -> ConnectionStatus {
        self.shared.status()
    }

    /// Bound socket address.
    pub fn local_addr(&self) -> SocketAddr {
        self.transport.local_addr()
    }

    /// Accept one producer and decode until stop or failure (blocking).
    ///
    /// Returns `Ok` only for a requested stop. Every transport or protocol
    /// failure closes the connection and is returned as-is; a frame still
    /// being assembled at that point is discarded.
    pub fn run<C>(&self, consumer: &mut C) -> Result<SessionSummary>
    where
        C: SceneConsumer + ?Sized,
    {
        if !self.shared.try_begin() {
            return Err(ListenerError::AlreadyStarted);
        }
        info!(addr = %self.local_addr(), "start listening");

        let stream = match self.transport.accept() {
            Ok(stream) => stream,
            Err(err) => {
                self.shared.set_status(ConnectionStatus::Closed);
                return Err(err.into());
            }
        };
        info!(peer = ?stream.peer_addr(), "got connection");
        self.shared.set_status(ConnectionStatus::Established);

        let result = self.serve(stream, consumer);
        self.shared.set_status(ConnectionStatus::Closed);
        result
    }

    /// Run on a dedicated thread.
    pub fn spawn<C>(self, consumer: C) -> Result<ListenerThread>
    where
        C: SceneConsumer + Send + 'static,
    {
        let handle = self.handle();
        let join = std::thread::Builder::new()
            .name("rewind-listener".to_string())
            .spawn(move || {
                let mut consumer = consumer;
                self.run(&mut consumer)
            })
            .map_err(rewind_transport::TransportError::Io)?;
        Ok(ListenerThread { handle, join })
    }

    fn serve<C>(&self, stream: NetStream, consumer: &mut C) -> Result<SessionSummary>
    where
        C: SceneConsumer + ?Sized,
    {
        let mut summary = SessionSummary {
            peer: stream.peer_addr(),
            ..SessionSummary::default()
        };
        let mut reader = EnvelopeReader::with_config_net(stream, self.config.decoder.clone())?;
        let mut assembler = FrameAssembler::new();
        let stop = &self.shared.stop;

        let outcome = loop {
            if stop.is_raised() {
                break Ok(());
            }
            let body = match reader.read_envelope(stop) {
                Ok(ReadOutcome::Envelope(body)) => body,
                Ok(ReadOutcome::ShutdownRequested) => break Ok(()),
                Err(err) => break Err(err),
            };
            summary.envelopes += 1;
            match assembler.process_body(&body, consumer, stop) {
                Ok(decoded) => {
                    summary.frames += decoded.frames as u64;
                    summary.areas += decoded.areas as u64;
                    summary.discarded_records += decoded.dropped_records;
                }
                Err(err) => break Err(err),
            }
        };

        let pending = assembler.pending_records();
        summary.discarded_records += pending;
        if assembler.discard().is_some() {
            debug!(records = pending, "discarding unfinished frame");
        }
        if let Err(err) = reader.get_ref().close() {
            debug!(error = %err, "closing connection failed");
        }

        match outcome {
            Ok(()) => {
                info!(
                    envelopes = summary.envelopes,
                    frames = summary.frames,
                    "network listening stopped"
                );
                Ok(summary)
            }
            Err(err) => {
                warn!(error = %err, "connection terminated");
                Err(err.into())
            }
        }
    }
}

/// A listener running on its own thread.
pub struct ListenerThread {
    handle: ListenerHandle,
    join: JoinHandle<Result<SessionSummary>>,
}

impl ListenerThread {
    pub fn handle(&self) -> &ListenerHandle {
        &self.handle
    }

    pub fn stop(&self) {
        self.handle.stop();
    }

    pub fn status(&self) -> ConnectionStatus {
        self.handle.status()
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the session to end.
    pub fn join(self) -> Result<SessionSummary> {
        self.join
            .join()
            .map_err(|_| ListenerError::ThreadPanicked)?
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::mpsc::{self, Receiver};
    use std::thread;
    use std::time::{Duration, Instant};

    use bytes::BytesMut;
    use rewind_frame::{
        encode_envelope, AreaDesc, AreaType, BodyEncoder, Frame, FrameError, SceneEvent,
        SceneWriter,
    };

    use super::*;

    const WAIT: Duration = Duration::from_secs(5);

    fn spawn_listener() -> (ListenerThread, SocketAddr, Receiver<SceneEvent>) {
        let listener = NetListener::bind("127.0.0.1:0").expect("listener should bind");
        let addr = listener.local_addr();
        let (tx, rx) = mpsc::channel();
        let thread = listener.spawn(tx).expect("listener should spawn");
        (thread, addr, rx)
    }

    fn wait_for_status(thread: &ListenerThread, status: ConnectionStatus) {
        let start = Instant::now();
        while thread.status() != status {
            assert!(start.elapsed() < WAIT, "status never became {status}");
            thread::sleep(Duration::from_millis(5));
        }
    }

    fn send_body(stream: &mut NetStream, body: &[u8]) -> std::io::Result<()> {
        let mut buf = BytesMut::new();
        encode_envelope(body, &mut buf).expect("body should encode");
        stream.write_all(&buf)
    }

    #[test]
    fn frames_and_areas_reach_consumer_then_stop_is_clean() {
        let (thread, addr, rx) = spawn_listener();
        let mut writer =
            SceneWriter::new(TcpTransport::connect(addr).expect("client should connect"));

        writer.area(1, 2, 0).circle(5.0, 5.0, 1.0, 0xFF0000);
        writer.message("tick").expect("message should queue");
        writer.end_frame().expect("frame should send");

        let area = rx.recv_timeout(WAIT).expect("area should arrive");
        assert_eq!(
            area,
            SceneEvent::Area(AreaDesc {
                x: 1,
                y: 2,
                area_type: AreaType::Forest
            })
        );
        let SceneEvent::Frame(frame) = rx.recv_timeout(WAIT).expect("frame should arrive") else {
            panic!("expected a frame");
        };
        assert_eq!(frame.circles.len(), 1);
        assert_eq!(frame.message.as_deref(), Some("tick"));
        assert_eq!(thread.status(), ConnectionStatus::Established);

        // The loop may already have seen the stop and closed the socket.
        thread.stop();
        writer.circle(0.0, 0.0, 1.0, 0);
        let _ = writer.end_frame();

        let summary = thread.join().expect("stop should end the session cleanly");
        assert_eq!(summary.frames, 1);
        assert_eq!(summary.areas, 1);
        assert!(summary.peer.is_some());
        assert!(rx.try_recv().is_err(), "no frame may follow the stop");
    }

    #[test]
    fn status_walks_the_state_machine() {
        let listener = NetListener::bind("127.0.0.1:0").expect("listener should bind");
        let addr = listener.local_addr();
        assert_eq!(listener.status(), ConnectionStatus::Closed);

        let thread = listener
            .spawn(Vec::<SceneEvent>::new())
            .expect("listener should spawn");
        wait_for_status(&thread, ConnectionStatus::Waiting);

        let client = TcpTransport::connect(addr).expect("client should connect");
        wait_for_status(&thread, ConnectionStatus::Established);

        drop(client);
        let err = thread.join().expect_err("peer close is terminal");
        assert!(err.is_disconnect());
    }

    #[test]
    fn non_begin_envelope_fails_the_connection() {
        let (thread, addr, rx) = spawn_listener();
        let mut client = TcpTransport::connect(addr).expect("client should connect");
        client
            .write_all(&[b'c', 0, 0, 0, 0])
            .expect("bytes should send");

        let err = thread.join().expect_err("bad tag is fatal");
        assert!(matches!(
            err,
            ListenerError::Frame(FrameError::UnexpectedEnvelopeTag { found: b'c' })
        ));
        assert!(err.is_protocol_violation());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn unknown_record_tag_fails_the_connection() {
        let (thread, addr, rx) = spawn_listener();
        let mut client = TcpTransport::connect(addr).expect("client should connect");
        send_body(&mut client, b"xe").expect("envelope should send");

        let err = thread.join().expect_err("unknown tag is fatal");
        assert!(matches!(
            err,
            ListenerError::Frame(FrameError::UnknownTag { byte: b'x', offset: 0 })
        ));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn area_arrives_without_end() {
        let (thread, addr, rx) = spawn_listener();
        let mut client = TcpTransport::connect(addr).expect("client should connect");

        let mut body = BodyEncoder::new();
        body.area(9, 10, 2);
        send_body(&mut client, body.as_bytes()).expect("envelope should send");

        let event = rx.recv_timeout(WAIT).expect("area should arrive immediately");
        assert_eq!(
            event,
            SceneEvent::Area(AreaDesc {
                x: 9,
                y: 10,
                area_type: AreaType::Rain
            })
        );
        assert_eq!(thread.status(), ConnectionStatus::Established);

        drop(client);
        let _ = thread.join();
    }

    #[test]
    fn stop_discards_unfinished_frame() {
        let (thread, addr, rx) = spawn_listener();
        let mut client = TcpTransport::connect(addr).expect("client should connect");

        let mut body = BodyEncoder::new();
        body.circle(0.0, 0.0, 1.0, 0).area(0, 0, 0);
        send_body(&mut client, body.as_bytes()).expect("envelope should send");
        rx.recv_timeout(WAIT).expect("area marks the body as processed");

        thread.stop();
        let mut tail = BodyEncoder::new();
        tail.end();
        let _ = send_body(&mut client, tail.as_bytes());

        let summary = thread.join().expect("stop is clean");
        assert_eq!(summary.frames, 0);
        assert_eq!(summary.discarded_records, 1);
        assert!(rx.try_recv().is_err());
    }

    struct StopAfterFirstFrame {
        handle: ListenerHandle,
        frames: Vec<Frame>,
    }

    impl SceneConsumer for StopAfterFirstFrame {
        fn submit_frame(&mut self, frame: Frame) {
            self.frames.push(frame);
            self.handle.stop();
        }

        fn submit_area(&mut self, _area: AreaDesc) {}
    }

    #[test]
    fn frame_ended_after_stop_counts_as_discarded() {
        let listener = NetListener::bind("127.0.0.1:0").expect("listener should bind");
        let addr = listener.local_addr();
        let consumer = StopAfterFirstFrame {
            handle: listener.handle(),
            frames: Vec::new(),
        };
        let thread = listener.spawn(consumer).expect("listener should spawn");

        let mut body = BodyEncoder::new();
        body.circle(0.0, 0.0, 1.0, 0).end();
        body.circle(1.0, 1.0, 1.0, 0).line(0.0, 0.0, 1.0, 1.0, 0).end();
        let mut client = TcpTransport::connect(addr).expect("client should connect");
        send_body(&mut client, body.as_bytes()).expect("envelope should send");

        let summary = thread.join().expect("stop is clean");
        assert_eq!(summary.envelopes, 1);
        assert_eq!(summary.frames, 1);
        assert_eq!(summary.discarded_records, 2);
    }

    #[test]
    fn session_runs_only_once() {
        let listener = NetListener::bind("127.0.0.1:0").expect("listener should bind");
        let addr = listener.local_addr();

        thread::scope(|scope| {
            let server = scope.spawn(|| {
                let mut events: Vec<SceneEvent> = Vec::new();
                listener.run(&mut events)
            });
            let client = TcpTransport::connect(addr).expect("client should connect");
            drop(client);
            assert!(server.join().expect("no panic").is_err());
        });

        assert_eq!(listener.status(), ConnectionStatus::Closed);
        let mut events: Vec<SceneEvent> = Vec::new();
        assert!(matches!(
            listener.run(&mut events),
            Err(ListenerError::AlreadyStarted)
        ));
    }

    #[test]
    fn oversized_body_is_rejected() {
        let config = ListenerConfig {
            decoder: DecoderConfig {
                max_body_size: 8,
                ..DecoderConfig::default()
            },
            ..ListenerConfig::default()
        };
        let listener = NetListener::bind("127.0.0.1:0")
            .expect("listener should bind")
            .with_config(config);
        let addr = listener.local_addr();
        let thread = listener
            .spawn(Vec::<SceneEvent>::new())
            .expect("listener should spawn");

        let mut frame = Frame::new();
        frame.message = Some("definitely longer than eight bytes".into());
        let mut writer =
            SceneWriter::new(TcpTransport::connect(addr).expect("client should connect"));
        writer.write_frame(&frame).expect("frame should send");

        let err = thread.join().expect_err("oversized body is fatal");
        assert!(matches!(
            err,
            ListenerError::Frame(FrameError::BodyTooLarge { max: 8, .. })
        ));
    }
}
