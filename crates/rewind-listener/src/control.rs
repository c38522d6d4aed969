use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use rewind_frame::StopSignal;
use tracing::info;

/// Connection lifecycle.
///
/// `Closed -> Waiting -> Established -> Closed`. There is no way back from
/// the final `Closed`; a listener serves a single session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// No socket activity: before `run`, or after the session ended.
    Closed,
    /// Blocked in accept.
    Waiting,
    /// A producer is connected and the decode loop is running.
    Established,
}

impl ConnectionStatus {
    fn to_raw(self) -> u8 {
        match self {
            ConnectionStatus::Closed => 0,
            ConnectionStatus::Waiting => 1,
            ConnectionStatus::Established => 2,
        }
    }

    fn from_raw(raw: u8) -> Self {
        match raw {
            1 => ConnectionStatus::Waiting,
            2 => ConnectionStatus::Established,
            _ => ConnectionStatus::Closed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionStatus::Closed => "closed",
            ConnectionStatus::Waiting => "waiting",
            ConnectionStatus::Established => "established",
        }
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State shared between the loop thread and its controllers.
#[derive(Debug, Default)]
pub(crate) struct Shared {
    pub(crate) stop: StopSignal,
    status: AtomicU8,
    started: AtomicBool,
}

impl Shared {
    pub(crate) fn status(&self) -> ConnectionStatus {
        ConnectionStatus::from_raw(self.status.load(Ordering::Acquire))
    }

    pub(crate) fn set_status(&self, status: ConnectionStatus) {
        self.status.store(status.to_raw(), Ordering::Release);
    }

    /// Move `Closed -> Waiting` for the one and only session.
    pub(crate) fn try_begin(&self) -> bool {
        if self.started.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.set_status(ConnectionStatus::Waiting);
        true
    }
}

/// Cloneable remote control for a listener, usable from any thread.
#[derive(Debug, Clone)]
pub struct ListenerHandle {
    shared: Arc<Shared>,
}

impl ListenerHandle {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Request cooperative shutdown.
    ///
    /// The loop exits at its next checkpoint; a read already blocked on the
    /// socket keeps waiting until data arrives or the peer closes.
    pub fn stop(&self) {
        if self.shared.status() != ConnectionStatus::Closed {
            info!("stopping network listening");
        }
        self.shared.stop.raise();
    }

    pub fn status(&self) -> ConnectionStatus {
        self.shared.status()
    }

    pub fn is_stop_requested(&self) -> bool {
        self.shared.stop.is_raised()
    }
}
