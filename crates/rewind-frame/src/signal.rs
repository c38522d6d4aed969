use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative stop flag shared between the decode loop and its controller.
///
/// Setting it never interrupts a blocked read; the loop observes it at
/// envelope boundaries and before dispatching frames.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    flag: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown.
    pub fn raise(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_raised(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Clear a previous request so the signal can drive another session.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::Release);
    }
}
