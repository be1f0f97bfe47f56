use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Clonable run/shutdown handle shared by the core loop and the
/// auxiliary threads (heartbeat monitor, console line source).
///
/// Owned by the process and passed to each component; every loop checks
/// it once per iteration and exits cleanly when it is cleared.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    running: Arc<AtomicBool>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Initiate orderly shutdown. Idempotent.
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::Relaxed);
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
