use std::io::BufRead;

use crossbeam_channel::{Receiver, TryRecvError, bounded};
use tracing::debug;

use crate::lifecycle::Lifecycle;

/// Non-blocking stdin line source.
///
/// A background thread blocks on stdin and feeds a bounded channel; the
/// core loop polls [`LineSource::try_line`] once per iteration. The
/// thread stops at EOF, when the receiver is dropped, or once the
/// lifecycle is shut down (checked per line).
pub struct LineSource {
    rx: Receiver<String>,
}

impl LineSource {
    pub fn spawn(lifecycle: Lifecycle) -> LineSource {
        let (tx, rx) = bounded::<String>(64);

        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                if !lifecycle.is_running() {
                    break;
                }
                let Ok(line) = line else {
                    break;
                };
                if tx.send(line).is_err() {
                    break;
                }
            }
            debug!("console input thread finished");
        });

        LineSource { rx }
    }

    /// The next pending line, if the reader has produced one.
    pub fn try_line(&self) -> Option<String> {
        match self.rx.try_recv() {
            Ok(line) => Some(line),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}
