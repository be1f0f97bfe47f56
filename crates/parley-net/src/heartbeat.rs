use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::connection::SharedConnections;
use crate::lifecycle::Lifecycle;

/// Background driver for per-connection liveness.
///
/// Each cycle it walks the shared connection set: dead connections are
/// closed and removed (which is how the owner learns about the
/// disconnect), live ones get a heartbeat probe. It is the sole
/// generator of outbound heartbeats; application traffic never
/// substitutes for a probe.
pub struct HeartbeatMonitor {
    handle: JoinHandle<()>,
}

impl HeartbeatMonitor {
    pub fn spawn(
        connections: SharedConnections,
        lifecycle: Lifecycle,
        period: Duration,
    ) -> HeartbeatMonitor {
        let handle = std::thread::spawn(move || {
            while lifecycle.is_running() {
                {
                    let mut conns = connections.lock();
                    conns.retain_mut(|conn| {
                        if conn.is_alive() {
                            conn.send_heartbeat();
                            true
                        } else {
                            info!(
                                name = %conn.name(),
                                peer = %conn.peer(),
                                "connection timed out, removing"
                            );
                            conn.close();
                            false
                        }
                    });
                }

                sleep_while_running(&lifecycle, period);
            }
        });

        HeartbeatMonitor { handle }
    }

    /// Wait for the monitor thread to finish. Call after the lifecycle
    /// has been shut down.
    pub fn join(self) {
        if self.handle.join().is_err() {
            warn!("heartbeat monitor thread panicked");
        }
    }
}

/// Sleep for `period` in short slices so shutdown is not stalled by a
/// full heartbeat interval.
fn sleep_while_running(lifecycle: &Lifecycle, period: Duration) {
    const SLICE: Duration = Duration::from_millis(20);

    let deadline = Instant::now() + period;
    while lifecycle.is_running() {
        let left = deadline.saturating_duration_since(Instant::now());
        if left.is_zero() {
            return;
        }
        std::thread::sleep(left.min(SLICE));
    }
}

#[cfg(test)]
mod tests {
    use super::HeartbeatMonitor;
    use std::io::Read;
    use std::net::{TcpListener, TcpStream};
    use std::sync::Arc;
    use std::time::Duration;

    use parking_lot::Mutex;

    use crate::connection::{Connection, SharedConnections};
    use crate::lifecycle::Lifecycle;

    fn tracked_pair(timeout: Duration) -> (SharedConnections, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let peer = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (accepted, _) = listener.accept().unwrap();
        let conn = Connection::with_timeout(accepted, timeout).unwrap();
        (Arc::new(Mutex::new(vec![conn])), peer)
    }

    #[test]
    fn live_connections_get_probed() {
        let (connections, mut peer) = tracked_pair(Duration::from_secs(10));
        let lifecycle = Lifecycle::new();

        let monitor = HeartbeatMonitor::spawn(
            connections.clone(),
            lifecycle.clone(),
            Duration::from_millis(10),
        );

        let mut byte = [1u8; 1];
        peer.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        peer.read_exact(&mut byte).unwrap();
        assert_eq!(byte[0], 0);

        lifecycle.shutdown();
        monitor.join();
        assert_eq!(connections.lock().len(), 1);
    }

    #[test]
    fn dead_connections_are_removed() {
        let (connections, _peer) = tracked_pair(Duration::from_millis(30));
        let lifecycle = Lifecycle::new();

        let monitor = HeartbeatMonitor::spawn(
            connections.clone(),
            lifecycle.clone(),
            Duration::from_millis(10),
        );

        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while !connections.lock().is_empty() {
            assert!(
                std::time::Instant::now() < deadline,
                "dead connection was never reaped"
            );
            std::thread::sleep(Duration::from_millis(10));
        }

        lifecycle.shutdown();
        monitor.join();
    }
}
