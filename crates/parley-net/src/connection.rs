use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use parley_proto::{
    constants::{CONNECTION_TIMEOUT, HEADER_LEN, PACKET_SIZE, RECV_BUFFER_SIZE},
    header::Header,
    packet::Packet,
    table_id::PacketType,
};

/// The connection set shared between a core loop and the heartbeat
/// monitor. The set-level lock guards both structural changes and
/// per-connection mutation, so at most one thread touches a
/// connection's queues at a time.
pub type SharedConnections = Arc<Mutex<Vec<Connection>>>;

/// One peer: socket, packet queues, and liveness clock.
///
/// Lifecycle is `Alive -> Closed`, with `Closed` terminal. A connection
/// closes on a zero-byte read, a read error, an exceeded timeout
/// window, or an explicit [`Connection::close`]. Per-packet problems
/// (oversized frame, unknown tag, unsupported framing) never close it.
pub struct Connection {
    name: String,
    peer: String,
    /// `None` once closed; the socket is shut down and released exactly
    /// once no matter how many times `close()` runs.
    stream: Option<TcpStream>,
    alive: bool,
    last_activity: Instant,
    timeout: Duration,
    inbound: Vec<Packet>,
    outbound: Vec<Packet>,
    recv_buf: Box<[u8; RECV_BUFFER_SIZE]>,
}

impl Connection {
    /// Wrap an accepted or freshly connected stream. The stream is
    /// switched to non-blocking mode; all later reads and writes return
    /// immediately whether or not data was available.
    pub fn new(stream: TcpStream) -> std::io::Result<Connection> {
        Self::with_timeout(stream, CONNECTION_TIMEOUT)
    }

    /// Like [`Connection::new`] with an explicit liveness window.
    pub fn with_timeout(stream: TcpStream, timeout: Duration) -> std::io::Result<Connection> {
        stream.set_nonblocking(true)?;
        let peer = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        Ok(Connection {
            name: "Unknown".to_string(),
            peer,
            stream: Some(stream),
            alive: true,
            last_activity: Instant::now(),
            timeout,
            inbound: Vec::new(),
            outbound: Vec::new(),
            recv_buf: Box::new([0u8; RECV_BUFFER_SIZE]),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Perform one non-blocking read and classify the bytes.
    ///
    /// - no data ready: no-op (the readiness driver raced us);
    /// - zero-byte read or read error: close the connection;
    /// - fewer bytes than a header: bare heartbeat probe, refresh the
    ///   liveness clock and enqueue nothing;
    /// - otherwise decode the header and either queue a full packet or
    ///   drop the frame with a diagnostic.
    pub fn receive(&mut self) {
        let Some(stream) = self.stream.as_mut() else {
            return;
        };

        let n = match stream.read(&mut self.recv_buf[..]) {
            Ok(0) => {
                info!(name = %self.name, peer = %self.peer, "peer closed the connection");
                self.close();
                return;
            }
            Ok(n) => n,
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::Interrupted) => {
                return;
            }
            Err(e) => {
                warn!(name = %self.name, peer = %self.peer, error = %e, "read failed");
                self.close();
                return;
            }
        };

        // Any successful read counts as peer activity, heartbeats included.
        self.last_activity = Instant::now();

        if n < HEADER_LEN {
            trace!(name = %self.name, peer = %self.peer, "heartbeat received");
            return;
        }

        let header = match Header::decode(&self.recv_buf[..n]) {
            Ok(header) => header,
            Err(e) => {
                warn!(name = %self.name, peer = %self.peer, error = %e, "undecodable header, frame dropped");
                return;
            }
        };

        match PacketType::from_repr(header.packet_type) {
            Some(PacketType::Normal) => {
                if n > PACKET_SIZE {
                    warn!(
                        name = %self.name,
                        peer = %self.peer,
                        bytes = n,
                        "oversized packet dropped"
                    );
                    return;
                }
                if let Err(e) = header.table() {
                    warn!(name = %self.name, peer = %self.peer, error = %e, "packet dropped");
                    return;
                }
                match Packet::from_wire(&self.recv_buf[..n]) {
                    Ok(packet) => self.inbound.push(packet),
                    Err(e) => {
                        warn!(name = %self.name, peer = %self.peer, error = %e, "packet dropped")
                    }
                }
            }
            Some(PacketType::Large) => {
                warn!(
                    name = %self.name,
                    peer = %self.peer,
                    "large framing is not implemented, packet dropped"
                );
            }
            None => {
                warn!(
                    name = %self.name,
                    peer = %self.peer,
                    packet_type = header.packet_type,
                    "unrecognized packet type, packet dropped"
                );
            }
        }
    }

    /// Queue a packet for sending. No I/O happens here; the queue is
    /// written out by [`Connection::flush_send_requests`].
    pub fn request_send(&mut self, packet: Packet) {
        self.outbound.push(packet);
    }

    /// Write every queued packet to the socket, one write per packet,
    /// in the order they were requested, then clear the queue.
    ///
    /// A write failure does not close the connection; if the peer is
    /// really gone, receive-side silence will exceed the timeout window
    /// and the liveness check will catch it.
    pub fn flush_send_requests(&mut self) {
        let Some(stream) = self.stream.as_mut() else {
            self.outbound.clear();
            return;
        };

        for packet in &self.outbound {
            if let Err(e) = stream.write_all(packet.as_bytes()) {
                warn!(name = %self.name, peer = %self.peer, error = %e, "write failed");
                break;
            }
        }

        self.outbound.clear();
    }

    /// Swap out and return everything received so far. Exactly-once
    /// drain: a second call with no intervening `receive()` is empty.
    pub fn extract_received(&mut self) -> Vec<Packet> {
        std::mem::take(&mut self.inbound)
    }

    /// Write the minimal single-byte liveness probe. It carries no
    /// header; its only job is to refresh the peer's activity clock.
    pub fn send_heartbeat(&mut self) {
        if let Some(stream) = self.stream.as_mut() {
            if let Err(e) = stream.write_all(&[0u8]) {
                debug!(name = %self.name, peer = %self.peer, error = %e, "heartbeat write failed");
            }
        }
    }

    /// Pure liveness predicate: closed connections and connections
    /// silent for longer than the timeout window are dead.
    pub fn is_alive(&self) -> bool {
        self.alive && self.last_activity.elapsed() < self.timeout
    }

    /// Transition to the terminal closed state. Idempotent; the socket
    /// is shut down and released on the first call only.
    pub fn close(&mut self) {
        self.alive = false;

        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
            debug!(name = %self.name, peer = %self.peer, "connection closed");
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::Connection;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::time::{Duration, Instant};

    use parley_proto::{
        constants::{HEADER_LEN, PACKET_SIZE},
        header::Header,
        packet::Packet,
        table_id::{PacketType, TableId},
        tables::MessageEntry,
    };

    /// A connection wired to a plain blocking peer stream over loopback.
    fn pair() -> (Connection, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let peer = TcpStream::connect(addr).unwrap();
        let (accepted, _) = listener.accept().unwrap();
        (Connection::new(accepted).unwrap(), peer)
    }

    /// Drive `receive()` until `done` holds or two seconds pass.
    fn poll_until(conn: &mut Connection, mut done: impl FnMut(&Connection) -> bool) {
        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            conn.receive();
            if done(conn) {
                return;
            }
            assert!(Instant::now() < deadline, "condition not reached in time");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn flush_preserves_fifo_order() {
        let (mut conn, mut peer) = pair();

        conn.request_send(Packet::from_entry(&MessageEntry::new("alice", "first")));
        conn.request_send(Packet::from_entry(&MessageEntry::new("alice", "second")));
        conn.flush_send_requests();

        let mut wire = [0u8; 2 * PACKET_SIZE];
        peer.read_exact(&mut wire).unwrap();

        let first = Packet::from_wire(&wire[..PACKET_SIZE])
            .unwrap()
            .decode_as::<MessageEntry>()
            .unwrap();
        let second = Packet::from_wire(&wire[PACKET_SIZE..])
            .unwrap()
            .decode_as::<MessageEntry>()
            .unwrap();

        assert_eq!(first.text, "first");
        assert_eq!(second.text, "second");
        assert!(conn.outbound.is_empty());
    }

    #[test]
    fn extract_received_drains_exactly_once() {
        let (mut conn, mut peer) = pair();

        let packet = Packet::from_entry(&MessageEntry::new("bob", "hi"));
        peer.write_all(packet.as_bytes()).unwrap();

        poll_until(&mut conn, |c| !c.inbound.is_empty());

        let first = conn.extract_received();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0], packet);

        assert!(conn.extract_received().is_empty());
    }

    #[test]
    fn bare_probe_refreshes_clock_and_enqueues_nothing() {
        let (mut conn, mut peer) = pair();
        let before = conn.last_activity;

        peer.write_all(&[0u8]).unwrap();
        poll_until(&mut conn, |c| c.last_activity > before);

        assert!(conn.inbound.is_empty());
        assert!(conn.is_alive());
    }

    #[test]
    fn silent_connection_exceeds_timeout_window() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let _peer = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (accepted, _) = listener.accept().unwrap();

        let conn = Connection::with_timeout(accepted, Duration::from_millis(50)).unwrap();
        assert!(conn.is_alive());

        std::thread::sleep(Duration::from_millis(80));
        assert!(!conn.is_alive());
    }

    #[test]
    fn zero_byte_read_closes_the_connection() {
        let (mut conn, peer) = pair();
        drop(peer);

        poll_until(&mut conn, |c| !c.alive);
        assert!(conn.stream.is_none());
        assert!(!conn.is_alive());
    }

    #[test]
    fn large_framing_is_dropped_without_killing_liveness() {
        let (mut conn, mut peer) = pair();
        let before = conn.last_activity;

        let mut header = Header::new(TableId::Message);
        header.packet_type = PacketType::Large as u8;
        let mut frame = [0u8; PACKET_SIZE];
        let mut hbuf = [0u8; HEADER_LEN];
        header.encode_into(&mut hbuf);
        frame[..HEADER_LEN].copy_from_slice(&hbuf);

        peer.write_all(&frame).unwrap();
        poll_until(&mut conn, |c| c.last_activity > before);

        assert!(conn.inbound.is_empty());
        assert!(conn.is_alive());
    }

    #[test]
    fn unknown_table_tag_is_dropped_without_killing_liveness() {
        let (mut conn, mut peer) = pair();
        let before = conn.last_activity;

        let mut header = Header::new(TableId::Heartbeat);
        header.table_id = 0x7777;
        let mut frame = [0u8; PACKET_SIZE];
        let mut hbuf = [0u8; HEADER_LEN];
        header.encode_into(&mut hbuf);
        frame[..HEADER_LEN].copy_from_slice(&hbuf);

        peer.write_all(&frame).unwrap();
        poll_until(&mut conn, |c| c.last_activity > before);

        assert!(conn.inbound.is_empty());
        assert!(conn.is_alive());
    }

    #[test]
    fn close_is_idempotent() {
        let (mut conn, _peer) = pair();

        conn.close();
        assert!(conn.stream.is_none());
        assert!(!conn.is_alive());

        conn.close();
        conn.receive();
        conn.flush_send_requests();
        assert!(conn.stream.is_none());
    }
}
