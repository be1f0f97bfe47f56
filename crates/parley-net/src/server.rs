use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, ToSocketAddrs};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use parley_proto::{
    constants::HEARTBEAT_PERIOD,
    packet::Packet,
    table_id::TableId,
    tables::{GreetingEntry, MessageEntry},
};

use crate::POLL_INTERVAL;
use crate::connection::{Connection, SharedConnections};
use crate::dispatch::Dispatcher;
use crate::error::NetError;
use crate::heartbeat::HeartbeatMonitor;
use crate::lifecycle::Lifecycle;

/// The relay role: accepts connections and re-sends every chat message
/// to all other live peers.
pub struct ChatServer {
    listener: TcpListener,
    connections: SharedConnections,
    dispatcher: Dispatcher,
}

impl ChatServer {
    /// Bind the listen socket. Failure here is fatal for the server
    /// role; the core loop is never entered.
    pub fn bind(addr: impl ToSocketAddrs) -> Result<ChatServer, NetError> {
        let listener = TcpListener::bind(addr)?;
        listener.set_nonblocking(true)?;
        info!(addr = %listener.local_addr()?, "listening");

        let mut dispatcher = Dispatcher::new();

        // A greeting names the connection for later log attribution.
        dispatcher.register(TableId::Greeting, |conn, packet| {
            match packet.decode_as::<GreetingEntry>() {
                Ok(greeting) => {
                    info!(peer = %conn.peer(), name = %greeting.sender, "peer introduced itself");
                    conn.set_name(greeting.sender);
                }
                Err(e) => warn!(peer = %conn.peer(), error = %e, "bad greeting payload"),
            }
        });

        dispatcher.register(TableId::Message, |conn, packet| {
            match packet.decode_as::<MessageEntry>() {
                Ok(msg) => debug!(
                    peer = %conn.peer(),
                    sender = %msg.sender,
                    text = %msg.text,
                    "chat message relayed"
                ),
                Err(e) => warn!(peer = %conn.peer(), error = %e, "bad message payload"),
            }
        });

        Ok(ChatServer {
            listener,
            connections: Arc::new(Mutex::new(Vec::new())),
            dispatcher,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, NetError> {
        Ok(self.listener.local_addr()?)
    }

    /// Run accept + relay until the lifecycle is shut down.
    pub fn run(mut self, lifecycle: Lifecycle) {
        let monitor = HeartbeatMonitor::spawn(
            self.connections.clone(),
            lifecycle.clone(),
            HEARTBEAT_PERIOD,
        );

        while lifecycle.is_running() {
            self.accept_ready();
            self.service_connections();
            std::thread::sleep(POLL_INTERVAL);
        }

        lifecycle.shutdown();
        monitor.join();

        let mut conns = self.connections.lock();
        for conn in conns.iter_mut() {
            conn.close();
        }
        conns.clear();
        info!("server stopped");
    }

    /// Accept every connection that is ready right now.
    fn accept_ready(&mut self) {
        loop {
            match self.listener.accept() {
                Ok((stream, addr)) => match Connection::new(stream) {
                    Ok(conn) => {
                        info!(peer = %addr, "connection established");
                        self.connections.lock().push(conn);
                    }
                    Err(e) => warn!(peer = %addr, error = %e, "failed to adopt connection"),
                },
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    break;
                }
            }
        }
    }

    /// One service pass: read every connection, relay chat messages to
    /// the other peers, run handlers, flush, and prune the dead.
    fn service_connections(&mut self) {
        let mut conns = self.connections.lock();

        let mut inbox: Vec<(usize, Vec<Packet>)> = Vec::new();
        for (i, conn) in conns.iter_mut().enumerate() {
            conn.receive();
            let packets = conn.extract_received();
            if !packets.is_empty() {
                inbox.push((i, packets));
            }
        }

        for (from, packets) in inbox {
            for packet in packets {
                let is_message = matches!(
                    packet.header().and_then(|h| h.table()),
                    Ok(TableId::Message)
                );
                if is_message {
                    for (i, peer) in conns.iter_mut().enumerate() {
                        if i != from && peer.is_alive() {
                            peer.request_send(packet.clone());
                        }
                    }
                }

                self.dispatcher.dispatch(&mut conns[from], &packet);
            }
        }

        for conn in conns.iter_mut() {
            conn.flush_send_requests();
        }

        conns.retain_mut(|conn| {
            if conn.is_alive() {
                true
            } else {
                info!(name = %conn.name(), peer = %conn.peer(), "connection closed, removing");
                conn.close();
                false
            }
        });
    }
}
