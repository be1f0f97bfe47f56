use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};

use parley_proto::{
    constants::HEARTBEAT_PERIOD,
    packet::Packet,
    table_id::TableId,
    tables::{GreetingEntry, MessageEntry},
};

use crate::POLL_INTERVAL;
use crate::connection::{Connection, SharedConnections};
use crate::console::LineSource;
use crate::dispatch::Dispatcher;
use crate::error::NetError;
use crate::heartbeat::HeartbeatMonitor;
use crate::lifecycle::Lifecycle;

/// The chatting role: one connection to a server, console lines out,
/// relayed messages in.
pub struct ChatClient {
    connections: SharedConnections,
    dispatcher: Dispatcher,
    name: String,
}

impl ChatClient {
    /// Connect and introduce ourselves. Failure here is fatal for the
    /// client role; the core loop is never entered.
    pub fn connect(addr: impl ToSocketAddrs, name: &str) -> Result<ChatClient, NetError> {
        let stream = TcpStream::connect(addr)?;
        let mut conn = Connection::new(stream)?;
        conn.set_name(name);
        info!(peer = %conn.peer(), name, "connected");

        conn.request_send(Packet::from_entry(&GreetingEntry::new(name)));
        conn.flush_send_requests();

        let mut dispatcher = Dispatcher::new();
        dispatcher.register(TableId::Message, |conn, packet| {
            match packet.decode_as::<MessageEntry>() {
                Ok(msg) => println!("rcv: {}: {}", msg.sender, msg.text),
                Err(e) => warn!(peer = %conn.peer(), error = %e, "bad message payload"),
            }
        });

        Ok(ChatClient {
            connections: Arc::new(Mutex::new(vec![conn])),
            dispatcher,
            name: name.to_string(),
        })
    }

    /// Run receive + console until the server goes away, the user types
    /// `quit`, or the lifecycle is shut down externally.
    pub fn run(mut self, lifecycle: Lifecycle) {
        let monitor = HeartbeatMonitor::spawn(
            self.connections.clone(),
            lifecycle.clone(),
            HEARTBEAT_PERIOD,
        );
        let lines = LineSource::spawn(lifecycle.clone());

        while lifecycle.is_running() {
            let mut conns = self.connections.lock();
            let Some(conn) = conns.first_mut() else {
                // The monitor reaped the connection between iterations.
                drop(conns);
                info!("disconnected from the server");
                break;
            };

            conn.receive();
            for packet in conn.extract_received() {
                self.dispatcher.dispatch(conn, &packet);
            }

            while let Some(line) = lines.try_line() {
                if line == "quit" {
                    lifecycle.shutdown();
                    break;
                }
                if line.is_empty() {
                    continue;
                }
                conn.request_send(Packet::from_entry(&MessageEntry::new(&self.name, &line)));
            }
            conn.flush_send_requests();

            if !conn.is_alive() {
                drop(conns);
                info!("disconnected from the server");
                break;
            }

            drop(conns);
            std::thread::sleep(POLL_INTERVAL);
        }

        lifecycle.shutdown();
        monitor.join();
    }
}
