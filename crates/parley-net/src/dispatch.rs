use std::collections::HashMap;

use tracing::warn;

use parley_proto::{packet::Packet, table_id::TableId};

use crate::connection::Connection;

/// A table handler. It receives the connection the packet arrived on
/// and the raw packet; typed decoding (`Packet::decode_as`) and payload
/// validation are the handler's responsibility.
pub type Handler = Box<dyn FnMut(&mut Connection, &Packet) + Send>;

/// Registry mapping table tags to handlers.
///
/// Dispatch never fails: packets with no registered handler, or with an
/// unreadable header, are logged and dropped.
pub struct Dispatcher {
    handlers: HashMap<TableId, Handler>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for a table tag, replacing any previous one.
    pub fn register<F>(&mut self, table: TableId, handler: F)
    where
        F: FnMut(&mut Connection, &Packet) + Send + 'static,
    {
        self.handlers.insert(table, Box::new(handler));
    }

    /// Route a packet to the handler registered for its table tag.
    pub fn dispatch(&mut self, connection: &mut Connection, packet: &Packet) {
        let table = match packet.header().and_then(|h| h.table()) {
            Ok(table) => table,
            Err(e) => {
                warn!(peer = %connection.peer(), error = %e, "undispatchable packet dropped");
                return;
            }
        };

        match self.handlers.get_mut(&table) {
            Some(handler) => handler(connection, packet),
            None => {
                warn!(
                    peer = %connection.peer(),
                    table = ?table,
                    "no handler for table, packet dropped"
                );
            }
        }
    }

    pub fn has_handler(&self, table: TableId) -> bool {
        self.handlers.contains_key(&table)
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
