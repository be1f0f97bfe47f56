//! Connection, liveness, and dispatch layer of the parley chat
//! transport, plus the server/client shells driving it.

use std::time::Duration;

pub mod client;
pub mod connection;
pub mod console;
pub mod dispatch;
pub mod error;
pub mod heartbeat;
pub mod lifecycle;
pub mod server;

pub use client::ChatClient;
pub use connection::{Connection, SharedConnections};
pub use dispatch::Dispatcher;
pub use error::NetError;
pub use heartbeat::HeartbeatMonitor;
pub use lifecycle::Lifecycle;
pub use server::ChatServer;

/// Upper bound on one idle core-loop iteration. Sockets are
/// non-blocking, so this sleep is the only blocking point in the loop.
pub(crate) const POLL_INTERVAL: Duration = Duration::from_millis(20);
