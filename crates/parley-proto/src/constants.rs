use std::time::Duration;

/// Default TCP port for both server and client roles.
pub const DEFAULT_PORT: u16 = 8089;

/// Total size of one wire packet (header + payload), in bytes.
/// This is a fixed protocol constant known to both ends; it is not
/// negotiated.
pub const PACKET_SIZE: usize = 256;

/// Fixed header length in bytes (wire format).
pub const HEADER_LEN: usize = 8;

/// Payload capacity of a single packet, in bytes.
pub const PAYLOAD_SIZE: usize = PACKET_SIZE - HEADER_LEN;

/// Receive buffer size per connection, sized for the largest frame
/// envelope the header can describe. Large framing itself is rejected
/// at receive time, so in practice reads never exceed `PACKET_SIZE`.
pub const RECV_BUFFER_SIZE: usize = 4096;

/// How often the heartbeat monitor probes each live connection.
pub const HEARTBEAT_PERIOD: Duration = Duration::from_millis(2000);

/// Silence window after which a connection is declared dead.
pub const CONNECTION_TIMEOUT: Duration =
    Duration::from_millis(5 * HEARTBEAT_PERIOD.as_millis() as u64);

/// Capacity of a sender-identifier text slot, excluding the NUL
/// terminator that always follows it on the wire.
pub const ID_LENGTH: usize = 32;

/// Capacity of a chat-message text slot, excluding the NUL terminator.
pub const MESSAGE_LENGTH: usize = 128;
