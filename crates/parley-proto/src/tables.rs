use crate::{error::ProtoError, table_id::TableId};

pub mod greeting;
pub mod message;

pub use greeting::GreetingEntry;
pub use message::MessageEntry;

/// A typed payload variant of the chat protocol.
///
/// Each entry type declares its table tag and encodes/decodes itself
/// against the raw payload region of a packet. Text fields live in
/// fixed-capacity slots, truncated to capacity and always
/// NUL-terminated, so every variant fits a single packet.
pub trait TableEntry: Sized {
    /// The table tag this entry encodes as.
    const TABLE_ID: TableId;

    /// Serialize into the payload region, returning the number of
    /// payload bytes used. `out` is at least `PAYLOAD_SIZE` long and
    /// zero-filled by the caller.
    fn encode_payload(&self, out: &mut [u8]) -> u16;

    /// Deserialize from the payload region.
    fn decode_payload(payload: &[u8]) -> Result<Self, ProtoError>;
}

/// The zero-length liveness probe payload, tag 0.
///
/// Note that bare heartbeats on the wire are a single byte without any
/// header; this entry exists so a full, headered heartbeat packet can
/// still be represented and dispatched like any other table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Heartbeat;

impl TableEntry for Heartbeat {
    const TABLE_ID: TableId = TableId::Heartbeat;

    fn encode_payload(&self, _out: &mut [u8]) -> u16 {
        0
    }

    fn decode_payload(_payload: &[u8]) -> Result<Self, ProtoError> {
        Ok(Heartbeat)
    }
}

/// Write `text` into a fixed slot of `capacity + 1` bytes at the front
/// of `out`, truncating at a character boundary and always writing a
/// NUL terminator. Returns the slot width (`capacity + 1`).
pub(crate) fn put_cstr(out: &mut [u8], text: &str, capacity: usize) -> usize {
    let mut len = text.len().min(capacity);
    while !text.is_char_boundary(len) {
        len -= 1;
    }
    out[..len].copy_from_slice(&text.as_bytes()[..len]);
    out[len] = 0;
    capacity + 1
}

/// Read a NUL-terminated string out of a fixed slot of `capacity + 1`
/// bytes at the front of `buf`. Missing terminators clamp at the slot
/// capacity, so a corrupted slot can never read past its bounds.
pub(crate) fn take_cstr(buf: &[u8], capacity: usize) -> Result<String, ProtoError> {
    let slot = buf.get(..capacity + 1).ok_or(ProtoError::TooShort)?;
    let end = slot
        .iter()
        .position(|&b| b == 0)
        .unwrap_or(capacity)
        .min(capacity);
    let text = std::str::from_utf8(&slot[..end]).map_err(|_| ProtoError::BadText)?;
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::{put_cstr, take_cstr};
    use crate::error::ProtoError;

    #[test]
    fn cstr_slot_roundtrip() {
        let mut buf = [0u8; 16];
        let used = put_cstr(&mut buf, "alice", 8);
        assert_eq!(used, 9);
        assert_eq!(buf[5], 0);
        assert_eq!(take_cstr(&buf, 8).unwrap(), "alice");
    }

    #[test]
    fn cstr_slot_truncates_and_terminates() {
        let mut buf = [0u8; 16];
        put_cstr(&mut buf, "overlong-name", 8);
        assert_eq!(buf[8], 0);
        assert_eq!(take_cstr(&buf, 8).unwrap(), "overlong");
    }

    #[test]
    fn cstr_truncation_respects_char_boundaries() {
        let mut buf = [0u8; 16];
        // "héllo" where the é (2 bytes) straddles the cut point.
        put_cstr(&mut buf, "aaaaaaaé", 8);
        assert_eq!(take_cstr(&buf, 8).unwrap(), "aaaaaaa");
    }

    #[test]
    fn cstr_slot_without_terminator_clamps() {
        let buf = [b'x'; 9];
        assert_eq!(take_cstr(&buf, 8).unwrap(), "xxxxxxxx");
    }

    #[test]
    fn cstr_short_buffer_errors() {
        assert_eq!(take_cstr(&[0u8; 4], 8), Err(ProtoError::TooShort));
    }
}
