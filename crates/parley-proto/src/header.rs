use crate::{
    constants::{HEADER_LEN, PAYLOAD_SIZE},
    error::ProtoError,
    table_id::TableId,
};

/// Packet header (wire format).
///
/// Encoding rules:
/// - Fixed size: exactly `HEADER_LEN` bytes.
/// - Integer fields are little-endian.
/// - Layout is defined by `encode_into()` / `decode()` offsets below.
///
/// Decode rules:
/// - Requires `buf.len() >= HEADER_LEN`.
/// - Requires `payload_len <= PAYLOAD_SIZE` (sanity check only; the
///   payload bytes themselves need not be present).
/// - `table_id` is stored as raw `u16`; upper layers validate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Table tag selecting the payload variant. Stored raw; `decode()`
    /// does not validate it so unknown tags can be logged and dropped
    /// upstream instead of killing the connection.
    pub table_id: u16,

    /// Schema version of that table. Currently always 0.
    pub table_version: u8,

    /// Framing kind, see [`crate::table_id::PacketType`]. Stored raw.
    pub packet_type: u8,

    /// Fragment index (reserved, always 0 today).
    pub index: u8,

    /// Fragment count (reserved, always 0 today).
    pub max_index: u8,

    /// Declared payload length in bytes. Trusted only up to the sanity
    /// check `payload_len <= PAYLOAD_SIZE`.
    pub payload_len: u16,
}

impl Header {
    /// Header size in bytes for the current wire layout.
    pub const LEN: usize = HEADER_LEN;

    /// Create a header with default values and a specific table tag.
    pub fn new(table_id: TableId) -> Self {
        Self {
            table_id: table_id as u16,
            table_version: 0,
            packet_type: 0,
            index: 0,
            max_index: 0,
            payload_len: 0,
        }
    }

    /// Encode this header into `out` using the current fixed wire layout.
    ///
    /// Offsets (bytes):
    /// - 0..2  table_id (u16 LE)
    /// - 2     table_version
    /// - 3     packet_type
    /// - 4     index
    /// - 5     max_index
    /// - 6..8  payload_len (u16 LE)
    pub fn encode_into(&self, out: &mut [u8; HEADER_LEN]) {
        out[0..2].copy_from_slice(&self.table_id.to_le_bytes());
        out[2] = self.table_version;
        out[3] = self.packet_type;
        out[4] = self.index;
        out[5] = self.max_index;
        out[6..8].copy_from_slice(&self.payload_len.to_le_bytes());
    }

    /// Decode a header from the front of `buf`.
    ///
    /// Reads only the header region; trailing bytes are ignored so a
    /// short read that covers the header but not the full packet still
    /// yields enough to classify the frame.
    pub fn decode(buf: &[u8]) -> Result<Header, ProtoError> {
        if buf.len() < HEADER_LEN {
            return Err(ProtoError::TooShort);
        }

        let table_id = read_u16_le(buf, 0)?;
        let payload_len = read_u16_le(buf, 6)?;

        if payload_len as usize > PAYLOAD_SIZE {
            return Err(ProtoError::PayloadTooLarge(payload_len as usize));
        }

        Ok(Header {
            table_id,
            table_version: buf[2],
            packet_type: buf[3],
            index: buf[4],
            max_index: buf[5],
            payload_len,
        })
    }

    /// The validated table tag, if this header carries a known one.
    pub fn table(&self) -> Result<TableId, ProtoError> {
        TableId::from_repr(self.table_id).ok_or(ProtoError::UnknownTableId(self.table_id))
    }
}

fn read_u16_le(buf: &[u8], start: usize) -> Result<u16, ProtoError> {
    let bytes: [u8; 2] = buf
        .get(start..start + 2)
        .ok_or(ProtoError::TooShort)?
        .try_into()
        .map_err(|_| ProtoError::TooShort)?;
    Ok(u16::from_le_bytes(bytes))
}
