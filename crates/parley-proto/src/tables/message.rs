use crate::{
    constants::{ID_LENGTH, MESSAGE_LENGTH},
    error::ProtoError,
    table_id::TableId,
    tables::{TableEntry, put_cstr, take_cstr},
};

/// A chat line: sender identifier plus message text.
///
/// Wire layout inside the payload region:
/// - 0..33    sender (32 bytes + NUL)
/// - 33..162  text (128 bytes + NUL)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEntry {
    pub sender: String,
    pub text: String,
}

impl MessageEntry {
    pub fn new(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            text: text.into(),
        }
    }

    /// Encoded payload width: both slots, terminators included.
    pub const ENCODED_LEN: usize = (ID_LENGTH + 1) + (MESSAGE_LENGTH + 1);
}

impl TableEntry for MessageEntry {
    const TABLE_ID: TableId = TableId::Message;

    fn encode_payload(&self, out: &mut [u8]) -> u16 {
        let mut at = put_cstr(out, &self.sender, ID_LENGTH);
        at += put_cstr(&mut out[at..], &self.text, MESSAGE_LENGTH);
        at as u16
    }

    fn decode_payload(payload: &[u8]) -> Result<Self, ProtoError> {
        let sender = take_cstr(payload, ID_LENGTH)?;
        let text = take_cstr(&payload[ID_LENGTH + 1..], MESSAGE_LENGTH)?;
        Ok(Self { sender, text })
    }
}
