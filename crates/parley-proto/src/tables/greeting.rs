use crate::{
    constants::ID_LENGTH,
    error::ProtoError,
    table_id::TableId,
    tables::{TableEntry, put_cstr, take_cstr},
};

/// First packet a client sends after connecting: announces its display
/// name so the peer can attribute later messages.
///
/// Wire layout inside the payload region:
/// - 0..33  sender (32 bytes + NUL)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GreetingEntry {
    pub sender: String,
}

impl GreetingEntry {
    pub fn new(sender: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
        }
    }

    pub const ENCODED_LEN: usize = ID_LENGTH + 1;
}

impl TableEntry for GreetingEntry {
    const TABLE_ID: TableId = TableId::Greeting;

    fn encode_payload(&self, out: &mut [u8]) -> u16 {
        put_cstr(out, &self.sender, ID_LENGTH) as u16
    }

    fn decode_payload(payload: &[u8]) -> Result<Self, ProtoError> {
        let sender = take_cstr(payload, ID_LENGTH)?;
        Ok(Self { sender })
    }
}
