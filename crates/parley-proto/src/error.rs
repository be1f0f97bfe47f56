use thiserror::Error;

use crate::table_id::TableId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtoError {
    #[error("buffer too short")]
    TooShort,
    #[error("payload too large: {0}")]
    PayloadTooLarge(usize),
    #[error("table tag mismatch: expected {expected:?}, got {actual}")]
    TagMismatch { expected: TableId, actual: u16 },
    #[error("unknown table id: {0}")]
    UnknownTableId(u16),
    #[error("unknown packet type: {0}")]
    UnknownPacketType(u8),
    #[error("text field is not valid UTF-8")]
    BadText,
}
