use strum::FromRepr;

/// Table tag: selects which payload variant the packet carries.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr)]
pub enum TableId {
    Heartbeat = 0,
    Message = 1,
    Greeting = 2,
    /// Reserved for a future peer-roster table; never sent today.
    IdList = 3,
}

/// Packet framing kind.
///
/// `Large` is a recognized wire value but formally unsupported: the
/// header reserves `index`/`max_index` for splitting an oversized
/// payload across frames, and no reassembly is implemented. Receivers
/// reject `Large` frames with a diagnostic instead of guessing.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr)]
pub enum PacketType {
    Normal = 0,
    Large = 1,
}
