use crate::{
    constants::{HEADER_LEN, PACKET_SIZE},
    error::ProtoError,
    header::Header,
    table_id::PacketType,
    tables::TableEntry,
};

/// One fixed-size wire packet: `[Header][payload, zero-padded]`.
///
/// Owns its bytes so it can be queued, broadcast, and moved across
/// threads freely. Typed access goes through [`Packet::from_entry`] and
/// [`Packet::decode_as`], which replace layout punning with explicit
/// encode/decode plus a mandatory tag check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    data: [u8; PACKET_SIZE],
}

impl Packet {
    /// Build a packet from a typed table entry. The header is written
    /// with the entry's tag, version 0, `Normal` framing, and the exact
    /// payload length; unused payload bytes stay zero.
    pub fn from_entry<T: TableEntry>(entry: &T) -> Packet {
        let mut data = [0u8; PACKET_SIZE];

        let payload_len = entry.encode_payload(&mut data[HEADER_LEN..]);

        let mut header = Header::new(T::TABLE_ID);
        header.packet_type = PacketType::Normal as u8;
        header.payload_len = payload_len;

        let mut hbuf = [0u8; HEADER_LEN];
        header.encode_into(&mut hbuf);
        data[..HEADER_LEN].copy_from_slice(&hbuf);

        Packet { data }
    }

    /// Build a packet from raw wire bytes.
    ///
    /// Validates the header, copies at most `PACKET_SIZE` bytes and
    /// zero-pads the rest. `buf` may be shorter than a full packet (a
    /// short read) as long as it covers the header.
    pub fn from_wire(buf: &[u8]) -> Result<Packet, ProtoError> {
        Header::decode(buf)?;

        let mut data = [0u8; PACKET_SIZE];
        let n = buf.len().min(PACKET_SIZE);
        data[..n].copy_from_slice(&buf[..n]);
        Ok(Packet { data })
    }

    /// Decode this packet's header.
    pub fn header(&self) -> Result<Header, ProtoError> {
        Header::decode(&self.data)
    }

    /// Reinterpret the payload region as entry type `T`.
    ///
    /// The tag check is mandatory: a packet whose header tag does not
    /// match `T::TABLE_ID` fails with `TagMismatch` instead of yielding
    /// garbage fields.
    pub fn decode_as<T: TableEntry>(&self) -> Result<T, ProtoError> {
        let header = self.header()?;
        if header.table_id != T::TABLE_ID as u16 {
            return Err(ProtoError::TagMismatch {
                expected: T::TABLE_ID,
                actual: header.table_id,
            });
        }
        T::decode_payload(self.payload())
    }

    pub fn payload(&self) -> &[u8] {
        &self.data[HEADER_LEN..]
    }

    pub fn as_bytes(&self) -> &[u8; PACKET_SIZE] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::Packet;
    use crate::{
        constants::{HEADER_LEN, ID_LENGTH, MESSAGE_LENGTH, PACKET_SIZE},
        error::ProtoError,
        table_id::TableId,
        tables::{GreetingEntry, Heartbeat, MessageEntry, TableEntry},
    };

    #[test]
    fn message_roundtrip() {
        let entry = MessageEntry::new("alice", "hi");
        let packet = Packet::from_entry(&entry);

        let header = packet.header().unwrap();
        assert_eq!(header.table().unwrap(), TableId::Message);
        assert_eq!(header.payload_len as usize, MessageEntry::ENCODED_LEN);

        let decoded = packet.decode_as::<MessageEntry>().unwrap();
        assert_eq!(decoded.sender, "alice");
        assert_eq!(decoded.text, "hi");
    }

    #[test]
    fn greeting_roundtrip() {
        let entry = GreetingEntry::new("bob");
        let decoded = Packet::from_entry(&entry)
            .decode_as::<GreetingEntry>()
            .unwrap();
        assert_eq!(decoded, entry);
    }

    #[test]
    fn heartbeat_roundtrip() {
        let packet = Packet::from_entry(&Heartbeat);
        assert_eq!(packet.header().unwrap().payload_len, 0);
        assert_eq!(packet.decode_as::<Heartbeat>().unwrap(), Heartbeat);
    }

    #[test]
    fn oversized_text_is_truncated_and_terminated() {
        let long_sender = "s".repeat(ID_LENGTH + 10);
        let long_text = "t".repeat(MESSAGE_LENGTH + 50);
        let packet = Packet::from_entry(&MessageEntry::new(long_sender, long_text));

        let decoded = packet.decode_as::<MessageEntry>().unwrap();
        assert_eq!(decoded.sender.len(), ID_LENGTH);
        assert_eq!(decoded.text.len(), MESSAGE_LENGTH);

        // Terminators sit at the end of each fixed slot.
        let payload = packet.payload();
        assert_eq!(payload[ID_LENGTH], 0);
        assert_eq!(payload[ID_LENGTH + 1 + MESSAGE_LENGTH], 0);
    }

    #[test]
    fn decode_as_enforces_tag_match() {
        let packet = Packet::from_entry(&GreetingEntry::new("carol"));

        let err = packet.decode_as::<MessageEntry>().unwrap_err();
        assert_eq!(
            err,
            ProtoError::TagMismatch {
                expected: TableId::Message,
                actual: TableId::Greeting as u16,
            }
        );
    }

    #[test]
    fn from_wire_zero_pads_short_reads() {
        let full = Packet::from_entry(&GreetingEntry::new("dave"));

        // Simulate a read that stopped after header + greeting slot.
        let short = &full.as_bytes()[..HEADER_LEN + GreetingEntry::ENCODED_LEN];
        let rebuilt = Packet::from_wire(short).unwrap();

        assert_eq!(rebuilt, full);
        assert_eq!(rebuilt.as_bytes().len(), PACKET_SIZE);
    }

    #[test]
    fn from_wire_rejects_garbage_header() {
        assert!(Packet::from_wire(&[0u8; 4]).is_err());
    }

    #[test]
    fn every_variant_fits_the_packet() {
        assert!(MessageEntry::ENCODED_LEN <= PACKET_SIZE - HEADER_LEN);
        assert!(GreetingEntry::ENCODED_LEN <= PACKET_SIZE - HEADER_LEN);
        assert_eq!(Heartbeat.encode_payload(&mut [0u8; 0]), 0);
    }
}
