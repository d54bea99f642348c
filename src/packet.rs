use crate::error::RconError;
use rand::Rng;

/// The `Type` field of the packet header. `SERVERDATA_EXECCOMMAND` and
/// `SERVERDATA_AUTH_RESPONSE` share the wire value 2 and can only be told
/// apart by conversation state; since we never receive an exec command as a
/// client, incoming 2s decode as [PacketType::AuthResponse].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    // SERVERDATA_AUTH
    Auth,
    // SERVERDATA_EXECCOMMAND
    Exec,
    // SERVERDATA_AUTH_RESPONSE
    AuthResponse,
    // SERVERDATA_RESPONSE_VALUE
    Response,
}

impl PacketType {
    pub fn value(&self) -> i32 {
        match self {
            PacketType::Auth => 3,
            PacketType::Exec => 2,
            PacketType::AuthResponse => 2,
            PacketType::Response => 0,
        }
    }

    pub fn to_le_bytes(&self) -> [u8; 4] {
        self.value().to_le_bytes()
    }
}

impl TryFrom<i32> for PacketType {
    type Error = RconError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            3 => Ok(PacketType::Auth),
            2 => Ok(PacketType::AuthResponse),
            0 => Ok(PacketType::Response),
            _ => Err(RconError::UnknownPacketType(value)),
        }
    }
}

/// A single rcon packet: a little-endian size, an id chosen by the client
/// (mirrored back by the server so responses can be matched up), a type and
/// a NUL terminated ASCII body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    id: i32,
    packet_type: PacketType,
    body: String,
}

impl Packet {
    /// Id, type and the two NUL terminators.
    pub const BASE_PACKET_SIZE: i32 = 10;
    /// Nominal cap on the `Size` field. Some servers exceed it in practice,
    /// so it is enforced for outgoing packets only.
    pub const MAX_PACKET_SIZE: i32 = 4096;
    /// Maximum body length for an outgoing packet.
    pub const MAX_BODY_SIZE: usize = (Self::MAX_PACKET_SIZE - Self::BASE_PACKET_SIZE) as usize;

    /// Builds a packet with a fresh random id.
    ///
    /// Ids stay in `[1, i32::MAX]`: the server reserves -1 to signal a failed
    /// authentication, so the client must never produce a negative id.
    pub fn new(packet_type: PacketType, body: &str) -> Result<Self, RconError> {
        Self::with_id(rand::thread_rng().gen_range(1..=i32::MAX), packet_type, body)
    }

    /// Builds a packet with a caller-chosen id. Useful when crafting
    /// responses, e.g. for a mock server in tests.
    pub fn with_id(id: i32, packet_type: PacketType, body: &str) -> Result<Self, RconError> {
        if body.len() > Self::MAX_BODY_SIZE {
            return Err(RconError::BodyTooLarge(body.len()));
        }

        Ok(Packet {
            id,
            packet_type,
            body: body.to_owned(),
        })
    }

    /// Parses everything that follows the `Size` field of a received packet:
    /// id at offset 0, type at offset 4, body from offset 8 up to the two
    /// trailing NULs.
    pub fn unpack(payload: &[u8]) -> Result<Self, RconError> {
        if payload.len() < Self::BASE_PACKET_SIZE as usize {
            return Err(RconError::InvalidPacketSize(payload.len() as i32));
        }

        let id = i32::from_le_bytes(payload[0..4].try_into()?);
        let type_value = i32::from_le_bytes(payload[4..8].try_into()?);
        let packet_type = PacketType::try_from(type_value)?;
        let body = std::str::from_utf8(&payload[8..payload.len() - 2])?;

        Ok(Packet {
            id,
            packet_type,
            body: body.to_owned(),
        })
    }

    // Since the only one of these values that can change in length is the body,
    // an easy way to calculate the size of a packet is to find the byte-length
    // of the packet body, then add 10 to it.
    pub fn size(&self) -> i32 {
        self.body.len() as i32 + Self::BASE_PACKET_SIZE
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn packet_type(&self) -> PacketType {
        self.packet_type
    }

    pub fn body(&self) -> &str {
        self.body.as_ref()
    }

    pub fn into_body(self) -> String {
        self.body
    }

    pub fn pack(&self) -> Vec<u8> {
        // Size, ID, Type, Body, Terminator
        let mut payload = Vec::<u8>::new();
        payload.extend_from_slice(&self.size().to_le_bytes());
        payload.extend_from_slice(&self.id().to_le_bytes());
        payload.extend_from_slice(&self.packet_type.to_le_bytes());
        payload.extend_from_slice(self.body().as_bytes());
        // null terminate the body (C++ interop 🤢), then null terminate the entire packet
        payload.extend_from_slice(&[0, 0]);
        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_the_wire_layout() {
        let packet = Packet::with_id(0x0100, PacketType::Exec, "echo hi").unwrap();
        let bytes = packet.pack();

        assert_eq!(&bytes[0..4], &17i32.to_le_bytes());
        assert_eq!(&bytes[4..8], &0x0100i32.to_le_bytes());
        assert_eq!(&bytes[8..12], &2i32.to_le_bytes());
        assert_eq!(&bytes[12..19], b"echo hi");
        assert_eq!(&bytes[19..], &[0, 0]);
    }

    #[test]
    fn round_trips_through_unpack() {
        let packet = Packet::new(PacketType::Response, "ab cd ef").unwrap();
        let bytes = packet.pack();

        let size = i32::from_le_bytes(bytes[0..4].try_into().unwrap());
        assert_eq!(size, packet.size());

        let decoded = Packet::unpack(&bytes[4..]).unwrap();
        assert_eq!(decoded.id(), packet.id());
        assert_eq!(decoded.packet_type(), PacketType::Response);
        assert_eq!(decoded.body(), "ab cd ef");
    }

    #[test]
    fn generates_positive_ids() {
        for _ in 0..64 {
            let packet = Packet::new(PacketType::Exec, "status").unwrap();
            assert!(packet.id() >= 1);
        }
    }

    #[test]
    fn accepts_a_maximum_size_body() {
        let body = "x".repeat(Packet::MAX_BODY_SIZE);
        let packet = Packet::new(PacketType::Exec, &body).unwrap();
        assert_eq!(packet.size(), Packet::MAX_PACKET_SIZE);
    }

    #[test]
    fn rejects_an_oversized_body() {
        let body = "x".repeat(Packet::MAX_BODY_SIZE + 1);
        assert!(matches!(
            Packet::new(PacketType::Exec, &body),
            Err(RconError::BodyTooLarge(4087))
        ));
    }

    #[test]
    fn rejects_unknown_packet_types() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&77i32.to_le_bytes());
        payload.extend_from_slice(&7i32.to_le_bytes());
        payload.extend_from_slice(&[0, 0]);

        assert!(matches!(
            Packet::unpack(&payload),
            Err(RconError::UnknownPacketType(7))
        ));
    }

    #[test]
    fn rejects_runt_payloads() {
        assert!(matches!(
            Packet::unpack(&[0; 6]),
            Err(RconError::InvalidPacketSize(6))
        ));
    }
}
