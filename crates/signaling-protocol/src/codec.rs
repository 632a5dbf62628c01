//! Codec for Socket.IO packets carried inside Engine.IO messages.
//!
//! Text layout: `<type>[<namespace>,][<ack id>][<json data>]`, for example
//! `2["ROOM_JOIN",{"roomName":"room1","roomType":"sfu"}]`. The namespace is
//! omitted for the default namespace `/`. Binary packets (types 5 and 6)
//! are not used by the signaling service and are rejected.

use serde_json::Value;

/// Namespace used when a packet does not name one.
pub const DEFAULT_NAMESPACE: &str = "/";

/// Error type for codec operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// Packet text was empty
    #[error("Empty packet")]
    Empty,

    /// Type digit outside `0..=6`
    #[error("Invalid packet type: {0:?}")]
    InvalidPacketType(char),

    /// Binary event/ack packets are not supported
    #[error("Binary packets are not supported")]
    UnsupportedBinary,

    /// Ack id did not fit in a u64
    #[error("Invalid ack id: {0}")]
    InvalidId(String),

    /// Data section was not valid JSON
    #[error("Invalid packet data: {0}")]
    InvalidData(String),

    /// Payload could not be serialized
    #[error("Failed to serialize payload: {0}")]
    Serialization(String),
}

/// Socket.IO packet type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SocketPacketType {
    /// Namespace connected
    Connect = 0,
    /// Namespace disconnected
    Disconnect = 1,
    /// Named event with arguments
    Event = 2,
    /// Acknowledgement of an event
    Ack = 3,
    /// Namespace-level error
    Error = 4,
    /// Event with binary attachments
    BinaryEvent = 5,
    /// Ack with binary attachments
    BinaryAck = 6,
}

impl SocketPacketType {
    fn from_char(c: char) -> Result<Self, CodecError> {
        match c {
            '0' => Ok(Self::Connect),
            '1' => Ok(Self::Disconnect),
            '2' => Ok(Self::Event),
            '3' => Ok(Self::Ack),
            '4' => Ok(Self::Error),
            '5' => Ok(Self::BinaryEvent),
            '6' => Ok(Self::BinaryAck),
            other => Err(CodecError::InvalidPacketType(other)),
        }
    }
}

/// A decoded Socket.IO packet.
#[derive(Debug, Clone, PartialEq)]
pub struct SocketPacket {
    /// Packet type.
    pub packet_type: SocketPacketType,
    /// Target namespace (`/` by default).
    pub namespace: String,
    /// Ack id, if the sender expects an acknowledgement.
    pub id: Option<u64>,
    /// JSON data section.
    pub data: Option<Value>,
}

impl SocketPacket {
    /// Build an event packet on the default namespace.
    ///
    /// `payload` becomes the single argument after the event name; `None`
    /// sends the bare event (`["PING"]`).
    #[must_use]
    pub fn event(name: &str, payload: Option<Value>) -> Self {
        let mut items = vec![Value::String(name.to_string())];
        items.extend(payload);

        Self {
            packet_type: SocketPacketType::Event,
            namespace: DEFAULT_NAMESPACE.to_string(),
            id: None,
            data: Some(Value::Array(items)),
        }
    }

    /// Event name and arguments, if this is a well-formed event packet.
    #[must_use]
    pub fn as_event(&self) -> Option<(&str, &[Value])> {
        if self.packet_type != SocketPacketType::Event {
            return None;
        }
        let Some(Value::Array(items)) = &self.data else {
            return None;
        };
        match items.split_first() {
            Some((Value::String(name), args)) => Some((name.as_str(), args)),
            _ => None,
        }
    }

    /// Whether the packet targets the default namespace.
    #[must_use]
    pub fn is_default_namespace(&self) -> bool {
        self.namespace == DEFAULT_NAMESPACE
    }
}

/// Encode a Socket.IO packet to its text form.
#[must_use]
pub fn encode_packet(packet: &SocketPacket) -> String {
    let mut out = String::new();
    out.push(char::from(b'0' + packet.packet_type as u8));

    if !packet.is_default_namespace() {
        out.push_str(&packet.namespace);
        out.push(',');
    }

    if let Some(id) = packet.id {
        out.push_str(&id.to_string());
    }

    if let Some(data) = &packet.data {
        out.push_str(&data.to_string());
    }

    out
}

/// Decode a Socket.IO packet from the body of an Engine.IO message.
///
/// # Errors
///
/// Returns an error if decoding fails
pub fn decode_packet(text: &str) -> Result<SocketPacket, CodecError> {
    let mut chars = text.chars();
    let type_char = chars.next().ok_or(CodecError::Empty)?;
    let packet_type = SocketPacketType::from_char(type_char)?;
    let mut rest = chars.as_str();

    if matches!(
        packet_type,
        SocketPacketType::BinaryEvent | SocketPacketType::BinaryAck
    ) {
        return Err(CodecError::UnsupportedBinary);
    }

    // Namespace runs up to the first comma
    let namespace = if rest.starts_with('/') {
        match rest.split_once(',') {
            Some((nsp, tail)) => {
                rest = tail;
                nsp.to_string()
            }
            None => {
                let nsp = rest.to_string();
                rest = "";
                nsp
            }
        }
    } else {
        DEFAULT_NAMESPACE.to_string()
    };

    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    let (id_text, data_text) = rest.split_at(digits);
    let id = if id_text.is_empty() {
        None
    } else {
        Some(
            id_text
                .parse::<u64>()
                .map_err(|_| CodecError::InvalidId(id_text.to_string()))?,
        )
    };

    let data = if data_text.is_empty() {
        None
    } else {
        Some(
            serde_json::from_str(data_text)
                .map_err(|e| CodecError::InvalidData(e.to_string()))?,
        )
    };

    Ok(SocketPacket {
        packet_type,
        namespace,
        id,
        data,
    })
}
