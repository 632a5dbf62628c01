//! Engine.IO (revision 3) text packets.
//!
//! Every WebSocket text frame is one packet: a single type digit followed by
//! an optional body.
//!
//! | Digit | Packet | Body |
//! |-------|--------|------|
//! | `0` | open | JSON handshake (`sid`, `upgrades`, `pingInterval`, `pingTimeout`) |
//! | `1` | close | none |
//! | `2` | ping | optional payload text |
//! | `3` | pong | optional payload text |
//! | `4` | message | Socket.IO packet (see [`crate::codec`]) |
//! | `5` | upgrade | none |
//! | `6` | noop | none |

use serde::Deserialize;
use std::time::Duration;

/// Error type for Engine.IO packet decoding
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PacketError {
    /// Frame had no type digit
    #[error("Empty packet")]
    Empty,

    /// Type digit outside `0..=6`
    #[error("Unknown packet type: {0:?}")]
    UnknownType(char),

    /// Open packet body was not a valid handshake
    #[error("Invalid handshake: {0}")]
    InvalidHandshake(String),
}

/// Handshake sent by the server in the open packet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Handshake {
    /// Engine.IO session id.
    pub sid: String,

    /// Transports the server would allow upgrading to.
    #[serde(default)]
    pub upgrades: Vec<String>,

    /// How often the client must ping, in milliseconds.
    #[serde(rename = "pingInterval")]
    pub ping_interval_ms: u64,

    /// How long the server waits for a ping before closing, in milliseconds.
    #[serde(rename = "pingTimeout")]
    pub ping_timeout_ms: u64,
}

impl Handshake {
    /// Client ping interval requested by the server.
    #[must_use]
    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval_ms)
    }

    /// Server-side ping timeout.
    #[must_use]
    pub fn ping_timeout(&self) -> Duration {
        Duration::from_millis(self.ping_timeout_ms)
    }
}

/// One Engine.IO packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnginePacket {
    /// Session opened by the server.
    Open(Handshake),
    /// Transport is closing.
    Close,
    /// Heartbeat request.
    Ping(Option<String>),
    /// Heartbeat response.
    Pong(Option<String>),
    /// Payload for the Socket.IO layer.
    Message(String),
    /// Transport upgrade confirmation.
    Upgrade,
    /// No operation.
    Noop,
}

impl EnginePacket {
    /// Decode a packet from a WebSocket text frame.
    ///
    /// # Errors
    ///
    /// Returns [`PacketError`] for empty frames, unknown type digits, or an
    /// open packet whose body is not a handshake.
    pub fn decode(text: &str) -> Result<Self, PacketError> {
        let mut chars = text.chars();
        let type_char = chars.next().ok_or(PacketError::Empty)?;
        let body = chars.as_str();

        match type_char {
            '0' => serde_json::from_str(body)
                .map(EnginePacket::Open)
                .map_err(|e| PacketError::InvalidHandshake(e.to_string())),
            '1' => Ok(EnginePacket::Close),
            '2' => Ok(EnginePacket::Ping(optional_body(body))),
            '3' => Ok(EnginePacket::Pong(optional_body(body))),
            '4' => Ok(EnginePacket::Message(body.to_string())),
            '5' => Ok(EnginePacket::Upgrade),
            '6' => Ok(EnginePacket::Noop),
            other => Err(PacketError::UnknownType(other)),
        }
    }

    /// Encode the packet as a WebSocket text frame.
    ///
    /// The open packet is server-only; clients never send it, so it encodes
    /// to its bare type digit.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            EnginePacket::Open(_) => "0".to_string(),
            EnginePacket::Close => "1".to_string(),
            EnginePacket::Ping(payload) => format!("2{}", payload.as_deref().unwrap_or_default()),
            EnginePacket::Pong(payload) => format!("3{}", payload.as_deref().unwrap_or_default()),
            EnginePacket::Message(body) => format!("4{body}"),
            EnginePacket::Upgrade => "5".to_string(),
            EnginePacket::Noop => "6".to_string(),
        }
    }
}

fn optional_body(body: &str) -> Option<String> {
    if body.is_empty() {
        None
    } else {
        Some(body.to_string())
    }
}
