//! Typed signals exchanged with the signaling server.
//!
//! Outbound signals are application events the client emits. Inbound signals
//! cover both the connection lifecycle reported by the transport (connect,
//! disconnect, heartbeats) and the room events pushed by the server.

use crate::codec::{encode_packet, CodecError, SocketPacket};
use crate::packet::EnginePacket;
use common::types::{PeerId, RoomName};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

// ============================================================================
// Event names
// ============================================================================

/// Join a room.
pub const ROOM_JOIN: &str = "ROOM_JOIN";
/// Broadcast data to the room.
pub const ROOM_SEND_DATA: &str = "ROOM_SEND_DATA";
/// Application-level keepalive.
pub const PING: &str = "PING";
/// Another participant joined the room.
pub const ROOM_USER_JOIN: &str = "ROOM_USER_JOIN";
/// Another participant left the room.
pub const ROOM_USER_LEAVE: &str = "ROOM_USER_LEAVE";
/// Default Socket.IO message event.
pub const MESSAGE: &str = "message";

// ============================================================================
// Outbound payloads
// ============================================================================

/// Room topology requested on join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomType {
    /// Media routed through a selective forwarding unit.
    Sfu,
}

/// Payload of `ROOM_JOIN`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomJoinRequest {
    pub room_name: RoomName,
    pub room_type: RoomType,
}

impl RoomJoinRequest {
    /// Join request for an SFU room.
    #[must_use]
    pub fn sfu(room_name: RoomName) -> Self {
        Self {
            room_name,
            room_type: RoomType::Sfu,
        }
    }
}

/// Payload of `ROOM_SEND_DATA`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDataMessage {
    pub room_name: RoomName,
    pub data: String,
}

impl RoomDataMessage {
    #[must_use]
    pub fn new(room_name: RoomName, data: impl Into<String>) -> Self {
        Self {
            room_name,
            data: data.into(),
        }
    }
}

/// Signal emitted by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundSignal {
    RoomJoin(RoomJoinRequest),
    RoomSendData(RoomDataMessage),
    /// Custom keepalive, sent without payload.
    Ping,
}

impl OutboundSignal {
    /// Event name on the wire.
    #[must_use]
    pub fn event_name(&self) -> &'static str {
        match self {
            OutboundSignal::RoomJoin(_) => ROOM_JOIN,
            OutboundSignal::RoomSendData(_) => ROOM_SEND_DATA,
            OutboundSignal::Ping => PING,
        }
    }

    /// Event payload as JSON, if the signal carries one.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Serialization`] if the payload cannot be encoded.
    pub fn payload(&self) -> Result<Option<Value>, CodecError> {
        let value = match self {
            OutboundSignal::RoomJoin(request) => serde_json::to_value(request),
            OutboundSignal::RoomSendData(message) => serde_json::to_value(message),
            OutboundSignal::Ping => return Ok(None),
        };
        value
            .map(Some)
            .map_err(|e| CodecError::Serialization(e.to_string()))
    }

    /// Socket.IO event packet for this signal.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Serialization`] if the payload cannot be encoded.
    pub fn to_packet(&self) -> Result<SocketPacket, CodecError> {
        Ok(SocketPacket::event(self.event_name(), self.payload()?))
    }

    /// Complete WebSocket text frame, e.g. `42["PING"]`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Serialization`] if the payload cannot be encoded.
    pub fn to_frame(&self) -> Result<String, CodecError> {
        let packet = self.to_packet()?;
        Ok(EnginePacket::Message(encode_packet(&packet)).encode())
    }
}

// ============================================================================
// Inbound signals
// ============================================================================

/// Dispatch key of an inbound signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    Connect,
    Connecting,
    Reconnecting,
    Disconnect,
    Error,
    Message,
    Ping,
    Pong,
    RoomUserJoin,
    RoomUserLeave,
    Custom,
}

impl SignalKind {
    /// Label used in logs and metrics.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Connect => "CONNECT",
            SignalKind::Connecting => "CONNECTING",
            SignalKind::Reconnecting => "RECONNECTING",
            SignalKind::Disconnect => "DISCONNECT",
            SignalKind::Error => "ERROR",
            SignalKind::Message => "MESSAGE",
            SignalKind::Ping => "PING",
            SignalKind::Pong => "PONG",
            SignalKind::RoomUserJoin => ROOM_USER_JOIN,
            SignalKind::RoomUserLeave => ROOM_USER_LEAVE,
            SignalKind::Custom => "CUSTOM",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signal delivered to the client by the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundSignal {
    /// Transport is opening.
    Connecting,
    /// Socket.IO namespace connected.
    Connected,
    /// Transport is retrying.
    Reconnecting { attempt: u32 },
    /// Connection closed.
    Disconnected { reason: String },
    /// Server or transport reported an error.
    Error { details: String },
    /// Default `message` event.
    Message { payload: Value },
    /// Engine.IO heartbeat sent.
    Ping,
    /// Engine.IO heartbeat answered.
    Pong,
    RoomUserJoined { peer_id: PeerId },
    RoomUserLeft { peer_id: PeerId },
    /// Any other named event.
    Custom { event: String, args: Vec<Value> },
}

impl InboundSignal {
    #[must_use]
    pub fn kind(&self) -> SignalKind {
        match self {
            InboundSignal::Connecting => SignalKind::Connecting,
            InboundSignal::Connected => SignalKind::Connect,
            InboundSignal::Reconnecting { .. } => SignalKind::Reconnecting,
            InboundSignal::Disconnected { .. } => SignalKind::Disconnect,
            InboundSignal::Error { .. } => SignalKind::Error,
            InboundSignal::Message { .. } => SignalKind::Message,
            InboundSignal::Ping => SignalKind::Ping,
            InboundSignal::Pong => SignalKind::Pong,
            InboundSignal::RoomUserJoined { .. } => SignalKind::RoomUserJoin,
            InboundSignal::RoomUserLeft { .. } => SignalKind::RoomUserLeave,
            InboundSignal::Custom { .. } => SignalKind::Custom,
        }
    }

    /// Map a server event to a signal.
    ///
    /// Room membership events carry the participant either as the `src`
    /// field of an object argument or as a bare string.
    #[must_use]
    pub fn from_event(name: &str, args: &[Value]) -> Self {
        match name {
            ROOM_USER_JOIN => InboundSignal::RoomUserJoined {
                peer_id: peer_id_from(args),
            },
            ROOM_USER_LEAVE => InboundSignal::RoomUserLeft {
                peer_id: peer_id_from(args),
            },
            MESSAGE => InboundSignal::Message {
                payload: args.first().cloned().unwrap_or(Value::Null),
            },
            _ => InboundSignal::Custom {
                event: name.to_string(),
                args: args.to_vec(),
            },
        }
    }
}

fn peer_id_from(args: &[Value]) -> PeerId {
    match args.first() {
        Some(Value::Object(fields)) => match fields.get("src") {
            Some(Value::String(src)) => PeerId::new(src.as_str()),
            _ => PeerId::new(Value::Object(fields.clone()).to_string()),
        },
        Some(Value::String(id)) => PeerId::new(id.as_str()),
        Some(other) => PeerId::new(other.to_string()),
        None => PeerId::new(String::new()),
    }
}
