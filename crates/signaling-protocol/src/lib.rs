//! Signaling wire protocol for the room client.
//!
//! The signaling service speaks Socket.IO (protocol revision 4) on top of
//! Engine.IO (protocol revision 3) over a WebSocket. This crate implements
//! the two text packet layers and the typed signals the client exchanges:
//!
//! - [`packet`] - Engine.IO packets (open, ping/pong, message, close)
//! - [`codec`] - Socket.IO packets carried inside Engine.IO messages
//! - [`signal`] - Room signals (`ROOM_JOIN`, `ROOM_SEND_DATA`, `PING`, ...)
//!
//! Everything here is pure: no I/O, no runtime. Decoders never panic on
//! untrusted input (see the `fuzz/` workspace).

#![warn(clippy::pedantic)]

pub mod codec;
pub mod packet;
pub mod signal;

pub use codec::{CodecError, SocketPacket, SocketPacketType};
pub use packet::{EnginePacket, Handshake, PacketError};
pub use signal::{
    InboundSignal, OutboundSignal, RoomDataMessage, RoomJoinRequest, RoomType, SignalKind,
};
