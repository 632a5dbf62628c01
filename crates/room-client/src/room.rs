//! Room operations.
//!
//! Both operations are fire-and-forget: they queue one event on the session's
//! connection and return. Neither waits for the server.

use crate::errors::RoomClientError;
use crate::session::SessionContext;
use signaling_protocol::{OutboundSignal, RoomDataMessage, RoomJoinRequest};
use tracing::debug;

/// Emit `ROOM_JOIN`.
///
/// # Errors
///
/// `NotConnected` before the server has confirmed the connection, or
/// `Transport` if the event cannot be queued.
pub fn join(session: &SessionContext, request: RoomJoinRequest) -> Result<(), RoomClientError> {
    ensure_connected(session)?;
    debug!(target: "rc.room", room = %request.room_name, "Joining room");
    session.emit(OutboundSignal::RoomJoin(request))
}

/// Emit `ROOM_SEND_DATA`.
///
/// # Errors
///
/// Same as [`join`].
pub fn send_data(
    session: &SessionContext,
    message: RoomDataMessage,
) -> Result<(), RoomClientError> {
    ensure_connected(session)?;
    debug!(target: "rc.room", room = %message.room_name, "Sending room data");
    session.emit(OutboundSignal::RoomSendData(message))
}

fn ensure_connected(session: &SessionContext) -> Result<(), RoomClientError> {
    if session.is_connected() {
        Ok(())
    } else {
        Err(RoomClientError::NotConnected)
    }
}
