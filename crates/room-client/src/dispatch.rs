//! Inbound signal dispatch.
//!
//! The table is fixed when a session starts. Signals without an entry are
//! ignored.

use crate::observability::metrics;
use crate::room;
use crate::session::SessionContext;
use signaling_protocol::{InboundSignal, RoomDataMessage, RoomJoinRequest, SignalKind};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Handler for one signal kind.
pub type SignalHandler = fn(&SessionContext, &InboundSignal);

/// Maps signal kinds to handlers.
pub struct DispatchTable {
    handlers: HashMap<SignalKind, SignalHandler>,
}

impl DispatchTable {
    /// The room client's table.
    pub fn new() -> Self {
        let mut handlers: HashMap<SignalKind, SignalHandler> = HashMap::new();
        handlers.insert(SignalKind::Connect, on_connect);
        handlers.insert(SignalKind::Error, on_error);
        handlers.insert(SignalKind::Disconnect, on_disconnect);
        handlers.insert(SignalKind::Message, log_signal);
        handlers.insert(SignalKind::Ping, log_signal);
        handlers.insert(SignalKind::Pong, log_signal);
        handlers.insert(SignalKind::Reconnecting, log_signal);
        handlers.insert(SignalKind::Connecting, log_signal);
        handlers.insert(SignalKind::RoomUserJoin, on_user_join);
        handlers.insert(SignalKind::RoomUserLeave, on_user_leave);
        Self { handlers }
    }

    pub fn handles(&self, kind: SignalKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Run the handler registered for `signal`, if any.
    pub fn dispatch(&self, ctx: &SessionContext, signal: &InboundSignal) {
        let kind = signal.kind();
        metrics::record_signal_received(kind);

        match self.handlers.get(&kind) {
            Some(handler) => handler(ctx, signal),
            None => trace!(target: "rc.session", kind = %kind, "Ignoring unhandled signal"),
        }
    }
}

impl Default for DispatchTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Drain `inbound` through `table` until cancelled or the connection closes.
///
/// A closed inbound stream means the transport is gone, so the session token
/// is cancelled to stop its other tasks.
pub async fn run_dispatch(
    ctx: Arc<SessionContext>,
    table: DispatchTable,
    mut inbound: mpsc::Receiver<InboundSignal>,
    cancel_token: CancellationToken,
) {
    loop {
        tokio::select! {
            () = cancel_token.cancelled() => {
                debug!(target: "rc.session", "Dispatch task cancelled");
                break;
            }
            signal = inbound.recv() => {
                let Some(signal) = signal else {
                    info!(target: "rc.session", "Connection closed, ending session");
                    ctx.set_connected(false);
                    cancel_token.cancel();
                    break;
                };
                table.dispatch(&ctx, &signal);
            }
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

fn on_connect(ctx: &SessionContext, _signal: &InboundSignal) {
    info!(target: "rc.session", room = %ctx.room_id(), "Connected to signaling server");
    ctx.set_connected(true);

    let request = RoomJoinRequest::sfu(ctx.room_id().clone());
    if let Err(e) = room::join(ctx, request) {
        warn!(target: "rc.session", error = %e, "Failed to send room join");
    }

    ctx.handlers().connected();
}

fn on_error(_ctx: &SessionContext, signal: &InboundSignal) {
    if let InboundSignal::Error { details } = signal {
        warn!(target: "rc.session", details = %details, "Signaling error");
    }
}

fn on_disconnect(ctx: &SessionContext, signal: &InboundSignal) {
    ctx.set_connected(false);
    if let InboundSignal::Disconnected { reason } = signal {
        info!(target: "rc.session", reason = %reason, "Disconnected from signaling server");
    }
}

fn log_signal(_ctx: &SessionContext, signal: &InboundSignal) {
    match signal {
        InboundSignal::Message { payload } => {
            debug!(target: "rc.session", payload = %payload, "Message");
        }
        InboundSignal::Reconnecting { attempt } => {
            debug!(target: "rc.session", attempt = attempt, "Reconnecting");
        }
        other => debug!(target: "rc.session", kind = %other.kind(), "Signal"),
    }
}

fn on_user_join(ctx: &SessionContext, signal: &InboundSignal) {
    let InboundSignal::RoomUserJoined { peer_id } = signal else {
        return;
    };
    info!(target: "rc.session", peer_id = %peer_id, "Participant joined room");

    let message = RoomDataMessage::new(ctx.room_id().clone(), ctx.greeting());
    if let Err(e) = room::send_data(ctx, message) {
        warn!(target: "rc.session", error = %e, "Failed to send room data");
    }

    ctx.handlers().user_joined(peer_id);
}

fn on_user_leave(ctx: &SessionContext, signal: &InboundSignal) {
    let InboundSignal::RoomUserLeft { peer_id } = signal else {
        return;
    };
    info!(target: "rc.session", peer_id = %peer_id, "Participant left room");
    ctx.handlers().user_left(peer_id);
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::handlers::LifecycleHandlers;
    use crate::transport::SignalSender;
    use common::types::{PeerId, RoomName};
    use serde_json::json;
    use signaling_protocol::{OutboundSignal, RoomType};
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Fixture {
        ctx: SessionContext,
        outbound: mpsc::Receiver<OutboundSignal>,
        connected_calls: Arc<AtomicU32>,
        joined_calls: Arc<AtomicU32>,
        left_calls: Arc<AtomicU32>,
    }

    fn fixture() -> Fixture {
        let (tx, outbound) = mpsc::channel(16);
        let connected_calls = Arc::new(AtomicU32::new(0));
        let joined_calls = Arc::new(AtomicU32::new(0));
        let left_calls = Arc::new(AtomicU32::new(0));

        let c = Arc::clone(&connected_calls);
        let j = Arc::clone(&joined_calls);
        let l = Arc::clone(&left_calls);
        let handlers = LifecycleHandlers::new()
            .on_connected(move || {
                c.fetch_add(1, Ordering::SeqCst);
            })
            .on_user_joined(move |_| {
                j.fetch_add(1, Ordering::SeqCst);
            })
            .on_user_left(move |_| {
                l.fetch_add(1, Ordering::SeqCst);
            });

        let ctx = SessionContext::new(
            RoomName::new("room1"),
            "from minecraft".to_string(),
            SignalSender::new(tx),
            handlers,
        );

        Fixture {
            ctx,
            outbound,
            connected_calls,
            joined_calls,
            left_calls,
        }
    }

    fn drain(rx: &mut mpsc::Receiver<OutboundSignal>) -> Vec<OutboundSignal> {
        let mut out = Vec::new();
        while let Ok(signal) = rx.try_recv() {
            out.push(signal);
        }
        out
    }

    #[test]
    fn test_table_covers_lifecycle_signals() {
        let table = DispatchTable::new();
        for kind in [
            SignalKind::Connect,
            SignalKind::Error,
            SignalKind::Disconnect,
            SignalKind::Message,
            SignalKind::Ping,
            SignalKind::Pong,
            SignalKind::Reconnecting,
            SignalKind::Connecting,
            SignalKind::RoomUserJoin,
            SignalKind::RoomUserLeave,
        ] {
            assert!(table.handles(kind), "{kind} should be handled");
        }
        assert!(!table.handles(SignalKind::Custom));
    }

    #[test]
    fn test_connect_joins_room_once() {
        let mut f = fixture();
        let table = DispatchTable::new();

        table.dispatch(&f.ctx, &InboundSignal::Connected);

        assert!(f.ctx.is_connected());
        let sent = drain(&mut f.outbound);
        assert_eq!(sent.len(), 1);
        let Some(OutboundSignal::RoomJoin(request)) = sent.first() else {
            unreachable!("expected ROOM_JOIN, got {sent:?}");
        };
        assert_eq!(request.room_name.as_str(), "room1");
        assert_eq!(request.room_type, RoomType::Sfu);
        assert_eq!(f.connected_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_user_join_sends_data_once() {
        let mut f = fixture();
        let table = DispatchTable::new();
        f.ctx.set_connected(true);

        table.dispatch(
            &f.ctx,
            &InboundSignal::RoomUserJoined {
                peer_id: PeerId::new("peer-1"),
            },
        );

        assert_eq!(
            drain(&mut f.outbound),
            vec![OutboundSignal::RoomSendData(RoomDataMessage::new(
                RoomName::new("room1"),
                "from minecraft"
            ))]
        );
        assert_eq!(f.joined_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_user_leave_invokes_handler_only() {
        let mut f = fixture();
        let table = DispatchTable::new();
        f.ctx.set_connected(true);

        table.dispatch(
            &f.ctx,
            &InboundSignal::RoomUserLeft {
                peer_id: PeerId::new("peer-1"),
            },
        );

        assert!(drain(&mut f.outbound).is_empty());
        assert_eq!(f.left_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_disconnect_marks_not_connected() {
        let f = fixture();
        let table = DispatchTable::new();
        f.ctx.set_connected(true);

        table.dispatch(
            &f.ctx,
            &InboundSignal::Disconnected {
                reason: "io server disconnect".to_string(),
            },
        );

        assert!(!f.ctx.is_connected());
    }

    #[test]
    fn test_error_keeps_connection() {
        let mut f = fixture();
        let table = DispatchTable::new();
        f.ctx.set_connected(true);

        table.dispatch(
            &f.ctx,
            &InboundSignal::Error {
                details: "bad".to_string(),
            },
        );

        assert!(f.ctx.is_connected());
        assert!(drain(&mut f.outbound).is_empty());
    }

    #[test]
    fn test_log_only_and_unknown_signals_emit_nothing() {
        let mut f = fixture();
        let table = DispatchTable::new();
        f.ctx.set_connected(true);

        for signal in [
            InboundSignal::Connecting,
            InboundSignal::Reconnecting { attempt: 2 },
            InboundSignal::Ping,
            InboundSignal::Pong,
            InboundSignal::Message {
                payload: json!("hello"),
            },
            InboundSignal::Custom {
                event: "SFU_OFFER".to_string(),
                args: vec![json!({})],
            },
        ] {
            table.dispatch(&f.ctx, &signal);
        }

        assert!(drain(&mut f.outbound).is_empty());
        assert_eq!(f.connected_calls.load(Ordering::SeqCst), 0);
        assert_eq!(f.joined_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_closed_inbound_cancels_session() {
        let f = fixture();
        let ctx = Arc::new(f.ctx);
        ctx.set_connected(true);
        let token = CancellationToken::new();
        let (tx, rx) = mpsc::channel(4);

        tx.send(InboundSignal::Pong).await.unwrap();
        drop(tx);

        run_dispatch(Arc::clone(&ctx), DispatchTable::new(), rx, token.clone()).await;

        assert!(token.is_cancelled());
        assert!(!ctx.is_connected());
    }
}
