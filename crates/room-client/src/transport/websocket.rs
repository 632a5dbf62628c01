//! Socket.IO over WebSocket, on `tokio-tungstenite`.
//!
//! Engine.IO heartbeats are driven by the client: after the open packet the
//! driver sends a ping every `pingInterval` and expects the server's pong.
//! A server silent for longer than `pingInterval + pingTimeout` is treated
//! as gone and the driver stops with `ping timeout`.

use super::{
    ConnectRequest, Connection, Connector, SignalSender, INBOUND_QUEUE_CAPACITY,
    OUTBOUND_QUEUE_CAPACITY,
};
use crate::errors::RoomClientError;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use signaling_protocol::codec::{decode_packet, SocketPacketType};
use signaling_protocol::{EnginePacket, InboundSignal, OutboundSignal};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::ORIGIN;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};

/// Opens Socket.IO connections over WebSocket.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

impl WebSocketConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    #[instrument(skip_all, fields(domain = %request.endpoint.domain(), secure = request.secure))]
    async fn open(
        &self,
        request: ConnectRequest,
        cancel: CancellationToken,
    ) -> Result<Connection, RoomClientError> {
        let url = request.url()?;

        let mut ws_request = url.as_str().into_client_request().map_err(|e| {
            RoomClientError::Connection(format!("Invalid WebSocket request: {e}"))
        })?;
        let origin = HeaderValue::from_str(&request.origin)
            .map_err(|e| RoomClientError::Connection(format!("Invalid origin header: {e}")))?;
        ws_request.headers_mut().insert(ORIGIN, origin);

        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_QUEUE_CAPACITY);
        // Fresh channel, cannot be full
        let _ = inbound_tx.try_send(InboundSignal::Connecting);

        debug!(target: "rc.transport", "Opening WebSocket");
        let upgrade = tokio::time::timeout(request.timeout, connect_async(ws_request));
        let (stream, response) = tokio::select! {
            () = cancel.cancelled() => {
                debug!(target: "rc.transport", "WebSocket connect cancelled");
                return Err(RoomClientError::Connection("connect cancelled".to_string()));
            }
            result = upgrade => match result {
                Ok(Ok(connected)) => connected,
                Ok(Err(e)) => {
                    warn!(target: "rc.transport", error = %e, "WebSocket connect failed");
                    return Err(RoomClientError::Connection(format!("WebSocket connect failed: {e}")));
                }
                Err(_) => {
                    warn!(target: "rc.transport", timeout = ?request.timeout, "WebSocket connect timed out");
                    return Err(RoomClientError::Connection(format!(
                        "WebSocket connect timed out after {:?}",
                        request.timeout
                    )));
                }
            },
        };
        info!(
            target: "rc.transport",
            status = response.status().as_u16(),
            "WebSocket connected"
        );

        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
        let driver = tokio::spawn(run_driver(stream, outbound_rx, inbound_tx, cancel));

        Ok(Connection {
            sender: SignalSender::new(outbound_tx),
            inbound: inbound_rx,
            driver,
        })
    }
}

/// What the driver does after handling one frame.
#[derive(Debug, PartialEq)]
enum FrameAction {
    Continue,
    /// Server handshake; start client heartbeats.
    StartHeartbeat { interval: Duration, timeout: Duration },
    /// Answer the server with this packet.
    Reply(EnginePacket),
    /// Stop the driver.
    Stop(String),
}

/// Socket driver: pumps outbound signals onto the socket and decoded frames
/// into `inbound` until cancelled or closed.
async fn run_driver<S>(
    stream: WebSocketStream<S>,
    mut outbound: mpsc::Receiver<OutboundSignal>,
    inbound: mpsc::Sender<InboundSignal>,
    cancel: CancellationToken,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    let (mut ws_tx, mut ws_rx) = stream.split();
    let mut heartbeat: Option<Heartbeat> = None;

    let reason = loop {
        tokio::select! {
            () = cancel.cancelled() => {
                let _ = ws_tx.send(Message::Close(None)).await;
                break "client disconnect".to_string();
            }
            signal = outbound.recv() => {
                let Some(signal) = signal else {
                    let _ = ws_tx.send(Message::Close(None)).await;
                    break "client disconnect".to_string();
                };
                match signal.to_frame() {
                    Ok(frame) => {
                        trace!(target: "rc.transport", event = signal.event_name(), "Sending event");
                        if let Err(e) = ws_tx.send(Message::text(frame)).await {
                            warn!(target: "rc.transport", error = %e, "WebSocket send failed");
                            break format!("send failed: {e}");
                        }
                    }
                    Err(e) => {
                        warn!(target: "rc.transport", error = %e, event = signal.event_name(), "Failed to encode signal");
                    }
                }
            }
            () = next_heartbeat(&mut heartbeat) => {
                if heartbeat.as_ref().is_some_and(Heartbeat::expired) {
                    warn!(target: "rc.transport", "No response from server within ping timeout");
                    break "ping timeout".to_string();
                }
                if let Err(e) = ws_tx.send(Message::text(EnginePacket::Ping(None).encode())).await {
                    warn!(target: "rc.transport", error = %e, "Heartbeat send failed");
                    break format!("send failed: {e}");
                }
                if !emit(&inbound, InboundSignal::Ping).await {
                    break "session closed".to_string();
                }
            }
            frame = ws_rx.next() => {
                if let (Some(heartbeat), Some(Ok(_))) = (heartbeat.as_mut(), &frame) {
                    heartbeat.saw_frame();
                }
                let action = match frame {
                    Some(Ok(Message::Text(text))) => handle_frame(text.as_str(), &inbound).await,
                    Some(Ok(Message::Close(close))) => FrameAction::Stop(
                        close.map_or_else(|| "transport close".to_string(), |c| c.reason.to_string()),
                    ),
                    // WebSocket-level ping/pong is answered by tungstenite
                    Some(Ok(_)) => FrameAction::Continue,
                    Some(Err(e)) => {
                        warn!(target: "rc.transport", error = %e, "WebSocket read failed");
                        let _ = emit(&inbound, InboundSignal::Error { details: e.to_string() }).await;
                        FrameAction::Stop("transport error".to_string())
                    }
                    None => FrameAction::Stop("transport close".to_string()),
                };

                match action {
                    FrameAction::Continue => {}
                    FrameAction::StartHeartbeat { interval, timeout } => {
                        heartbeat = Some(Heartbeat::new(interval, timeout));
                    }
                    FrameAction::Reply(packet) => {
                        if let Err(e) = ws_tx.send(Message::text(packet.encode())).await {
                            break format!("send failed: {e}");
                        }
                    }
                    FrameAction::Stop(reason) => break reason,
                }
            }
        }
    };

    info!(target: "rc.transport", reason = %reason, "WebSocket driver stopped");
    // The session may already be gone; never wait on it here
    let _ = inbound.try_send(InboundSignal::Disconnected { reason });
}

/// Client heartbeat schedule and server liveness.
struct Heartbeat {
    ticker: Interval,
    /// Longest the server may stay silent.
    deadline: Duration,
    last_seen: Instant,
}

impl Heartbeat {
    fn new(interval: Duration, timeout: Duration) -> Self {
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self {
            ticker,
            deadline: interval + timeout,
            last_seen: Instant::now(),
        }
    }

    /// Any frame from the server counts as a sign of life.
    fn saw_frame(&mut self) {
        self.last_seen = Instant::now();
    }

    fn expired(&self) -> bool {
        self.last_seen.elapsed() > self.deadline
    }
}

async fn next_heartbeat(heartbeat: &mut Option<Heartbeat>) {
    match heartbeat {
        Some(heartbeat) => {
            heartbeat.ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// Deliver a signal; false once the session has dropped its receiver.
async fn emit(inbound: &mpsc::Sender<InboundSignal>, signal: InboundSignal) -> bool {
    inbound.send(signal).await.is_ok()
}

/// Decode one Engine.IO frame and forward what it carries.
async fn handle_frame(text: &str, inbound: &mpsc::Sender<InboundSignal>) -> FrameAction {
    let packet = match EnginePacket::decode(text) {
        Ok(packet) => packet,
        Err(e) => {
            warn!(target: "rc.transport", error = %e, "Dropping malformed frame");
            return FrameAction::Continue;
        }
    };

    let (signal, action) = match packet {
        EnginePacket::Open(handshake) => {
            debug!(
                target: "rc.transport",
                ping_interval_ms = handshake.ping_interval_ms,
                ping_timeout_ms = handshake.ping_timeout_ms,
                "Engine.IO session opened"
            );
            let interval = handshake.ping_interval();
            if interval.is_zero() {
                warn!(target: "rc.transport", "Server sent a zero ping interval, heartbeats disabled");
                (None, FrameAction::Continue)
            } else {
                let timeout = handshake.ping_timeout();
                (None, FrameAction::StartHeartbeat { interval, timeout })
            }
        }
        EnginePacket::Ping(payload) => (None, FrameAction::Reply(EnginePacket::Pong(payload))),
        EnginePacket::Pong(_) => (Some(InboundSignal::Pong), FrameAction::Continue),
        EnginePacket::Close => (None, FrameAction::Stop("transport close".to_string())),
        EnginePacket::Message(body) => return handle_message(&body, inbound).await,
        EnginePacket::Upgrade | EnginePacket::Noop => (None, FrameAction::Continue),
    };

    if let Some(signal) = signal {
        if !emit(inbound, signal).await {
            return FrameAction::Stop("session closed".to_string());
        }
    }
    action
}

/// Handle the Socket.IO packet inside an Engine.IO message.
async fn handle_message(body: &str, inbound: &mpsc::Sender<InboundSignal>) -> FrameAction {
    let packet = match decode_packet(body) {
        Ok(packet) => packet,
        Err(e) => {
            warn!(target: "rc.transport", error = %e, "Dropping malformed Socket.IO packet");
            return FrameAction::Continue;
        }
    };

    if !packet.is_default_namespace() {
        trace!(target: "rc.transport", namespace = %packet.namespace, "Ignoring packet for other namespace");
        return FrameAction::Continue;
    }

    let signal = match packet.packet_type {
        SocketPacketType::Connect => InboundSignal::Connected,
        // Reported as Disconnected by the driver on exit
        SocketPacketType::Disconnect => {
            return FrameAction::Stop("io server disconnect".to_string());
        }
        SocketPacketType::Error => InboundSignal::Error {
            details: match packet.data {
                Some(Value::String(details)) => details,
                Some(other) => other.to_string(),
                None => String::new(),
            },
        },
        SocketPacketType::Event => match packet.as_event() {
            Some((name, args)) => InboundSignal::from_event(name, args),
            None => {
                warn!(target: "rc.transport", "Dropping event without a name");
                return FrameAction::Continue;
            }
        },
        SocketPacketType::Ack | SocketPacketType::BinaryEvent | SocketPacketType::BinaryAck => {
            trace!(target: "rc.transport", "Ignoring ack packet");
            return FrameAction::Continue;
        }
    };

    if emit(inbound, signal).await {
        FrameAction::Continue
    } else {
        FrameAction::Stop("session closed".to_string())
    }
}
