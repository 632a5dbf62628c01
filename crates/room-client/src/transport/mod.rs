//! Event connection to the signaling server.
//!
//! A [`Connector`] opens one connection per session and hands back a
//! [`Connection`]: an outbound [`SignalSender`], the inbound signal stream,
//! and the driver task that owns the socket. The driver stops when the
//! session's cancellation token fires or the server closes the connection,
//! and closes the inbound stream on exit.

pub mod websocket;

use crate::discovery::SignalingEndpoint;
use crate::errors::RoomClientError;
use crate::observability::metrics;
use crate::token::SessionToken;
use async_trait::async_trait;
use common::secret::{ExposeSecret, SecretString};
use reqwest::Url;
use signaling_protocol::{InboundSignal, OutboundSignal};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

pub use websocket::WebSocketConnector;

/// Outbound queue depth per connection.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 64;

/// Inbound queue depth per connection.
pub const INBOUND_QUEUE_CAPACITY: usize = 64;

/// Engine.IO protocol revision spoken by the signaling server.
pub const ENGINE_IO_VERSION: &str = "3";

/// Parameters for opening the event connection.
#[derive(Debug, Clone)]
pub struct ConnectRequest {
    pub endpoint: SignalingEndpoint,
    pub api_key: SecretString,
    pub token: SessionToken,
    /// `Origin` header for the upgrade request.
    pub origin: String,
    /// `wss` when true, `ws` otherwise.
    pub secure: bool,
    /// Unix millis for the `t` query parameter.
    pub timestamp_ms: i64,
    /// Upper bound on the WebSocket upgrade.
    pub timeout: Duration,
}

impl ConnectRequest {
    /// Socket.IO WebSocket URL with authentication and transport parameters.
    ///
    /// The result embeds the API key and token; never log it.
    ///
    /// # Errors
    ///
    /// Returns `RoomClientError::Connection` if the domain does not form a
    /// valid URL.
    pub fn url(&self) -> Result<Url, RoomClientError> {
        let scheme = if self.secure { "wss" } else { "ws" };
        let base = format!("{scheme}://{}/socket.io/", self.endpoint.domain());
        let timestamp = self.timestamp_ms.to_string();

        Url::parse_with_params(
            &base,
            &[
                ("apiKey", self.api_key.expose_secret()),
                ("token", self.token.expose()),
                ("EIO", ENGINE_IO_VERSION),
                ("transport", "websocket"),
                ("t", timestamp.as_str()),
            ],
        )
        .map_err(|e| RoomClientError::Connection(format!("Invalid signaling URL: {e}")))
    }
}

/// Handle for queueing outbound signals onto a connection.
///
/// Sending never blocks: a full queue is reported as an error instead.
#[derive(Debug, Clone)]
pub struct SignalSender {
    tx: mpsc::Sender<OutboundSignal>,
}

impl SignalSender {
    pub fn new(tx: mpsc::Sender<OutboundSignal>) -> Self {
        Self { tx }
    }

    /// Queue a signal for the driver.
    ///
    /// # Errors
    ///
    /// Returns `RoomClientError::Transport` if the queue is full or the
    /// connection is gone.
    pub fn send(&self, signal: OutboundSignal) -> Result<(), RoomClientError> {
        let event = signal.event_name();
        match self.tx.try_send(signal) {
            Ok(()) => {
                metrics::record_signal_sent(event);
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                warn!(target: "rc.transport", event = event, "Outbound queue full, signal dropped");
                Err(RoomClientError::Transport("outbound queue full".to_string()))
            }
            Err(TrySendError::Closed(_)) => {
                Err(RoomClientError::Transport("connection closed".to_string()))
            }
        }
    }

    /// Whether the driver has stopped accepting signals.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// An open event connection.
pub struct Connection {
    pub sender: SignalSender,
    pub inbound: mpsc::Receiver<InboundSignal>,
    /// Task owning the socket.
    pub driver: JoinHandle<()>,
}

/// Opens event connections.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a new connection; never reuses an earlier one.
    ///
    /// The driver must stop when `cancel` fires.
    async fn open(
        &self,
        request: ConnectRequest,
        cancel: CancellationToken,
    ) -> Result<Connection, RoomClientError>;
}
