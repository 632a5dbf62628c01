//! Room client and session lifecycle.
//!
//! [`RoomClient::connect`] resolves the signaling server, generates a fresh
//! session token, opens the event connection and starts the session tasks:
//!
//! ```text
//! RoomClient (cancel token)
//! └── Session (child token)
//!     ├── transport driver   (owns the socket)
//!     ├── dispatch task      (inbound signals -> DispatchTable)
//!     └── keepalive task     (PING every interval)
//! ```
//!
//! `connect()` returns once the transport is open. The Socket.IO connect and
//! the room join complete asynchronously on the dispatch task.

use crate::config::Config;
use crate::discovery::EndpointResolver;
use crate::dispatch::{run_dispatch, DispatchTable};
use crate::errors::RoomClientError;
use crate::handlers::LifecycleHandlers;
use crate::keepalive::spawn_keepalive;
use crate::observability::metrics;
use crate::room;
use crate::token::SessionToken;
use crate::transport::{ConnectRequest, Connection, Connector, SignalSender, WebSocketConnector};
use common::types::RoomName;
use ring::rand::SystemRandom;
use signaling_protocol::{OutboundSignal, RoomDataMessage, RoomJoinRequest};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// State shared by a session's tasks and its room operations.
#[derive(Debug)]
pub struct SessionContext {
    room_id: RoomName,
    greeting: String,
    sender: SignalSender,
    handlers: LifecycleHandlers,
    connected: AtomicBool,
}

impl SessionContext {
    /// New context; starts out not connected.
    pub fn new(
        room_id: RoomName,
        greeting: String,
        sender: SignalSender,
        handlers: LifecycleHandlers,
    ) -> Self {
        Self {
            room_id,
            greeting,
            sender,
            handlers,
            connected: AtomicBool::new(false),
        }
    }

    pub fn room_id(&self) -> &RoomName {
        &self.room_id
    }

    pub fn greeting(&self) -> &str {
        &self.greeting
    }

    pub fn handlers(&self) -> &LifecycleHandlers {
        &self.handlers
    }

    /// Whether the server has confirmed the Socket.IO connection.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Queue an outbound signal without blocking.
    ///
    /// # Errors
    ///
    /// Returns `RoomClientError::Transport` if the signal cannot be queued.
    pub fn emit(&self, signal: OutboundSignal) -> Result<(), RoomClientError> {
        self.sender.send(signal)
    }
}

/// Client for one room on the signaling service.
///
/// Discovery results are cached across `connect()` calls; every call gets a
/// new token and a new connection. Dropping the client closes every session
/// it started.
pub struct RoomClient {
    config: Config,
    resolver: EndpointResolver,
    connector: Arc<dyn Connector>,
    handlers: LifecycleHandlers,
    rng: SystemRandom,
    secure: bool,
    cancel_token: CancellationToken,
}

impl RoomClient {
    /// Client using the WebSocket transport.
    ///
    /// # Errors
    ///
    /// Returns `RoomClientError::Discovery` if the HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self, RoomClientError> {
        Self::with_connector(config, Arc::new(WebSocketConnector::new()))
    }

    /// Client using a custom connector.
    ///
    /// # Errors
    ///
    /// Returns `RoomClientError::Discovery` if the HTTP client cannot be built.
    pub fn with_connector(
        config: Config,
        connector: Arc<dyn Connector>,
    ) -> Result<Self, RoomClientError> {
        let resolver = EndpointResolver::new(&config)?;

        Ok(Self {
            config,
            resolver,
            connector,
            handlers: LifecycleHandlers::new(),
            rng: SystemRandom::new(),
            secure: true,
            cancel_token: CancellationToken::new(),
        })
    }

    /// Register lifecycle callbacks for subsequent sessions.
    #[must_use]
    pub fn with_handlers(mut self, handlers: LifecycleHandlers) -> Self {
        self.handlers = handlers;
        self
    }

    /// Use `ws://` instead of `wss://` (local servers only).
    #[must_use]
    pub fn insecure(mut self) -> Self {
        self.secure = false;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn resolver(&self) -> &EndpointResolver {
        &self.resolver
    }

    /// Connect to the room.
    ///
    /// # Errors
    ///
    /// - `Discovery` if the signaling server cannot be resolved; no
    ///   connection is attempted
    /// - `TokenGeneration` if the random source fails
    /// - `Connection` if the transport cannot be opened
    #[instrument(skip_all, fields(room_id = %self.config.room_id))]
    pub async fn connect(&self) -> Result<Session, RoomClientError> {
        let result = self.try_connect().await;

        match &result {
            Ok(_) => metrics::record_connect_attempt("success"),
            Err(e) => {
                warn!(target: "rc.session", error = %e, "Connect failed");
                metrics::record_connect_attempt(e.kind());
            }
        }

        result
    }

    async fn try_connect(&self) -> Result<Session, RoomClientError> {
        let endpoint = self.resolver.resolve().await?;
        info!(target: "rc.session", url = %endpoint.url(), "Signaling server is {}", endpoint.domain());

        let token = SessionToken::generate(&self.rng)?;
        let session_token = self.cancel_token.child_token();

        let request = ConnectRequest {
            endpoint,
            api_key: self.config.api_key.clone(),
            token,
            origin: self.config.origin.clone(),
            secure: self.secure,
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
            timeout: self.config.http_timeout(),
        };

        let connection = self
            .connector
            .open(request, session_token.clone())
            .await?;

        Ok(Session::start(
            connection,
            &self.config,
            self.handlers.clone(),
            session_token,
        ))
    }

    /// Cancel every session started by this client.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}

impl Drop for RoomClient {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

/// One connection to a room.
///
/// Dropping a session cancels its tasks; [`Session::disconnect`] also waits
/// for them to finish.
pub struct Session {
    context: Arc<SessionContext>,
    cancel_token: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl Session {
    fn start(
        connection: Connection,
        config: &Config,
        handlers: LifecycleHandlers,
        cancel_token: CancellationToken,
    ) -> Self {
        let Connection {
            sender,
            inbound,
            driver,
        } = connection;

        let context = Arc::new(SessionContext::new(
            config.room_id.clone(),
            config.greeting.clone(),
            sender,
            handlers,
        ));

        let table = DispatchTable::new();
        let dispatch = tokio::spawn(run_dispatch(
            Arc::clone(&context),
            table,
            inbound,
            cancel_token.clone(),
        ));

        let keepalive = spawn_keepalive(
            Arc::clone(&context),
            config.keepalive_interval(),
            cancel_token.clone(),
        );

        debug!(target: "rc.session", room = %config.room_id, "Session started");

        Self {
            context,
            cancel_token,
            tasks: vec![driver, dispatch, keepalive],
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn is_connected(&self) -> bool {
        self.context.is_connected()
    }

    /// Whether the session has ended (disconnect, transport close, or client
    /// shutdown).
    pub fn is_closed(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Wait until the session ends.
    pub async fn closed(&self) {
        self.cancel_token.cancelled().await;
    }

    /// Emit `ROOM_JOIN` on this session.
    ///
    /// # Errors
    ///
    /// See [`room::join`].
    pub fn join(&self, request: RoomJoinRequest) -> Result<(), RoomClientError> {
        room::join(&self.context, request)
    }

    /// Emit `ROOM_SEND_DATA` on this session.
    ///
    /// # Errors
    ///
    /// See [`room::send_data`].
    pub fn send_data(&self, message: RoomDataMessage) -> Result<(), RoomClientError> {
        room::send_data(&self.context, message)
    }

    /// Close the connection and wait for all session tasks to stop.
    pub async fn disconnect(mut self) {
        info!(target: "rc.session", room = %self.context.room_id(), "Disconnecting");
        self.cancel_token.cancel();
        self.context.set_connected(false);

        for task in std::mem::take(&mut self.tasks) {
            if let Err(e) = task.await {
                warn!(target: "rc.session", error = %e, "Session task failed");
            }
        }

        debug!(target: "rc.session", "Session closed");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}
