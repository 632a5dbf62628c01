//! In-memory connector for session tests.
//!
//! Every `open()` records the [`ConnectRequest`] and hands back a connection
//! whose outbound queue and inbound stream are held by a [`MockConnection`].
//! Tests inject server signals and read what the client sent.
//!
//! ```rust,ignore
//! let connector = MockConnector::new();
//! let client = RoomClient::with_connector(config, connector.clone()).unwrap();
//! let _session = client.connect().await.unwrap();
//!
//! let connection = connector.last_connection();
//! connection.inject(InboundSignal::Connected).await;
//! assert_eq!(connection.wait_for_sent(1).await.len(), 1);
//! ```

use async_trait::async_trait;
use room_client::errors::RoomClientError;
use room_client::transport::{
    ConnectRequest, Connection, Connector, SignalSender, INBOUND_QUEUE_CAPACITY,
    OUTBOUND_QUEUE_CAPACITY,
};
use signaling_protocol::{InboundSignal, OutboundSignal};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// How long [`MockConnection::wait_for_sent`] waits before failing.
pub const SENT_WAIT_TIMEOUT: Duration = Duration::from_secs(2);

/// Connector that never touches the network.
#[derive(Debug, Default)]
pub struct MockConnector {
    requests: Mutex<Vec<ConnectRequest>>,
    connections: Mutex<Vec<MockConnection>>,
    failure: Mutex<Option<String>>,
}

impl MockConnector {
    /// Connector that accepts every `open()`.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Connector whose `open()` fails with `RoomClientError::Connection`.
    #[must_use]
    pub fn failing(message: &str) -> Arc<Self> {
        let connector = Self::default();
        *connector.failure.lock().unwrap() = Some(message.to_string());
        Arc::new(connector)
    }

    /// Requests passed to `open()`, oldest first.
    pub fn requests(&self) -> Vec<ConnectRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of `open()` calls, successful or not.
    pub fn open_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Most recently opened connection.
    ///
    /// # Panics
    ///
    /// Panics if no connection has been opened.
    pub fn last_connection(&self) -> MockConnection {
        self.connections
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no connection opened")
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn open(
        &self,
        request: ConnectRequest,
        cancel: CancellationToken,
    ) -> Result<Connection, RoomClientError> {
        self.requests.lock().unwrap().push(request);

        if let Some(message) = self.failure.lock().unwrap().clone() {
            return Err(RoomClientError::Connection(message));
        }

        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_QUEUE_CAPACITY);

        let connection = MockConnection {
            inbound: Arc::new(Mutex::new(Some(inbound_tx))),
            outbound: Arc::new(Mutex::new(outbound_rx)),
            sent: Arc::new(Mutex::new(Vec::new())),
            closed: Arc::new(AtomicBool::new(false)),
        };
        self.connections.lock().unwrap().push(connection.clone());

        let closed = Arc::clone(&connection.closed);
        let driver = tokio::spawn(async move {
            cancel.cancelled().await;
            closed.store(true, Ordering::SeqCst);
        });

        Ok(Connection {
            sender: SignalSender::new(outbound_tx),
            inbound: inbound_rx,
            driver,
        })
    }
}

/// Server side of a mocked connection.
#[derive(Debug, Clone)]
pub struct MockConnection {
    inbound: Arc<Mutex<Option<mpsc::Sender<InboundSignal>>>>,
    outbound: Arc<Mutex<mpsc::Receiver<OutboundSignal>>>,
    sent: Arc<Mutex<Vec<OutboundSignal>>>,
    closed: Arc<AtomicBool>,
}

impl MockConnection {
    /// Deliver a signal to the session.
    ///
    /// # Panics
    ///
    /// Panics if the connection was closed or the session stopped reading.
    pub async fn inject(&self, signal: InboundSignal) {
        let sender = self
            .inbound
            .lock()
            .unwrap()
            .clone()
            .expect("connection closed by test");
        sender
            .send(signal)
            .await
            .expect("session stopped reading signals");
    }

    /// Close the inbound stream, as a transport loss would.
    pub fn close(&self) {
        self.inbound.lock().unwrap().take();
    }

    /// Every signal the client has queued so far, oldest first.
    pub fn sent(&self) -> Vec<OutboundSignal> {
        let mut outbound = self.outbound.lock().unwrap();
        let mut sent = self.sent.lock().unwrap();
        while let Ok(signal) = outbound.try_recv() {
            sent.push(signal);
        }
        sent.clone()
    }

    /// Wait until at least `count` signals have been sent.
    ///
    /// Uses real time; do not call from paused-clock tests.
    ///
    /// # Panics
    ///
    /// Panics after [`SENT_WAIT_TIMEOUT`].
    pub async fn wait_for_sent(&self, count: usize) -> Vec<OutboundSignal> {
        tokio::time::timeout(SENT_WAIT_TIMEOUT, async {
            loop {
                let sent = self.sent();
                if sent.len() >= count {
                    return sent;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("expected {count} sent signals, got {:?}", self.sent()))
    }

    /// Whether the session cancelled this connection.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
