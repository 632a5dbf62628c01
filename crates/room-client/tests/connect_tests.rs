//! End-to-end session tests against a mocked discovery endpoint and an
//! in-memory connector.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::secret::ExposeSecret;
use rc_test_utils::*;
use room_client::errors::{DiscoveryError, RoomClientError};
use room_client::handlers::LifecycleHandlers;
use room_client::session::RoomClient;
use signaling_protocol::{InboundSignal, OutboundSignal, RoomDataMessage, RoomJoinRequest};
use wiremock::MockServer;

async fn discovery_server() -> MockServer {
    let server = MockServer::start().await;
    mount_discovery(&server, TEST_DOMAIN).await;
    server
}

// ============================================================================
// Connect
// ============================================================================

#[tokio::test]
async fn test_connect_then_socket_connect_joins_room_once() {
    let server = discovery_server().await;
    let connector = MockConnector::new();
    let client = RoomClient::with_connector(test_config(&server), connector.clone()).unwrap();

    let session = client.connect().await.unwrap();
    assert!(!session.is_connected());

    let connection = connector.last_connection();
    connection.inject(InboundSignal::Connected).await;

    let sent = connection.wait_for_sent(1).await;
    assert_eq!(
        sent,
        vec![OutboundSignal::RoomJoin(RoomJoinRequest::sfu(TEST_ROOM.into()))]
    );
    assert_eq!(
        sent.first().unwrap().to_frame().unwrap(),
        r#"42["ROOM_JOIN",{"roomName":"room1","roomType":"sfu"}]"#
    );
    assert!(session.is_connected());

    // Nothing else goes out without further server events
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(connection.sent().len(), 1);

    session.disconnect().await;
}

#[tokio::test]
async fn test_connect_request_carries_credentials() {
    let server = discovery_server().await;
    let connector = MockConnector::new();
    let client = RoomClient::with_connector(test_config(&server), connector.clone()).unwrap();

    let _session = client.connect().await.unwrap();

    let requests = connector.requests();
    assert_eq!(requests.len(), 1);
    let request = requests.first().unwrap();
    assert_eq!(request.endpoint.domain(), TEST_DOMAIN);
    assert_eq!(request.api_key.expose_secret(), TEST_API_KEY);
    assert!(request.secure);

    let url = request.url().unwrap();
    assert_eq!(url.scheme(), "wss");
    assert_eq!(url.host_str(), Some(TEST_DOMAIN));
    assert_eq!(url.path(), "/socket.io/");

    let params: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    let param = |name: &str| {
        params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    };
    assert_eq!(param("apiKey").as_deref(), Some(TEST_API_KEY));
    assert_eq!(param("token").as_deref(), Some(request.token.expose()));
    assert!(!request.token.expose().is_empty());
    assert_eq!(param("EIO").as_deref(), Some("3"));
    assert_eq!(param("transport").as_deref(), Some("websocket"));
    assert!(param("t").is_some());
}

#[tokio::test]
async fn test_each_connect_uses_a_new_token() {
    let server = discovery_server().await;
    let connector = MockConnector::new();
    let client = RoomClient::with_connector(test_config(&server), connector.clone()).unwrap();

    let first = client.connect().await.unwrap();
    let second = client.connect().await.unwrap();

    let requests = connector.requests();
    assert_eq!(requests.len(), 2);
    assert_ne!(
        requests.first().unwrap().token.expose(),
        requests.last().unwrap().token.expose()
    );

    first.disconnect().await;
    second.disconnect().await;
}

#[tokio::test]
async fn test_discovery_is_cached_across_connects() {
    let server = discovery_server().await;
    let connector = MockConnector::new();
    let client = RoomClient::with_connector(test_config(&server), connector.clone()).unwrap();

    let _first = client.connect().await.unwrap();
    let _second = client.connect().await.unwrap();

    assert_eq!(discovery_requests(&server).await, 1);
    assert_eq!(connector.open_count(), 2);
    assert_eq!(
        client.resolver().cached().map(|e| e.domain().to_string()),
        Some(TEST_DOMAIN.to_string())
    );
}

#[tokio::test]
async fn test_discovery_failure_skips_connection() {
    let server = MockServer::start().await;
    mount_discovery_failure(&server, 500).await;
    let connector = MockConnector::new();
    let client = RoomClient::with_connector(test_config(&server), connector.clone()).unwrap();

    let result = client.connect().await;

    assert!(matches!(
        result,
        Err(RoomClientError::Discovery(DiscoveryError::Status(500)))
    ));
    assert_eq!(connector.open_count(), 0);
}

#[tokio::test]
async fn test_connector_failure_is_reported() {
    let server = discovery_server().await;
    let connector = MockConnector::failing("handshake rejected");
    let client = RoomClient::with_connector(test_config(&server), connector.clone()).unwrap();

    let result = client.connect().await;

    assert!(matches!(result, Err(RoomClientError::Connection(msg)) if msg == "handshake rejected"));
    assert_eq!(connector.open_count(), 1);
}

// ============================================================================
// Room events
// ============================================================================

#[tokio::test]
async fn test_user_join_sends_greeting_once() {
    let server = discovery_server().await;
    let connector = MockConnector::new();
    let joined = Arc::new(AtomicU32::new(0));
    let joined_clone = Arc::clone(&joined);
    let client = RoomClient::with_connector(test_config(&server), connector.clone())
        .unwrap()
        .with_handlers(LifecycleHandlers::new().on_user_joined(move |_| {
            joined_clone.fetch_add(1, Ordering::SeqCst);
        }));

    let session = client.connect().await.unwrap();
    let connection = connector.last_connection();
    connection.inject(InboundSignal::Connected).await;
    connection.wait_for_sent(1).await;

    connection.inject(user_joined("peer-1")).await;

    let sent = connection.wait_for_sent(2).await;
    assert_eq!(
        sent.last(),
        Some(&OutboundSignal::RoomSendData(RoomDataMessage::new(
            TEST_ROOM.into(),
            "from minecraft"
        )))
    );
    assert_eq!(joined.load(Ordering::SeqCst), 1);

    session.disconnect().await;
}

#[tokio::test]
async fn test_room_operations_before_socket_connect_fail() {
    let server = discovery_server().await;
    let connector = MockConnector::new();
    let client = RoomClient::with_connector(test_config(&server), connector.clone()).unwrap();

    let session = client.connect().await.unwrap();

    assert!(matches!(
        session.join(RoomJoinRequest::sfu(TEST_ROOM.into())),
        Err(RoomClientError::NotConnected)
    ));
    assert!(matches!(
        session.send_data(RoomDataMessage::new(TEST_ROOM.into(), "hi")),
        Err(RoomClientError::NotConnected)
    ));
    assert!(connector.last_connection().sent().is_empty());
}

#[tokio::test]
async fn test_unknown_and_log_only_signals_send_nothing() {
    let server = discovery_server().await;
    let connector = MockConnector::new();
    let client = RoomClient::with_connector(test_config(&server), connector.clone()).unwrap();

    let session = client.connect().await.unwrap();
    let connection = connector.last_connection();
    connection.inject(InboundSignal::Connected).await;
    connection.wait_for_sent(1).await;

    connection.inject(unknown_event("SFU_OFFER")).await;
    connection.inject(InboundSignal::Pong).await;
    connection.inject(user_left("peer-1")).await;
    connection
        .inject(InboundSignal::Error {
            details: "oops".to_string(),
        })
        .await;

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(connection.sent().len(), 1);
    assert!(session.is_connected());
}

// ============================================================================
// Teardown
// ============================================================================

#[tokio::test]
async fn test_transport_loss_closes_session() {
    let server = discovery_server().await;
    let connector = MockConnector::new();
    let client = RoomClient::with_connector(test_config(&server), connector.clone()).unwrap();

    let session = client.connect().await.unwrap();
    let connection = connector.last_connection();
    connection.inject(InboundSignal::Connected).await;
    connection.wait_for_sent(1).await;

    connection.close();

    tokio::time::timeout(Duration::from_secs(2), session.closed())
        .await
        .expect("session should close after transport loss");
    assert!(!session.is_connected());

    session.disconnect().await;
    assert!(connection.is_closed());
}

#[tokio::test]
async fn test_disconnect_cancels_connection() {
    let server = discovery_server().await;
    let connector = MockConnector::new();
    let client = RoomClient::with_connector(test_config(&server), connector.clone()).unwrap();

    let session = client.connect().await.unwrap();
    let connection = connector.last_connection();

    session.disconnect().await;

    assert!(connection.is_closed());
}

#[tokio::test]
async fn test_client_shutdown_closes_all_sessions() {
    let server = discovery_server().await;
    let connector = MockConnector::new();
    let client = RoomClient::with_connector(test_config(&server), connector.clone()).unwrap();

    let first = client.connect().await.unwrap();
    let second = client.connect().await.unwrap();

    client.shutdown();

    assert!(first.is_closed());
    assert!(second.is_closed());
}

#[tokio::test]
async fn test_dropping_client_closes_sessions() {
    let server = discovery_server().await;
    let connector = MockConnector::new();
    let client = RoomClient::with_connector(test_config(&server), connector.clone()).unwrap();

    let session = client.connect().await.unwrap();
    let connection = connector.last_connection();

    drop(client);

    assert!(session.is_closed());
    session.disconnect().await;
    assert!(connection.is_closed());
}
