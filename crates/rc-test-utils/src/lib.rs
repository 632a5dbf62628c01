//! # Room Client Test Utilities
//!
//! Mocks and fixtures for testing the room client without a real signaling
//! service.
//!
//! ## Modules
//!
//! - `mock_connector` - In-memory [`Connector`](room_client::transport::Connector)
//!   that records connection requests and outbound signals
//! - `mock_discovery` - wiremock helpers for the discovery endpoint
//! - `fixtures` - Test configuration and signals
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rc_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let server = wiremock::MockServer::start().await;
//!     mount_discovery(&server, TEST_DOMAIN).await;
//!
//!     let connector = MockConnector::new();
//!     let client = RoomClient::with_connector(test_config(&server), connector.clone()).unwrap();
//!     let session = client.connect().await.unwrap();
//!
//!     let connection = connector.last_connection();
//!     connection.inject(InboundSignal::Connected).await;
//!     let sent = connection.wait_for_sent(1).await;
//! }
//! ```

pub mod fixtures;
pub mod mock_connector;
pub mod mock_discovery;

pub use fixtures::*;
pub use mock_connector::*;
pub use mock_discovery::*;
