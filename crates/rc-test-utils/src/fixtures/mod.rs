//! Test configuration and signal fixtures.

use common::secret::SecretString;
use common::types::PeerId;
use room_client::config::Config;
use signaling_protocol::InboundSignal;
use wiremock::MockServer;

use crate::mock_discovery::discovery_url;

/// API key used by test configurations.
pub const TEST_API_KEY: &str = "abc";

/// Room joined by test configurations.
pub const TEST_ROOM: &str = "room1";

/// Domain returned by the mocked discovery endpoint.
pub const TEST_DOMAIN: &str = "sig.example.com";

/// Configuration pointing discovery at `server`.
#[must_use]
pub fn test_config(server: &MockServer) -> Config {
    Config::new(SecretString::from(TEST_API_KEY), TEST_ROOM)
        .with_discovery_url(discovery_url(server))
}

/// `ROOM_USER_JOIN` from `peer`.
#[must_use]
pub fn user_joined(peer: &str) -> InboundSignal {
    InboundSignal::RoomUserJoined {
        peer_id: PeerId::new(peer),
    }
}

/// `ROOM_USER_LEAVE` from `peer`.
#[must_use]
pub fn user_left(peer: &str) -> InboundSignal {
    InboundSignal::RoomUserLeft {
        peer_id: PeerId::new(peer),
    }
}

/// An event the room client has no handler for.
#[must_use]
pub fn unknown_event(name: &str) -> InboundSignal {
    InboundSignal::Custom {
        event: name.to_string(),
        args: vec![serde_json::json!({"src": "peer-9"})],
    }
}
