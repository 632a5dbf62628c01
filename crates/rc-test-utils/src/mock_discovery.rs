//! wiremock helpers for the signaling discovery endpoint.

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path served by the mocked discovery endpoint.
pub const DISCOVERY_PATH: &str = "/signaling";

/// Discovery URL for `server`.
#[must_use]
pub fn discovery_url(server: &MockServer) -> String {
    format!("{}{DISCOVERY_PATH}", server.uri())
}

/// Respond to discovery with `{"domain": domain}`.
pub async fn mount_discovery(server: &MockServer, domain: &str) {
    Mock::given(method("GET"))
        .and(path(DISCOVERY_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "domain": domain })),
        )
        .mount(server)
        .await;
}

/// Respond to discovery with `status` and no body.
pub async fn mount_discovery_failure(server: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .and(path(DISCOVERY_PATH))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Number of discovery requests `server` has received.
pub async fn discovery_requests(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == DISCOVERY_PATH)
        .count()
}
