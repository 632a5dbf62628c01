//! Room client error types.
//!
//! Discovery and connection failures surface from `connect()`. Anything that
//! happens after the connection is up is reported through logs and the
//! lifecycle handlers instead.

use thiserror::Error;

/// Signaling server discovery failed.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Request could not be sent (DNS, TLS, timeout, refused).
    #[error("Discovery request failed: {0}")]
    Request(String),

    /// Dispatcher answered with a non-success status.
    #[error("Discovery returned status {0}")]
    Status(u16),

    /// Response body was empty or unreadable.
    #[error("Discovery response body is empty")]
    EmptyBody,

    /// Response body was not the expected JSON document.
    #[error("Invalid discovery response: {0}")]
    InvalidBody(String),

    /// Response JSON had no usable `domain`.
    #[error("Discovery response has no domain")]
    MissingDomain,

    /// HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

/// Room client error type.
#[derive(Debug, Error)]
pub enum RoomClientError {
    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    /// Event connection could not be opened.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Room operation attempted without a connected session.
    #[error("Not connected")]
    NotConnected,

    /// Outbound signal could not be queued.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Secure random generator failed.
    #[error("Session token generation failed")]
    TokenGeneration,
}

impl RoomClientError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RoomClientError::Discovery(_) => "discovery",
            RoomClientError::Connection(_) => "connection",
            RoomClientError::NotConnected => "not_connected",
            RoomClientError::Transport(_) => "transport",
            RoomClientError::TokenGeneration => "token",
        }
    }
}
