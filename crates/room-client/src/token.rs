//! Per-session authentication token.
//!
//! A fresh token is generated for every `connect()` and sent as the `token`
//! connection parameter. The value comes from the system CSPRNG and is
//! lowercase hex.

use crate::errors::RoomClientError;
use common::secret::{ExposeSecret, SecretString};
use ring::rand::SecureRandom;
use tracing::error;

/// Random bytes per token (32 hex characters).
pub const SESSION_TOKEN_BYTES: usize = 16;

/// Session token, redacted in Debug output.
#[derive(Debug, Clone)]
pub struct SessionToken(SecretString);

impl SessionToken {
    /// Generate a token from the given random source.
    ///
    /// # Errors
    ///
    /// Returns `RoomClientError::TokenGeneration` if the random source fails.
    pub fn generate(rng: &dyn SecureRandom) -> Result<Self, RoomClientError> {
        let mut bytes = [0u8; SESSION_TOKEN_BYTES];
        rng.fill(&mut bytes).map_err(|_| {
            error!(target: "rc.session", "Secure random generator failed");
            RoomClientError::TokenGeneration
        })?;

        Ok(Self(SecretString::from(hex::encode(bytes))))
    }

    /// Token value for the connection query.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl From<SessionToken> for SecretString {
    fn from(token: SessionToken) -> Self {
        token.0
    }
}
