//! Secret types for protecting sensitive values from accidental logging.
//!
//! This module re-exports types from the [`secrecy`] crate. The signaling
//! client holds two secrets: the application API key supplied by the host,
//! and the per-session token generated on every connect. Both travel as
//! connection parameters and must never show up in logs.
//!
//! `SecretString` implements `Debug` with redaction, so any struct that
//! derives `Debug` and holds one gets safe logging behavior for free.
//!
//! # Example
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct Credentials {
//!     room: String,
//!     api_key: SecretString,
//! }
//!
//! let creds = Credentials {
//!     room: "lobby".to_string(),
//!     api_key: SecretString::from("5bea388b-3f95-4e1e-acb5-a34efdd0c480"),
//! };
//!
//! // Safe: the key is redacted
//! let rendered = format!("{creds:?}");
//! assert!(!rendered.contains("5bea388b"));
//!
//! // Reading the value is always explicit
//! let key: &str = creds.api_key.expose_secret();
//! assert!(key.starts_with("5bea"));
//! ```

pub use secrecy::{ExposeSecret, SecretString};
