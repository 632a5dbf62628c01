//! Room Client Library
//!
//! Connects an application to a room on a hosted real-time signaling
//! service:
//!
//! - Resolves the signaling server through the HTTP discovery endpoint
//! - Opens a Socket.IO event connection authenticated with an API key and a
//!   fresh random session token
//! - Joins the configured room once the server confirms the connection
//! - Greets every participant who joins afterwards
//! - Sends an application-level `PING` on a fixed interval
//!
//! # Architecture
//!
//! ```text
//! RoomClient
//! ├── EndpointResolver     (discovery, cached per client)
//! ├── Connector            (WebSocket transport, swappable in tests)
//! └── Session              (one per connect())
//!     ├── driver task      (Engine.IO framing and heartbeat)
//!     ├── dispatch task    (InboundSignal -> DispatchTable)
//!     └── keepalive task
//! ```
//!
//! # Modules
//!
//! - [`config`] - Configuration from environment
//! - [`discovery`] - Signaling server discovery
//! - [`session`] - Client and session lifecycle
//! - [`room`] - Room join and data operations
//! - [`transport`] - Event connection

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod discovery;
pub mod dispatch;
pub mod errors;
pub mod handlers;
pub mod keepalive;
pub mod observability;
pub mod room;
pub mod session;
pub mod token;
pub mod transport;

pub use config::Config;
pub use errors::{DiscoveryError, RoomClientError};
pub use handlers::LifecycleHandlers;
pub use session::{RoomClient, Session, SessionContext};
