//! Host application callbacks.
//!
//! Handlers are registered on the client before `connect()` and run on the
//! session's dispatch task, so they must not block.

use common::types::PeerId;
use std::fmt;
use std::sync::Arc;

type ConnectedHandler = Arc<dyn Fn() + Send + Sync>;
type PeerHandler = Arc<dyn Fn(&PeerId) + Send + Sync>;

/// Optional lifecycle callbacks.
///
/// ```
/// use room_client::handlers::LifecycleHandlers;
///
/// let handlers = LifecycleHandlers::new()
///     .on_connected(|| println!("connected"))
///     .on_user_joined(|peer| println!("{peer} joined"));
/// assert!(handlers.has_connected_handler());
/// ```
#[derive(Clone, Default)]
pub struct LifecycleHandlers {
    connected: Option<ConnectedHandler>,
    user_joined: Option<PeerHandler>,
    user_left: Option<PeerHandler>,
}

impl LifecycleHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called after the room join has been sent.
    #[must_use]
    pub fn on_connected(mut self, handler: impl Fn() + Send + Sync + 'static) -> Self {
        self.connected = Some(Arc::new(handler));
        self
    }

    /// Called when another participant joins the room.
    #[must_use]
    pub fn on_user_joined(mut self, handler: impl Fn(&PeerId) + Send + Sync + 'static) -> Self {
        self.user_joined = Some(Arc::new(handler));
        self
    }

    /// Called when another participant leaves the room.
    #[must_use]
    pub fn on_user_left(mut self, handler: impl Fn(&PeerId) + Send + Sync + 'static) -> Self {
        self.user_left = Some(Arc::new(handler));
        self
    }

    pub fn has_connected_handler(&self) -> bool {
        self.connected.is_some()
    }

    pub(crate) fn connected(&self) {
        if let Some(handler) = &self.connected {
            handler();
        }
    }

    pub(crate) fn user_joined(&self, peer_id: &PeerId) {
        if let Some(handler) = &self.user_joined {
            handler(peer_id);
        }
    }

    pub(crate) fn user_left(&self, peer_id: &PeerId) {
        if let Some(handler) = &self.user_left {
            handler(peer_id);
        }
    }
}

impl fmt::Debug for LifecycleHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleHandlers")
            .field("connected", &self.connected.is_some())
            .field("user_joined", &self.user_joined.is_some())
            .field("user_left", &self.user_left.is_some())
            .finish()
    }
}
