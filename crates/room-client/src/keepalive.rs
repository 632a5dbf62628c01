//! Application-level keepalive.
//!
//! Sends a custom `PING` event on a fixed interval, separate from the
//! Engine.IO heartbeat. The task belongs to one session and stops with the
//! session's cancellation token.

use crate::observability::metrics;
use crate::session::SessionContext;
use signaling_protocol::OutboundSignal;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Shortest interval accepted.
pub const MIN_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(1);

/// Spawn the keepalive task for a session.
pub fn spawn_keepalive(
    ctx: Arc<SessionContext>,
    interval: Duration,
    cancel_token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(run_keepalive(ctx, interval, cancel_token))
}

/// Keepalive loop.
///
/// The first `PING` goes out one interval after start, not as soon as the
/// loop begins; the Socket.IO connect that precedes it already proves the
/// link is up. Ticks while the session is not connected are skipped; missed
/// ticks are not replayed.
pub async fn run_keepalive(
    ctx: Arc<SessionContext>,
    interval: Duration,
    cancel_token: CancellationToken,
) {
    let period = interval.max(MIN_KEEPALIVE_INTERVAL);
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    debug!(
        target: "rc.keepalive",
        interval_secs = period.as_secs(),
        "Keepalive started"
    );

    loop {
        tokio::select! {
            () = cancel_token.cancelled() => {
                info!(target: "rc.keepalive", "Keepalive stopped");
                break;
            }
            _ = ticker.tick() => {
                if !ctx.is_connected() {
                    debug!(target: "rc.keepalive", "Skipping keepalive - not connected");
                    continue;
                }

                match ctx.emit(OutboundSignal::Ping) {
                    Ok(()) => {
                        metrics::record_keepalive_ping();
                        debug!(target: "rc.keepalive", "Keepalive sent");
                    }
                    Err(e) => warn!(target: "rc.keepalive", error = %e, "Keepalive failed"),
                }
            }
        }
    }
}
