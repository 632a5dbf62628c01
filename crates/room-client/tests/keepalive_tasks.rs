//! Tests for keepalive task behavior.
//!
//! Uses tokio's paused clock to verify:
//! - `PING` goes out on interval boundaries only
//! - Ticks are skipped while the session is not connected
//! - Cancellation stops the task

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use common::types::RoomName;
use room_client::config::DEFAULT_KEEPALIVE_INTERVAL_SECONDS;
use room_client::handlers::LifecycleHandlers;
use room_client::keepalive::spawn_keepalive;
use room_client::session::SessionContext;
use room_client::transport::SignalSender;
use signaling_protocol::OutboundSignal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const INTERVAL: Duration = Duration::from_secs(DEFAULT_KEEPALIVE_INTERVAL_SECONDS);

fn session_context() -> (Arc<SessionContext>, mpsc::Receiver<OutboundSignal>) {
    let (tx, rx) = mpsc::channel(16);
    let ctx = SessionContext::new(
        RoomName::new("room1"),
        "from minecraft".to_string(),
        SignalSender::new(tx),
        LifecycleHandlers::new(),
    );
    (Arc::new(ctx), rx)
}

async fn advance(duration: Duration) {
    tokio::time::advance(duration).await;
    tokio::task::yield_now().await;
}

fn pings(rx: &mut mpsc::Receiver<OutboundSignal>) -> usize {
    let mut count = 0;
    while let Ok(signal) = rx.try_recv() {
        assert_eq!(signal, OutboundSignal::Ping);
        count += 1;
    }
    count
}

// ============================================================================
// Timing
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_ping_on_interval_boundaries() {
    let (ctx, mut rx) = session_context();
    ctx.set_connected(true);
    let cancel_token = CancellationToken::new();
    let handle = spawn_keepalive(ctx, INTERVAL, cancel_token.clone());
    tokio::task::yield_now().await;

    // Nothing at start
    advance(Duration::from_secs(1)).await;
    assert_eq!(pings(&mut rx), 0);

    // First PING at 25s
    advance(Duration::from_secs(24)).await;
    assert_eq!(pings(&mut rx), 1);

    // Nothing mid-interval
    advance(Duration::from_secs(12)).await;
    assert_eq!(pings(&mut rx), 0);

    // Second PING at 50s
    advance(Duration::from_secs(13)).await;
    assert_eq!(pings(&mut rx), 1);

    cancel_token.cancel();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_ticks_skipped_until_connected() {
    let (ctx, mut rx) = session_context();
    let cancel_token = CancellationToken::new();
    let handle = spawn_keepalive(Arc::clone(&ctx), INTERVAL, cancel_token.clone());
    tokio::task::yield_now().await;

    advance(INTERVAL).await;
    assert_eq!(pings(&mut rx), 0);

    ctx.set_connected(true);
    advance(INTERVAL).await;
    assert_eq!(pings(&mut rx), 1);

    ctx.set_connected(false);
    advance(INTERVAL).await;
    assert_eq!(pings(&mut rx), 0);

    cancel_token.cancel();
    handle.await.unwrap();
}

// ============================================================================
// Shutdown
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_keepalive_stops_on_cancellation() {
    let (ctx, mut rx) = session_context();
    ctx.set_connected(true);
    let cancel_token = CancellationToken::new();
    let handle = spawn_keepalive(ctx, INTERVAL, cancel_token.clone());
    tokio::task::yield_now().await;

    advance(INTERVAL).await;
    assert_eq!(pings(&mut rx), 1);

    cancel_token.cancel();
    handle.await.unwrap();

    advance(INTERVAL * 4).await;
    assert_eq!(pings(&mut rx), 0);
}

#[tokio::test(start_paused = true)]
async fn test_child_token_cancellation_propagates() {
    let (ctx, _rx) = session_context();
    let parent = CancellationToken::new();
    let handle = spawn_keepalive(ctx, INTERVAL, parent.child_token());
    tokio::task::yield_now().await;

    parent.cancel();

    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("keepalive should stop with its parent token")
        .unwrap();
}
