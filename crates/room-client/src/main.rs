//! Room Client
//!
//! Joins a room on the signaling service and stays connected until Ctrl+C,
//! SIGTERM, or the server closes the connection.
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment
//! 2. Install the Prometheus exporter (when `RC_METRICS_BIND_ADDRESS` is set)
//! 3. Resolve the signaling server and connect
//! 4. Wait for shutdown or connection loss

#![warn(clippy::pedantic)]

use std::net::SocketAddr;

use room_client::config::Config;
use room_client::handlers::LifecycleHandlers;
use room_client::observability::metrics::init_metrics_exporter;
use room_client::session::RoomClient;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Configuration is loaded first so RC_LOG_JSON can pick the log format
    let config = Config::from_env();
    init_tracing(config.as_ref().is_ok_and(|c| c.log_json));

    info!("Starting Room Client");

    let config = config.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        room_id = %config.room_id,
        discovery_url = %config.discovery_url,
        origin = %config.origin,
        keepalive_interval = ?config.keepalive_interval,
        "Configuration loaded successfully"
    );

    if let Some(address) = &config.metrics_bind_address {
        let addr: SocketAddr = address.parse().map_err(|e| {
            error!(error = %e, addr = %address, "Invalid metrics bind address");
            format!("Invalid metrics bind address: {e}")
        })?;
        init_metrics_exporter(addr).map_err(|e| {
            error!(error = %e, "Failed to install Prometheus exporter");
            e
        })?;
        info!(addr = %addr, "Prometheus exporter listening");
    }

    let handlers = LifecycleHandlers::new()
        .on_connected(|| info!("Joined room"))
        .on_user_joined(|peer| info!(peer_id = %peer, "Greeted new participant"));

    let client = RoomClient::new(config)?.with_handlers(handlers);

    let session = client.connect().await.map_err(|e| {
        error!(error = %e, "Failed to connect to signaling server");
        e
    })?;

    info!("Room Client running - press Ctrl+C to shutdown");

    tokio::select! {
        () = shutdown_signal() => {
            info!("Shutdown signal received, disconnecting...");
        }
        () = session.closed() => {
            info!("Connection closed by server");
        }
    }

    session.disconnect().await;
    client.shutdown();

    info!("Room Client shutdown complete");
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "room_client=debug".into());

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        #[expect(
            clippy::expect_used,
            reason = "Process cannot be stopped cleanly without a Ctrl+C handler"
        )]
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        #[expect(
            clippy::expect_used,
            reason = "Process cannot be stopped cleanly without a SIGTERM handler"
        )]
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
