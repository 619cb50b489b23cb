//! Duel arena server binary.
//!
//! Clients connect over `/ws`, join a room by id and stream their input; one
//! tick driver simulates every room and pushes sparse updates back.

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use duel_arena_server::app::AppState;
use duel_arena_server::config::Config;
use duel_arena_server::http::build_router;
use duel_arena_server::util::time::{init_server_time, SIMULATION_TPS};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    init_tracing(&config.log_level);
    init_server_time();

    info!(
        addr = %config.server_addr,
        origins = %config.client_origin,
        static_dir = ?config.static_dir,
        "Starting duel arena server"
    );

    let state = AppState::new(config.clone());

    // Rooms are created lazily by joins; the driver ticks whatever exists
    let driver = tokio::spawn(state.room_registry.clone().run());
    info!(tps = SIMULATION_TPS, "Tick driver spawned");

    let router = build_router(state);
    let listener = TcpListener::bind(config.server_addr).await?;
    info!(addr = %config.server_addr, "Accepting connections on /ws, health on /health");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    driver.abort();
    info!("Arena server stopped");
    Ok(())
}

/// `RUST_LOG` wins over `LOG_LEVEL`
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!(signal = "ctrl_c", "Shutting down, closing open sessions"),
        _ = terminate => info!(signal = "sigterm", "Shutting down, closing open sessions"),
    }
}
