//! # Venue Server
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Tracing (RUST_LOG, default info,venue=debug,sqlx=warn)             │
//! │  2. Configuration (defaults → venue.toml → VENUE_* → validate)         │
//! │  3. Database (SQLite, WAL, migrations)                                 │
//! │  4. Reservation sweeper spawned                                        │
//! │  5. HTTP server until Ctrl+C / SIGTERM                                 │
//! │  6. Sweeper stopped, pool closed                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```bash
//! venue-server                      # platform config dir / defaults
//! venue-server --config venue.toml
//! ```

use std::path::PathBuf;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::{error, info};
use venue_db::{Database, DbConfig};
use venue_server::{build_router, init_tracing, AppState, ReservationSweeper, VenueConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = VenueConfig::load(config_arg())?;
    info!(
        venue = %config.venue.name,
        currency = %config.venue.currency,
        timezone = %config.venue.timezone,
        db_path = %config.database.path.display(),
        "Configuration loaded"
    );

    if let Some(dir) = config.database.path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let db = Database::new(
        DbConfig::new(&config.database.path).max_connections(config.database.max_connections),
    )
    .await?;
    info!("Database connected and migrations applied");

    let (sweeper, sweeper_handle) = ReservationSweeper::new(
        &db,
        Duration::from_secs(config.scheduler.reservation_sweep_secs),
    );
    let sweeper_task = tokio::spawn(sweeper.run());

    let addr = config.listen_address();
    let state = AppState::new(db.clone(), config)?;
    let app = build_router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "Venue server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper_handle.shutdown().await;
    if let Err(e) = sweeper_task.await {
        error!(?e, "Reservation sweeper task failed");
    }
    db.close().await;

    info!("Server shutdown complete");
    Ok(())
}

/// `--config <PATH>` / `-c <PATH>`
fn config_arg() -> Option<PathBuf> {
    let args: Vec<String> = std::env::args().collect();
    args.iter()
        .position(|a| a == "--config" || a == "-c")
        .and_then(|i| args.get(i + 1))
        .map(PathBuf::from)
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(?e, "Failed to install Ctrl+C handler");
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
                error!(?e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
