//! # Reservation Sweeper
//!
//! Promotes reservations whose starting time has passed.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Reservation Sweeper Loop                             │
//! │                                                                         │
//! │   interval.tick() ──► promote_due_reservations(now)                    │
//! │        │                  UPDATE sessions SET state = 'running'        │
//! │        │                  WHERE state = 'available'                    │
//! │        │                    AND starting_time <= now                   │
//! │        │                                                                │
//! │        ├── Ok(n > 0) ──► info!                                         │
//! │        ├── Err(e)    ──► error!, keep looping                          │
//! │        │                                                                │
//! │   shutdown_rx.recv() ──► break                                         │
//! │                                                                         │
//! │  Missed ticks are delayed, never bunched.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use venue_db::{Database, DbResult, SessionRepository};

/// Background task that starts due reservations.
pub struct ReservationSweeper {
    sessions: SessionRepository,
    period: Duration,
    shutdown_rx: mpsc::Receiver<()>,
}

/// Handle for stopping the sweeper.
#[derive(Clone)]
pub struct SweeperHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl SweeperHandle {
    /// Triggers graceful shutdown. A stopped sweeper is not an error.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

impl ReservationSweeper {
    /// Creates a sweeper and returns its handle.
    pub fn new(db: &Database, period: Duration) -> (Self, SweeperHandle) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let sweeper = ReservationSweeper {
            sessions: db.sessions(),
            period,
            shutdown_rx,
        };
        (sweeper, SweeperHandle { shutdown_tx })
    }

    /// Runs the sweep loop.
    ///
    /// This should be spawned as a background task.
    pub async fn run(mut self) {
        info!(period_secs = self.period.as_secs(), "Reservation sweeper starting");

        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.sweep_once(Utc::now()).await {
                        error!(?e, "Reservation sweep failed");
                    }
                }

                _ = self.shutdown_rx.recv() => {
                    info!("Reservation sweeper shutting down");
                    break;
                }
            }
        }

        info!("Reservation sweeper stopped");
    }

    /// Runs one sweep as of `now`, returning how many sessions started.
    pub async fn sweep_once(&self, now: DateTime<Utc>) -> DbResult<u64> {
        let promoted = self.sessions.promote_due_reservations(now).await?;
        debug!(promoted, "Reservation sweep complete");
        Ok(promoted)
    }
}
