//! # Application State
//!
//! Shared by every handler through axum's `State` extractor.
//!
//! `Database` wraps a `SqlitePool` and the config is behind an `Arc`, so
//! cloning the state per request is cheap.

use chrono_tz::Tz;
use std::sync::Arc;
use venue_db::{BillingRepository, Database};

use crate::config::{ConfigError, VenueConfig};
use crate::error::ApiResult;

#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<VenueConfig>,
    timezone: Tz,
}

impl AppState {
    pub fn new(db: Database, config: VenueConfig) -> Result<Self, ConfigError> {
        let timezone = config.timezone()?;
        Ok(AppState {
            db,
            config: Arc::new(config),
            timezone,
        })
    }

    /// Billing workflow in the venue currency.
    pub fn billing(&self) -> BillingRepository {
        self.db.billing(&self.config.venue.currency)
    }

    /// The zone named by the request, or the venue's.
    pub fn viewer_timezone(&self, requested: Option<&str>) -> ApiResult<Tz> {
        match requested.map(str::trim).filter(|tz| !tz.is_empty()) {
            Some(name) => Ok(venue_core::time::parse_timezone(name)?),
            None => Ok(self.timezone),
        }
    }
}
