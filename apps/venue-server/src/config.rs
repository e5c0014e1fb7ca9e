//! # Server Configuration
//!
//! Configuration is resolved in layers, later layers winning:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Defaults (this file)                                               │
//! │  2. venue.toml                                                         │
//! │     • explicit path, or VENUE_CONFIG                                   │
//! │     • otherwise the platform config dir, when the file exists          │
//! │  3. Environment (VENUE_*)                                              │
//! │  4. validate()                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example File
//! ```toml
//! [server]
//! bind_addr = "0.0.0.0"
//! port = 8080
//!
//! [database]
//! path = "/var/lib/venue/venue.db"
//! max_connections = 5
//!
//! [venue]
//! name = "Arena"
//! currency = "EGP"
//! timezone = "Africa/Cairo"
//!
//! [scheduler]
//! reservation_sweep_secs = 60
//! ```

use chrono_tz::Tz;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use venue_core::time::parse_timezone;
use venue_core::validation::validate_currency_code;
use venue_core::DEFAULT_CURRENCY;

const CONFIG_FILE: &str = "venue.toml";

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file; created on first start.
    pub path: PathBuf,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            path: default_database_path(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VenueSection {
    /// Display name, logged at startup.
    pub name: String,

    /// ISO 4217 code stamped on invoices.
    pub currency: String,

    /// IANA zone used when a request does not name one.
    pub timezone: String,
}

impl Default for VenueSection {
    fn default() -> Self {
        VenueSection {
            name: "Venue".to_string(),
            currency: DEFAULT_CURRENCY.to_string(),
            timezone: "UTC".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Seconds between reservation sweeps.
    pub reservation_sweep_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            reservation_sweep_secs: 60,
        }
    }
}

// =============================================================================
// Venue Config
// =============================================================================

/// Complete server configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VenueConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub venue: VenueSection,
    pub scheduler: SchedulerConfig,
}

impl VenueConfig {
    /// Loads configuration from every layer and validates it.
    ///
    /// ## Errors
    /// - the named config file is missing or unreadable
    /// - TOML syntax errors
    /// - an environment override does not parse
    /// - validation failures
    pub fn load(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = explicit
            .or_else(|| std::env::var("VENUE_CONFIG").ok().map(PathBuf::from))
            .map(|p| (p, true))
            .or_else(|| platform_config_path().map(|p| (p, false)));

        let mut config = match path {
            Some((path, true)) => Self::from_file(&path)?,
            Some((path, false)) if path.exists() => Self::from_file(&path)?,
            _ => VenueConfig::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML file. Missing sections take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Applies `VENUE_*` overrides read through `lookup`.
    ///
    /// ## Variables
    /// - `VENUE_BIND_ADDR`, `VENUE_PORT`
    /// - `VENUE_DB_PATH`, `VENUE_DB_MAX_CONNECTIONS`
    /// - `VENUE_CURRENCY`, `VENUE_TIMEZONE`
    /// - `VENUE_SWEEP_SECS`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("VENUE_BIND_ADDR") {
            self.server.bind_addr = addr;
        }
        if let Some(port) = lookup("VENUE_PORT") {
            self.server.port = parse_number("VENUE_PORT", &port)?;
        }
        if let Some(path) = lookup("VENUE_DB_PATH") {
            self.database.path = PathBuf::from(path);
        }
        if let Some(max) = lookup("VENUE_DB_MAX_CONNECTIONS") {
            self.database.max_connections = parse_number("VENUE_DB_MAX_CONNECTIONS", &max)?;
        }
        if let Some(currency) = lookup("VENUE_CURRENCY") {
            self.venue.currency = currency.trim().to_uppercase();
        }
        if let Some(tz) = lookup("VENUE_TIMEZONE") {
            self.venue.timezone = tz;
        }
        if let Some(secs) = lookup("VENUE_SWEEP_SECS") {
            self.scheduler.reservation_sweep_secs = parse_number("VENUE_SWEEP_SECS", &secs)?;
        }
        Ok(())
    }

    /// Checks the values no layer can be trusted with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                key: "server.port".to_string(),
                reason: "must not be 0".to_string(),
            });
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                key: "database.max_connections".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.scheduler.reservation_sweep_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "scheduler.reservation_sweep_secs".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        validate_currency_code(&self.venue.currency).map_err(|e| ConfigError::InvalidValue {
            key: "venue.currency".to_string(),
            reason: e.to_string(),
        })?;
        self.timezone()?;
        Ok(())
    }

    /// The venue's default time zone.
    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        parse_timezone(&self.venue.timezone).map_err(|e| ConfigError::InvalidValue {
            key: "venue.timezone".to_string(),
            reason: e.to_string(),
        })
    }

    /// `bind_addr:port`
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.server.bind_addr, self.server.port)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        reason: format!("'{}' is not a number", value),
    })
}

fn platform_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "venue", "venue-server").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

/// Platform data dir, falling back to the working directory.
///
/// - **Linux**: `~/.local/share/venue-server/venue.db`
/// - **macOS**: `~/Library/Application Support/com.venue.venue-server/venue.db`
fn default_database_path() -> PathBuf {
    ProjectDirs::from("com", "venue", "venue-server")
        .map(|dirs| dirs.data_dir().join("venue.db"))
        .unwrap_or_else(|| PathBuf::from("venue.db"))
}

// =============================================================================
// Errors
// =============================================================================

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}
