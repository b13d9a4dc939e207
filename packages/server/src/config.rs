//! Server configuration from environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use natal_chart::DEFAULT_PROVIDER_TIMEOUT;
use natal_chart_models::HouseSystem;
use natal_database::DEFAULT_DB_PATH;
use natal_ephemeris::horizons::DEFAULT_HORIZONS_URL;

/// Default directory for cached reference data.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Settings read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// `DATABASE_PATH`
    pub database_path: PathBuf,
    /// `DATA_DIR`: leap-second cache location.
    pub data_dir: PathBuf,
    /// `BIND_ADDR`
    pub bind_addr: String,
    /// `PORT`
    pub port: u16,
    /// `HOUSE_SYSTEM`: a snake_case [`HouseSystem`] name, e.g. `placidus`.
    pub house_system: HouseSystem,
    /// `HORIZONS_URL`
    pub horizons_url: String,
    /// `PROVIDER_TIMEOUT_SECS`
    pub provider_timeout: Duration,
}

impl ServerConfig {
    /// Reads the configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    ///
    /// Unset or unparseable values fall back to their defaults; a bad
    /// value is logged at `warn`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            database_path: lookup("DATABASE_PATH")
                .map_or_else(|| DEFAULT_DB_PATH.into(), PathBuf::from),
            data_dir: lookup("DATA_DIR").map_or_else(|| DEFAULT_DATA_DIR.into(), PathBuf::from),
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_var(&lookup, "PORT").unwrap_or(8080),
            house_system: parse_var(&lookup, "HOUSE_SYSTEM").unwrap_or_default(),
            horizons_url: lookup("HORIZONS_URL")
                .unwrap_or_else(|| DEFAULT_HORIZONS_URL.to_string()),
            provider_timeout: parse_var(&lookup, "PROVIDER_TIMEOUT_SECS")
                .map_or(DEFAULT_PROVIDER_TIMEOUT, Duration::from_secs),
        }
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let value = lookup(key)?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            log::warn!("Ignoring invalid {key}={value}");
            None
        }
    }
}
