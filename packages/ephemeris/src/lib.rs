#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Ephemeris providers for natal chart derivation.
//!
//! Chart derivation never does astronomy itself. It asks an
//! [`EphemerisProvider`] for two things:
//!
//! 1. Geocentric ecliptic longitudes of the ten chart bodies.
//! 2. The twelve house cusp longitudes for an instant and place.
//!
//! The production provider is [`horizons::HorizonsProvider`], which
//! queries the JPL Horizons API for planet longitudes in Terrestrial Time
//! and computes cusps with the Swiss Ephemeris via [`houses`]. The UTC to
//! TT conversion uses a [`timescale::LeapSecondTable`] that is loaded once
//! (cached file, then remote sources from the [`registry`], then an
//! embedded default) and injected into the provider.

pub mod horizons;
pub mod houses;
pub mod registry;
pub mod retry;
pub mod timescale;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use natal_chart_models::{GeoLocation, HouseSystem, Planet};
use thiserror::Error;

/// Ecliptic longitude in degrees for each chart body.
pub type Longitudes = BTreeMap<Planet, f64>;

/// Twelve house cusp longitudes in house order.
pub type Cusps = [f64; 12];

/// Source of raw astronomical positions for a chart.
///
/// Implementations must be deterministic for a given instant and
/// location; derivation treats any error as a provider failure and never
/// produces a partial chart.
#[async_trait::async_trait]
pub trait EphemerisProvider: Send + Sync {
    /// The house system [`EphemerisProvider::cusps`] divides the chart with.
    fn house_system(&self) -> HouseSystem;

    /// Geocentric ecliptic longitudes in `[0, 360)` for every [`Planet`].
    ///
    /// # Errors
    ///
    /// Returns [`EphemerisError`] if the positions cannot be obtained.
    async fn longitudes(
        &self,
        instant: DateTime<Utc>,
        location: GeoLocation,
    ) -> Result<Longitudes, EphemerisError>;

    /// The twelve house cusps, house 1 first, as ecliptic longitudes.
    ///
    /// # Errors
    ///
    /// Returns [`EphemerisError`] if the cusps cannot be computed.
    async fn cusps(
        &self,
        instant: DateTime<Utc>,
        location: GeoLocation,
    ) -> Result<Cusps, EphemerisError>;
}

/// Errors from ephemeris providers and reference-data loading.
#[derive(Debug, Error)]
pub enum EphemerisError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status.
    #[error("HTTP {status} for {url}")]
    HttpStatus {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// The upstream service reported an error in its response body.
    #[error("Ephemeris service error: {message}")]
    Service {
        /// Message returned by the service.
        message: String,
    },

    /// The response could not be parsed into positions.
    #[error("Malformed ephemeris data: {message}")]
    MalformedResponse {
        /// Description of the parsing failure.
        message: String,
    },

    /// I/O error reading or writing cached reference data.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

impl EphemerisError {
    /// Whether repeating the same request later may succeed.
    ///
    /// Network failures, throttling, and server errors are retryable;
    /// malformed data and client errors are not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => retry::is_transient(e),
            Self::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            Self::Io { .. } => true,
            Self::Service { .. } | Self::MalformedResponse { .. } => false,
        }
    }
}
