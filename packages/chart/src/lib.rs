#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Natal chart derivation.
//!
//! Turns a [`BirthInput`] plus raw provider output (planet longitudes and
//! house cusps) into a [`ChartResult`]: each planet gets its sign and
//! house, and every planet pair is checked for a major aspect.
//!
//! [`assemble_chart`] is the pure part and has no side effects.
//! [`ChartService`] wraps it with an injected [`EphemerisProvider`] and a
//! timeout.

pub mod aspects;
pub mod format;
pub mod houses;

use std::sync::Arc;
use std::time::Duration;

use natal_chart_models::{
    BirthInput, ChartResult, HouseCusp, HouseSystem, InvalidInputError, Planet, PlanetPosition,
    ZodiacSign, normalize_degrees,
};
use natal_ephemeris::{Cusps, EphemerisError, EphemerisProvider, Longitudes};
use thiserror::Error;

pub use aspects::{AspectOrbs, DEFAULT_ASPECT_ORBS, detect_aspect, detect_aspects};
pub use format::format_chart;
pub use houses::house_for;

/// Default time allowed for both provider calls of one chart.
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from chart derivation.
#[derive(Debug, Error)]
pub enum ChartError {
    /// Birth data failed validation; the provider was not called.
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// The provider failed or timed out.
    #[error("Ephemeris provider unavailable: {message}")]
    ProviderUnavailable {
        /// Whether the same request may succeed later.
        retryable: bool,
        message: String,
    },

    /// The provider answered with data that cannot form a chart.
    #[error("Malformed provider data: {message}")]
    MalformedProviderData { message: String },
}

impl ChartError {
    /// Whether repeating the request later may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::ProviderUnavailable { retryable, .. } => *retryable,
            Self::InvalidInput(_) | Self::MalformedProviderData { .. } => false,
        }
    }
}

impl From<EphemerisError> for ChartError {
    fn from(e: EphemerisError) -> Self {
        match e {
            EphemerisError::MalformedResponse { message } => {
                Self::MalformedProviderData { message }
            }
            other => Self::ProviderUnavailable {
                retryable: other.is_retryable(),
                message: other.to_string(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// Builds a chart from provider output.
///
/// Every [`Planet`] must be present with a finite longitude, and `cusps`
/// must wrap the circle exactly once in house order. Otherwise nothing is
/// produced.
///
/// # Errors
///
/// Returns [`ChartError::MalformedProviderData`] if the provider output is
/// incomplete or inconsistent.
pub fn assemble_chart(
    input: BirthInput,
    longitudes: &Longitudes,
    cusps: &Cusps,
    house_system: HouseSystem,
    orbs: &AspectOrbs,
) -> Result<ChartResult, ChartError> {
    if !houses::cusps_wrap_once(cusps) {
        return Err(ChartError::MalformedProviderData {
            message: format!("house cusps do not wrap the circle once: {cusps:?}"),
        });
    }
    let cusps = cusps.map(normalize_degrees);

    let mut planets = Vec::with_capacity(Planet::all().len());
    for &planet in Planet::all() {
        let raw = longitudes
            .get(&planet)
            .copied()
            .ok_or_else(|| ChartError::MalformedProviderData {
                message: format!("no longitude for {planet}"),
            })?;
        if !raw.is_finite() {
            return Err(ChartError::MalformedProviderData {
                message: format!("non-finite longitude for {planet}: {raw}"),
            });
        }

        let longitude = normalize_degrees(raw);
        planets.push(PlanetPosition {
            planet,
            longitude,
            sign: ZodiacSign::from_longitude(longitude),
            house: house_for(longitude, &cusps),
        });
    }

    let cusps = (1u8..)
        .zip(cusps)
        .map(|(house, longitude)| HouseCusp {
            house,
            longitude,
            sign: ZodiacSign::from_longitude(longitude),
        })
        .collect();

    let aspects = detect_aspects(&planets, orbs);

    Ok(ChartResult {
        input,
        house_system,
        planets,
        cusps,
        aspects,
    })
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Derives charts using an injected ephemeris provider.
#[derive(Clone)]
pub struct ChartService {
    provider: Arc<dyn EphemerisProvider>,
    orbs: AspectOrbs,
    timeout: Duration,
}

impl std::fmt::Debug for ChartService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChartService")
            .field("house_system", &self.provider.house_system())
            .field("orbs", &self.orbs)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ChartService {
    #[must_use]
    pub fn new(provider: Arc<dyn EphemerisProvider>) -> Self {
        Self {
            provider,
            orbs: DEFAULT_ASPECT_ORBS,
            timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_orbs(mut self, orbs: AspectOrbs) -> Self {
        self.orbs = orbs;
        self
    }

    /// The provider's house system, recorded on every chart.
    #[must_use]
    pub fn house_system(&self) -> HouseSystem {
        self.provider.house_system()
    }

    /// Derives a full chart for `input`.
    ///
    /// Longitudes and cusps are requested concurrently under a single
    /// timeout. Given identical provider output the result is identical.
    ///
    /// # Errors
    ///
    /// * [`ChartError::InvalidInput`] if the location is out of range
    /// * [`ChartError::ProviderUnavailable`] if either provider call fails
    ///   or the timeout elapses (retryable)
    /// * [`ChartError::MalformedProviderData`] if the provider output is
    ///   unusable
    pub async fn derive(&self, input: &BirthInput) -> Result<ChartResult, ChartError> {
        input.location().validate()?;

        let instant = input.instant();
        let location = input.location();

        let calls = async {
            tokio::join!(
                self.provider.longitudes(instant, location),
                self.provider.cusps(instant, location),
            )
        };

        let (longitudes, cusps) = tokio::time::timeout(self.timeout, calls)
            .await
            .map_err(|_| {
                log::warn!(
                    "Ephemeris provider timed out after {:?} for {instant}",
                    self.timeout
                );
                ChartError::ProviderUnavailable {
                    retryable: true,
                    message: format!("provider timed out after {}s", self.timeout.as_secs_f64()),
                }
            })?;

        let chart = assemble_chart(
            input.clone(),
            &longitudes?,
            &cusps?,
            self.house_system(),
            &self.orbs,
        )?;

        log::debug!(
            "Derived chart for {instant}: {} aspects",
            chart.aspects.len()
        );
        Ok(chart)
    }
}
