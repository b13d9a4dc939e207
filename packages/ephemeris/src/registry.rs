//! Compile-time registry of leap-second data sources.
//!
//! Each source is defined in a TOML file under `sources/`. The registry
//! embeds these at compile time and exposes them via [`all_sources`] and
//! [`enabled_sources`]. Sources are tried in ascending priority order
//! when the cached leap-second table is missing or expired.

use serde::Deserialize;

/// A leap-second data source loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct LeapSecondSource {
    /// Unique identifier (e.g., `"iers"`, `"iana"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Whether this source is tried at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Fetch order. Lower values are tried first.
    pub priority: u32,
    /// Download URL.
    pub url: String,
    /// File format served at `url`.
    pub format: LeapSecondFormat,
}

/// Supported leap-second file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeapSecondFormat {
    /// IERS Bulletin C `Leap_Second.dat` (MJD, day, month, year, TAI-UTC).
    IersDat,
    /// IANA tz `leap-seconds.list` (NTP seconds, TAI-UTC).
    IanaList,
}

const fn default_true() -> bool {
    true
}

// ── Compile-time embedded TOML files ────────────────────────────────

const SOURCE_TOMLS: &[(&str, &str)] = &[
    ("iers", include_str!("../sources/iers.toml")),
    ("iana", include_str!("../sources/iana.toml")),
];

#[cfg(test)]
const EXPECTED_SOURCE_COUNT: usize = 2;

/// Returns all leap-second sources (enabled and disabled).
///
/// # Panics
///
/// Panics if any TOML config is malformed (the configs are embedded, so
/// this is caught by the registry tests).
#[must_use]
pub fn all_sources() -> Vec<LeapSecondSource> {
    SOURCE_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse leap-second source '{name}': {e}"))
        })
        .collect()
}

/// Returns only enabled sources, sorted by priority (ascending).
#[must_use]
pub fn enabled_sources() -> Vec<LeapSecondSource> {
    let mut sources: Vec<LeapSecondSource> =
        all_sources().into_iter().filter(|s| s.enabled).collect();
    sources.sort_by_key(|s| s.priority);
    sources
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn loads_all_sources() {
        assert_eq!(all_sources().len(), EXPECTED_SOURCE_COUNT);
    }

    #[test]
    fn source_ids_are_unique() {
        let mut seen = BTreeSet::new();
        for source in &all_sources() {
            assert!(seen.insert(source.id.clone()), "Duplicate source ID: {}", source.id);
        }
    }

    #[test]
    fn sources_have_https_urls() {
        for source in &all_sources() {
            assert!(
                source.url.starts_with("https://"),
                "Source {} has non-HTTPS url {}",
                source.id,
                source.url
            );
        }
    }

    #[test]
    fn enabled_sources_sorted_by_priority() {
        let sources = enabled_sources();
        for window in sources.windows(2) {
            assert!(
                window[0].priority <= window[1].priority,
                "Sources not sorted by priority: {} ({}) > {} ({})",
                window[0].id,
                window[0].priority,
                window[1].id,
                window[1].priority
            );
        }
    }
}
