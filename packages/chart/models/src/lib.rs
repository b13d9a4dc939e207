#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Zodiac, planet, house, and aspect types for natal charts.
//!
//! This crate defines the canonical chart vocabulary shared by the
//! derivation engine, the ephemeris providers, persistence, and the REST
//! API. Everything here is plain data plus the static lookup tables
//! (elements, colours, glyphs) that the frontend renders from.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone as _, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Width of one zodiac sign in degrees of ecliptic longitude.
pub const SIGN_WIDTH_DEGREES: f64 = 30.0;

/// Normalizes an angle in degrees to the half-open range `[0, 360)`.
///
/// `rem_euclid` can return exactly `360.0` for tiny negative inputs due to
/// rounding, which is folded back to `0.0`.
#[must_use]
pub fn normalize_degrees(degrees: f64) -> f64 {
    let normalized = degrees.rem_euclid(360.0);
    if normalized >= 360.0 { 0.0 } else { normalized }
}

// ---------------------------------------------------------------------------
// Planets
// ---------------------------------------------------------------------------

/// The bodies placed in a chart, in traditional order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum Planet {
    Sun,
    Moon,
    Mercury,
    Venus,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Pluto,
}

impl Planet {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Sun,
            Self::Moon,
            Self::Mercury,
            Self::Venus,
            Self::Mars,
            Self::Jupiter,
            Self::Saturn,
            Self::Uranus,
            Self::Neptune,
            Self::Pluto,
        ]
    }

    /// Astronomical glyph used by the chart wheel.
    #[must_use]
    pub const fn glyph(self) -> &'static str {
        match self {
            Self::Sun => "\u{2609}",
            Self::Moon => "\u{263D}",
            Self::Mercury => "\u{263F}",
            Self::Venus => "\u{2640}",
            Self::Mars => "\u{2642}",
            Self::Jupiter => "\u{2643}",
            Self::Saturn => "\u{2644}",
            Self::Uranus => "\u{2645}",
            Self::Neptune => "\u{2646}",
            Self::Pluto => "\u{2647}",
        }
    }
}

// ---------------------------------------------------------------------------
// Signs and elements
// ---------------------------------------------------------------------------

/// Classical element of a zodiac sign.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum Element {
    Fire,
    Earth,
    Air,
    Water,
}

/// The twelve tropical zodiac signs, starting at 0° Aries.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum ZodiacSign {
    Aries,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
}

/// Signs in ecliptic order; index `n` covers `[30n, 30n + 30)`.
pub const ZODIAC_SIGNS: [ZodiacSign; 12] = [
    ZodiacSign::Aries,
    ZodiacSign::Taurus,
    ZodiacSign::Gemini,
    ZodiacSign::Cancer,
    ZodiacSign::Leo,
    ZodiacSign::Virgo,
    ZodiacSign::Libra,
    ZodiacSign::Scorpio,
    ZodiacSign::Sagittarius,
    ZodiacSign::Capricorn,
    ZodiacSign::Aquarius,
    ZodiacSign::Pisces,
];

/// Elements cycle Fire, Earth, Air, Water starting at Aries.
const SIGN_ELEMENTS: [Element; 4] = [Element::Fire, Element::Earth, Element::Air, Element::Water];

/// Display colour for each sign, indexed like [`ZODIAC_SIGNS`].
const SIGN_COLORS: [&str; 12] = [
    "#E53935", // Aries
    "#43A047", // Taurus
    "#FDD835", // Gemini
    "#90A4AE", // Cancer
    "#FB8C00", // Leo
    "#8D6E63", // Virgo
    "#F06292", // Libra
    "#6D1B7B", // Scorpio
    "#7E57C2", // Sagittarius
    "#37474F", // Capricorn
    "#29B6F6", // Aquarius
    "#26A69A", // Pisces
];

const SIGN_GLYPHS: [&str; 12] = [
    "\u{2648}", "\u{2649}", "\u{264A}", "\u{264B}", "\u{264C}", "\u{264D}", "\u{264E}", "\u{264F}",
    "\u{2650}", "\u{2651}", "\u{2652}", "\u{2653}",
];

impl ZodiacSign {
    /// Resolves the sign containing an ecliptic longitude.
    ///
    /// Uses floor bucketing on the normalized longitude, so exact multiples
    /// of 30° belong to the sign that starts there (30.0° is Taurus).
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_longitude(longitude: f64) -> Self {
        let index = (normalize_degrees(longitude) / SIGN_WIDTH_DEGREES).floor() as usize;
        ZODIAC_SIGNS[index % 12]
    }

    /// Zero-based position of this sign in [`ZODIAC_SIGNS`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Ecliptic longitude at which this sign begins.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub const fn start_longitude(self) -> f64 {
        self.index() as f64 * SIGN_WIDTH_DEGREES
    }

    #[must_use]
    pub const fn element(self) -> Element {
        SIGN_ELEMENTS[self.index() % 4]
    }

    /// Hex colour used for this sign by the chart wheel.
    #[must_use]
    pub const fn color(self) -> &'static str {
        SIGN_COLORS[self.index()]
    }

    #[must_use]
    pub const fn glyph(self) -> &'static str {
        SIGN_GLYPHS[self.index()]
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &ZODIAC_SIGNS
    }
}

// ---------------------------------------------------------------------------
// Houses and aspects
// ---------------------------------------------------------------------------

/// House division scheme passed to the Swiss Ephemeris.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HouseSystem {
    /// Each quadrant between the angles is trisected.
    #[default]
    Porphyry,
    /// Twelve 30° houses starting at the Ascendant.
    Equal,
    /// Each house is one whole sign, starting with the Ascendant's sign.
    WholeSign,
    /// Time-based trisection of the diurnal arcs.
    Placidus,
    Koch,
    Regiomontanus,
    Campanus,
}

/// Major aspect types, ordered by defining angle.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum AspectKind {
    Conjunction,
    Sextile,
    Square,
    Trine,
    Opposition,
}

impl AspectKind {
    /// The exact separation in degrees that defines this aspect.
    #[must_use]
    pub const fn angle(self) -> f64 {
        match self {
            Self::Conjunction => 0.0,
            Self::Sextile => 60.0,
            Self::Square => 90.0,
            Self::Trine => 120.0,
            Self::Opposition => 180.0,
        }
    }

    /// Returns all variants in ascending order of defining angle.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Conjunction,
            Self::Sextile,
            Self::Square,
            Self::Trine,
            Self::Opposition,
        ]
    }
}

// ---------------------------------------------------------------------------
// Birth input
// ---------------------------------------------------------------------------

/// Geographic coordinates in decimal degrees (WGS84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    /// Latitude, north positive, in `[-90, 90]`.
    pub latitude: f64,
    /// Longitude, east positive, in `[-180, 180]`.
    pub longitude: f64,
}

impl GeoLocation {
    /// Creates a validated location.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInputError`] if either coordinate is non-finite or
    /// out of range.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, InvalidInputError> {
        let location = Self {
            latitude,
            longitude,
        };
        location.validate()?;
        Ok(location)
    }

    /// Checks that both coordinates are finite and in range.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInputError`] naming the first offending coordinate.
    pub fn validate(&self) -> Result<(), InvalidInputError> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(InvalidInputError::Latitude {
                value: self.latitude,
            });
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(InvalidInputError::Longitude {
                value: self.longitude,
            });
        }
        Ok(())
    }
}

/// Validated birth moment and place. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BirthInput {
    datetime: DateTime<FixedOffset>,
    location: GeoLocation,
    place: Option<String>,
}

impl BirthInput {
    /// Creates a birth input from an already-resolved local timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInputError`] if the location is out of range.
    pub fn new(
        datetime: DateTime<FixedOffset>,
        location: GeoLocation,
    ) -> Result<Self, InvalidInputError> {
        location.validate()?;
        Ok(Self {
            datetime,
            location,
            place: None,
        })
    }

    /// Parses form fields into a birth input.
    ///
    /// Accepts `YYYY-MM-DD` dates, `HH:MM` or `HH:MM:SS` times, and UTC
    /// offsets as `Z`, `UTC`, `±HH`, `±HHMM`, or `±HH:MM`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInputError`] for the first field that fails to parse
    /// or validate.
    pub fn parse(
        date: &str,
        time: &str,
        utc_offset: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<Self, InvalidInputError> {
        let date_value = date.trim();
        let date = NaiveDate::parse_from_str(date_value, "%Y-%m-%d").map_err(|_| {
            InvalidInputError::Date {
                value: date_value.to_string(),
            }
        })?;

        let time_value = time.trim();
        let time = NaiveTime::parse_from_str(time_value, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(time_value, "%H:%M"))
            .map_err(|_| InvalidInputError::Time {
                value: time_value.to_string(),
            })?;

        let offset = parse_utc_offset(utc_offset)?;
        let local = NaiveDateTime::new(date, time);
        let datetime = offset
            .from_local_datetime(&local)
            .single()
            .ok_or_else(|| InvalidInputError::Time {
                value: time_value.to_string(),
            })?;

        Self::new(datetime, GeoLocation::new(latitude, longitude)?)
    }

    /// Attaches a display label for the birth place.
    #[must_use]
    pub fn with_place(mut self, place: impl Into<String>) -> Self {
        let place = place.into();
        let trimmed = place.trim();
        self.place = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self
    }

    /// Local birth time with its UTC offset.
    #[must_use]
    pub const fn datetime(&self) -> DateTime<FixedOffset> {
        self.datetime
    }

    /// Birth instant in UTC, as handed to ephemeris providers.
    #[must_use]
    pub fn instant(&self) -> DateTime<Utc> {
        self.datetime.with_timezone(&Utc)
    }

    #[must_use]
    pub const fn location(&self) -> GeoLocation {
        self.location
    }

    #[must_use]
    pub fn place(&self) -> Option<&str> {
        self.place.as_deref()
    }
}

/// Parses a UTC offset such as `+05:30`, `-0800`, `+2`, or `Z`.
///
/// # Errors
///
/// Returns [`InvalidInputError::UtcOffset`] if the string is malformed or
/// the offset exceeds ±18 hours.
pub fn parse_utc_offset(value: &str) -> Result<FixedOffset, InvalidInputError> {
    let trimmed = value.trim();
    let invalid = || InvalidInputError::UtcOffset {
        value: trimmed.to_string(),
    };

    if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }

    let (sign, rest) = match trimmed.chars().next() {
        Some('+') => (1, &trimmed[1..]),
        Some('-') => (-1, &trimmed[1..]),
        _ => return Err(invalid()),
    };
    if !rest.is_ascii() {
        return Err(invalid());
    }

    let (hours, minutes) = if let Some((h, m)) = rest.split_once(':') {
        (h, m)
    } else if rest.len() == 4 {
        rest.split_at(2)
    } else {
        (rest, "0")
    };

    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if !(0..=18).contains(&hours) || !(0..60).contains(&minutes) {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

/// Error returned when user-supplied birth data fails validation.
#[derive(Debug, Clone, PartialEq)]
pub enum InvalidInputError {
    /// The date is not a valid `YYYY-MM-DD` calendar date.
    Date {
        /// The rejected input.
        value: String,
    },
    /// The time is not a valid `HH:MM[:SS]` time of day.
    Time {
        /// The rejected input.
        value: String,
    },
    /// The UTC offset is malformed or out of range.
    UtcOffset {
        /// The rejected input.
        value: String,
    },
    /// Latitude is non-finite or outside `[-90, 90]`.
    Latitude {
        /// The rejected value.
        value: f64,
    },
    /// Longitude is non-finite or outside `[-180, 180]`.
    Longitude {
        /// The rejected value.
        value: f64,
    },
}

impl std::fmt::Display for InvalidInputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Date { value } => write!(f, "invalid date '{value}': expected YYYY-MM-DD"),
            Self::Time { value } => write!(f, "invalid time '{value}': expected HH:MM[:SS]"),
            Self::UtcOffset { value } => {
                write!(f, "invalid UTC offset '{value}': expected ±HH:MM")
            }
            Self::Latitude { value } => {
                write!(f, "invalid latitude {value}: expected -90 to 90")
            }
            Self::Longitude { value } => {
                write!(f, "invalid longitude {value}: expected -180 to 180")
            }
        }
    }
}

impl std::error::Error for InvalidInputError {}

// ---------------------------------------------------------------------------
// Chart result
// ---------------------------------------------------------------------------

/// A planet placed in the chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanetPosition {
    pub planet: Planet,
    /// Geocentric ecliptic longitude in `[0, 360)`.
    pub longitude: f64,
    pub sign: ZodiacSign,
    /// House number, 1-12.
    pub house: u8,
}

impl PlanetPosition {
    /// Degrees past the start of the planet's sign, in `[0, 30)`.
    #[must_use]
    pub fn degree_in_sign(&self) -> f64 {
        self.longitude - self.sign.start_longitude()
    }
}

/// The starting boundary of one house.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseCusp {
    /// House number, 1-12.
    pub house: u8,
    /// Ecliptic longitude of the cusp in `[0, 360)`.
    pub longitude: f64,
    pub sign: ZodiacSign,
}

impl HouseCusp {
    #[must_use]
    pub fn degree_in_sign(&self) -> f64 {
        self.longitude - self.sign.start_longitude()
    }
}

/// An aspect between two distinct planets.
///
/// The pair is unordered; `first` always precedes `second` in [`Planet`]
/// order so equal pairs compare equal regardless of lookup direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aspect {
    pub first: Planet,
    pub second: Planet,
    pub kind: AspectKind,
    /// Shortest angular separation between the two planets, in `[0, 180]`.
    pub angle: f64,
    /// Deviation from the exact aspect angle.
    pub orb: f64,
}

impl Aspect {
    /// Returns `true` if this aspect joins `a` and `b` in either order.
    #[must_use]
    pub fn involves_pair(&self, a: Planet, b: Planet) -> bool {
        (self.first == a && self.second == b) || (self.first == b && self.second == a)
    }
}

/// A fully derived natal chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartResult {
    pub input: BirthInput,
    pub house_system: HouseSystem,
    /// One entry per [`Planet`], in [`Planet::all`] order.
    pub planets: Vec<PlanetPosition>,
    /// Twelve cusps in house order.
    pub cusps: Vec<HouseCusp>,
    pub aspects: Vec<Aspect>,
}

impl ChartResult {
    #[must_use]
    pub fn planet(&self, planet: Planet) -> Option<&PlanetPosition> {
        self.planets.iter().find(|p| p.planet == planet)
    }

    #[must_use]
    pub fn cusp(&self, house: u8) -> Option<&HouseCusp> {
        self.cusps.iter().find(|c| c.house == house)
    }

    /// Looks up the aspect between two planets, in either order.
    #[must_use]
    pub fn aspect_between(&self, a: Planet, b: Planet) -> Option<&Aspect> {
        self.aspects.iter().find(|aspect| aspect.involves_pair(a, b))
    }
}

/// A persisted chart together with its generated key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredChart {
    /// Generated chart ID (UUID).
    pub id: String,
    /// When the chart was stored (RFC 3339).
    pub created_at: String,
    pub chart: ChartResult,
}

/// Summary of a stored chart for listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSummary {
    pub id: String,
    pub created_at: String,
    /// Local birth time (RFC 3339 with offset).
    pub birth_datetime: String,
    pub place: Option<String>,
    pub sun_sign: Option<ZodiacSign>,
    pub moon_sign: Option<ZodiacSign>,
    pub ascendant_sign: Option<ZodiacSign>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_boundaries_use_floor() {
        assert_eq!(ZodiacSign::from_longitude(0.0), ZodiacSign::Aries);
        assert_eq!(ZodiacSign::from_longitude(29.999), ZodiacSign::Aries);
        assert_eq!(ZodiacSign::from_longitude(30.0), ZodiacSign::Taurus);
        assert_eq!(ZodiacSign::from_longitude(359.999), ZodiacSign::Pisces);
    }

    #[test]
    fn sign_is_periodic() {
        for step in 0..720 {
            let longitude = f64::from(step) * 0.5 + 0.25;
            assert_eq!(
                ZodiacSign::from_longitude(longitude),
                ZodiacSign::from_longitude(longitude + 360.0),
                "sign differs at {longitude}"
            );
            assert_eq!(
                ZodiacSign::from_longitude(longitude),
                ZodiacSign::from_longitude(longitude - 360.0),
                "sign differs at {longitude} - 360"
            );
        }
    }

    #[test]
    fn normalize_handles_negative_and_wrapped() {
        assert!((normalize_degrees(-10.0) - 350.0).abs() < 1e-12);
        assert!((normalize_degrees(370.0) - 10.0).abs() < 1e-12);
        assert!(normalize_degrees(-1e-18) < 360.0);
    }

    #[test]
    fn elements_cycle_from_aries() {
        assert_eq!(ZodiacSign::Aries.element(), Element::Fire);
        assert_eq!(ZodiacSign::Taurus.element(), Element::Earth);
        assert_eq!(ZodiacSign::Gemini.element(), Element::Air);
        assert_eq!(ZodiacSign::Cancer.element(), Element::Water);
        assert_eq!(ZodiacSign::Sagittarius.element(), Element::Fire);
        assert_eq!(ZodiacSign::Pisces.element(), Element::Water);
    }

    #[test]
    fn sign_index_matches_table() {
        for (i, sign) in ZODIAC_SIGNS.iter().enumerate() {
            assert_eq!(sign.index(), i);
            assert!(sign.color().starts_with('#'));
        }
    }

    #[test]
    fn parses_form_fields() {
        let input = BirthInput::parse("1991-06-18", "07:10", "+05:30", 10.522, 76.172).unwrap();
        assert_eq!(
            input.instant().to_rfc3339(),
            "1991-06-18T01:40:00+00:00".to_string()
        );
        assert_eq!(input.location().latitude, 10.522);
        assert!(input.place().is_none());
    }

    #[test]
    fn parses_offset_variants() {
        assert_eq!(parse_utc_offset("Z").unwrap().local_minus_utc(), 0);
        assert_eq!(parse_utc_offset("-0800").unwrap().local_minus_utc(), -8 * 3600);
        assert_eq!(parse_utc_offset("+2").unwrap().local_minus_utc(), 2 * 3600);
        assert_eq!(
            parse_utc_offset("+05:45").unwrap().local_minus_utc(),
            5 * 3600 + 45 * 60
        );
        assert!(parse_utc_offset("05:00").is_err());
        assert!(parse_utc_offset("+25:00").is_err());
    }

    #[test]
    fn rejects_non_ascii_offsets() {
        assert!(matches!(
            parse_utc_offset("+1\u{e9}1"),
            Err(InvalidInputError::UtcOffset { .. })
        ));
        assert!(matches!(
            BirthInput::parse("1991-06-18", "07:10", "-0\u{b0}5", 0.0, 0.0),
            Err(InvalidInputError::UtcOffset { .. })
        ));
        assert!(parse_utc_offset("+\u{661}\u{662}:00").is_err());
    }

    #[test]
    fn rejects_invalid_fields() {
        assert!(matches!(
            BirthInput::parse("1991-13-18", "07:10", "+00:00", 0.0, 0.0),
            Err(InvalidInputError::Date { .. })
        ));
        assert!(matches!(
            BirthInput::parse("1991-06-18", "7 am", "+00:00", 0.0, 0.0),
            Err(InvalidInputError::Time { .. })
        ));
        assert!(matches!(
            BirthInput::parse("1991-06-18", "07:10", "+00:00", 91.0, 0.0),
            Err(InvalidInputError::Latitude { .. })
        ));
        assert!(matches!(
            BirthInput::parse("1991-06-18", "07:10", "+00:00", 0.0, f64::NAN),
            Err(InvalidInputError::Longitude { .. })
        ));
    }

    #[test]
    fn blank_place_is_dropped() {
        let input = BirthInput::parse("2000-01-01", "12:00", "Z", 0.0, 0.0)
            .unwrap()
            .with_place("   ");
        assert!(input.place().is_none());
    }

    #[test]
    fn house_system_parses_snake_case() {
        assert_eq!(
            "whole_sign".parse::<HouseSystem>().unwrap(),
            HouseSystem::WholeSign
        );
        assert_eq!(HouseSystem::Porphyry.to_string(), "porphyry");
    }
}
