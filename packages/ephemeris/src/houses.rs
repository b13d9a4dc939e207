//! House cusps from the Swiss Ephemeris.
//!
//! Cusps are computed by `swe_houses_ex` for a Julian Day in UT and the
//! observer's geographic position. The Swiss Ephemeris keeps global state,
//! so calls are serialized behind [`SWISS_LOCK`].

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Datelike as _, Timelike as _, Utc};
use natal_chart_models::{GeoLocation, HouseSystem, normalize_degrees};
use swisseph::swe::{houses_ex, julday};
use swisseph::{AscMc, Cusp};

use crate::{Cusps, EphemerisError};

/// `SE_GREG_CAL`
const GREGORIAN_CALENDAR: i32 = 1;

/// Tropical zodiac, no sidereal or topocentric flags.
const HOUSE_FLAGS: i32 = 0;

static SWISS_LOCK: Mutex<()> = Mutex::new(());

/// Swiss Ephemeris house system code.
#[must_use]
pub const fn house_system_code(system: HouseSystem) -> u8 {
    match system {
        HouseSystem::Porphyry => b'O',
        HouseSystem::Equal => b'E',
        HouseSystem::WholeSign => b'W',
        HouseSystem::Placidus => b'P',
        HouseSystem::Koch => b'K',
        HouseSystem::Regiomontanus => b'R',
        HouseSystem::Campanus => b'C',
    }
}

/// Julian Day (UT) of an instant.
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub fn julian_day_ut(instant: DateTime<Utc>) -> f64 {
    let hours = f64::from(instant.hour())
        + f64::from(instant.minute()) / 60.0
        + (f64::from(instant.second()) + f64::from(instant.nanosecond()) / 1e9) / 3600.0;

    julday(
        instant.year(),
        instant.month() as i32,
        instant.day() as i32,
        hours,
        GREGORIAN_CALENDAR,
    )
}

/// The chart angles returned alongside the cusps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartAngles {
    pub ascendant: f64,
    pub midheaven: f64,
}

/// Computes the twelve cusps and the chart angles.
///
/// Systems that are undefined inside the polar circles (Placidus, Koch)
/// fall back to Porphyry inside the Swiss Ephemeris.
///
/// # Errors
///
/// Returns [`EphemerisError::MalformedResponse`] if the engine returns a
/// non-finite cusp.
pub fn house_cusps(
    instant: DateTime<Utc>,
    location: GeoLocation,
    system: HouseSystem,
) -> Result<(Cusps, ChartAngles), EphemerisError> {
    let jd = julian_day_ut(instant);

    let (raw_cusps, raw_angles) = {
        let _guard = SWISS_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        houses_ex(
            jd,
            HOUSE_FLAGS,
            location.latitude,
            location.longitude,
            i32::from(house_system_code(system)),
        )
    };

    let c = Cusp::from_array(raw_cusps);
    let a = AscMc::from_array(raw_angles);

    let cusps = [
        c.first, c.second, c.third, c.fourth, c.fifth, c.sixth, c.seventh, c.eighth, c.ninth,
        c.tenth, c.eleventh, c.twelfth,
    ];
    if let Some(bad) = cusps.iter().find(|cusp| !cusp.is_finite()) {
        return Err(EphemerisError::MalformedResponse {
            message: format!("Swiss Ephemeris returned cusp {bad} for {system} houses"),
        });
    }

    Ok((
        cusps.map(normalize_degrees),
        ChartAngles {
            ascendant: normalize_degrees(a.ascendant),
            midheaven: normalize_degrees(a.mc),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone as _;

    const ALL_SYSTEMS: [HouseSystem; 7] = [
        HouseSystem::Porphyry,
        HouseSystem::Equal,
        HouseSystem::WholeSign,
        HouseSystem::Placidus,
        HouseSystem::Koch,
        HouseSystem::Regiomontanus,
        HouseSystem::Campanus,
    ];

    fn j2000() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap()
    }

    fn arc(from: f64, to: f64) -> f64 {
        normalize_degrees(to - from)
    }

    #[test]
    fn julian_day_of_j2000() {
        assert!((julian_day_ut(j2000()) - 2_451_545.0).abs() < 1e-9);
    }

    #[test]
    fn midheaven_at_greenwich_j2000() {
        let greenwich = GeoLocation::new(51.4769, 0.0).unwrap();
        let (cusps, angles) = house_cusps(j2000(), greenwich, HouseSystem::Porphyry).unwrap();

        // RAMC 280.46°, so the MC sits near 279.6° of ecliptic longitude.
        assert!((angles.midheaven - 279.6).abs() < 0.5);
        assert!(arc(cusps[9], angles.midheaven).min(arc(angles.midheaven, cusps[9])) < 1e-6);
        assert!(arc(cusps[0], angles.ascendant).min(arc(angles.ascendant, cusps[0])) < 1e-6);
    }

    #[test]
    fn equal_houses_are_thirty_degrees_apart() {
        let location = GeoLocation::new(10.5, 76.17).unwrap();
        let instant = Utc.with_ymd_and_hms(1991, 6, 18, 1, 40, 0).unwrap();
        let (cusps, _) = house_cusps(instant, location, HouseSystem::Equal).unwrap();
        for pair in cusps.windows(2) {
            assert!((arc(pair[0], pair[1]) - 30.0).abs() < 1e-9);
        }
    }

    #[test]
    fn whole_sign_starts_at_sign_boundary() {
        let location = GeoLocation::new(-33.87, 151.21).unwrap();
        let (cusps, angles) = house_cusps(j2000(), location, HouseSystem::WholeSign).unwrap();
        let offset = cusps[0] % 30.0;
        assert!(offset.min(30.0 - offset) < 1e-9);
        assert!(arc(cusps[0], angles.ascendant) < 30.0);
    }

    #[test]
    fn every_system_wraps_once() {
        let instant = Utc.with_ymd_and_hms(1985, 11, 3, 21, 15, 0).unwrap();
        for latitude in [-60.0, -23.4, 0.0, 11.25, 45.0, 66.0] {
            let location = GeoLocation::new(latitude, -73.9).unwrap();
            for system in ALL_SYSTEMS {
                let (cusps, _) = house_cusps(instant, location, system).unwrap();
                let total: f64 = (0..12).map(|i| arc(cusps[i], cusps[(i + 1) % 12])).sum();
                assert!(
                    (total - 360.0).abs() < 1e-6,
                    "{system} at {latitude}: spans sum to {total}"
                );
            }
        }
    }

    #[test]
    fn codes_match_swiss_letters() {
        assert_eq!(house_system_code(HouseSystem::Placidus), b'P');
        assert_eq!(house_system_code(HouseSystem::Porphyry), b'O');
        assert_eq!(house_system_code(HouseSystem::WholeSign), b'W');
    }
}
