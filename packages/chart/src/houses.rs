//! Circular house assignment and cusp validation.

use natal_chart_models::normalize_degrees;
use natal_ephemeris::Cusps;

/// Tolerance when checking that cusp spans add up to one circle.
const FULL_CIRCLE_TOLERANCE: f64 = 1e-6;

/// Returns the house (1-12) whose span `[cusp[i], cusp[i + 1])` contains
/// `longitude`, walking the circle from the first cusp.
///
/// A longitude exactly on a cusp belongs to the house starting there.
/// Assumes `cusps` wrap the circle once in house order; see
/// [`cusps_wrap_once`].
#[must_use]
pub fn house_for(longitude: f64, cusps: &Cusps) -> u8 {
    let origin = cusps[0];
    let offset = normalize_degrees(longitude - origin);

    (1u8..)
        .zip(cusps.iter())
        .take_while(|&(_, &cusp)| normalize_degrees(cusp - origin) <= offset)
        .last()
        .map_or(1, |(house, _)| house)
}

/// Whether consecutive cusp spans sum to exactly one full circle.
#[must_use]
pub fn cusps_wrap_once(cusps: &Cusps) -> bool {
    if cusps.iter().any(|c| !c.is_finite()) {
        return false;
    }

    let total: f64 = (0..cusps.len())
        .map(|i| normalize_degrees(cusps[(i + 1) % cusps.len()] - cusps[i]))
        .sum();

    (total - 360.0).abs() < FULL_CIRCLE_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn equal_cusps(start: f64) -> Cusps {
        let mut cusps = [0.0; 12];
        for (i, cusp) in (0u8..).zip(cusps.iter_mut()) {
            *cusp = normalize_degrees(start + f64::from(i) * 30.0);
        }
        cusps
    }

    #[test]
    fn planet_on_cusp_starts_that_house() {
        let cusps = equal_cusps(15.0);
        assert_eq!(house_for(15.0, &cusps), 1);
        assert_eq!(house_for(45.0, &cusps), 2);
        assert_eq!(house_for(345.0, &cusps), 12);
    }

    #[test]
    fn wraps_past_aries() {
        let cusps = equal_cusps(300.0);
        assert_eq!(house_for(310.0, &cusps), 1);
        assert_eq!(house_for(359.9, &cusps), 2);
        assert_eq!(house_for(0.0, &cusps), 3);
        assert_eq!(house_for(299.9, &cusps), 12);
    }

    #[test]
    fn unequal_houses() {
        let cusps = [
            100.0, 130.0, 160.0, 190.0, 220.0, 250.0, 280.0, 313.3, 346.7, 10.0, 40.0, 70.0,
        ];
        assert_eq!(house_for(5.0, &cusps), 9);
        assert_eq!(house_for(10.0, &cusps), 10);
        assert_eq!(house_for(99.999, &cusps), 12);
        assert_eq!(house_for(100.0, &cusps), 1);
    }

    #[test]
    fn every_longitude_lands_in_exactly_one_house() {
        let cusps = equal_cusps(347.25);
        let mut counts = [0u32; 12];
        for tenth in 0..3600u16 {
            let longitude = f64::from(tenth) / 10.0;
            let house = house_for(longitude, &cusps);
            assert!((1..=12).contains(&house));
            counts[usize::from(house - 1)] += 1;
        }
        assert!(counts.iter().all(|&n| n == 300), "uneven partition: {counts:?}");
    }

    #[test]
    fn detects_non_wrapping_cusps() {
        assert!(cusps_wrap_once(&equal_cusps(0.0)));

        let mut reversed = equal_cusps(0.0);
        reversed.reverse();
        assert!(!cusps_wrap_once(&reversed));

        let mut broken = equal_cusps(0.0);
        broken[4] = f64::NAN;
        assert!(!cusps_wrap_once(&broken));

        assert!(!cusps_wrap_once(&[42.0; 12]));
    }
}
