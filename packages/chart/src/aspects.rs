//! Aspect detection between planet pairs.

use natal_chart_models::{Aspect, AspectKind, Planet, PlanetPosition, normalize_degrees};

/// Maximum allowed deviation (degrees) from each aspect's exact angle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AspectOrbs {
    pub conjunction: f64,
    pub sextile: f64,
    pub square: f64,
    pub trine: f64,
    pub opposition: f64,
}

/// ±8° for every major aspect.
pub const DEFAULT_ASPECT_ORBS: AspectOrbs = AspectOrbs {
    conjunction: 8.0,
    sextile: 8.0,
    square: 8.0,
    trine: 8.0,
    opposition: 8.0,
};

impl AspectOrbs {
    #[must_use]
    pub const fn orb(&self, kind: AspectKind) -> f64 {
        match kind {
            AspectKind::Conjunction => self.conjunction,
            AspectKind::Sextile => self.sextile,
            AspectKind::Square => self.square,
            AspectKind::Trine => self.trine,
            AspectKind::Opposition => self.opposition,
        }
    }
}

impl Default for AspectOrbs {
    fn default() -> Self {
        DEFAULT_ASPECT_ORBS
    }
}

/// Shortest angular distance between two longitudes, in `[0, 180]`.
#[must_use]
pub fn angular_separation(a: f64, b: f64) -> f64 {
    let diff = normalize_degrees(a - b);
    diff.min(360.0 - diff)
}

/// Finds the closest qualifying aspect between two planets, if any.
///
/// Aspect kinds are checked in ascending angle order and a later kind
/// only replaces an earlier one when strictly closer, so ties go to the
/// lower angle. The returned pair is ordered by [`Planet`].
#[must_use]
pub fn detect_aspect(
    a: Planet,
    longitude_a: f64,
    b: Planet,
    longitude_b: f64,
    orbs: &AspectOrbs,
) -> Option<Aspect> {
    if a == b {
        return None;
    }

    let angle = angular_separation(longitude_a, longitude_b);
    let mut best: Option<(AspectKind, f64)> = None;

    for &kind in AspectKind::all() {
        let deviation = (angle - kind.angle()).abs();
        if deviation > orbs.orb(kind) {
            continue;
        }
        if best.is_none_or(|(_, closest)| deviation < closest) {
            best = Some((kind, deviation));
        }
    }

    let (first, second) = if a < b { (a, b) } else { (b, a) };
    best.map(|(kind, orb)| Aspect {
        first,
        second,
        kind,
        angle,
        orb,
    })
}

/// Detects aspects across every unordered pair of `positions`.
#[must_use]
pub fn detect_aspects(positions: &[PlanetPosition], orbs: &AspectOrbs) -> Vec<Aspect> {
    let mut aspects = Vec::new();

    for (i, p1) in positions.iter().enumerate() {
        for p2 in &positions[i + 1..] {
            if let Some(aspect) =
                detect_aspect(p1.planet, p1.longitude, p2.planet, p2.longitude, orbs)
            {
                aspects.push(aspect);
            }
        }
    }

    aspects
}

#[cfg(test)]
mod tests {
    use super::*;
    use natal_chart_models::ZodiacSign;

    fn position(planet: Planet, longitude: f64) -> PlanetPosition {
        PlanetPosition {
            planet,
            longitude,
            sign: ZodiacSign::from_longitude(longitude),
            house: 1,
        }
    }

    #[test]
    fn exact_opposition() {
        let aspect =
            detect_aspect(Planet::Sun, 10.0, Planet::Moon, 190.0, &DEFAULT_ASPECT_ORBS).unwrap();
        assert_eq!(aspect.kind, AspectKind::Opposition);
        assert!(aspect.orb.abs() < 1e-12);
        assert!((aspect.angle - 180.0).abs() < 1e-12);
    }

    #[test]
    fn exact_sextile() {
        let aspect =
            detect_aspect(Planet::Sun, 10.0, Planet::Venus, 70.0, &DEFAULT_ASPECT_ORBS).unwrap();
        assert_eq!(aspect.kind, AspectKind::Sextile);
        assert!(aspect.orb.abs() < 1e-12);
    }

    #[test]
    fn detection_is_symmetric() {
        let forward = detect_aspect(Planet::Mars, 355.0, Planet::Saturn, 92.5, &DEFAULT_ASPECT_ORBS);
        let reverse = detect_aspect(Planet::Saturn, 92.5, Planet::Mars, 355.0, &DEFAULT_ASPECT_ORBS);
        assert_eq!(forward, reverse);
        let aspect = forward.unwrap();
        assert_eq!(aspect.first, Planet::Mars);
        assert_eq!(aspect.kind, AspectKind::Square);
        assert!((aspect.orb - 7.5).abs() < 1e-9);
    }

    #[test]
    fn separation_wraps_around_aries() {
        assert!((angular_separation(359.0, 1.0) - 2.0).abs() < 1e-12);
        let aspect =
            detect_aspect(Planet::Sun, 359.0, Planet::Mercury, 1.0, &DEFAULT_ASPECT_ORBS).unwrap();
        assert_eq!(aspect.kind, AspectKind::Conjunction);
    }

    #[test]
    fn outside_every_orb_is_none() {
        assert!(detect_aspect(Planet::Sun, 0.0, Planet::Moon, 35.0, &DEFAULT_ASPECT_ORBS).is_none());
        assert!(
            detect_aspect(Planet::Sun, 0.0, Planet::Moon, 150.0, &DEFAULT_ASPECT_ORBS).is_none()
        );
    }

    #[test]
    fn orb_boundary_is_inclusive() {
        let aspect =
            detect_aspect(Planet::Sun, 0.0, Planet::Moon, 8.0, &DEFAULT_ASPECT_ORBS).unwrap();
        assert_eq!(aspect.kind, AspectKind::Conjunction);
    }

    #[test]
    fn ties_go_to_lower_angle() {
        let wide = AspectOrbs {
            conjunction: 30.0,
            sextile: 30.0,
            ..DEFAULT_ASPECT_ORBS
        };
        let aspect = detect_aspect(Planet::Sun, 0.0, Planet::Moon, 30.0, &wide).unwrap();
        assert_eq!(aspect.kind, AspectKind::Conjunction);
    }

    #[test]
    fn same_planet_has_no_aspect() {
        assert!(detect_aspect(Planet::Sun, 0.0, Planet::Sun, 0.0, &DEFAULT_ASPECT_ORBS).is_none());
    }

    #[test]
    fn every_pair_considered_once() {
        // Ten planets bunched within 5° form all 45 conjunctions.
        let positions: Vec<_> = Planet::all()
            .iter()
            .enumerate()
            .map(|(i, &planet)| position(planet, 100.0 + f64::from(u8::try_from(i).unwrap()) * 0.5))
            .collect();
        let aspects = detect_aspects(&positions, &DEFAULT_ASPECT_ORBS);
        assert_eq!(aspects.len(), 45);
        assert!(aspects.iter().all(|a| a.first < a.second));
    }
}
