//! JPL Horizons ephemeris provider.
//!
//! Planet longitudes come from the Horizons REST API as observer-table
//! quantity 31 (observer-centred ecliptic longitude/latitude) from the
//! geocentre (`500@399`). One request is made per body, concurrently.
//! Queries are made in Terrestrial Time using the injected leap-second
//! table. House cusps come from the Swiss Ephemeris via [`houses`].
//!
//! API docs: <https://ssd-api.jpl.nasa.gov/doc/horizons.html>

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use natal_chart_models::{GeoLocation, HouseSystem, Planet, normalize_degrees};
use serde::Deserialize;

use crate::timescale::LeapSecondTable;
use crate::{Cusps, EphemerisError, EphemerisProvider, Longitudes, houses, retry};

/// Public Horizons API endpoint.
pub const DEFAULT_HORIZONS_URL: &str = "https://ssd.jpl.nasa.gov/api/horizons.api";

/// Per-request HTTP timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Horizons calendar format, to the millisecond.
const HORIZONS_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// JSON envelope returned by the API. The ephemeris itself is plain text
/// inside `result`.
#[derive(Debug, Deserialize)]
struct HorizonsResponse {
    result: Option<String>,
    error: Option<String>,
}

/// Ephemeris provider backed by JPL Horizons.
#[derive(Debug, Clone)]
pub struct HorizonsProvider {
    client: reqwest::Client,
    base_url: String,
    house_system: HouseSystem,
    leap_seconds: Arc<LeapSecondTable>,
}

impl HorizonsProvider {
    /// Creates a provider for `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`EphemerisError::Http`] if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        house_system: HouseSystem,
        leap_seconds: Arc<LeapSecondTable>,
    ) -> Result<Self, EphemerisError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("natal-chart/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            house_system,
            leap_seconds,
        })
    }

    /// Horizons request parameters for `planet` at the UTC `instant`.
    fn query_params(&self, planet: Planet, instant: DateTime<Utc>) -> Vec<(&'static str, String)> {
        query_params(planet, self.leap_seconds.terrestrial_time(instant))
    }
}

#[async_trait::async_trait]
impl EphemerisProvider for HorizonsProvider {
    fn house_system(&self) -> HouseSystem {
        self.house_system
    }

    async fn longitudes(
        &self,
        instant: DateTime<Utc>,
        _location: GeoLocation,
    ) -> Result<Longitudes, EphemerisError> {
        log::debug!("Querying Horizons for {instant}");
        let mut tasks = tokio::task::JoinSet::new();

        for &planet in Planet::all() {
            let client = self.client.clone();
            let url = self.base_url.clone();
            let params = self.query_params(planet, instant);

            tasks.spawn(async move {
                let response: HorizonsResponse =
                    retry::send_json(|| client.get(&url).query(&params)).await?;
                let longitude = response_longitude(response)?;
                Ok::<_, EphemerisError>((planet, longitude))
            });
        }

        let mut longitudes = Longitudes::new();
        while let Some(joined) = tasks.join_next().await {
            let (planet, longitude) = joined.map_err(|e| EphemerisError::Service {
                message: format!("Horizons query task failed: {e}"),
            })??;
            log::trace!("{planet}: {longitude:.6}");
            longitudes.insert(planet, longitude);
        }

        Ok(longitudes)
    }

    async fn cusps(
        &self,
        instant: DateTime<Utc>,
        location: GeoLocation,
    ) -> Result<Cusps, EphemerisError> {
        let (cusps, _) = houses::house_cusps(instant, location, self.house_system)?;
        Ok(cusps)
    }
}

/// Horizons `COMMAND` identifier for a body.
#[must_use]
pub const fn command_id(planet: Planet) -> &'static str {
    match planet {
        Planet::Sun => "10",
        Planet::Moon => "301",
        Planet::Mercury => "199",
        Planet::Venus => "299",
        Planet::Mars => "499",
        Planet::Jupiter => "599",
        Planet::Saturn => "699",
        Planet::Uranus => "799",
        Planet::Neptune => "899",
        Planet::Pluto => "999",
    }
}

fn query_params(planet: Planet, tt: NaiveDateTime) -> Vec<(&'static str, String)> {
    let start = tt.format(HORIZONS_TIME_FORMAT).to_string();
    let stop = (tt + chrono::Duration::minutes(1))
        .format(HORIZONS_TIME_FORMAT)
        .to_string();

    vec![
        ("format", "json".to_string()),
        ("COMMAND", format!("'{}'", command_id(planet))),
        ("OBJ_DATA", "'NO'".to_string()),
        ("MAKE_EPHEM", "'YES'".to_string()),
        ("EPHEM_TYPE", "'OBSERVER'".to_string()),
        ("CENTER", "'500@399'".to_string()),
        ("TIME_TYPE", "'TT'".to_string()),
        ("START_TIME", format!("'{start}'")),
        ("STOP_TIME", format!("'{stop}'")),
        ("STEP_SIZE", "'1m'".to_string()),
        ("QUANTITIES", "'31'".to_string()),
        ("CSV_FORMAT", "'YES'".to_string()),
    ]
}

fn response_longitude(response: HorizonsResponse) -> Result<f64, EphemerisError> {
    if let Some(message) = response.error {
        return Err(EphemerisError::Service { message });
    }
    let result = response.result.ok_or_else(|| EphemerisError::MalformedResponse {
        message: "response has no result".to_string(),
    })?;
    parse_observer_longitude(&result)
}

/// Extracts the ecliptic longitude from the first row of a CSV observer
/// table (`$$SOE` .. `$$EOE`).
///
/// Rows look like `1991-Jun-18 01:40, , , 86.3456789, -0.0001234,`; the
/// first field is the date and the presence flags may be blank, so the
/// longitude is the first numeric field after the date.
///
/// # Errors
///
/// Returns [`EphemerisError::MalformedResponse`] if the markers are
/// missing, the table is empty, or no finite longitude is present.
pub fn parse_observer_longitude(result: &str) -> Result<f64, EphemerisError> {
    let malformed = |message: &str| EphemerisError::MalformedResponse {
        message: message.to_string(),
    };

    let mut lines = result.lines().skip_while(|line| !line.contains("$$SOE"));
    if lines.next().is_none() {
        return Err(malformed("missing $$SOE marker"));
    }

    let row = lines
        .map(str::trim)
        .find(|line| !line.is_empty())
        .filter(|line| !line.contains("$$EOE"))
        .ok_or_else(|| malformed("empty ephemeris table"))?;

    let longitude = row
        .split(',')
        .skip(1)
        .find_map(|field| field.trim().parse::<f64>().ok())
        .ok_or_else(|| malformed("no longitude column in ephemeris row"))?;

    if !longitude.is_finite() {
        return Err(malformed("non-finite longitude"));
    }

    Ok(normalize_degrees(longitude))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone as _;

    const SAMPLE_RESULT: &str = "\
*******************************************************************************
Ephemeris / API_USER Tue Jun 18 01:40:00 1991 Pasadena, USA      / Horizons
*******************************************************************************
 Date__(UT)__HR:MN, , , ObsEcLon, ObsEcLat,
***************************************************************************
$$SOE
 1991-Jun-18 01:40, , ,  86.3456789,  -0.0001234,
 1991-Jun-18 01:41, , ,  86.3463690,  -0.0001234,
$$EOE
***************************************************************************
";

    #[test]
    fn parses_first_row_longitude() {
        let longitude = parse_observer_longitude(SAMPLE_RESULT).unwrap();
        assert!((longitude - 86.345_678_9).abs() < 1e-9);
    }

    #[test]
    fn skips_presence_flags() {
        let result = "$$SOE\n 2024-Mar-20 03:06,*,m, 359.9999000, 5.1,\n$$EOE\n";
        let longitude = parse_observer_longitude(result).unwrap();
        assert!((longitude - 359.9999).abs() < 1e-9);
    }

    #[test]
    fn missing_markers_are_malformed() {
        let err = parse_observer_longitude("No ephemeris for target").unwrap_err();
        assert!(matches!(err, EphemerisError::MalformedResponse { .. }));

        let err = parse_observer_longitude("$$SOE\n$$EOE\n").unwrap_err();
        assert!(matches!(err, EphemerisError::MalformedResponse { .. }));
    }

    #[test]
    fn service_errors_surface_message() {
        let response = HorizonsResponse {
            result: None,
            error: Some("Cannot interpret date".to_string()),
        };
        let err = response_longitude(response).unwrap_err();
        assert!(matches!(err, EphemerisError::Service { ref message } if message.contains("date")));
    }

    fn param(params: &[(&'static str, String)], key: &str) -> String {
        params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.clone())
            .unwrap()
    }

    fn provider(leap_seconds: LeapSecondTable) -> HorizonsProvider {
        HorizonsProvider::new(
            "https://127.0.0.1:9/horizons.api",
            HouseSystem::Equal,
            Arc::new(leap_seconds),
        )
        .unwrap()
    }

    #[test]
    fn queries_in_terrestrial_time() {
        let instant = Utc.with_ymd_and_hms(1991, 6, 18, 1, 40, 0).unwrap();
        let params = provider(LeapSecondTable::embedded()).query_params(Planet::Moon, instant);

        // TAI-UTC was 26 s in mid-1991, so TT runs 58.184 s ahead.
        assert_eq!(param(&params, "COMMAND"), "'301'");
        assert_eq!(param(&params, "TIME_TYPE"), "'TT'");
        assert_eq!(param(&params, "START_TIME"), "'1991-06-18 01:40:58.184'");
        assert_eq!(param(&params, "STOP_TIME"), "'1991-06-18 01:41:58.184'");
        assert_eq!(param(&params, "QUANTITIES"), "'31'");
    }

    #[test]
    fn stale_leap_seconds_change_the_queried_instant() {
        let stale = LeapSecondTable::parse(
            "41317.0    1  1 1972       10\n",
            crate::registry::LeapSecondFormat::IersDat,
            crate::timescale::TableOrigin::Cached,
        )
        .unwrap();
        let instant = Utc.with_ymd_and_hms(2020, 3, 1, 12, 0, 0).unwrap();

        let current = provider(LeapSecondTable::embedded()).query_params(Planet::Sun, instant);
        let stale = provider(stale).query_params(Planet::Sun, instant);

        assert_eq!(param(&current, "START_TIME"), "'2020-03-01 12:01:09.184'");
        assert_eq!(param(&stale, "START_TIME"), "'2020-03-01 12:00:42.184'");
    }

    #[tokio::test]
    async fn cusps_come_from_the_configured_system() {
        let provider = provider(LeapSecondTable::embedded());
        assert_eq!(provider.house_system(), HouseSystem::Equal);

        let instant = Utc.with_ymd_and_hms(1991, 6, 18, 1, 40, 0).unwrap();
        let location = GeoLocation::new(10.5, 76.17).unwrap();

        let cusps = provider.cusps(instant, location).await.unwrap();
        let spacing = normalize_degrees(cusps[1] - cusps[0]);
        assert!((spacing - 30.0).abs() < 1e-9);
    }
}
