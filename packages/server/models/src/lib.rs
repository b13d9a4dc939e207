#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the natal chart server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the chart and forum types so the API contract can carry display
//! fields (glyphs, colours, elements) the frontend renders directly.

use natal_chart_models::{
    Aspect, AspectKind, BirthInput, ChartSummary, Element, HouseCusp, HouseSystem,
    InvalidInputError, Planet, PlanetPosition, StoredChart, ZodiacSign,
};
use natal_forum_models::{Post, Topic};
use serde::{Deserialize, Serialize};

/// Default page size for the chart listing.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Largest page size the chart listing accepts.
pub const MAX_PAGE_SIZE: u32 = 500;

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

/// Error body returned with every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub error: String,
    /// Set for provider failures: whether the client should try again.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
}

impl ApiError {
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            retryable: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Signs
// ---------------------------------------------------------------------------

/// One row of the static sign table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSign {
    pub sign: ZodiacSign,
    pub index: usize,
    pub start_longitude: f64,
    pub element: Element,
    pub color: String,
    pub glyph: String,
}

impl From<ZodiacSign> for ApiSign {
    fn from(sign: ZodiacSign) -> Self {
        Self {
            sign,
            index: sign.index(),
            start_longitude: sign.start_longitude(),
            element: sign.element(),
            color: sign.color().to_string(),
            glyph: sign.glyph().to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Charts
// ---------------------------------------------------------------------------

/// Birth form submission for `POST /api/charts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartRequest {
    /// `YYYY-MM-DD`.
    pub date: String,
    /// `HH:MM` or `HH:MM:SS`, local time.
    pub time: String,
    /// Offset from UTC at the birth place, e.g. `+05:30`.
    pub utc_offset: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Display label for the birth place.
    #[serde(default)]
    pub place: Option<String>,
}

impl ChartRequest {
    /// Validates the form into a [`BirthInput`].
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInputError`] for the first invalid field.
    pub fn to_birth_input(&self) -> Result<BirthInput, InvalidInputError> {
        let input = BirthInput::parse(
            &self.date,
            &self.time,
            &self.utc_offset,
            self.latitude,
            self.longitude,
        )?;
        Ok(match &self.place {
            Some(place) => input.with_place(place),
            None => input,
        })
    }
}

/// Query parameters for `GET /api/charts`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartListParams {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl ChartListParams {
    /// Page size, defaulted and clamped to [`MAX_PAGE_SIZE`].
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE)
    }

    #[must_use]
    pub fn offset(&self) -> u32 {
        self.offset.unwrap_or(0)
    }
}

/// A page of stored chart summaries.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiChartList {
    pub charts: Vec<ChartSummary>,
    /// Total number of stored charts.
    pub total: u64,
}

/// Birth data echoed back with a chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiBirth {
    /// Local birth time with offset (RFC 3339).
    pub datetime: String,
    pub latitude: f64,
    pub longitude: f64,
    pub place: Option<String>,
}

impl From<&BirthInput> for ApiBirth {
    fn from(input: &BirthInput) -> Self {
        let location = input.location();
        Self {
            datetime: input.datetime().to_rfc3339(),
            latitude: location.latitude,
            longitude: location.longitude,
            place: input.place().map(str::to_string),
        }
    }
}

/// A planet placement with display fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPlanet {
    pub planet: Planet,
    pub glyph: String,
    pub longitude: f64,
    pub degree_in_sign: f64,
    pub sign: ZodiacSign,
    pub sign_glyph: String,
    pub element: Element,
    pub color: String,
    pub house: u8,
}

impl From<&PlanetPosition> for ApiPlanet {
    fn from(position: &PlanetPosition) -> Self {
        Self {
            planet: position.planet,
            glyph: position.planet.glyph().to_string(),
            longitude: position.longitude,
            degree_in_sign: position.degree_in_sign(),
            sign: position.sign,
            sign_glyph: position.sign.glyph().to_string(),
            element: position.sign.element(),
            color: position.sign.color().to_string(),
            house: position.house,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCusp {
    pub house: u8,
    pub longitude: f64,
    pub degree_in_sign: f64,
    pub sign: ZodiacSign,
    pub sign_glyph: String,
}

impl From<&HouseCusp> for ApiCusp {
    fn from(cusp: &HouseCusp) -> Self {
        Self {
            house: cusp.house,
            longitude: cusp.longitude,
            degree_in_sign: cusp.degree_in_sign(),
            sign: cusp.sign,
            sign_glyph: cusp.sign.glyph().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAspect {
    pub first: Planet,
    pub second: Planet,
    pub kind: AspectKind,
    /// Exact angle of the aspect type.
    pub exact_angle: f64,
    /// Actual separation between the planets.
    pub angle: f64,
    pub orb: f64,
}

impl From<&Aspect> for ApiAspect {
    fn from(aspect: &Aspect) -> Self {
        Self {
            first: aspect.first,
            second: aspect.second,
            kind: aspect.kind,
            exact_angle: aspect.kind.angle(),
            angle: aspect.angle,
            orb: aspect.orb,
        }
    }
}

/// A stored chart as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiChart {
    pub id: String,
    pub created_at: String,
    pub birth: ApiBirth,
    pub house_system: HouseSystem,
    pub planets: Vec<ApiPlanet>,
    pub cusps: Vec<ApiCusp>,
    pub aspects: Vec<ApiAspect>,
}

impl From<StoredChart> for ApiChart {
    fn from(stored: StoredChart) -> Self {
        let chart = &stored.chart;
        Self {
            birth: ApiBirth::from(&chart.input),
            house_system: chart.house_system,
            planets: chart.planets.iter().map(ApiPlanet::from).collect(),
            cusps: chart.cusps.iter().map(ApiCusp::from).collect(),
            aspects: chart.aspects.iter().map(ApiAspect::from).collect(),
            id: stored.id,
            created_at: stored.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Forum
// ---------------------------------------------------------------------------

/// A topic together with its posts.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTopicDetail {
    pub topic: Topic,
    pub posts: Vec<Post>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chart_request_uses_camel_case() {
        let request: ChartRequest = serde_json::from_str(
            r#"{"date":"1991-06-18","time":"07:10","utcOffset":"+05:30",
                "latitude":11.25,"longitude":75.78,"place":"Calicut"}"#,
        )
        .unwrap();
        let input = request.to_birth_input().unwrap();
        assert_eq!(input.place(), Some("Calicut"));
        assert_eq!(input.instant().to_rfc3339(), "1991-06-18T01:40:00+00:00");
    }

    #[test]
    fn chart_request_rejects_bad_latitude() {
        let request = ChartRequest {
            date: "1991-06-18".to_string(),
            time: "07:10".to_string(),
            utc_offset: "+05:30".to_string(),
            latitude: 91.0,
            longitude: 0.0,
            place: None,
        };
        assert!(matches!(
            request.to_birth_input(),
            Err(InvalidInputError::Latitude { .. })
        ));
    }

    #[test]
    fn list_params_clamp() {
        let params = ChartListParams {
            limit: Some(10_000),
            offset: None,
        };
        assert_eq!(params.limit(), MAX_PAGE_SIZE);
        assert_eq!(params.offset(), 0);
        assert_eq!(ChartListParams::default().limit(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn sign_table_row() {
        let row = ApiSign::from(ZodiacSign::Leo);
        assert_eq!(row.index, 4);
        assert_eq!(row.element, Element::Fire);
        assert!(row.color.starts_with('#'));
    }

    #[test]
    fn error_omits_missing_retryable() {
        let json = serde_json::to_string(&ApiError::new("bad date")).unwrap();
        assert_eq!(json, r#"{"error":"bad date"}"#);
    }
}
