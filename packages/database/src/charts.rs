//! Chart record CRUD.

use std::str::FromStr;

use chrono::DateTime;
use moosicbox_json_utils::database::ToValue as _;
use natal_chart_models::{
    Aspect, BirthInput, ChartResult, ChartSummary, GeoLocation, HouseCusp, PlanetPosition,
    StoredChart,
};
use switchy_database::{Database, DatabaseValue, Row};

use crate::DbError;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn bad_column(column: &str, detail: impl std::fmt::Debug) -> DbError {
    DbError::Conversion {
        message: format!("column {column}: {detail:?}"),
    }
}

fn parse_enum<T: FromStr>(column: &str, value: &str) -> Result<T, DbError> {
    value
        .parse()
        .map_err(|_| bad_column(column, format!("unknown value '{value}'")))
}

fn text_column(row: &Row, column: &str) -> Result<String, DbError> {
    row.to_value::<String>(column)
        .map_err(|e| bad_column(column, e))
}

fn real_column(row: &Row, column: &str) -> Result<f64, DbError> {
    row.to_value::<f64>(column).map_err(|e| bad_column(column, e))
}

fn house_column(row: &Row) -> Result<u8, DbError> {
    let house: i64 = row.to_value("house").map_err(|e| bad_column("house", e))?;
    u8::try_from(house).map_err(|e| bad_column("house", e))
}

fn id_param(id: &str) -> DatabaseValue {
    DatabaseValue::String(id.to_string())
}

fn ordinal(index: usize) -> DatabaseValue {
    DatabaseValue::Int32(i32::try_from(index).unwrap_or(i32::MAX))
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Persists a chart and returns its generated ID.
///
/// The `charts` row and its planets, cusps, and aspects are written in one
/// transaction, so a failed store leaves nothing behind.
///
/// # Errors
///
/// Returns [`DbError`] if any insert fails or the transaction cannot be
/// committed.
pub async fn store_chart(db: &dyn Database, chart: &ChartResult) -> Result<String, DbError> {
    let id = uuid::Uuid::new_v4().to_string();

    let txn = db.begin_transaction().await?;

    if let Err(e) = write_chart(txn.as_ref(), &id, chart).await {
        log::error!("Failed to store chart {id}: {e}");
        if let Err(rollback) = txn.rollback().await {
            log::warn!("Rollback of chart {id} failed: {rollback}");
        }
        return Err(e);
    }

    txn.commit().await?;

    log::debug!("Stored chart {id}");
    Ok(id)
}

async fn write_chart(db: &dyn Database, id: &str, chart: &ChartResult) -> Result<(), DbError> {
    let input = &chart.input;
    let location = input.location();

    db.exec_raw_params(
        "INSERT INTO charts
            (id, created_at, birth_datetime, latitude, longitude, place, house_system)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
        &[
            id_param(id),
            DatabaseValue::String(chrono::Utc::now().to_rfc3339()),
            DatabaseValue::String(input.datetime().to_rfc3339()),
            DatabaseValue::Real64(location.latitude),
            DatabaseValue::Real64(location.longitude),
            input
                .place()
                .map_or(DatabaseValue::Null, |p| DatabaseValue::String(p.to_string())),
            DatabaseValue::String(chart.house_system.to_string()),
        ],
    )
    .await?;

    write_children(db, id, chart).await
}

async fn write_children(db: &dyn Database, id: &str, chart: &ChartResult) -> Result<(), DbError> {
    for (index, position) in chart.planets.iter().enumerate() {
        db.exec_raw_params(
            "INSERT INTO chart_planets (chart_id, position, planet, longitude, sign, house)
             VALUES ($1, $2, $3, $4, $5, $6)",
            &[
                id_param(id),
                ordinal(index),
                DatabaseValue::String(position.planet.to_string()),
                DatabaseValue::Real64(position.longitude),
                DatabaseValue::String(position.sign.to_string()),
                DatabaseValue::Int32(i32::from(position.house)),
            ],
        )
        .await?;
    }

    for cusp in &chart.cusps {
        db.exec_raw_params(
            "INSERT INTO chart_cusps (chart_id, house, longitude, sign)
             VALUES ($1, $2, $3, $4)",
            &[
                id_param(id),
                DatabaseValue::Int32(i32::from(cusp.house)),
                DatabaseValue::Real64(cusp.longitude),
                DatabaseValue::String(cusp.sign.to_string()),
            ],
        )
        .await?;
    }

    for (index, aspect) in chart.aspects.iter().enumerate() {
        db.exec_raw_params(
            "INSERT INTO chart_aspects (chart_id, position, first, second, kind, angle, orb)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
            &[
                id_param(id),
                ordinal(index),
                DatabaseValue::String(aspect.first.to_string()),
                DatabaseValue::String(aspect.second.to_string()),
                DatabaseValue::String(aspect.kind.to_string()),
                DatabaseValue::Real64(aspect.angle),
                DatabaseValue::Real64(aspect.orb),
            ],
        )
        .await?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Fetch
// ---------------------------------------------------------------------------

/// Loads a stored chart by ID.
///
/// Returns `None` if no chart has that ID.
///
/// # Errors
///
/// Returns [`DbError`] if a query fails or a stored value cannot be
/// converted back.
pub async fn fetch_chart(db: &dyn Database, id: &str) -> Result<Option<StoredChart>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT id, created_at, birth_datetime, latitude, longitude, place, house_system
             FROM charts WHERE id = $1",
            &[id_param(id)],
        )
        .await?;

    let Some(row) = rows.first() else {
        return Ok(None);
    };

    let birth = text_column(row, "birth_datetime")?;
    let datetime =
        DateTime::parse_from_rfc3339(&birth).map_err(|e| bad_column("birth_datetime", e))?;
    let location = GeoLocation {
        latitude: real_column(row, "latitude")?,
        longitude: real_column(row, "longitude")?,
    };

    let mut input =
        BirthInput::new(datetime, location).map_err(|e| bad_column("latitude/longitude", e))?;
    if let Some(place) = row.to_value::<Option<String>>("place").unwrap_or(None) {
        input = input.with_place(place);
    }

    let chart = ChartResult {
        input,
        house_system: parse_enum("house_system", &text_column(row, "house_system")?)?,
        planets: fetch_planets(db, id).await?,
        cusps: fetch_cusps(db, id).await?,
        aspects: fetch_aspects(db, id).await?,
    };

    Ok(Some(StoredChart {
        id: text_column(row, "id")?,
        created_at: text_column(row, "created_at")?,
        chart,
    }))
}

async fn fetch_planets(db: &dyn Database, id: &str) -> Result<Vec<PlanetPosition>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT planet, longitude, sign, house FROM chart_planets
             WHERE chart_id = $1 ORDER BY position",
            &[id_param(id)],
        )
        .await?;

    rows.iter()
        .map(|row| {
            Ok(PlanetPosition {
                planet: parse_enum("planet", &text_column(row, "planet")?)?,
                longitude: real_column(row, "longitude")?,
                sign: parse_enum("sign", &text_column(row, "sign")?)?,
                house: house_column(row)?,
            })
        })
        .collect()
}

async fn fetch_cusps(db: &dyn Database, id: &str) -> Result<Vec<HouseCusp>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT house, longitude, sign FROM chart_cusps
             WHERE chart_id = $1 ORDER BY house",
            &[id_param(id)],
        )
        .await?;

    rows.iter()
        .map(|row| {
            Ok(HouseCusp {
                house: house_column(row)?,
                longitude: real_column(row, "longitude")?,
                sign: parse_enum("sign", &text_column(row, "sign")?)?,
            })
        })
        .collect()
}

async fn fetch_aspects(db: &dyn Database, id: &str) -> Result<Vec<Aspect>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT first, second, kind, angle, orb FROM chart_aspects
             WHERE chart_id = $1 ORDER BY position",
            &[id_param(id)],
        )
        .await?;

    rows.iter()
        .map(|row| {
            Ok(Aspect {
                first: parse_enum("first", &text_column(row, "first")?)?,
                second: parse_enum("second", &text_column(row, "second")?)?,
                kind: parse_enum("kind", &text_column(row, "kind")?)?,
                angle: real_column(row, "angle")?,
                orb: real_column(row, "orb")?,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// List / delete / count
// ---------------------------------------------------------------------------

/// Lists stored charts, newest first.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn list_charts(
    db: &dyn Database,
    limit: u32,
    offset: u32,
) -> Result<Vec<ChartSummary>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT c.id, c.created_at, c.birth_datetime, c.place,
                    (SELECT p.sign FROM chart_planets p
                     WHERE p.chart_id = c.id AND p.planet = 'Sun') AS sun_sign,
                    (SELECT p.sign FROM chart_planets p
                     WHERE p.chart_id = c.id AND p.planet = 'Moon') AS moon_sign,
                    (SELECT h.sign FROM chart_cusps h
                     WHERE h.chart_id = c.id AND h.house = 1) AS ascendant_sign
             FROM charts c
             ORDER BY c.created_at DESC, c.id
             LIMIT $1 OFFSET $2",
            &[
                DatabaseValue::Int32(i32::try_from(limit).unwrap_or(i32::MAX)),
                DatabaseValue::Int32(i32::try_from(offset).unwrap_or(0)),
            ],
        )
        .await?;

    let sign = |row: &Row, column: &str| {
        row.to_value::<Option<String>>(column)
            .unwrap_or(None)
            .and_then(|s| s.parse().ok())
    };

    let mut summaries = Vec::with_capacity(rows.len());
    for row in &rows {
        summaries.push(ChartSummary {
            id: row.to_value("id").unwrap_or_default(),
            created_at: row.to_value("created_at").unwrap_or_default(),
            birth_datetime: row.to_value("birth_datetime").unwrap_or_default(),
            place: row.to_value("place").unwrap_or(None),
            sun_sign: sign(row, "sun_sign"),
            moon_sign: sign(row, "moon_sign"),
            ascendant_sign: sign(row, "ascendant_sign"),
        });
    }

    Ok(summaries)
}

/// Deletes a chart and its child rows.
///
/// The `charts` row goes first so the chart stops being fetchable before
/// its children are removed. Returns `false` if no chart had that ID.
///
/// # Errors
///
/// Returns [`DbError`] if a delete fails.
pub async fn delete_chart(db: &dyn Database, id: &str) -> Result<bool, DbError> {
    let txn = db.begin_transaction().await?;

    let deleted = txn
        .exec_raw_params("DELETE FROM charts WHERE id = $1", &[id_param(id)])
        .await?;

    for table in ["chart_planets", "chart_cusps", "chart_aspects"] {
        let sql = format!("DELETE FROM {table} WHERE chart_id = $1");
        txn.exec_raw_params(&sql, &[id_param(id)]).await?;
    }

    txn.commit().await?;

    Ok(deleted > 0)
}

/// Returns the total number of stored charts.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn count_charts(db: &dyn Database) -> Result<u64, DbError> {
    let rows = db
        .query_raw_params("SELECT COUNT(*) as cnt FROM charts", &[])
        .await?;

    let count: i64 = rows.first().map_or(0, |r| r.to_value("cnt").unwrap_or(0));

    Ok(u64::try_from(count).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::open_db;
    use natal_chart_models::{AspectKind, HouseSystem, Planet, ZodiacSign};

    async fn temp_db(name: &str) -> Box<dyn Database> {
        let path = std::env::temp_dir().join(format!("natal_database_test_{name}.db"));
        let _ = std::fs::remove_file(&path);
        open_db(&path).await.unwrap()
    }

    fn sample_chart() -> ChartResult {
        let input = BirthInput::parse("1991-06-18", "07:10:30", "+05:30", 11.258_753, 75.780_411)
            .unwrap()
            .with_place("Calicut, India");

        let planets = Planet::all()
            .iter()
            .zip(1u8..)
            .map(|(&planet, n)| {
                let longitude = f64::from(n) * 33.123_456_789_012_3 % 360.0;
                PlanetPosition {
                    planet,
                    longitude,
                    sign: ZodiacSign::from_longitude(longitude),
                    house: (n % 12) + 1,
                }
            })
            .collect();

        let cusps = (1u8..=12)
            .map(|house| {
                let longitude = (f64::from(house) * 30.0 + 0.1 / 3.0) % 360.0;
                HouseCusp {
                    house,
                    longitude,
                    sign: ZodiacSign::from_longitude(longitude),
                }
            })
            .collect();

        let aspects = vec![
            Aspect {
                first: Planet::Sun,
                second: Planet::Moon,
                kind: AspectKind::Sextile,
                angle: 66.246_913_578_024_6,
                orb: 6.246_913_578_024_6,
            },
            Aspect {
                first: Planet::Venus,
                second: Planet::Pluto,
                kind: AspectKind::Trine,
                angle: 121.0 / 1.000_000_1,
                orb: 0.999_987_9,
            },
        ];

        ChartResult {
            input,
            house_system: HouseSystem::WholeSign,
            planets,
            cusps,
            aspects,
        }
    }

    #[tokio::test]
    async fn round_trip_preserves_every_field() {
        let db = temp_db("round_trip").await;
        let chart = sample_chart();

        let id = store_chart(db.as_ref(), &chart).await.unwrap();
        let stored = fetch_chart(db.as_ref(), &id).await.unwrap().unwrap();

        assert_eq!(stored.id, id);
        assert_eq!(stored.chart, chart);
        assert_eq!(stored.chart.input.place(), Some("Calicut, India"));
    }

    #[tokio::test]
    async fn fetch_unknown_id_is_none() {
        let db = temp_db("unknown").await;
        assert!(fetch_chart(db.as_ref(), "no-such-chart").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_store_rolls_back_every_row() {
        let db = temp_db("rollback").await;

        // Duplicate house numbers violate the cusp primary key after the
        // chart row and its planets are already written.
        let mut chart = sample_chart();
        chart.cusps[11].house = 1;

        let err = store_chart(db.as_ref(), &chart).await.unwrap_err();
        assert!(matches!(err, DbError::Database(_)));

        assert_eq!(count_charts(db.as_ref()).await.unwrap(), 0);
        for table in ["chart_planets", "chart_cusps", "chart_aspects"] {
            let rows = db
                .query_raw_params(&format!("SELECT chart_id FROM {table}"), &[])
                .await
                .unwrap();
            assert!(rows.is_empty(), "{table} kept {} rows", rows.len());
        }

        let id = store_chart(db.as_ref(), &sample_chart()).await.unwrap();
        assert!(fetch_chart(db.as_ref(), &id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn list_summarizes_signs() {
        let db = temp_db("list").await;
        let chart = sample_chart();
        let id = store_chart(db.as_ref(), &chart).await.unwrap();

        let summaries = list_charts(db.as_ref(), 10, 0).await.unwrap();
        assert_eq!(summaries.len(), 1);
        let summary = &summaries[0];
        assert_eq!(summary.id, id);
        assert_eq!(summary.place.as_deref(), Some("Calicut, India"));
        assert_eq!(summary.birth_datetime, chart.input.datetime().to_rfc3339());
        assert_eq!(
            summary.sun_sign,
            chart.planet(Planet::Sun).map(|p| p.sign)
        );
        assert_eq!(summary.ascendant_sign, chart.cusp(1).map(|c| c.sign));
    }

    #[tokio::test]
    async fn list_paginates() {
        let db = temp_db("paginate").await;
        for _ in 0..3 {
            store_chart(db.as_ref(), &sample_chart()).await.unwrap();
        }

        assert_eq!(count_charts(db.as_ref()).await.unwrap(), 3);
        assert_eq!(list_charts(db.as_ref(), 2, 0).await.unwrap().len(), 2);
        assert_eq!(list_charts(db.as_ref(), 2, 2).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_removes_chart_and_children() {
        let db = temp_db("delete").await;
        let id = store_chart(db.as_ref(), &sample_chart()).await.unwrap();

        assert!(delete_chart(db.as_ref(), &id).await.unwrap());
        assert!(fetch_chart(db.as_ref(), &id).await.unwrap().is_none());
        assert!(!delete_chart(db.as_ref(), &id).await.unwrap());

        let rows = db
            .query_raw_params(
                "SELECT COUNT(*) as cnt FROM chart_planets WHERE chart_id = $1",
                &[id_param(&id)],
            )
            .await
            .unwrap();
        let remaining: i64 = (&rows[0]).to_value("cnt").unwrap();
        assert_eq!(remaining, 0);
    }
}
