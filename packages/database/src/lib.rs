#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! `SQLite` persistence for natal charts.
//!
//! A chart is stored as one `charts` row plus child rows for its planets,
//! cusps, and aspects. Longitudes are kept as `REAL` columns, so a fetched
//! chart compares equal to the one that was stored. The forum tables live
//! in the same file but are owned by the forum package.

pub mod charts;

use std::path::Path;

use switchy_database::Database;
use switchy_database_connection::init_sqlite_rusqlite;
use thiserror::Error;

pub use charts::{count_charts, delete_chart, fetch_chart, list_charts, store_chart};

/// Default path for the application database.
pub const DEFAULT_DB_PATH: &str = "data/natal_chart.db";

/// Errors from chart persistence.
#[derive(Debug, Error)]
pub enum DbError {
    /// Database query error.
    #[error("Database error: {0}")]
    Database(#[from] switchy_database::DatabaseError),

    /// The database file could not be opened.
    #[error("Connection error: {0}")]
    Connection(String),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored row could not be converted back into chart types.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

/// Opens (or creates) the `SQLite` database and ensures the chart schema
/// exists.
///
/// # Errors
///
/// Returns [`DbError`] if the database cannot be opened or schema creation
/// fails.
pub async fn open_db(path: &Path) -> Result<Box<dyn Database>, DbError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db = init_sqlite_rusqlite(Some(path)).map_err(|e| DbError::Connection(e.to_string()))?;

    ensure_schema(db.as_ref()).await?;
    log::debug!("Opened chart database at {}", path.display());

    Ok(db)
}

/// Creates the chart tables if they don't already exist.
///
/// Child tables are keyed by `chart_id` without a foreign key;
/// [`store_chart`] and [`delete_chart`] touch a chart and its children in
/// one transaction.
///
/// # Errors
///
/// Returns [`DbError`] if any statement fails.
pub async fn ensure_schema(db: &dyn Database) -> Result<(), DbError> {
    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS charts (
            id              TEXT PRIMARY KEY,
            created_at      TEXT NOT NULL,
            birth_datetime  TEXT NOT NULL,
            latitude        REAL NOT NULL,
            longitude       REAL NOT NULL,
            place           TEXT,
            house_system    TEXT NOT NULL
        )",
    )
    .await?;

    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS chart_planets (
            chart_id    TEXT NOT NULL,
            position    INTEGER NOT NULL,
            planet      TEXT NOT NULL,
            longitude   REAL NOT NULL,
            sign        TEXT NOT NULL,
            house       INTEGER NOT NULL,
            PRIMARY KEY (chart_id, planet)
        )",
    )
    .await?;

    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS chart_cusps (
            chart_id    TEXT NOT NULL,
            house       INTEGER NOT NULL,
            longitude   REAL NOT NULL,
            sign        TEXT NOT NULL,
            PRIMARY KEY (chart_id, house)
        )",
    )
    .await?;

    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS chart_aspects (
            chart_id    TEXT NOT NULL,
            position    INTEGER NOT NULL,
            first       TEXT NOT NULL,
            second      TEXT NOT NULL,
            kind        TEXT NOT NULL,
            angle       REAL NOT NULL,
            orb         REAL NOT NULL,
            PRIMARY KEY (chart_id, first, second)
        )",
    )
    .await?;

    db.exec_raw("CREATE INDEX IF NOT EXISTS idx_charts_created ON charts (created_at)")
        .await?;

    Ok(())
}
