//! Leap-second table for UTC to Terrestrial Time conversion.
//!
//! The table is loaded once at startup and shared with providers. Loading
//! tries, in order:
//!
//! 1. An unexpired cached file in the data directory.
//! 2. Each enabled remote source from the [`registry`](crate::registry),
//!    by priority. A successful download refreshes the cache.
//! 3. An expired cached file.
//! 4. The embedded table compiled into this crate.
//!
//! Steps 3 and 4 are logged at `warn` since the offsets may be stale.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone as _, Utc};

use crate::EphemerisError;
use crate::registry::{self, LeapSecondFormat, LeapSecondSource};

/// Constant offset between TT and TAI in seconds.
pub const TT_MINUS_TAI: f64 = 32.184;

/// Seconds between the NTP epoch (1900-01-01) and the Unix epoch.
const NTP_UNIX_OFFSET: i64 = 2_208_988_800;

/// `(year, month, TAI-UTC)` for every leap second through 2017-01-01.
const EMBEDDED_LEAP_SECONDS: &[(i32, u32, i32)] = &[
    (1972, 1, 10),
    (1972, 7, 11),
    (1973, 1, 12),
    (1974, 1, 13),
    (1975, 1, 14),
    (1976, 1, 15),
    (1977, 1, 16),
    (1978, 1, 17),
    (1979, 1, 18),
    (1980, 1, 19),
    (1981, 7, 20),
    (1982, 7, 21),
    (1983, 7, 22),
    (1985, 7, 23),
    (1988, 1, 24),
    (1990, 1, 25),
    (1991, 1, 26),
    (1992, 7, 27),
    (1993, 7, 28),
    (1994, 7, 29),
    (1996, 1, 30),
    (1997, 7, 31),
    (1999, 1, 32),
    (2006, 1, 33),
    (2009, 1, 34),
    (2012, 7, 35),
    (2015, 7, 36),
    (2017, 1, 37),
];

/// A step in TAI-UTC taking effect at `effective`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeapSecond {
    /// First instant at which the new offset applies.
    pub effective: DateTime<Utc>,
    /// TAI-UTC in whole seconds from `effective` onward.
    pub tai_minus_utc: i32,
}

/// Where a loaded table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum TableOrigin {
    /// Read from the on-disk cache.
    Cached,
    /// Freshly downloaded from a remote source.
    Downloaded,
    /// Built-in table.
    Embedded,
}

/// Sorted TAI-UTC steps plus the publisher's expiry date, if known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeapSecondTable {
    entries: Vec<LeapSecond>,
    expires: Option<DateTime<Utc>>,
    origin: TableOrigin,
}

impl LeapSecondTable {
    /// The table compiled into this crate.
    #[must_use]
    pub fn embedded() -> Self {
        let entries = EMBEDDED_LEAP_SECONDS
            .iter()
            .filter_map(|&(year, month, offset)| {
                Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
                    .single()
                    .map(|effective| LeapSecond {
                        effective,
                        tai_minus_utc: offset,
                    })
            })
            .collect();

        Self {
            entries,
            expires: None,
            origin: TableOrigin::Embedded,
        }
    }

    /// Parses a leap-second file in the given format.
    ///
    /// # Errors
    ///
    /// Returns [`EphemerisError::MalformedResponse`] if a data line cannot
    /// be parsed or the file contains no entries.
    pub fn parse(
        text: &str,
        format: LeapSecondFormat,
        origin: TableOrigin,
    ) -> Result<Self, EphemerisError> {
        let (mut entries, expires) = match format {
            LeapSecondFormat::IersDat => parse_iers_dat(text)?,
            LeapSecondFormat::IanaList => parse_iana_list(text)?,
        };

        if entries.is_empty() {
            return Err(malformed("leap-second file has no entries"));
        }
        entries.sort_by_key(|e| e.effective);

        Ok(Self {
            entries,
            expires,
            origin,
        })
    }

    /// TAI-UTC in seconds at `instant`.
    ///
    /// Instants before 1972 use the first tabulated offset.
    #[must_use]
    pub fn tai_minus_utc(&self, instant: DateTime<Utc>) -> f64 {
        let offset = self
            .entries
            .iter()
            .take_while(|e| e.effective <= instant)
            .last()
            .or_else(|| self.entries.first())
            .map_or(0, |e| e.tai_minus_utc);
        f64::from(offset)
    }

    /// TT-UTC in seconds at `instant`.
    #[must_use]
    pub fn tt_minus_utc(&self, instant: DateTime<Utc>) -> f64 {
        self.tai_minus_utc(instant) + TT_MINUS_TAI
    }

    /// Terrestrial Time reading at the UTC `instant`, to the millisecond.
    ///
    /// TT is not a UTC offset, so the result is a bare date and time.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn terrestrial_time(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        let offset_ms = (self.tt_minus_utc(instant) * 1000.0).round() as i64;
        (instant + chrono::Duration::milliseconds(offset_ms)).naive_utc()
    }

    /// Whether the publisher's expiry date has passed at `now`.
    ///
    /// Tables without an expiry (the embedded one) never expire.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|expires| expires <= now)
    }

    #[must_use]
    pub fn entries(&self) -> &[LeapSecond] {
        &self.entries
    }

    #[must_use]
    pub const fn expires(&self) -> Option<DateTime<Utc>> {
        self.expires
    }

    #[must_use]
    pub const fn origin(&self) -> TableOrigin {
        self.origin
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Loads the leap-second table using the enabled registry sources.
///
/// Never fails: when nothing better is available the embedded table is
/// returned.
pub async fn load(data_dir: &Path, client: &reqwest::Client) -> LeapSecondTable {
    load_with_sources(data_dir, client, &registry::enabled_sources()).await
}

/// Loads the leap-second table from an explicit source list.
pub async fn load_with_sources(
    data_dir: &Path,
    client: &reqwest::Client,
    sources: &[LeapSecondSource],
) -> LeapSecondTable {
    let now = Utc::now();
    let mut stale: Option<LeapSecondTable> = None;

    for source in sources {
        let Some(table) = read_cache(data_dir, source).await else {
            continue;
        };
        if table.is_expired(now) {
            log::debug!("Cached leap-second table from {} has expired", source.id);
            stale.get_or_insert(table);
        } else {
            log::info!(
                "Loaded {} leap seconds from cache ({})",
                table.entries.len(),
                source.id
            );
            return table;
        }
    }

    match refresh(data_dir, client, sources).await {
        Ok(table) => return table,
        Err(e) => log::debug!("Leap-second refresh failed: {e}"),
    }

    if let Some(table) = stale {
        log::warn!(
            "Using expired leap-second table (expired {})",
            table.expires.map_or_else(|| "unknown".to_string(), |d| d.to_rfc3339())
        );
        return table;
    }

    log::warn!("No leap-second data available, falling back to embedded table");
    LeapSecondTable::embedded()
}

/// Downloads the first source that yields a valid table and caches it.
///
/// # Errors
///
/// Returns the last source's error if every source fails, or
/// [`EphemerisError::Service`] if `sources` is empty.
pub async fn refresh(
    data_dir: &Path,
    client: &reqwest::Client,
    sources: &[LeapSecondSource],
) -> Result<LeapSecondTable, EphemerisError> {
    let mut last_error = None;

    for source in sources {
        log::info!("Fetching leap seconds from {} ({})", source.name, source.url);
        match fetch_source(client, source).await {
            Ok((text, table)) => {
                if let Err(e) = write_cache(data_dir, source, &text).await {
                    log::warn!("Failed to cache leap-second table: {e}");
                }
                return Ok(table);
            }
            Err(e) => {
                log::warn!("Leap-second source {} failed: {e}", source.id);
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| EphemerisError::Service {
        message: "no leap-second sources configured".to_string(),
    }))
}

async fn fetch_source(
    client: &reqwest::Client,
    source: &LeapSecondSource,
) -> Result<(String, LeapSecondTable), EphemerisError> {
    let text = crate::retry::send_text(|| client.get(&source.url)).await?;
    let table = LeapSecondTable::parse(&text, source.format, TableOrigin::Downloaded)?;
    Ok((text, table))
}

/// Cache file path for a source.
#[must_use]
pub fn cache_path(data_dir: &Path, source: &LeapSecondSource) -> PathBuf {
    data_dir.join(format!("leap_seconds_{}.txt", source.id))
}

async fn read_cache(data_dir: &Path, source: &LeapSecondSource) -> Option<LeapSecondTable> {
    let path = cache_path(data_dir, source);
    let text = tokio::fs::read_to_string(&path).await.ok()?;
    match LeapSecondTable::parse(&text, source.format, TableOrigin::Cached) {
        Ok(table) => Some(table),
        Err(e) => {
            log::warn!("Ignoring unreadable cache {}: {e}", path.display());
            None
        }
    }
}

async fn write_cache(
    data_dir: &Path,
    source: &LeapSecondSource,
    text: &str,
) -> Result<(), EphemerisError> {
    let io_err = |path: &Path, source: std::io::Error| EphemerisError::Io {
        path: path.display().to_string(),
        source,
    };

    tokio::fs::create_dir_all(data_dir)
        .await
        .map_err(|e| io_err(data_dir, e))?;
    let path = cache_path(data_dir, source);
    tokio::fs::write(&path, text)
        .await
        .map_err(|e| io_err(&path, e))?;
    log::debug!("Cached leap seconds at {}", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Parsers
// ---------------------------------------------------------------------------

type Parsed = (Vec<LeapSecond>, Option<DateTime<Utc>>);

fn malformed(message: impl Into<String>) -> EphemerisError {
    EphemerisError::MalformedResponse {
        message: message.into(),
    }
}

/// IERS `Leap_Second.dat`: `MJD day month year TAI-UTC` rows, with the
/// expiry in a `File expires on 28 June 2025` comment.
fn parse_iers_dat(text: &str) -> Result<Parsed, EphemerisError> {
    let mut entries = Vec::new();
    let mut expires = None;

    for line in text.lines().map(str::trim) {
        if let Some(comment) = line.strip_prefix('#') {
            if let Some((_, date)) = comment.split_once("File expires on") {
                expires = NaiveDate::parse_from_str(date.trim(), "%d %B %Y")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(|d| d.and_utc());
            }
            continue;
        }
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        let [_, day, month, year, offset] = fields.as_slice() else {
            return Err(malformed(format!("unexpected IERS row: {line}")));
        };
        let parse_err = || malformed(format!("invalid IERS row: {line}"));

        let day: u32 = day.parse().map_err(|_| parse_err())?;
        let month: u32 = month.parse().map_err(|_| parse_err())?;
        let year: i32 = year.parse().map_err(|_| parse_err())?;
        let tai_minus_utc: i32 = offset.parse().map_err(|_| parse_err())?;
        let effective = Utc
            .with_ymd_and_hms(year, month, day, 0, 0, 0)
            .single()
            .ok_or_else(parse_err)?;

        entries.push(LeapSecond {
            effective,
            tai_minus_utc,
        });
    }

    Ok((entries, expires))
}

/// IANA `leap-seconds.list`: `NTP-seconds TAI-UTC # comment` rows, with
/// the expiry on a `#@ NTP-seconds` line.
fn parse_iana_list(text: &str) -> Result<Parsed, EphemerisError> {
    let mut entries = Vec::new();
    let mut expires = None;

    for line in text.lines().map(str::trim) {
        if let Some(expiry) = line.strip_prefix("#@") {
            expires = expiry
                .trim()
                .parse::<i64>()
                .ok()
                .and_then(ntp_to_utc);
            continue;
        }
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let data = line.split('#').next().unwrap_or_default();
        let mut fields = data.split_whitespace();
        let parse_err = || malformed(format!("invalid IANA row: {line}"));

        let ntp: i64 = fields
            .next()
            .and_then(|f| f.parse().ok())
            .ok_or_else(parse_err)?;
        let tai_minus_utc: i32 = fields
            .next()
            .and_then(|f| f.parse().ok())
            .ok_or_else(parse_err)?;
        let effective = ntp_to_utc(ntp).ok_or_else(parse_err)?;

        entries.push(LeapSecond {
            effective,
            tai_minus_utc,
        });
    }

    Ok((entries, expires))
}

fn ntp_to_utc(ntp_seconds: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ntp_seconds - NTP_UNIX_OFFSET, 0)
}
