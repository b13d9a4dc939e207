#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line tool for computing and managing natal charts.
//!
//! Reads the same environment variables as the server (`DATABASE_PATH`,
//! `DATA_DIR`, `HOUSE_SYSTEM`, `HORIZONS_URL`, `PROVIDER_TIMEOUT_SECS`), so
//! charts saved here show up in the web app and vice versa.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use natal_chart::{ChartService, format_chart};
use natal_chart_models::{BirthInput, HouseSystem};
use natal_ephemeris::horizons::HorizonsProvider;
use natal_ephemeris::{registry, timescale};
use natal_server::ServerConfig;
use switchy_database::Database;

// ---------------------------------------------------------------------------
// CLI definitions
// ---------------------------------------------------------------------------

/// Compute and manage natal charts.
#[derive(Parser)]
#[command(name = "natal_cli")]
#[command(about = "Compute and manage natal charts")]
struct Cli {
    /// Path to the chart `SQLite` database (overrides `DATABASE_PATH`).
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive a chart from birth data and print it.
    Compute {
        /// Birth date, `YYYY-MM-DD`.
        #[arg(long)]
        date: String,

        /// Local birth time, `HH:MM` or `HH:MM:SS`.
        #[arg(long)]
        time: String,

        /// UTC offset at the birth place, e.g. `+05:30`.
        #[arg(long, allow_hyphen_values = true)]
        offset: String,

        /// Latitude in degrees, north positive.
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in degrees, east positive.
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Birth place label.
        #[arg(long)]
        place: Option<String>,

        /// House system (overrides `HOUSE_SYSTEM`).
        #[arg(long)]
        house_system: Option<HouseSystem>,

        /// Store the chart in the database.
        #[arg(long)]
        save: bool,
    },

    /// Print a stored chart.
    Show {
        /// Chart ID.
        id: String,
    },

    /// List stored charts, newest first.
    List {
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },

    /// Delete a stored chart.
    Delete {
        /// Chart ID.
        id: String,
    },

    /// Download the leap-second table into the data directory.
    FetchLeapSeconds,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let mut config = ServerConfig::from_env();
    if let Some(path) = cli.db_path {
        config.database_path = path;
    }

    match cli.command {
        Commands::Compute {
            date,
            time,
            offset,
            lat,
            lon,
            place,
            house_system,
            save,
        } => {
            let mut input = BirthInput::parse(&date, &time, &offset, lat, lon)?;
            if let Some(place) = place {
                input = input.with_place(place);
            }
            if let Some(house_system) = house_system {
                config.house_system = house_system;
            }
            cmd_compute(&config, &input, save).await
        }
        Commands::Show { id } => {
            let db = natal_database::open_db(&config.database_path).await?;
            cmd_show(db.as_ref(), &id).await
        }
        Commands::List { limit } => {
            let db = natal_database::open_db(&config.database_path).await?;
            cmd_list(db.as_ref(), limit).await
        }
        Commands::Delete { id } => {
            let db = natal_database::open_db(&config.database_path).await?;
            cmd_delete(db.as_ref(), &id).await
        }
        Commands::FetchLeapSeconds => cmd_fetch_leap_seconds(&config).await,
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn cmd_compute(
    config: &ServerConfig,
    input: &BirthInput,
    save: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();
    let leap_seconds = timescale::load(&config.data_dir, &client).await;
    log::debug!("Using {} leap-second table", leap_seconds.origin());

    let provider = HorizonsProvider::new(
        config.horizons_url.clone(),
        config.house_system,
        Arc::new(leap_seconds),
    )?;
    let service = ChartService::new(Arc::new(provider)).with_timeout(config.provider_timeout);

    let chart = service.derive(input).await?;
    print!("{}", format_chart(&chart));

    if save {
        let db = natal_database::open_db(&config.database_path).await?;
        let id = natal_database::store_chart(db.as_ref(), &chart).await?;
        println!();
        println!("Saved chart {id}");
    }

    Ok(())
}

async fn cmd_show(db: &dyn Database, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let Some(stored) = natal_database::fetch_chart(db, id).await? else {
        return Err(format!("Chart {id} not found").into());
    };

    println!("Chart {} (stored {})", stored.id, stored.created_at);
    println!();
    print!("{}", format_chart(&stored.chart));
    Ok(())
}

async fn cmd_list(db: &dyn Database, limit: u32) -> Result<(), Box<dyn std::error::Error>> {
    let charts = natal_database::list_charts(db, limit, 0).await?;
    let total = natal_database::count_charts(db).await?;

    if charts.is_empty() {
        println!("No stored charts.");
        return Ok(());
    }

    let sign = |s: Option<natal_chart_models::ZodiacSign>| {
        s.map_or_else(|| "-".to_string(), |s| s.to_string())
    };

    println!(
        "{:<36}  {:<25}  {:<11}  {:<11}  {:<11}  PLACE",
        "ID", "BORN", "SUN", "MOON", "ASC"
    );
    for chart in &charts {
        println!(
            "{:<36}  {:<25}  {:<11}  {:<11}  {:<11}  {}",
            chart.id,
            chart.birth_datetime,
            sign(chart.sun_sign),
            sign(chart.moon_sign),
            sign(chart.ascendant_sign),
            chart.place.as_deref().unwrap_or("-")
        );
    }
    println!();
    println!("Showing {} of {total} charts", charts.len());
    Ok(())
}

async fn cmd_delete(db: &dyn Database, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    if natal_database::delete_chart(db, id).await? {
        println!("Deleted chart {id}");
        Ok(())
    } else {
        Err(format!("Chart {id} not found").into())
    }
}

async fn cmd_fetch_leap_seconds(config: &ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let sources = registry::enabled_sources();
    let table = timescale::refresh(&config.data_dir, &reqwest::Client::new(), &sources).await?;

    println!(
        "Downloaded {} leap-second entries into {}",
        table.entries().len(),
        config.data_dir.display()
    );
    match table.expires() {
        Some(expires) => println!("Table expires {}", expires.format("%Y-%m-%d")),
        None => println!("Table has no published expiry"),
    }
    Ok(())
}
