#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the natal chart application.
//!
//! Serves the REST API for deriving and browsing birth charts, the forum
//! endpoints, and the static frontend build from `app/dist`. Charts and
//! forum rows share one `SQLite` database. Planet positions come from JPL
//! Horizons through an injected [`ChartService`].

pub mod config;
mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};
use natal_chart::ChartService;
use natal_ephemeris::horizons::HorizonsProvider;
use natal_ephemeris::timescale;
use switchy_database::Database;

pub use config::ServerConfig;

/// Shared application state.
pub struct AppState {
    /// Chart and forum database.
    pub db: Arc<dyn Database>,
    /// Chart derivation backed by the configured ephemeris provider.
    pub charts: ChartService,
}

/// Registers the `/api` routes.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/signs", web::get().to(handlers::signs))
            .route("/charts", web::post().to(handlers::create_chart))
            .route("/charts", web::get().to(handlers::list_charts))
            .route("/charts/{id}", web::get().to(handlers::get_chart))
            .route("/charts/{id}", web::delete().to(handlers::delete_chart))
            .route(
                "/forum/categories",
                web::get().to(handlers::list_categories),
            )
            .route(
                "/forum/categories",
                web::post().to(handlers::create_category),
            )
            .route(
                "/forum/categories/{id}/topics",
                web::get().to(handlers::list_topics),
            )
            .route("/forum/topics", web::post().to(handlers::create_topic))
            .route("/forum/topics/{id}", web::get().to(handlers::get_topic))
            .route(
                "/forum/topics/{id}/posts",
                web::post().to(handlers::create_post),
            ),
    );
}

fn startup_error(context: &str, e: impl std::fmt::Display) -> std::io::Error {
    log::error!("{context}: {e}");
    std::io::Error::other(format!("{context}: {e}"))
}

/// Starts the natal chart API server.
///
/// Reads [`ServerConfig`] from the environment, opens the database,
/// loads the leap-second table (falling back to the embedded table when
/// no download succeeds), and starts the Actix-Web HTTP server. The
/// caller provides the async runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the database cannot be opened,
/// the HTTP client cannot be built, or the server fails to bind.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = ServerConfig::from_env();
    log::debug!("Configuration: {config:?}");

    log::info!("Opening database at {}...", config.database_path.display());
    let db = natal_database::open_db(&config.database_path)
        .await
        .map_err(|e| startup_error("Failed to open database", e))?;
    natal_forum::ensure_schema(db.as_ref())
        .await
        .map_err(|e| startup_error("Failed to create forum schema", e))?;

    log::info!("Loading leap-second table...");
    let leap_seconds = timescale::load(&config.data_dir, &reqwest::Client::new()).await;
    log::info!(
        "Leap-second table: {} entries ({})",
        leap_seconds.entries().len(),
        leap_seconds.origin()
    );

    let provider = HorizonsProvider::new(
        config.horizons_url.clone(),
        config.house_system,
        Arc::new(leap_seconds),
    )
    .map_err(|e| startup_error("Failed to build ephemeris client", e))?;

    let charts = ChartService::new(Arc::new(provider)).with_timeout(config.provider_timeout);

    let state = web::Data::new(AppState {
        db: Arc::from(db),
        charts,
    });

    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure_api)
            // Serve frontend static files (production)
            .service(Files::new("/", "app/dist").index_file("index.html"))
    })
    .bind((config.bind_addr.clone(), config.port))?
    .run()
    .await
}
