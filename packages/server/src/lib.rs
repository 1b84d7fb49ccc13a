#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web query server for county civic-opportunity data.
//!
//! Serves search, county detail, state profile, state comparison and the
//! full export from an in-memory snapshot built by the analytics pipeline.
//! The snapshot can be rebuilt from the raw inputs at runtime via
//! `POST /api/reload`; the swap is atomic and in-flight requests finish
//! against the snapshot they started with.

mod handlers;
pub mod interactive;
pub mod queries;
pub mod store;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};
use civic_quest_pipeline::PipelineError;
use civic_quest_pipeline::assemble::build_snapshot;
use civic_quest_pipeline::config::PipelineConfig;
use civic_quest_pipeline::export::read_export;
use civic_quest_pipeline::paths;
use civic_quest_pipeline::progress::null_progress;
use civic_quest_pipeline::snapshot::Snapshot;

use store::SnapshotStore;

/// Directory (under the project root) holding the frontend build.
const FRONTEND_DIR: &str = "static";

/// Listen address when `BIND_ADDR` is unset.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1";

/// Listen port when `PORT` is unset or invalid.
pub const DEFAULT_PORT: u16 = 8080;

/// Shared application state.
pub struct AppState {
    /// The live snapshot.
    pub store: SnapshotStore,
    /// Pipeline config used for reloads.
    pub config: PipelineConfig,
}

/// Builds the startup snapshot.
///
/// Runs the pipeline over the raw inputs; if that fails, falls back to the
/// first readable previously exported document.
///
/// # Errors
///
/// Returns the pipeline error when neither the raw inputs nor any export
/// document can be loaded.
pub fn load_snapshot(config: &PipelineConfig) -> Result<Snapshot, PipelineError> {
    let build_err = match build_snapshot(config, &null_progress()) {
        Ok(snapshot) => return Ok(snapshot),
        Err(e) => e,
    };
    log::warn!("Could not build snapshot from raw inputs: {build_err}");

    load_exported_snapshot(config).ok_or(build_err)
}

/// Loads the first readable export document named by the config.
#[must_use]
pub fn load_exported_snapshot(config: &PipelineConfig) -> Option<Snapshot> {
    for path in config.export_paths() {
        match read_export(&path) {
            Ok(document) => {
                log::info!("Serving exported snapshot from {}", path.display());
                return Some(Snapshot::from_export(document));
            }
            Err(e) => log::warn!("Could not read export {}: {e}", path.display()),
        }
    }
    None
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/states", web::get().to(handlers::states))
            .route("/search", web::get().to(handlers::search))
            .route("/county/{fips}", web::get().to(handlers::county))
            .route("/state/{code}", web::get().to(handlers::state_profile))
            .route("/compare", web::get().to(handlers::compare))
            .route("/export", web::get().to(handlers::export))
            .route("/reload", web::post().to(handlers::reload)),
    );
}

/// Starts the civic quest API server.
///
/// Builds (or loads) the snapshot and starts the Actix-Web HTTP server on
/// `BIND_ADDR:PORT`. The caller provides the async runtime (e.g. via
/// `#[actix_web::main]`) and the logger.
///
/// # Errors
///
/// Returns an `std::io::Result` error if no snapshot can be loaded, or if
/// the HTTP server fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: PipelineConfig) -> std::io::Result<()> {
    log::info!("Building snapshot...");
    let snapshot = load_snapshot(&config).map_err(std::io::Error::other)?;

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    serve(config, snapshot, bind_addr, port).await
}

/// Serves `snapshot` on `bind_addr:port` until the server stops.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn serve(
    config: PipelineConfig,
    snapshot: Snapshot,
    bind_addr: String,
    port: u16,
) -> std::io::Result<()> {
    log::info!(
        "Serving {} counties across {} states ({})",
        snapshot.metadata().county_count,
        snapshot.metadata().state_count,
        snapshot.urbanicity_source()
    );

    let generated_dir = paths::generated_dir(&config.root);
    let frontend_dir = config.root.join(FRONTEND_DIR);

    let state = web::Data::new(AppState {
        store: SnapshotStore::new(snapshot),
        config,
    });

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        let mut app = App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure);

        // Serve exported artifacts
        if generated_dir.is_dir() {
            app = app.service(Files::new("/data", &generated_dir).show_files_listing());
        }
        // Serve frontend static files
        if frontend_dir.is_dir() {
            app = app.service(Files::new("/", &frontend_dir).index_file("index.html"));
        }
        app
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
