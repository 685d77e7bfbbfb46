//! Web server — axum REST API for the KAVACH log backend.
//!
//! Shared state holds the read-only station/relay master tables, the log
//! directory scanned by the date-range driver, and a handle to the
//! fault-CRUD SQLite collaborator.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use kavach_core::relays::RelayTable;
use kavach_core::stations::StationTable;

use crate::db::Database;

pub mod routes;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

pub struct AppState {
    pub stations: StationTable,
    pub relays: RelayTable,
    pub log_dir: PathBuf,
    pub db: Mutex<Database>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", axum::routing::get(routes::api_health))
        .route("/api/auth/login", axum::routing::post(routes::api_login))
        .route(
            "/api/loco-movement/by-date",
            axum::routing::post(routes::api_loco_movement_by_date),
        )
        .route(
            "/api/stationary/regular/by-date",
            axum::routing::post(routes::api_stationary_regular_by_date),
        )
        .route(
            "/api/stationary/access/by-date",
            axum::routing::post(routes::api_stationary_access_by_date),
        )
        .route(
            "/api/stationary/emergency/by-date",
            axum::routing::post(routes::api_stationary_emergency_by_date),
        )
        .route(
            "/api/loco-faults/by-date",
            axum::routing::get(routes::api_loco_faults_by_date),
        )
        .route(
            "/api/interlocking/stations",
            axum::routing::get(routes::api_interlocking_stations),
        )
        .route(
            "/api/interlocking/report",
            axum::routing::get(routes::api_interlocking_report),
        )
        .route("/api/graph/meta", axum::routing::get(routes::api_graph_meta))
        .route("/api/graph/data", axum::routing::get(routes::api_graph_data))
        .route(
            "/api/track-profile/stations",
            axum::routing::get(routes::api_track_profile_stations),
        )
        .route(
            "/api/track-profile/meta",
            axum::routing::get(routes::api_track_profile_meta),
        )
        .route(
            "/api/track-profile/report",
            axum::routing::get(routes::api_track_profile_report),
        )
        .route(
            "/api/track-profile/graph",
            axum::routing::get(routes::api_track_profile_graph),
        )
        .with_state(state)
        .layer(cors)
}

/// Start the web server.
pub async fn serve(log_dir: String, db_path: String, port: u16) {
    let db = Database::open(&db_path).expect("failed to open fault database");
    let state = Arc::new(AppState {
        stations: StationTable::builtin(),
        relays: RelayTable::builtin_default(),
        log_dir: PathBuf::from(log_dir),
        db: Mutex::new(db),
    });

    let app = build_router(state);
    let addr = format!("0.0.0.0:{port}");

    eprintln!("kavach-server listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
