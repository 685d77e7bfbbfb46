//! REST API route handlers (§6). Every response is wrapped as
//! `{"success": true, "data": ...}` or `{"success": false, "error": "..."}`
//! and returned with HTTP 200 — the error-propagation policy of the
//! original backend, which never surfaces a 4xx/5xx for a decode failure.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use kavach_core::driver::{enumerate_files, paginate, parse_query_datetime, scan_file, scan_source};
use kavach_core::fault::FaultPacket;
use kavach_core::graph::{GraphDirection, GraphMetaBuilder, GraphType};
use kavach_core::hexio::{
    frames_from_bytes, MARKER_FAULT, MARKER_FAULT_GPRS, MARKER_INTERLOCKING_EVENT,
    MARKER_INTERLOCKING_PERIODIC, MARKER_POSITION, MARKER_STATIONARY,
};
use kavach_core::interlocking;
use kavach_core::pos::{self, is_loco_id_sentinel, PosPacket, PosRegular};
use kavach_core::record::{self, Record};
use kavach_core::stationary::{self, StaPacket};
use kavach_core::types::{DataSource, Sof};

use crate::auth::{check_credentials, LoginRequest};
use crate::web::AppState;

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn ok(data: Value) -> Json<Value> {
    Json(json!({ "success": true, "data": data }))
}

fn err(message: impl Into<String>) -> Json<Value> {
    Json(json!({ "success": false, "error": message.into() }))
}

// ---------------------------------------------------------------------------
// Query param types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct ByDateParams {
    from: String,
    to: String,
}

#[derive(Deserialize)]
pub struct LogDirDateParams {
    from: String,
    to: String,
    #[serde(rename = "logDir")]
    log_dir: Option<String>,
}

#[derive(Deserialize)]
pub struct InterlockingReportParams {
    from: String,
    to: String,
    #[serde(rename = "logDir")]
    log_dir: Option<String>,
    station: Option<String>,
    page: Option<usize>,
}

#[derive(Deserialize)]
pub struct GraphDataParams {
    #[serde(rename = "locoId")]
    loco_id: Option<u32>,
    from: String,
    to: String,
    direction: Option<String>,
    #[serde(rename = "graphType")]
    graph_type: Option<String>,
    #[serde(rename = "logDir")]
    log_dir: Option<String>,
}

fn parse_graph_type(s: Option<&str>) -> GraphType {
    match s {
        Some("location-mode") => GraphType::LocationMode,
        Some("time-speed") => GraphType::TimeSpeed,
        Some("time-mode") => GraphType::TimeMode,
        _ => GraphType::LocationSpeed,
    }
}

fn parse_direction_filter(s: Option<&str>) -> Option<GraphDirection> {
    match s {
        Some("nominal") => Some(GraphDirection::Nominal),
        Some("reverse") => Some(GraphDirection::Reverse),
        Some("unidentified") => Some(GraphDirection::Unidentified),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Health + auth
// ---------------------------------------------------------------------------

pub async fn api_health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn api_login(Json(body): Json<LoginRequest>) -> impl IntoResponse {
    if check_credentials(&body) {
        ok(json!({ "username": body.username }))
    } else {
        err("invalid username or password")
    }
}

// ---------------------------------------------------------------------------
// Upload-based decode endpoints (§4.2, §4.3) — body is the raw file bytes,
// decoded against the uploaded-file data source.
// ---------------------------------------------------------------------------

fn pos_regular_records(body: &Bytes, from: &str, to: &str) -> Result<Vec<Record>, String> {
    let from_dt = parse_query_datetime(from).map_err(|e| e.to_string())?;
    let to_dt = parse_query_datetime(to).map_err(|e| e.to_string())?;
    let frames = frames_from_bytes(body, &[MARKER_POSITION]);
    let records: Vec<Record> = scan_source(frames, DataSource::Upload, |raw, ds, sof| {
        match pos::decode(raw) {
            Ok(PosPacket::Regular(p)) if p.header.event_time >= from_dt && p.header.event_time <= to_dt => {
                Some(record::from_pos_regular(&p, ds, sof))
            }
            Ok(PosPacket::AccessRequest(p)) if p.header.event_time >= from_dt && p.header.event_time <= to_dt => {
                Some(record::from_pos_access(&p, ds, sof))
            }
            _ => None,
        }
    });
    Ok(records)
}

pub async fn api_loco_movement_by_date(
    Query(params): Query<ByDateParams>,
    body: Bytes,
) -> impl IntoResponse {
    match pos_regular_records(&body, &params.from, &params.to) {
        Ok(records) => ok(json!(records)),
        Err(e) => err(e),
    }
}

fn decode_sta_variant<F>(body: &Bytes, from: &str, to: &str, pick: F) -> Result<Vec<Record>, String>
where
    F: Fn(StaPacket, DataSource, Sof) -> Option<Record>,
{
    let from_dt = parse_query_datetime(from).map_err(|e| e.to_string())?;
    let to_dt = parse_query_datetime(to).map_err(|e| e.to_string())?;
    let frames = frames_from_bytes(body, &[MARKER_STATIONARY]);
    let records = scan_source(frames, DataSource::Upload, |raw, ds, sof| {
        let pkt = stationary::decode(raw).ok()?;
        let event_time = match &pkt {
            StaPacket::Regular(p) => p.header.event_time,
            StaPacket::Access(p) => p.header.event_time,
            StaPacket::Emergency(p) => p.header.event_time,
        };
        if event_time < from_dt || event_time > to_dt {
            return None;
        }
        pick(pkt, ds, sof)
    });
    Ok(records)
}

pub async fn api_stationary_regular_by_date(
    Query(params): Query<ByDateParams>,
    body: Bytes,
) -> impl IntoResponse {
    let result = decode_sta_variant(&body, &params.from, &params.to, |pkt, ds, sof| match pkt {
        StaPacket::Regular(p) => Some(record::from_sta_regular(&p, ds, sof)),
        _ => None,
    });
    match result {
        Ok(records) => ok(json!(records)),
        Err(e) => err(e),
    }
}

pub async fn api_stationary_access_by_date(
    Query(params): Query<ByDateParams>,
    body: Bytes,
) -> impl IntoResponse {
    let result = decode_sta_variant(&body, &params.from, &params.to, |pkt, ds, sof| match pkt {
        StaPacket::Access(p) => Some(record::from_sta_access(&p, ds, sof)),
        _ => None,
    });
    match result {
        Ok(records) => ok(json!(records)),
        Err(e) => err(e),
    }
}

pub async fn api_stationary_emergency_by_date(
    Query(params): Query<ByDateParams>,
    body: Bytes,
) -> impl IntoResponse {
    let result = decode_sta_variant(&body, &params.from, &params.to, |pkt, ds, sof| match pkt {
        StaPacket::Emergency(p) => Some(record::from_sta_emergency(&p, ds, sof)),
        _ => None,
    });
    match result {
        Ok(records) => ok(json!(records)),
        Err(e) => err(e),
    }
}

// ---------------------------------------------------------------------------
// Date-range query endpoints — scan LOG_DIR
// ---------------------------------------------------------------------------

fn resolve_log_dir(state: &AppState, override_dir: Option<&str>) -> std::path::PathBuf {
    match override_dir {
        Some(d) if !d.is_empty() => std::path::PathBuf::from(d),
        _ => state.log_dir.clone(),
    }
}

pub async fn api_loco_faults_by_date(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LogDirDateParams>,
) -> impl IntoResponse {
    let from_dt = match parse_query_datetime(&params.from) {
        Ok(dt) => dt,
        Err(e) => return err(e.to_string()),
    };
    let to_dt = match parse_query_datetime(&params.to) {
        Ok(dt) => dt,
        Err(e) => return err(e.to_string()),
    };
    let log_dir = resolve_log_dir(&state, params.log_dir.as_deref());
    let files = enumerate_files(&log_dir, from_dt.date(), to_dt.date());

    let mut records = Vec::new();
    for file in &files {
        let file_records: Vec<Record> = scan_file(file, &[MARKER_FAULT, MARKER_FAULT_GPRS], |raw, ds, sof| {
            let pkt: FaultPacket = kavach_core::fault::decode(raw).ok()?;
            if pkt.header.event_time < from_dt || pkt.header.event_time > to_dt {
                return None;
            }
            Some(record::from_fault(&pkt, ds, sof))
        })
        .into_iter()
        .flatten()
        .collect();
        records.extend(file_records);
    }

    ok(json!(records))
}

pub async fn api_interlocking_stations(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ok(json!(state.stations.all()))
}

pub async fn api_interlocking_report(
    State(state): State<Arc<AppState>>,
    Query(params): Query<InterlockingReportParams>,
) -> impl IntoResponse {
    let from_dt = match parse_query_datetime(&params.from) {
        Ok(dt) => dt,
        Err(e) => return err(e.to_string()),
    };
    let to_dt = match parse_query_datetime(&params.to) {
        Ok(dt) => dt,
        Err(e) => return err(e.to_string()),
    };
    let log_dir = resolve_log_dir(&state, params.log_dir.as_deref());
    let files = enumerate_files(&log_dir, from_dt.date(), to_dt.date());

    let station_filter = params.station.as_deref().and_then(|code| state.stations.by_code(code));

    let mut records = Vec::new();
    for file in &files {
        let periodic: Vec<Record> = scan_file(
            file,
            &[MARKER_INTERLOCKING_PERIODIC],
            |raw, ds, sof| {
                let pkt = interlocking::decode_periodic(raw, &state.relays).ok()?;
                if pkt.header.event_time < from_dt || pkt.header.event_time > to_dt {
                    return None;
                }
                if let Some(st) = station_filter {
                    if pkt.header.station_id as u32 != st.station_id {
                        return None;
                    }
                }
                Some(record::from_periodic(&pkt, ds, sof))
            },
        );
        let events: Vec<Record> = scan_file(file, &[MARKER_INTERLOCKING_EVENT], |raw, ds, sof| {
            let pkt = interlocking::decode_event(raw, &state.relays).ok()?;
            if pkt.header.event_time < from_dt || pkt.header.event_time > to_dt {
                return None;
            }
            if let Some(st) = station_filter {
                if pkt.header.station_id as u32 != st.station_id {
                    return None;
                }
            }
            Some(record::from_event(&pkt, ds, sof))
        });
        records.extend(periodic);
        records.extend(events);
    }

    let page = paginate(records, params.page.unwrap_or(1));
    ok(serde_json::to_value(&page).unwrap_or(json!({})))
}

// ---------------------------------------------------------------------------
// Graph meta/data
// ---------------------------------------------------------------------------

fn decode_pos_regulars(file: &std::path::Path) -> Vec<PosRegular> {
    scan_file(file, &[MARKER_POSITION], |raw, _ds, _sof| match pos::decode(raw) {
        Ok(PosPacket::Regular(p)) => Some(p),
        _ => None,
    })
}

pub async fn api_graph_meta(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let log_dir = state.log_dir.clone();
    let far_past = chrono::NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
    let far_future = chrono::NaiveDate::from_ymd_opt(2100, 1, 1).unwrap();
    let files = enumerate_files(&log_dir, far_past, far_future);

    let mut builder = GraphMetaBuilder::new();
    for file in &files {
        if let Some(date) = kavach_core::driver::parse_filename_date(file) {
            let packets = decode_pos_regulars(file);
            builder.visit_file(date, &packets);
        }
    }
    let meta = builder.finish();
    ok(serde_json::to_value(&meta).unwrap_or(json!({})))
}

pub async fn api_graph_data(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GraphDataParams>,
) -> impl IntoResponse {
    let from_dt = match parse_query_datetime(&params.from) {
        Ok(dt) => dt,
        Err(e) => return err(e.to_string()),
    };
    let to_dt = match parse_query_datetime(&params.to) {
        Ok(dt) => dt,
        Err(e) => return err(e.to_string()),
    };
    let log_dir = resolve_log_dir(&state, params.log_dir.as_deref());
    let files = enumerate_files(&log_dir, from_dt.date(), to_dt.date());
    let graph_type = parse_graph_type(params.graph_type.as_deref());
    let direction_filter = parse_direction_filter(params.direction.as_deref());

    let mut packets = Vec::new();
    for file in &files {
        for p in decode_pos_regulars(file) {
            if is_loco_id_sentinel(p.source_loco_id) {
                continue;
            }
            if p.header.event_time < from_dt || p.header.event_time > to_dt {
                continue;
            }
            if let Some(loco_id) = params.loco_id {
                if p.source_loco_id != loco_id {
                    continue;
                }
            }
            if let Some(dir) = direction_filter {
                if GraphDirection::from(p.movement_dir) != dir {
                    continue;
                }
            }
            packets.push(p);
        }
    }

    let points = kavach_core::graph::project(&packets, graph_type);
    ok(serde_json::to_value(&points).unwrap_or(json!([])))
}

// ---------------------------------------------------------------------------
// Track profile — reuses the stationary-Regular decoder output (§9 design
// note: no separate low-level decoder for the track-profile surface).
// ---------------------------------------------------------------------------

pub async fn api_track_profile_stations(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ok(json!(state.stations.all()))
}

pub async fn api_track_profile_meta(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let log_dir = state.log_dir.clone();
    let far_past = chrono::NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
    let far_future = chrono::NaiveDate::from_ymd_opt(2100, 1, 1).unwrap();
    let files = enumerate_files(&log_dir, far_past, far_future);
    let dates: Vec<_> = files.iter().filter_map(|f| kavach_core::driver::parse_filename_date(f)).collect();
    ok(json!({ "dates": dates }))
}

pub async fn api_track_profile_report(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LogDirDateParams>,
) -> impl IntoResponse {
    let from_dt = match parse_query_datetime(&params.from) {
        Ok(dt) => dt,
        Err(e) => return err(e.to_string()),
    };
    let to_dt = match parse_query_datetime(&params.to) {
        Ok(dt) => dt,
        Err(e) => return err(e.to_string()),
    };
    let log_dir = resolve_log_dir(&state, params.log_dir.as_deref());
    let files = enumerate_files(&log_dir, from_dt.date(), to_dt.date());

    let mut records = Vec::new();
    for file in &files {
        let file_records: Vec<Record> = scan_file(file, &[MARKER_STATIONARY], |raw, ds, sof| {
            match stationary::decode(raw) {
                Ok(StaPacket::Regular(p)) if p.header.event_time >= from_dt && p.header.event_time <= to_dt => {
                    Some(record::from_sta_regular(&p, ds, sof))
                }
                _ => None,
            }
        });
        records.extend(file_records);
    }
    ok(json!(records))
}

pub async fn api_track_profile_graph(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LogDirDateParams>,
) -> impl IntoResponse {
    let from_dt = match parse_query_datetime(&params.from) {
        Ok(dt) => dt,
        Err(e) => return err(e.to_string()),
    };
    let to_dt = match parse_query_datetime(&params.to) {
        Ok(dt) => dt,
        Err(e) => return err(e.to_string()),
    };
    let log_dir = resolve_log_dir(&state, params.log_dir.as_deref());
    let files = enumerate_files(&log_dir, from_dt.date(), to_dt.date());

    let mut sub_packet_counts = Vec::new();
    for file in &files {
        let counts: Vec<usize> = scan_file(file, &[MARKER_STATIONARY], |raw, _ds, _sof| {
            match stationary::decode(raw) {
                Ok(StaPacket::Regular(p)) if p.header.event_time >= from_dt && p.header.event_time <= to_dt => {
                    Some(p.sub_packets.len())
                }
                _ => None,
            }
        });
        sub_packet_counts.extend(counts);
    }
    ok(json!({ "sub_packet_counts": sub_packet_counts }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Mutex;
    use tower::ServiceExt;

    use kavach_core::relays::RelayTable;
    use kavach_core::stations::StationTable;

    use crate::db::Database;

    fn test_state() -> (Arc<AppState>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("logs");
        std::fs::create_dir_all(&log_dir).unwrap();
        let db = Database::open_memory().unwrap();
        let state = Arc::new(AppState {
            stations: StationTable::builtin(),
            relays: RelayTable::builtin_default(),
            log_dir,
            db: Mutex::new(db),
        });
        (state, dir)
    }

    #[tokio::test]
    async fn test_api_health() {
        let (state, _dir) = test_state();
        let app = crate::web::build_router(state);
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_api_login_success() {
        let (state, _dir) = test_state();
        let app = crate::web::build_router(state);
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/login")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"username":"admin","password":"admin123"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], true);
    }

    #[tokio::test]
    async fn test_api_login_failure() {
        let (state, _dir) = test_state();
        let app = crate::web::build_router(state);
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/login")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"username":"admin","password":"nope"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn test_api_interlocking_stations_returns_builtin_table() {
        let (state, _dir) = test_state();
        let app = crate::web::build_router(state);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/interlocking/stations")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert!(json["data"].as_array().unwrap().len() >= 20);
    }

    #[tokio::test]
    async fn test_api_loco_faults_by_date_empty_log_dir() {
        let (state, _dir) = test_state();
        let app = crate::web::build_router(state);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/loco-faults/by-date?from=2024-01-01&to=2024-12-31")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], true);
        assert!(json["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_api_graph_meta_no_files() {
        let (state, _dir) = test_state();
        let app = crate::web::build_router(state);
        let response = app
            .oneshot(Request::builder().uri("/api/graph/meta").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["data"]["loco_ids"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_api_loco_movement_by_date_bad_range() {
        let (state, _dir) = test_state();
        let app = crate::web::build_router(state);
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/loco-movement/by-date?from=not-a-date&to=2024-12-31")
                    .body(Body::from(vec![]))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
    }
}
