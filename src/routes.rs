//! ==============================================================================
//! routes.rs - http surface of the hub
//! ==============================================================================
//!
//! purpose:
//!     - GET /            dashboard page
//!     - GET /data        latest stored reading as json
//!     - GET /api/upload  device push endpoint (statusCode + info query params)
//!
//! relationships:
//!     - uses: info.rs (parse device payload)
//!     - uses: domain.rs (record + timestamp)
//!     - uses: store.rs (append / latest, on the blocking pool)
//!     - uses: error.rs (failure -> status code)
//!
//! every handler is stateless; the csv file is the only shared state.
//!
//! ==============================================================================

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::{Html, Json},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::config::TelemetryConfig;
use crate::domain::{now_timestamp, SensorRecord};
use crate::error::{TelemetryError, TelemetryResult};
use crate::info::parse_info;
use crate::store::AppendStore;

const DEFAULT_INDEX: &str = include_str!("../static/index.html");

// ==============================================================================
// shared state
// ==============================================================================
// built once at startup from the config and cloned into every handler.
// the store sits behind an arc so it can move into spawn_blocking.

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<AppendStore>,
    /// html file served at `/`, built-in page when unset
    pub index_page: Option<PathBuf>,
    /// log saved records at info instead of debug
    pub show_sensor_data: bool,
}

impl AppState {
    /// open (and if needed create) the store named in the config
    pub fn new(config: &TelemetryConfig) -> TelemetryResult<Self> {
        let store = AppendStore::open(config.store.path.clone())?;
        Ok(Self {
            store: Arc::new(store),
            index_page: config.dashboard.index_page.clone(),
            show_sensor_data: config.logging.show_sensor_data,
        })
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/data", get(latest_handler))
        .route("/api/upload", get(upload_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ==============================================================================
// device status
// ==============================================================================

/// what the device says about the reading it is pushing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatus {
    /// 200: info carries a reading
    Reading,
    /// 500: info carries an error report
    Fault,
    Unknown(i64),
}

impl DeviceStatus {
    /// absent or non-integer codes count as -1
    pub fn from_query(raw: Option<&str>) -> Self {
        let code = raw
            .and_then(|s| s.trim().parse::<i64>().ok())
            .unwrap_or(-1);
        match code {
            200 => DeviceStatus::Reading,
            500 => DeviceStatus::Fault,
            other => DeviceStatus::Unknown(other),
        }
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct UploadParams {
    pub status_code: Option<String>,
    pub info: Option<String>,
}

impl UploadParams {
    /// first occurrence of each parameter wins, repeats are ignored
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "statusCode" => &mut params.status_code,
                "info" => &mut params.info,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        params
    }
}

// ==============================================================================
// handlers
// ==============================================================================

/// GET /api/upload?statusCode=<int>&info=<string>
///
/// always acks with 200 unless a reading fails to parse or persist.
async fn upload_handler(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> TelemetryResult<Json<Value>> {
    let Query(pairs) = query.map_err(|rejection| {
        let e = TelemetryError::Query(rejection.body_text());
        error!(error = %e, "rejected upload query");
        e
    })?;
    let params = UploadParams::from_pairs(pairs);
    let status = DeviceStatus::from_query(params.status_code.as_deref());
    let info = params.info.unwrap_or_default();

    match status {
        DeviceStatus::Reading => {
            info!(info = %info, "reading received");
            let record = ingest(&state, &info).await.map_err(|e| {
                error!(error = %e, info = %info, "failed to ingest reading");
                e
            })?;
            if state.show_sensor_data {
                info!(record = ?record, "data saved");
            } else {
                debug!(record = ?record, "data saved");
            }
        }
        DeviceStatus::Fault => warn!(info = %info, "device reported an error"),
        DeviceStatus::Unknown(code) => warn!(code, info = %info, "unknown status code"),
    }

    Ok(Json(json!({ "message": "Data received successfully" })))
}

/// parse, stamp and append one reading
async fn ingest(state: &AppState, info: &str) -> TelemetryResult<SensorRecord> {
    let parsed = parse_info(info)?;
    let record = SensorRecord::from_parsed(now_timestamp(), &parsed)?;

    // offload blocking io to dedicated thread
    let store = state.store.clone();
    let to_save = record.clone();
    tokio::task::spawn_blocking(move || store.append(&to_save)).await??;

    Ok(record)
}

/// GET /data - newest row, 404 while the store has none
async fn latest_handler(State(state): State<AppState>) -> TelemetryResult<Json<SensorRecord>> {
    let store = state.store.clone();
    let latest = tokio::task::spawn_blocking(move || store.latest()).await?;

    match latest {
        Ok(record) => Ok(Json(record)),
        Err(TelemetryError::EmptyStore) => Err(TelemetryError::EmptyStore),
        Err(e) => {
            error!(error = %e, "failed to read latest reading");
            Err(e)
        }
    }
}

/// GET / - configured page if readable, built-in page otherwise
async fn index_handler(State(state): State<AppState>) -> Html<String> {
    if let Some(path) = &state.index_page {
        match tokio::fs::read_to_string(path).await {
            Ok(html) => return Html(html),
            Err(e) => warn!(path = %path.display(), error = %e, "index page unreadable, serving built-in page"),
        }
    }
    Html(DEFAULT_INDEX.to_string())
}
