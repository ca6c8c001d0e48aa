//! error taxonomy for ingestion and queries, and its http mapping.
//!
//! every failure raised inside a request ends here and becomes a response;
//! nothing is allowed to take the process down.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::info::ParseError;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("missing field {0} in device info")]
    MissingField(&'static str),

    #[error("invalid query string: {0}")]
    Query(String),

    #[error("no data available")]
    EmptyStore,

    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt store row at line {line}: {reason}")]
    CorruptRow { line: usize, reason: String },

    #[error("store worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

pub type TelemetryResult<T> = Result<T, TelemetryError>;

impl IntoResponse for TelemetryError {
    fn into_response(self) -> Response {
        match self {
            // an empty store is an expected state, not a failure
            TelemetryError::EmptyStore => (
                StatusCode::NOT_FOUND,
                Json(json!({ "message": "No data available" })),
            )
                .into_response(),
            other => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": other.to_string() })),
            )
                .into_response(),
        }
    }
}
