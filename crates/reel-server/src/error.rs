//! Maps every core crate's `thiserror` enum onto the five-kind HTTP
//! taxonomy, mirroring the way the teacher widens library errors only at
//! the adapter edge.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Model(#[from] reel_model::ModelError),
    #[error(transparent)]
    Engine(#[from] reel_engine::EngineError),
    #[error(transparent)]
    Midi(#[from] reel_midi::MidiError),
    #[error(transparent)]
    Theory(#[from] reel_theory::TheoryError),
    #[error("no candidate satisfied the locked bars: {0}")]
    GenerationFailure(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'static str>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, field) = match &self {
            ApiError::Model(reel_model::ModelError::NotFound { .. }) => (StatusCode::NOT_FOUND, None),
            ApiError::Model(reel_model::ModelError::InvariantViolation { field, .. }) => {
                (StatusCode::BAD_REQUEST, Some(*field))
            }
            ApiError::Model(reel_model::ModelError::Locked { .. }) => (StatusCode::BAD_REQUEST, None),
            ApiError::Engine(reel_engine::EngineError::Model(reel_model::ModelError::NotFound { .. })) => {
                (StatusCode::NOT_FOUND, None)
            }
            ApiError::Engine(reel_engine::EngineError::GenerationFailure(_)) => (StatusCode::BAD_REQUEST, None),
            ApiError::Engine(_) => (StatusCode::BAD_REQUEST, None),
            ApiError::Theory(_) => (StatusCode::BAD_REQUEST, None),
            ApiError::GenerationFailure(_) => (StatusCode::BAD_REQUEST, None),
            ApiError::Midi(_) => (StatusCode::INTERNAL_SERVER_ERROR, None),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, None),
        };
        tracing::warn!(error = %self, status = %status, "request failed");
        let body = ErrorBody { error: self.to_string(), field };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
