//! Error responses shared by the HTTP handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use salon_types::ConversationState;
use serde_json::json;
use thiserror::Error;

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl ApiError {
    fn parts(self) -> (StatusCode, String) {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.parts();

        let body = Json(json!({
            "ok": false,
            "error": message
        }));

        (status, body).into_response()
    }
}

/// A failed voice turn.
///
/// Echoes the caller's state back so the client can keep its session, and
/// the elapsed time when the failure happened mid-turn.
#[derive(Debug)]
pub struct TurnError {
    pub error: ApiError,
    pub state: ConversationState,
    pub timing: Option<String>,
}

impl TurnError {
    pub fn new(error: ApiError, state: &ConversationState) -> Self {
        Self {
            error,
            state: state.clone(),
            timing: None,
        }
    }

    pub fn with_timing(mut self, timing: String) -> Self {
        self.timing = Some(timing);
        self
    }
}

impl From<ApiError> for TurnError {
    fn from(error: ApiError) -> Self {
        Self::new(error, &ConversationState::default())
    }
}

impl IntoResponse for TurnError {
    fn into_response(self) -> Response {
        let (status, message) = self.error.parts();

        let mut body = json!({
            "ok": false,
            "error": message,
            "state": self.state,
        });
        if let Some(timing) = self.timing {
            body["timing"] = json!(timing);
        }

        (status, Json(body)).into_response()
    }
}
