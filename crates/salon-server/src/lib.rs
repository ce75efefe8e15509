//! Salon front desk server library logic.

pub mod api;
pub mod api_voice;
pub mod config;
pub mod retention;

use axum::{
    extract::DefaultBodyLimit,
    response::Html,
    routing::{get, post},
    Extension, Json, Router,
};
use salon_dialogue::DialogueEngine;
use salon_voice::{SttService, Transcoder, TtsService};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Turn-level dialogue logic.
    pub engine: Arc<DialogueEngine>,
    /// Upload normalization.
    pub transcoder: Arc<Transcoder>,
    /// Speech recognition.
    pub stt: Arc<SttService>,
    /// Speech synthesis.
    pub tts: Arc<TtsService>,
    /// Directory for per-turn audio files.
    pub tmp_dir: PathBuf,
}

/// Maximum request body size for everything except voice uploads (64 KiB).
const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

const INDEX_HTML: &str = include_str!("../static/index.html");

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Serves the browser front end.
async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    // The inner limit is applied last, so it wins over the router-wide one.
    let voice_routes = Router::new()
        .route("/api/voice", post(api_voice::voice_handler))
        .layer(DefaultBodyLimit::max(api_voice::MAX_VOICE_UPLOAD_BYTES));

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/reset", post(api_voice::reset_handler))
        .route("/tts/{name}", get(api_voice::tts_file_handler))
        .merge(voice_routes)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
