//! Salon front desk server binary.
//!
//! Starts the axum HTTP server with structured logging, the Gemini-backed
//! dialogue engine, the speech adapters and graceful shutdown on SIGTERM/SIGINT.

use salon_dialogue::{DialogueEngine, GeminiClient};
use salon_server::{app, config, retention, AppState};
use salon_voice::{SttService, Transcoder, TtsService};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("SALON_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

#[tokio::main]
async fn main() {
    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("config.toml"));

    // Load configuration
    let config = config::load_config(selected_config_path)
        .expect("failed to load configuration; the server cannot start without valid config");

    // Initialize tracing
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    // Language model
    let model = GeminiClient::new(config.gemini.clone())
        .expect("failed to build Gemini client; set GEMINI_API_KEY or gemini.api_key");
    let engine = DialogueEngine::new(Arc::new(model), config.dialogue.to_engine_config());
    tracing::info!(
        model = %config.gemini.model,
        timeout_ms = config.dialogue.model_timeout_ms,
        "dialogue engine ready"
    );

    // Speech adapters
    let speech = &config.speech;
    let transcoder = Transcoder::new(&speech.ffmpeg_binary);
    let stt = SttService::new(
        &speech.whisper_model,
        &speech.whisper_binary,
        speech.language.clone(),
    );
    let tts = TtsService::new(
        &speech.piper_binary,
        speech.voice.clone(),
        speech.max_reply_chars,
    );
    let voice = tts.voice();
    if std::path::Path::new(&voice.model_path).exists() {
        tracing::info!(locale = %voice.locale, model = %voice.model_path, "speech voice ready");
    } else {
        tracing::warn!(
            model = %voice.model_path,
            "piper voice model not found; replies will be text only"
        );
    }

    let tmp_dir = PathBuf::from(&config.storage.tmp_dir);
    std::fs::create_dir_all(&tmp_dir).expect("failed to create storage.tmp_dir");

    tokio::spawn(retention::start_audio_retention_task(
        tmp_dir.clone(),
        Duration::from_secs(config.storage.audio_retention_seconds),
    ));

    // Build application
    let app = app(AppState {
        engine: Arc::new(engine),
        transcoder: Arc::new(transcoder),
        stt: Arc::new(stt),
        tts: Arc::new(tts),
        tmp_dir,
    });
    let addr = SocketAddr::new(config.server.host, config.server.port);

    tracing::info!(%addr, "starting salon server");

    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind to address; is another process using this port?");

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("salon server shut down");
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, initiating graceful shutdown"); }
        () = terminate => { tracing::info!("received SIGTERM, initiating graceful shutdown"); }
    }
}
