//! Voice turn handlers.
//!
//! One `POST /api/voice` request is one conversational turn: the uploaded clip
//! is normalized with ffmpeg, transcribed, answered by the dialogue engine and
//! spoken back with piper. The conversation state travels with the request;
//! the server keeps none of it.

use crate::api::{ApiError, TurnError};
use crate::AppState;
use axum::{
    extract::{Extension, Multipart, Path},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use salon_dialogue::sanitize_for_speech;
use salon_types::ConversationState;
use serde::Serialize;
use serde_json::{json, Value};
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Maximum voice upload size: 25 MiB.
pub const MAX_VOICE_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Prefix and suffix every servable synthesized reply carries.
pub const TTS_FILE_PREFIX: &str = "tts_";
pub const TTS_FILE_SUFFIX: &str = ".wav";

/// Milliseconds spent in each stage of a turn.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StageTimings {
    pub transcode_ms: u64,
    pub stt_ms: u64,
    pub dialogue_ms: u64,
    pub tts_ms: u64,
    pub total_ms: u64,
}

/// Response body for a completed voice turn.
#[derive(Debug, Serialize)]
pub struct VoiceResponse {
    pub ok: bool,
    pub request_id: String,
    pub user_text: String,
    pub reply_text: String,
    /// `/tts/<name>`, or empty when synthesis failed.
    pub audio_url: String,
    pub tts_ok: bool,
    pub tts_error: String,
    pub state: ConversationState,
    pub route: &'static str,
    /// Total wall time, e.g. "1.2s".
    pub timing: String,
    pub timings: StageTimings,
}

/// Removes a turn's input files however the handler exits.
struct TempFiles(Vec<PathBuf>);

impl Drop for TempFiles {
    fn drop(&mut self) {
        for path in &self.0 {
            if let Err(e) = std::fs::remove_file(path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %path.display(), "failed to remove temp file: {}", e);
                }
            }
        }
    }
}

fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.1}s", elapsed.as_secs_f64())
}

fn millis(elapsed: Duration) -> u64 {
    elapsed.as_millis() as u64
}

/// Short id tying together the log lines of one request.
fn new_request_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Whether `name` may be served from the temp directory.
pub fn is_servable_tts_name(name: &str) -> bool {
    name.starts_with(TTS_FILE_PREFIX)
        && name.ends_with(TTS_FILE_SUFFIX)
        && name.len() > TTS_FILE_PREFIX.len() + TTS_FILE_SUFFIX.len()
        && !name.contains(['/', '\\'])
        && !name.contains("..")
}

struct VoiceUpload {
    audio: Vec<u8>,
    extension: String,
    state_json: String,
}

async fn read_upload(multipart: &mut Multipart) -> Result<VoiceUpload, ApiError> {
    let mut audio = None;
    let mut extension = "webm".to_string();
    let mut state_json = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("multipart error: {}", e)))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("audio") => {
                if let Some(ext) = field
                    .file_name()
                    .and_then(|name| FsPath::new(name).extension())
                    .and_then(|ext| ext.to_str())
                    .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
                {
                    extension = ext.to_ascii_lowercase();
                }
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("failed to read audio: {}", e)))?;
                audio = Some(data.to_vec());
            }
            Some("state") => {
                state_json = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("failed to read state: {}", e)))?;
            }
            _ => {}
        }
    }

    let audio = audio
        .filter(|data| !data.is_empty())
        .ok_or_else(|| ApiError::BadRequest("no audio uploaded".to_string()))?;

    Ok(VoiceUpload {
        audio,
        extension,
        state_json,
    })
}

/// Handler for `POST /api/voice`.
pub async fn voice_handler(
    Extension(state): Extension<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<VoiceResponse>, TurnError> {
    let started = Instant::now();
    let request_id = new_request_id();

    let upload = read_upload(&mut multipart).await?;
    let session = ConversationState::from_json_lossy(&upload.state_json);

    tracing::info!(
        request_id = %request_id,
        bytes = upload.audio.len(),
        treatment = ?session.treatment,
        has_booking_time = session.booking_time.is_some(),
        "voice turn received"
    );

    let input_path = state
        .tmp_dir
        .join(format!("in_{}.{}", request_id, upload.extension));
    let wav_path = state.tmp_dir.join(format!("in_{}.wav", request_id));
    let _cleanup = TempFiles(vec![input_path.clone(), wav_path.clone()]);

    tokio::fs::write(&input_path, &upload.audio)
        .await
        .map_err(|e| {
            TurnError::new(
                ApiError::InternalServerError(format!("failed to save upload: {}", e)),
                &session,
            )
        })?;

    let mut timings = StageTimings::default();

    let stage = Instant::now();
    if let Err(e) = state.transcoder.to_pcm_wav(&input_path, &wav_path).await {
        tracing::error!(request_id = %request_id, "transcoding failed: {}", e);
        return Err(TurnError::new(
            ApiError::InternalServerError(format!("audio conversion failed: {}", e)),
            &session,
        )
        .with_timing(format_elapsed(started.elapsed())));
    }
    timings.transcode_ms = millis(stage.elapsed());

    let stage = Instant::now();
    let user_text = state.stt.transcribe(&wav_path).await;
    timings.stt_ms = millis(stage.elapsed());

    if user_text.is_empty() {
        tracing::info!(request_id = %request_id, "no speech recognized");
        return Err(TurnError::new(
            ApiError::BadRequest("speech not recognized, please try again".to_string()),
            &session,
        )
        .with_timing(format_elapsed(started.elapsed())));
    }

    let stage = Instant::now();
    let turn = state.engine.generate_reply(&user_text, &session).await;
    timings.dialogue_ms = millis(stage.elapsed());

    let reply_text = sanitize_for_speech(&turn.reply);
    let tts_name = format!("{}{}{}", TTS_FILE_PREFIX, request_id, TTS_FILE_SUFFIX);
    let tts_path = state.tmp_dir.join(&tts_name);

    let stage = Instant::now();
    let outcome = state.tts.speak(&reply_text, &tts_path).await;
    timings.tts_ms = millis(stage.elapsed());
    if !outcome.ok {
        tracing::warn!(request_id = %request_id, "speech synthesis failed: {}", outcome.error);
    }

    let elapsed = started.elapsed();
    timings.total_ms = millis(elapsed);

    tracing::info!(
        request_id = %request_id,
        route = turn.route.as_str(),
        transcode_ms = timings.transcode_ms,
        stt_ms = timings.stt_ms,
        dialogue_ms = timings.dialogue_ms,
        tts_ms = timings.tts_ms,
        total_ms = timings.total_ms,
        "voice turn complete"
    );

    Ok(Json(VoiceResponse {
        ok: true,
        request_id,
        user_text,
        reply_text,
        audio_url: if outcome.ok {
            format!("/tts/{}", tts_name)
        } else {
            String::new()
        },
        tts_ok: outcome.ok,
        tts_error: outcome.error,
        state: turn.state,
        route: turn.route.as_str(),
        timing: format_elapsed(elapsed),
        timings,
    }))
}

/// Handler for `POST /api/reset`.
pub async fn reset_handler() -> Json<Value> {
    Json(json!({
        "ok": true,
        "state": ConversationState::reset(),
    }))
}

/// Handler for `GET /tts/{name}`.
pub async fn tts_file_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    if !is_servable_tts_name(&name) {
        return Err(ApiError::NotFound("audio not found".to_string()));
    }

    let data = tokio::fs::read(state.tmp_dir.join(&name))
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ApiError::NotFound("audio not found".to_string()),
            _ => ApiError::InternalServerError(format!("failed to read audio: {}", e)),
        })?;

    Ok((
        [
            (header::CONTENT_TYPE, "audio/wav"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        data,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn servable_names() {
        assert!(is_servable_tts_name("tts_1a2b3c4d.wav"));
        assert!(!is_servable_tts_name("tts_.wav"));
        assert!(!is_servable_tts_name("in_1a2b3c4d.wav"));
        assert!(!is_servable_tts_name("tts_1a2b3c4d.mp3"));
        assert!(!is_servable_tts_name("tts_../secret.wav"));
        assert!(!is_servable_tts_name("tts_a\\b.wav"));
    }

    #[test]
    fn request_ids_are_short_hex() {
        let id = new_request_id();
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn elapsed_has_one_decimal() {
        assert_eq!(format_elapsed(Duration::from_millis(1234)), "1.2s");
        assert_eq!(format_elapsed(Duration::ZERO), "0.0s");
    }
}
