use crate::error::VoiceError;
use salon_types::voice::VoiceSelection;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::Mutex;

/// Timeout for TTS process execution.
const TTS_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of a synthesis attempt, shaped for the voice API response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SynthesisOutcome {
    pub ok: bool,
    /// Empty on success.
    pub error: String,
}

impl SynthesisOutcome {
    fn success() -> Self {
        Self {
            ok: true,
            error: String::new(),
        }
    }

    fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: error.into(),
        }
    }
}

/// Keeps at most `max_chars` characters of `text`.
pub fn truncate_for_speech(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Service for speaking replies with piper.
///
/// Piper is not run concurrently: each instance owns a lock held for the
/// duration of one synthesis.
#[derive(Debug, Clone)]
pub struct TtsService {
    piper_binary: PathBuf,
    voice: VoiceSelection,
    max_chars: usize,
    synth_lock: Arc<Mutex<()>>,
}

impl TtsService {
    pub fn new(piper_binary: impl AsRef<Path>, voice: VoiceSelection, max_chars: usize) -> Self {
        Self {
            piper_binary: piper_binary.as_ref().to_path_buf(),
            voice,
            max_chars,
            synth_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn voice(&self) -> &VoiceSelection {
        &self.voice
    }

    /// Speaks `text` into a WAV file at `out`, reporting failure as a value.
    ///
    /// `text` is expected to be sanitized already; it is trimmed and cut to the
    /// configured maximum length here.
    pub async fn speak(&self, text: &str, out: &Path) -> SynthesisOutcome {
        match self.synthesize_to_file(text, out).await {
            Ok(()) => SynthesisOutcome::success(),
            Err(e) => {
                tracing::error!("TTS failed: {}", e);
                SynthesisOutcome::failure(e.to_string())
            }
        }
    }

    pub async fn synthesize_to_file(&self, text: &str, out: &Path) -> Result<(), VoiceError> {
        let text = truncate_for_speech(text.trim(), self.max_chars);
        if text.is_empty() {
            return Err(VoiceError::Tts("text is empty".to_string()));
        }

        let model_path = Path::new(&self.voice.model_path);
        if !model_path.exists() {
            return Err(VoiceError::Tts(format!(
                "Model file not found: {:?}",
                model_path
            )));
        }

        match tokio::fs::remove_file(out).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(VoiceError::Tts(format!(
                    "Cannot replace output file {:?}: {}",
                    out, e
                )))
            }
        }

        let mut command = Command::new(&self.piper_binary);
        command
            .arg("--model")
            .arg(model_path)
            .arg("--output_file")
            .arg(out)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(config) = &self.voice.config_path {
            command.arg("--config").arg(config);
        }

        if let Some(speaker) = self.voice.speaker_id {
            command.arg("--speaker").arg(speaker.to_string());
        }

        let _guard = self.synth_lock.lock().await;

        let mut child = command
            .spawn()
            .map_err(|e| VoiceError::Tts(format!("Failed to spawn piper: {}", e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| VoiceError::Tts("Failed to open stdin".to_string()))?;
        let text_owned = format!("{}\n", text);

        // Write from a separate task so a full stdout pipe cannot deadlock us.
        let write_task = tokio::spawn(async move {
            stdin.write_all(text_owned.as_bytes()).await?;
            stdin.shutdown().await
        });

        let output = tokio::time::timeout(TTS_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| {
                VoiceError::Tts(format!(
                    "TTS process timed out after {} seconds",
                    TTS_TIMEOUT.as_secs()
                ))
            })?
            .map_err(|e| VoiceError::Tts(format!("Failed to wait for piper: {}", e)))?;

        match write_task.await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                return Err(VoiceError::Tts(format!(
                    "Failed to write to piper stdin: {}",
                    e
                )))
            }
            Err(e) => return Err(VoiceError::Tts(format!("Stdin task failed: {}", e))),
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VoiceError::Tts(format!("Piper failed: {}", stderr)));
        }

        let written = tokio::fs::metadata(out).await.map(|m| m.len()).unwrap_or(0);
        if written == 0 {
            return Err(VoiceError::Tts("Piper produced no audio".to_string()));
        }

        Ok(())
    }
}
