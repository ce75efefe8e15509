use crate::error::VoiceError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

/// Maximum audio input size for STT (10 MiB). A few seconds of 16 kHz mono
/// PCM is well under this.
const MAX_STT_INPUT_BYTES: u64 = 10 * 1024 * 1024;

/// Timeout for STT process execution.
const STT_TIMEOUT: Duration = Duration::from_secs(30);

/// Speech recognition through a whisper.cpp command-line binary.
#[derive(Debug, Clone)]
pub struct SttService {
    model_path: PathBuf,
    binary_path: PathBuf,
    language: String,
}

impl SttService {
    pub fn new(
        model_path: impl Into<PathBuf>,
        binary_path: impl Into<PathBuf>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            model_path: model_path.into(),
            binary_path: binary_path.into(),
            language: language.into(),
        }
    }

    /// Best-effort transcript of a 16 kHz mono WAV file.
    ///
    /// Every failure (no speech, bad file, crashed or hung recognizer) is
    /// logged and collapses to an empty string.
    pub async fn transcribe(&self, wav_path: &Path) -> String {
        match self.try_transcribe(wav_path).await {
            Ok(text) => {
                if text.is_empty() {
                    tracing::warn!("STT: no speech recognized");
                }
                text
            }
            Err(e) => {
                tracing::error!("STT failed: {}", e);
                String::new()
            }
        }
    }

    /// Runs the recognizer and returns its trimmed stdout.
    pub async fn try_transcribe(&self, wav_path: &Path) -> Result<String, VoiceError> {
        let metadata = tokio::fs::metadata(wav_path)
            .await
            .map_err(|e| VoiceError::Stt(format!("Cannot read audio file {:?}: {}", wav_path, e)))?;
        if metadata.len() > MAX_STT_INPUT_BYTES {
            return Err(VoiceError::Stt(format!(
                "audio data exceeds maximum size: {} bytes (limit: {} bytes)",
                metadata.len(),
                MAX_STT_INPUT_BYTES
            )));
        }

        // whisper.cpp: -nt drops timestamps and -np suppresses progress output,
        // leaving only the transcription on stdout.
        let mut command = Command::new(&self.binary_path);
        command
            .arg("-m")
            .arg(&self.model_path)
            .arg("-l")
            .arg(&self.language)
            .arg("-nt")
            .arg("-np")
            .arg("-f")
            .arg(wav_path)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true);

        let child = command
            .spawn()
            .map_err(|e| VoiceError::Stt(format!("Failed to spawn STT binary: {}", e)))?;

        let output = tokio::time::timeout(STT_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| {
                VoiceError::Stt(format!(
                    "STT process timed out after {} seconds",
                    STT_TIMEOUT.as_secs()
                ))
            })?
            .map_err(|e| VoiceError::Stt(format!("Failed to read stdout: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VoiceError::Stt(format!("STT binary failed: {}", stderr)));
        }

        // Markers such as `[BLANK_AUDIO]` are not speech.
        let text = String::from_utf8_lossy(&output.stdout)
            .split_whitespace()
            .filter(|word| !(word.starts_with('[') && word.ends_with(']')))
            .collect::<Vec<_>>()
            .join(" ");
        Ok(text)
    }
}
