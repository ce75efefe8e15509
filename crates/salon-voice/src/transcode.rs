use crate::error::VoiceError;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Timeout for a single ffmpeg conversion.
const TRANSCODE_TIMEOUT: Duration = Duration::from_secs(25);

/// How much of ffmpeg's stderr is kept in error messages.
const STDERR_TAIL_CHARS: usize = 500;

/// Converts uploaded clips (typically browser webm/opus) into the 16 kHz mono
/// PCM WAV the recognizer expects.
#[derive(Debug, Clone)]
pub struct Transcoder {
    ffmpeg_binary: PathBuf,
}

impl Transcoder {
    pub fn new(ffmpeg_binary: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_binary: ffmpeg_binary.into(),
        }
    }

    /// Writes a 16 kHz mono `pcm_s16le` WAV of `src` to `dst`, overwriting it.
    pub async fn to_pcm_wav(&self, src: &Path, dst: &Path) -> Result<(), VoiceError> {
        let mut command = Command::new(&self.ffmpeg_binary);
        command
            .args(["-y", "-nostdin", "-hide_banner", "-loglevel", "error"])
            .args(["-threads", "2"])
            .arg("-i")
            .arg(src)
            .args(["-vn", "-ac", "1", "-ar", "16000", "-c:a", "pcm_s16le"])
            .arg(dst)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = command
            .spawn()
            .map_err(|e| VoiceError::Transcode(format!("Failed to spawn ffmpeg: {}", e)))?;

        let output = tokio::time::timeout(TRANSCODE_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| {
                VoiceError::Transcode(format!(
                    "ffmpeg timed out after {} seconds",
                    TRANSCODE_TIMEOUT.as_secs()
                ))
            })?
            .map_err(|e| VoiceError::Transcode(format!("Failed to wait for ffmpeg: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail = stderr_tail(&stderr);
            return Err(VoiceError::Transcode(format!(
                "ffmpeg failed: {}",
                if tail.is_empty() { "unknown error" } else { tail }
            )));
        }

        if !dst.exists() {
            return Err(VoiceError::Transcode(format!(
                "ffmpeg produced no output at {:?}",
                dst
            )));
        }

        Ok(())
    }
}

fn stderr_tail(stderr: &str) -> &str {
    let trimmed = stderr.trim();
    let count = trimmed.chars().count();
    if count <= STDERR_TAIL_CHARS {
        return trimmed;
    }
    let skip = count - STDERR_TAIL_CHARS;
    match trimmed.char_indices().nth(skip) {
        Some((idx, _)) => &trimmed[idx..],
        None => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stderr_tail_keeps_the_end() {
        let long = format!("{}{}", "x".repeat(600), "last words");
        let tail = stderr_tail(&long);
        assert_eq!(tail.chars().count(), STDERR_TAIL_CHARS);
        assert!(tail.ends_with("last words"));
        assert_eq!(stderr_tail("  short  "), "short");
    }

    #[tokio::test]
    async fn missing_binary_is_a_transcode_error() {
        let dir = tempfile::tempdir().unwrap();
        let transcoder = Transcoder::new(dir.path().join("no-such-ffmpeg"));
        let result = transcoder
            .to_pcm_wav(&dir.path().join("in.webm"), &dir.path().join("out.wav"))
            .await;
        match result {
            Err(VoiceError::Transcode(msg)) => assert!(msg.contains("spawn")),
            other => panic!("expected transcode error, got {:?}", other),
        }
    }
}
