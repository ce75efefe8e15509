//! Background task for deleting synthesized replies once they have been played.

use crate::api_voice::{TTS_FILE_PREFIX, TTS_FILE_SUFFIX};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::time::sleep;

/// Deletes `tts_*.wav` files in `dir` whose last modification is at least
/// `max_age` ago. Other files are left alone.
///
/// Returns the number of files removed.
///
/// # Errors
///
/// Returns an error if `dir` cannot be listed. Failures on individual files
/// are logged and skipped.
pub async fn prune_synthesized_audio(dir: &Path, max_age: Duration) -> std::io::Result<usize> {
    let now = SystemTime::now();
    let mut removed = 0;
    let mut entries = tokio::fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !name.starts_with(TTS_FILE_PREFIX) || !name.ends_with(TTS_FILE_SUFFIX) {
            continue;
        }

        let modified = match entry.metadata().await.and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) => {
                tracing::warn!(file = name, "failed to stat synthesized audio: {}", e);
                continue;
            }
        };
        // Clock skew can put mtime in the future; treat that as fresh.
        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        if age < max_age {
            continue;
        }

        match tokio::fs::remove_file(entry.path()).await {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(file = name, "failed to delete synthesized audio: {}", e),
        }
    }

    Ok(removed)
}

/// Starts a background task that periodically prunes synthesized replies.
///
/// This task runs indefinitely. A zero `max_age` disables it.
pub async fn start_audio_retention_task(dir: PathBuf, max_age: Duration) {
    if max_age.is_zero() {
        tracing::info!("audio retention disabled");
        return;
    }

    let interval = (max_age / 2).clamp(Duration::from_secs(1), Duration::from_secs(60));
    tracing::info!(
        dir = %dir.display(),
        max_age_seconds = max_age.as_secs(),
        interval_seconds = interval.as_secs(),
        "starting audio retention task"
    );

    loop {
        sleep(interval).await;

        match prune_synthesized_audio(&dir, max_age).await {
            Ok(0) => tracing::debug!("no expired audio to delete"),
            Ok(count) => tracing::info!(count, "deleted expired audio"),
            Err(e) => tracing::error!(error = %e, "failed to prune audio directory"),
        }
    }
}
