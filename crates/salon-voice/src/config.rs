use salon_types::voice::VoiceSelection;
use serde::Deserialize;

/// Default cap on the number of characters handed to the synthesizer.
pub const DEFAULT_MAX_REPLY_CHARS: usize = 180;

fn default_ffmpeg_binary() -> String {
    "ffmpeg".to_string()
}

fn default_whisper_binary() -> String {
    "whisper-cli".to_string()
}

fn default_whisper_model() -> String {
    "models/ggml-base.bin".to_string()
}

fn default_language() -> String {
    "yue".to_string()
}

fn default_piper_binary() -> String {
    "piper".to_string()
}

fn default_max_reply_chars() -> usize {
    DEFAULT_MAX_REPLY_CHARS
}

/// Paths and limits for the speech programs.
#[derive(Debug, Clone, Deserialize)]
pub struct SpeechConfig {
    #[serde(default = "default_ffmpeg_binary")]
    pub ffmpeg_binary: String,
    #[serde(default = "default_whisper_binary")]
    pub whisper_binary: String,
    #[serde(default = "default_whisper_model")]
    pub whisper_model: String,
    /// Recognition language passed to whisper (`-l`).
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_piper_binary")]
    pub piper_binary: String,
    /// The voice every reply is spoken with.
    #[serde(default)]
    pub voice: VoiceSelection,
    /// Replies longer than this many characters are cut before synthesis.
    #[serde(default = "default_max_reply_chars")]
    pub max_reply_chars: usize,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            ffmpeg_binary: default_ffmpeg_binary(),
            whisper_binary: default_whisper_binary(),
            whisper_model: default_whisper_model(),
            language: default_language(),
            piper_binary: default_piper_binary(),
            voice: VoiceSelection::default(),
            max_reply_chars: default_max_reply_chars(),
        }
    }
}
