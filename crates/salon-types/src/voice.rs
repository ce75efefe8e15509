//! Voice selection for synthesized replies.
//!
//! The front desk speaks with one fixed voice. A `VoiceSelection` names the
//! piper model that produces it and the locale it is meant for.

use serde::{Deserialize, Serialize};

/// The fixed voice used for every reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceSelection {
    /// BCP 47 locale of the voice.
    #[serde(default = "default_locale")]
    pub locale: String,
    /// Path to the piper ONNX model.
    pub model_path: String,
    /// Path to the model configuration file, if it does not sit next to the model.
    #[serde(default)]
    pub config_path: Option<String>,
    /// Speaker ID within a multi-speaker model (0-indexed).
    #[serde(default)]
    pub speaker_id: Option<u32>,
}

fn default_locale() -> String {
    "zh-HK".to_string()
}

impl Default for VoiceSelection {
    fn default() -> Self {
        Self {
            locale: default_locale(),
            model_path: "voices/zh_HK-voice-medium.onnx".to_string(),
            config_path: None,
            speaker_id: None,
        }
    }
}
