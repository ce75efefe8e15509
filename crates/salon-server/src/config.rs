//! Server configuration loading from file and environment variables.

use salon_dialogue::{DialogueConfig, GeminiConfig, GenerationParams, SYSTEM_PROMPT};
use salon_voice::SpeechConfig;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Scratch space for uploads and synthesized replies.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Dialogue engine tuning.
    #[serde(default)]
    pub dialogue: DialogueSettings,

    /// Language model provider.
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// ffmpeg, whisper and piper.
    #[serde(default)]
    pub speech: SpeechConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "salon_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Where temporary audio lives and for how long.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory for uploaded clips and synthesized replies.
    #[serde(default = "default_tmp_dir")]
    pub tmp_dir: String,

    /// Synthesized replies older than this are deleted.
    #[serde(default = "default_audio_retention_seconds")]
    pub audio_retention_seconds: u64,
}

/// Dialogue engine settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DialogueSettings {
    /// Deadline for one language model call.
    #[serde(default = "default_model_timeout_ms")]
    pub model_timeout_ms: u64,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    5001
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_tmp_dir() -> String {
    "./salon_tmp".to_string()
}

fn default_audio_retention_seconds() -> u64 {
    600
}

fn default_model_timeout_ms() -> u64 {
    5_000
}

fn default_max_output_tokens() -> u32 {
    GenerationParams::default().max_output_tokens
}

fn default_temperature() -> f32 {
    GenerationParams::default().temperature
}

fn default_top_p() -> f32 {
    GenerationParams::default().top_p
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            tmp_dir: default_tmp_dir(),
            audio_retention_seconds: default_audio_retention_seconds(),
        }
    }
}

impl Default for DialogueSettings {
    fn default() -> Self {
        Self {
            model_timeout_ms: default_model_timeout_ms(),
            max_output_tokens: default_max_output_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
        }
    }
}

impl DialogueSettings {
    /// Engine configuration with the built-in persona.
    pub fn to_engine_config(&self) -> DialogueConfig {
        DialogueConfig {
            model_timeout: Duration::from_millis(self.model_timeout_ms),
            generation: GenerationParams {
                max_output_tokens: self.max_output_tokens,
                temperature: self.temperature,
                top_p: self.top_p,
            },
            system_prompt: SYSTEM_PROMPT.to_string(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `SALON_HOST`, `SALON_PORT` override `server.*`
/// - `SALON_LOG_LEVEL` overrides `logging.level`
/// - `SALON_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `SALON_TMP_DIR` overrides `storage.tmp_dir`
/// - `GEMINI_API_KEY` overrides `gemini.api_key`
/// - `GEMINI_TIMEOUT_S` overrides `dialogue.model_timeout_ms` (in seconds)
/// - `GEMINI_MAX_TOKENS`, `GEMINI_TEMPERATURE`, `GEMINI_TOP_P` override the
///   generation parameters
/// - `MAX_REPLY_CHARS` overrides `speech.max_reply_chars`
///
/// Unparseable numeric overrides are ignored.
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    align_model_timeouts(&mut config);
    Ok(config)
}

/// Headroom the transport timeout keeps over the engine deadline.
const TRANSPORT_TIMEOUT_MARGIN_MS: u64 = 1_000;

/// Keeps the HTTP client timeout above the dialogue deadline.
///
/// Otherwise reqwest gives up first and a slow provider is reported as a
/// failure instead of a timeout.
fn align_model_timeouts(config: &mut Config) {
    let deadline = config.dialogue.model_timeout_ms;
    if config.gemini.request_timeout_ms <= deadline {
        let raised = deadline.saturating_add(TRANSPORT_TIMEOUT_MARGIN_MS);
        tracing::warn!(
            model_timeout_ms = deadline,
            request_timeout_ms = config.gemini.request_timeout_ms,
            raised_to = raised,
            "gemini.request_timeout_ms is not above the model timeout, raising it"
        );
        config.gemini.request_timeout_ms = raised;
    }
}

fn apply_env_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(host) = var("SALON_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Some(port) = var("SALON_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Some(level) = var("SALON_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = var("SALON_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Some(dir) = var("SALON_TMP_DIR") {
        if !dir.trim().is_empty() {
            config.storage.tmp_dir = dir;
        }
    }
    if let Some(key) = var("GEMINI_API_KEY") {
        config.gemini.api_key = key.trim().to_string();
    }
    if let Some(secs) = var("GEMINI_TIMEOUT_S") {
        if let Ok(parsed) = secs.trim().parse::<f64>() {
            if parsed > 0.0 {
                config.dialogue.model_timeout_ms = (parsed * 1000.0) as u64;
            }
        }
    }
    if let Some(tokens) = var("GEMINI_MAX_TOKENS") {
        if let Ok(parsed) = tokens.trim().parse() {
            config.dialogue.max_output_tokens = parsed;
        }
    }
    if let Some(temperature) = var("GEMINI_TEMPERATURE") {
        if let Ok(parsed) = temperature.trim().parse() {
            config.dialogue.temperature = parsed;
        }
    }
    if let Some(top_p) = var("GEMINI_TOP_P") {
        if let Ok(parsed) = top_p.trim().parse() {
            config.dialogue.top_p = parsed;
        }
    }
    if let Some(chars) = var("MAX_REPLY_CHARS") {
        if let Ok(parsed) = chars.trim().parse() {
            config.speech.max_reply_chars = parsed;
        }
    }
}
