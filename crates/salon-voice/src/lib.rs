//! Speech plumbing for the salon front desk.
//!
//! Wraps the three external programs a voice turn passes through: ffmpeg
//! normalizes the uploaded clip to 16 kHz mono PCM, whisper.cpp transcribes
//! it, and piper speaks the reply. Each adapter runs its program as a child
//! process under a hard timeout.
//!
//! Recognition failures never escape [`SttService::transcribe`]: they collapse
//! to an empty transcript, which the dialogue engine answers with a re-ask.

pub mod config;
pub mod error;
pub mod stt;
pub mod transcode;
pub mod tts;

pub use config::{SpeechConfig, DEFAULT_MAX_REPLY_CHARS};
pub use error::VoiceError;
pub use stt::SttService;
pub use transcode::Transcoder;
pub use tts::{truncate_for_speech, SynthesisOutcome, TtsService};
