use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("Transcoding error: {0}")]
    Transcode(String),

    #[error("TTS error: {0}")]
    Tts(String),

    #[error("STT error: {0}")]
    Stt(String),
}
