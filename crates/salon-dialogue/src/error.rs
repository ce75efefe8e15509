//! Error types for the language-model boundary.

/// Errors a [`LanguageModel`](crate::LanguageModel) call can end with.
///
/// None of these escape the dialogue engine; they select the fallback reply.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// The provider is not usable with the given settings.
    #[error("model configuration error: {0}")]
    Config(String),

    /// The HTTP request could not be sent or its body not read.
    #[error("model request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("model returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The provider refused the prompt.
    #[error("model blocked the prompt: {0}")]
    Blocked(String),

    /// The response body did not have the expected shape.
    #[error("malformed model response: {0}")]
    Malformed(#[from] serde_json::Error),
}
