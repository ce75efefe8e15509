use crate::error::LlmError;
use async_trait::async_trait;

/// Sampling settings sent with every completion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    /// Replies are spoken, so they are kept short.
    pub max_output_tokens: u32,
    pub temperature: f32,
    /// Nucleus-sampling threshold.
    pub top_p: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_output_tokens: 60,
            temperature: 0.2,
            top_p: 0.7,
        }
    }
}

/// One single-turn completion.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Persona and style instruction.
    pub system: String,
    /// Known-facts block followed by the customer's latest utterance.
    pub prompt: String,
    pub params: GenerationParams,
}

/// A text-completion backend.
///
/// Implementations must be cancel-safe: the engine drops the future when its
/// deadline passes.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Returns the model's plain-text reply, possibly empty.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;
}
