//! Dialogue decision engine for the salon front desk.
//!
//! A turn flows through four small, pure stages and one suspending call:
//!
//! 1. [`extractor`] folds what the customer just said into the
//!    [`ConversationState`](salon_types::ConversationState).
//! 2. [`classifier`] decides whether a deterministic rule can answer.
//! 3. [`responder`] produces that rule-based reply.
//! 4. Otherwise the [`LanguageModel`] is asked under a hard timeout, and its
//!    output goes through the [`filter`] so it never re-asks a known fact.
//!
//! [`DialogueEngine`] sequences the stages. It keeps no session table: the
//! caller passes the state in and receives the next snapshot back.

pub mod classifier;
pub mod error;
pub mod extractor;
pub mod filter;
pub mod gemini;
pub mod llm;
pub mod orchestrator;
pub mod prompt;
pub mod responder;
pub mod signals;

pub use classifier::should_use_quick_path;
pub use error::LlmError;
pub use extractor::extract;
pub use filter::{apply_hard_rules, sanitize_for_speech};
pub use gemini::{GeminiClient, GeminiConfig};
pub use llm::{CompletionRequest, GenerationParams, LanguageModel};
pub use orchestrator::{replies, DialogueConfig, DialogueEngine, DialogueTurn, ReplyRoute};
pub use prompt::{build_memory_context, build_prompt, SYSTEM_PROMPT};
pub use responder::{rule_reply, RuleKind};
