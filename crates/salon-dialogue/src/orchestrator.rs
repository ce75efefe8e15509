//! Turn orchestration.
//!
//! ```text
//! START ─▶ STATE_UPDATED ─┬─▶ QUICK_REPLIED ───────────────────────────▶ DONE
//!                         └─▶ MODEL_PENDING ─┬─▶ MODEL_REPLIED ─────────▶ DONE
//!                                            ├─▶ MODEL_TIMED_OUT ─▶ rule ▶ DONE
//!                                            └─▶ MODEL_FAILED ────▶ rule ▶ DONE
//! ```
//!
//! `generate_reply` is total: whatever the utterance, state or provider
//! behaviour, it returns a non-empty reply and a valid state, and it never
//! waits on the model longer than the configured timeout.

use crate::classifier::should_use_quick_path;
use crate::extractor::extract;
use crate::filter::apply_hard_rules;
use crate::llm::{CompletionRequest, GenerationParams, LanguageModel};
use crate::prompt::{build_prompt, SYSTEM_PROMPT};
use crate::responder::{matching_rule, rule_reply};
use salon_types::ConversationState;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Canned replies for turns nothing else can answer.
pub mod replies {
    /// The utterance was empty.
    pub const UNHEARD: &str = "唔好意思，我頭先好似聽唔清楚，可以再講多次嗎？";
    /// The model answered with nothing usable.
    pub const NO_MODEL_TEXT: &str = "唔好意思，我暫時回應唔到，可以重新講嗎？";
    /// The model timed out and no rule applied.
    pub const BUSY: &str = "系統暫時繁忙，可以稍後再試嗎？";
    /// The model failed and no rule applied.
    pub const TECHNICAL_PROBLEM: &str = "唔好意思，出咗啲技術問題，可以再講一次嗎？";
}

/// Default deadline for a model call.
pub const DEFAULT_MODEL_TIMEOUT: Duration = Duration::from_secs(5);

/// Terminal state a turn reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyRoute {
    /// Empty utterance; nothing was extracted.
    Unheard,
    /// Answered by a rule without calling the model.
    QuickPath,
    /// Answered by the model.
    Model,
    /// The model answered but nothing usable survived.
    ModelEmpty,
    /// The model missed its deadline.
    TimedOut,
    /// The model call failed.
    Failed,
}

impl ReplyRoute {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unheard => "unheard",
            Self::QuickPath => "quick_path",
            Self::Model => "model",
            Self::ModelEmpty => "model_empty",
            Self::TimedOut => "timed_out",
            Self::Failed => "failed",
        }
    }
}

/// The outcome of one turn.
#[derive(Debug, Clone, PartialEq)]
pub struct DialogueTurn {
    /// Never empty.
    pub reply: String,
    pub state: ConversationState,
    pub route: ReplyRoute,
}

/// Settings for the engine.
#[derive(Debug, Clone)]
pub struct DialogueConfig {
    pub model_timeout: Duration,
    pub generation: GenerationParams,
    pub system_prompt: String,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            model_timeout: DEFAULT_MODEL_TIMEOUT,
            generation: GenerationParams::default(),
            system_prompt: SYSTEM_PROMPT.to_string(),
        }
    }
}

/// Stateless dialogue engine; safe to share across concurrent sessions.
#[derive(Clone)]
pub struct DialogueEngine {
    model: Arc<dyn LanguageModel>,
    config: DialogueConfig,
}

impl std::fmt::Debug for DialogueEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogueEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DialogueEngine {
    pub fn new(model: Arc<dyn LanguageModel>, config: DialogueConfig) -> Self {
        Self { model, config }
    }

    /// Produces the reply for one turn and the state to carry into the next.
    pub async fn generate_reply(&self, utterance: &str, state: &ConversationState) -> DialogueTurn {
        let utterance = utterance.trim();
        if utterance.is_empty() {
            return DialogueTurn {
                reply: replies::UNHEARD.to_string(),
                state: state.clone(),
                route: ReplyRoute::Unheard,
            };
        }

        let state = extract(state, utterance);

        if should_use_quick_path(utterance, &state) {
            match matching_rule(utterance, &state) {
                Some(rule) => {
                    tracing::debug!(route = "quick_path", ?rule, "answered by rule");
                    return DialogueTurn {
                        reply: rule_reply(utterance, &state),
                        state,
                        route: ReplyRoute::QuickPath,
                    };
                }
                None => tracing::debug!("quick path approved but no rule applied"),
            }
        }

        let request = CompletionRequest {
            system: self.config.system_prompt.clone(),
            prompt: build_prompt(&state, utterance),
            params: self.config.generation,
        };

        // Dropping the future on timeout abandons the request.
        let outcome =
            tokio::time::timeout(self.config.model_timeout, self.model.complete(&request)).await;

        let (reply, route) = match outcome {
            Ok(Ok(text)) => {
                let filtered = apply_hard_rules(text.trim(), &state);
                if filtered.is_empty() {
                    tracing::warn!(raw_len = text.len(), "model reply empty after filtering");
                    (replies::NO_MODEL_TEXT.to_string(), ReplyRoute::ModelEmpty)
                } else {
                    (filtered, ReplyRoute::Model)
                }
            }
            Ok(Err(e)) => {
                tracing::error!("language model error: {}", e);
                (
                    fallback(utterance, &state, replies::TECHNICAL_PROBLEM),
                    ReplyRoute::Failed,
                )
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.config.model_timeout.as_millis() as u64,
                    "language model timed out, using rule fallback"
                );
                (
                    fallback(utterance, &state, replies::BUSY),
                    ReplyRoute::TimedOut,
                )
            }
        };

        tracing::debug!(route = route.as_str(), "turn complete");
        DialogueTurn {
            reply,
            state,
            route,
        }
    }
}

fn fallback(utterance: &str, state: &ConversationState, canned: &str) -> String {
    let reply = rule_reply(utterance, state);
    if reply.is_empty() {
        canned.to_string()
    } else {
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_names_match_serde() {
        for route in [
            ReplyRoute::Unheard,
            ReplyRoute::QuickPath,
            ReplyRoute::Model,
            ReplyRoute::ModelEmpty,
            ReplyRoute::TimedOut,
            ReplyRoute::Failed,
        ] {
            assert_eq!(
                serde_json::to_value(route).unwrap(),
                serde_json::Value::from(route.as_str())
            );
        }
    }

    #[test]
    fn canned_replies_survive_sanitizing() {
        for reply in [
            replies::UNHEARD,
            replies::NO_MODEL_TEXT,
            replies::BUSY,
            replies::TECHNICAL_PROBLEM,
        ] {
            assert_eq!(crate::filter::sanitize_for_speech(reply), reply);
        }
    }
}
