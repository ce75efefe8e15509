//! Decides whether a turn can skip the language model.
//!
//! Coverage is deliberately narrow: the quick path only fires when the rule
//! responder is known to have a good answer.

use crate::signals::SignalSet;
use salon_types::ConversationState;

/// Scheduling and appointment talk.
pub const BOOKING_INTENT: SignalSet = SignalSet::substrings(&[
    "預約",
    "約",
    "book",
    "改期",
    "幾點",
    "幾時",
    "邊日",
    "時間",
    "appointment",
]);

/// Questions about cost.
pub const PRICE_INQUIRY: SignalSet = SignalSet::substrings(&[
    "幾錢",
    "幾多錢",
    "價錢",
    "費用",
    "cost",
    "price",
    "how much",
]);

/// Talk about the service itself; only useful once a treatment is known.
pub const SERVICE_DESCRIPTION: SignalSet =
    SignalSet::substrings(&["facial", "面部", "清潔", "皮膚", "做面"]);

/// Returns `true` if the deterministic responder should be tried first.
pub fn should_use_quick_path(utterance: &str, state: &ConversationState) -> bool {
    BOOKING_INTENT.matches(utterance)
        || PRICE_INQUIRY.matches(utterance)
        || (state.treatment.is_some() && SERVICE_DESCRIPTION.matches(utterance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use salon_types::Treatment;

    #[test]
    fn booking_and_price_fire_on_empty_state() {
        let empty = ConversationState::default();
        assert!(should_use_quick_path("我想預約", &empty));
        assert!(should_use_quick_path("幾點有位", &empty));
        assert!(should_use_quick_path("How much is it?", &empty));
        assert!(should_use_quick_path("Can I BOOK a slot", &empty));
    }

    #[test]
    fn service_talk_needs_a_known_treatment() {
        let empty = ConversationState::default();
        assert!(!should_use_quick_path("facial 會唔會痛", &empty));

        let chosen = ConversationState {
            treatment: Some(Treatment::BasicFacial),
            booking_time: None,
        };
        assert!(should_use_quick_path("facial 會唔會痛", &chosen));
    }

    #[test]
    fn open_questions_go_to_the_model() {
        let empty = ConversationState::default();
        assert!(!should_use_quick_path("我皮膚好乾，有咩建議", &empty));
        assert!(!should_use_quick_path("你好", &empty));
        assert!(!should_use_quick_path("", &empty));
    }
}
