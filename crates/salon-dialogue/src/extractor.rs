//! Folds a new utterance into the conversation state.

use crate::signals::SignalSet;
use salon_types::{clip_booking_time, ConversationState, Treatment};

/// Treatment detectors in priority order. Every set in an entry must match;
/// the first entry that matches wins.
const TREATMENT_SIGNALS: &[(Treatment, &[SignalSet])] = &[
    (
        Treatment::DeepCleanseFacial,
        &[SignalSet::substrings(&["深層清潔", "deep"])],
    ),
    (
        Treatment::BasicFacial,
        &[
            SignalSet::substrings(&["basic"]),
            SignalSet::substrings(&["facial"]),
        ],
    ),
    (
        Treatment::PicoLaser,
        &[SignalSet::substrings(&["皮秒", "激光", "laser"])],
    ),
    (
        Treatment::BodyMassage,
        &[SignalSet::substrings(&["按摩", "body", "massage"])],
    ),
];

/// Day names, relative days, parts of the day and clock words.
const TIME_SIGNALS: &[SignalSet] = &[
    SignalSet::substrings(&[
        "星期", "禮拜", "聽日", "後日", "今日", "今晚", "下晝", "夜晚", "點",
    ]),
    SignalSet::words(&[
        "am",
        "pm",
        "o'clock",
        "today",
        "tonight",
        "tomorrow",
        "monday",
        "tuesday",
        "wednesday",
        "thursday",
        "friday",
        "saturday",
        "sunday",
    ]),
];

/// Returns the first treatment mentioned in `utterance`, by detection order.
pub fn detect_treatment(utterance: &str) -> Option<Treatment> {
    TREATMENT_SIGNALS
        .iter()
        .find(|(_, sets)| sets.iter().all(|set| set.matches(utterance)))
        .map(|(treatment, _)| *treatment)
}

/// Returns `true` if `utterance` mentions a day or time.
pub fn mentions_time(utterance: &str) -> bool {
    TIME_SIGNALS.iter().any(|set| set.matches(utterance))
}

/// Returns `state` extended with whatever `utterance` reveals.
///
/// Fields already set are never touched. The booking time is not parsed: the
/// trimmed utterance itself, clipped to
/// [`MAX_BOOKING_TIME_CHARS`](salon_types::MAX_BOOKING_TIME_CHARS), is kept as
/// display text.
pub fn extract(state: &ConversationState, utterance: &str) -> ConversationState {
    let mut next = state.clone();

    if next.treatment.is_none() {
        next.treatment = detect_treatment(utterance);
    }

    if next.booking_time.is_none() && mentions_time(utterance) {
        next.booking_time = clip_booking_time(utterance);
    }

    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use salon_types::MAX_BOOKING_TIME_CHARS;

    #[test]
    fn detects_each_treatment() {
        assert_eq!(
            detect_treatment("我想做深層清潔"),
            Some(Treatment::DeepCleanseFacial)
        );
        assert_eq!(
            detect_treatment("Basic Facial 幾錢"),
            Some(Treatment::BasicFacial)
        );
        assert_eq!(
            detect_treatment("facial 要 basic 嗰款"),
            Some(Treatment::BasicFacial)
        );
        assert_eq!(detect_treatment("皮秒激光"), Some(Treatment::PicoLaser));
        assert_eq!(detect_treatment("想按摩下"), Some(Treatment::BodyMassage));
        assert_eq!(detect_treatment("facial 有咩揀"), None);
        assert_eq!(detect_treatment(""), None);
    }

    #[test]
    fn conflicting_signals_record_first_priority_match() {
        let state = extract(&ConversationState::default(), "按摩定係 deep facial 好");
        assert_eq!(state.treatment, Some(Treatment::DeepCleanseFacial));

        let state = extract(&ConversationState::default(), "laser or body massage");
        assert_eq!(state.treatment, Some(Treatment::PicoLaser));
    }

    #[test]
    fn set_fields_are_never_overwritten() {
        let state = ConversationState {
            treatment: Some(Treatment::BodyMassage),
            booking_time: Some("星期六".to_string()),
        };
        for utterance in ["deep facial", "皮秒激光聽日三點", "", "basic facial tomorrow 3pm"] {
            let next = extract(&state, utterance);
            assert_eq!(next, state, "utterance {:?} changed state", utterance);
        }
    }

    #[test]
    fn time_is_stored_as_raw_clipped_text() {
        let state = extract(&ConversationState::default(), "  聽日下晝三點得唔得  ");
        assert_eq!(state.booking_time.as_deref(), Some("聽日下晝三點得唔得"));

        let long = format!("星期五{}", "好".repeat(100));
        let state = extract(&ConversationState::default(), &long);
        assert_eq!(
            state.booking_time.map(|t| t.chars().count()),
            Some(MAX_BOOKING_TIME_CHARS)
        );
    }

    #[test]
    fn latin_time_words_need_boundaries() {
        let state = extract(&ConversationState::default(), "Tomorrow at 3pm");
        assert_eq!(state.booking_time.as_deref(), Some("Tomorrow at 3pm"));

        let state = extract(&ConversationState::default(), "my name is Sam");
        assert_eq!(state.booking_time, None);
    }

    #[test]
    fn input_state_is_not_mutated() {
        let original = ConversationState::default();
        let next = extract(&original, "deep facial 聽日");
        assert!(original.is_empty());
        assert!(next.treatment.is_some() && next.booking_time.is_some());
    }
}
