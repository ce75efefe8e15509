//! Deterministic replies.
//!
//! The responder is an ordered rule table. Each rule pairs a signal set with
//! a handler; the first rule whose signals match (and whose treatment
//! precondition holds) produces the reply. An empty reply means no rule
//! applies.
//!
//! The orchestrator also calls this directly as the fallback when the model
//! times out or fails, so every rule must be safe for any state.

use crate::classifier::PRICE_INQUIRY;
use crate::signals::SignalSet;
use salon_types::{ConversationState, Treatment};

/// Explicit requests to book or reschedule.
pub const BOOKING_REQUEST: SignalSet =
    SignalSet::substrings(&["預約", "約", "book", "改期", "appointment"]);

/// Mentions of the service that warrant a confirmation.
pub const SERVICE_CONFIRMATION: SignalSet = SignalSet::substrings(&["facial", "清潔", "皮膚"]);

pub const OPENING_HOURS: SignalSet =
    SignalSet::substrings(&["營業時間", "幾時開", "幾時收", "opening hours"]);

pub const LOCATION: SignalSet = SignalSet::substrings(&["位置", "地址", "邊度", "address"]);

pub const OPENING_HOURS_REPLY: &str = "我哋營業時間係早上十一點到夜晚九點，星期一休息。";

pub const LOCATION_REPLY: &str = "我哋喺中環，具體地址你可以聯絡我時再畀你。你想先預約嗎？";

/// Identifies which rule produced a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Booking,
    Price,
    ServiceConfirmation,
    OpeningHours,
    Location,
}

struct Rule {
    kind: RuleKind,
    signals: SignalSet,
    requires_treatment: bool,
    respond: fn(&ConversationState) -> String,
}

/// Priority order; first match wins.
const RULES: &[Rule] = &[
    Rule {
        kind: RuleKind::Booking,
        signals: BOOKING_REQUEST,
        requires_treatment: false,
        respond: booking_reply,
    },
    Rule {
        kind: RuleKind::Price,
        signals: PRICE_INQUIRY,
        requires_treatment: false,
        respond: price_reply,
    },
    Rule {
        kind: RuleKind::ServiceConfirmation,
        signals: SERVICE_CONFIRMATION,
        requires_treatment: true,
        respond: service_confirmation_reply,
    },
    Rule {
        kind: RuleKind::OpeningHours,
        signals: OPENING_HOURS,
        requires_treatment: false,
        respond: opening_hours_reply,
    },
    Rule {
        kind: RuleKind::Location,
        signals: LOCATION,
        requires_treatment: false,
        respond: location_reply,
    },
];

/// Returns the rule that would answer `utterance`, if any.
pub fn matching_rule(utterance: &str, state: &ConversationState) -> Option<RuleKind> {
    find_rule(utterance, state).map(|rule| rule.kind)
}

/// Returns the deterministic reply for this turn, or an empty string when no
/// rule applies.
pub fn rule_reply(utterance: &str, state: &ConversationState) -> String {
    find_rule(utterance, state)
        .map(|rule| (rule.respond)(state))
        .unwrap_or_default()
}

fn find_rule(utterance: &str, state: &ConversationState) -> Option<&'static Rule> {
    RULES.iter().find(|rule| {
        (!rule.requires_treatment || state.treatment.is_some()) && rule.signals.matches(utterance)
    })
}

/// Starting price for each treatment, in HKD.
pub fn starting_price(treatment: Treatment) -> &'static str {
    match treatment {
        Treatment::BasicFacial => "$480 起",
        Treatment::DeepCleanseFacial => "$680 起",
        Treatment::PicoLaser => "$1800 起",
        Treatment::BodyMassage => "$580 起",
    }
}

fn booking_reply(state: &ConversationState) -> String {
    match (state.treatment, state.booking_time.as_deref()) {
        (None, _) => "好呀～你想預約邊款療程呢？basic facial 定深層清潔 facial？".to_string(),
        (Some(treatment), None) => {
            format!("明白～你想預約 {}。你想約邊日同幾點呢？", treatment)
        }
        (Some(treatment), Some(time)) => format!(
            "好～我幫你登記：{} 做 {}。麻煩留低全名同電話號碼～",
            time, treatment
        ),
    }
}

fn price_reply(state: &ConversationState) -> String {
    let Some(treatment) = state.treatment else {
        return format!(
            "basic facial {}，深層清潔 {}，皮秒激光 {}，身體按摩 {}。你想了解邊款呢？",
            starting_price(Treatment::BasicFacial),
            starting_price(Treatment::DeepCleanseFacial),
            starting_price(Treatment::PicoLaser),
            starting_price(Treatment::BodyMassage),
        );
    };

    let price = starting_price(treatment);
    match treatment {
        Treatment::BasicFacial => format!(
            "good，basic facial 係 {}。有咩皮膚問題想重點改善嗎？",
            price
        ),
        Treatment::DeepCleanseFacial => {
            format!("deep facial 係 {}。幫你深層清潔同補水。", price)
        }
        Treatment::PicoLaser => format!("皮秒激光療程係 {}，視乎療程次數。", price),
        Treatment::BodyMassage => format!("身體按摩係 {}，視乎按摩時間長短。", price),
    }
}

fn opening_hours_reply(_: &ConversationState) -> String {
    OPENING_HOURS_REPLY.to_string()
}

fn location_reply(_: &ConversationState) -> String {
    LOCATION_REPLY.to_string()
}

fn service_confirmation_reply(state: &ConversationState) -> String {
    match state.treatment {
        Some(treatment) => format!(
            "好呀，關於 {}，我哋可以幫你安排。你想幾時嚟做呢？",
            treatment
        ),
        None => String::new(),
    }
}
