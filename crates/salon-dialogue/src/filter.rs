//! Post-processing for model replies and for anything headed to the speech
//! synthesizer.

use crate::signals::SignalSet;
use regex::Regex;
use salon_types::ConversationState;
use std::sync::LazyLock;

/// Phrases that ask which treatment the customer wants.
pub const REASKS_TREATMENT: SignalSet = SignalSet::substrings(&[
    "想做咩",
    "邊款療程",
    "做邊款",
    "邊隻 facial",
    "which treatment",
    "which service",
]);

/// Phrases that ask when the customer wants to come.
pub const REASKS_TIME: SignalSet = SignalSet::substrings(&[
    "幾點",
    "幾時",
    "邊日",
    "咩時間",
    "what time",
    "which day",
]);

// Inner span capped at 40 chars so one stray bracket cannot eat the reply.
static RE_ASIDE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[（(][^（）()]{0,40}[）)]").unwrap());
static RE_QUOTES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"[*"'“”‘’]"#).unwrap());
static RE_DASHES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-‐–—─━═|｜]+").unwrap());
static RE_SLASHES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:斜線|slash|／|\\|/)+").unwrap());
static RE_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

fn is_terminal(c: char) -> bool {
    matches!(c, '。' | '！' | '？' | '!' | '?' | '.' | '．')
}

/// Splits `text` into trimmed sentences, each keeping its terminal
/// punctuation. A `.` between two digits (`$1.5`) does not end a sentence.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    let mut prev: Option<char> = None;

    while let Some((idx, c)) = chars.next() {
        let next = chars.peek().map(|&(_, n)| n);
        let decimal_point = c == '.'
            && prev.is_some_and(|p| p.is_ascii_digit())
            && next.is_some_and(|n| n.is_ascii_digit());
        prev = Some(c);

        if !is_terminal(c) || decimal_point {
            continue;
        }
        // Keep runs such as "？！" or "..." attached to their sentence.
        if next.is_some_and(is_terminal) {
            continue;
        }

        let end = idx + c.len_utf8();
        let sentence = text[start..end].trim();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        start = end;
    }

    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest);
    }
    sentences
}

/// Whether `text` has anything a synthesizer can say: a letter, digit or
/// CJK character rather than only punctuation.
pub fn has_speakable_text(text: &str) -> bool {
    text.chars().any(char::is_alphanumeric)
}

/// Sanitizes `raw_reply` for speech, then removes sentences that re-ask facts
/// already in `state` or that have nothing left to say.
///
/// Surviving sentences keep their order and punctuation; a sentence without
/// terminal punctuation is closed with `。`. Returns an empty string when
/// every sentence was dropped.
pub fn apply_hard_rules(raw_reply: &str, state: &ConversationState) -> String {
    let has_treatment = state.treatment.is_some();
    let has_time = state.booking_time.is_some();
    let cleaned = sanitize_for_speech(raw_reply);

    let mut joined = String::new();
    for sentence in split_sentences(&cleaned) {
        if !has_speakable_text(sentence) {
            tracing::debug!(sentence, "dropping sentence with nothing to say");
            continue;
        }
        if has_treatment && REASKS_TREATMENT.matches(sentence) {
            tracing::debug!(sentence, "dropping treatment re-ask");
            continue;
        }
        if has_time && REASKS_TIME.matches(sentence) {
            tracing::debug!(sentence, "dropping time re-ask");
            continue;
        }

        if joined.ends_with(|c: char| c.is_ascii_punctuation()) {
            joined.push(' ');
        }
        joined.push_str(sentence);
        if !sentence.ends_with(is_terminal) {
            joined.push('。');
        }
    }

    joined
}

/// Strips text that reads badly when spoken: bracketed asides, quotes and
/// asterisks, dash or bar runs, and slash-like tokens.
pub fn sanitize_for_speech(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let text = RE_ASIDE.replace_all(text, "");
    let text = RE_QUOTES.replace_all(&text, "");
    let text = RE_DASHES.replace_all(&text, " ");
    let text = RE_SLASHES.replace_all(&text, " ");
    let text = RE_WHITESPACE.replace_all(&text, " ");
    text.trim().to_string()
}
