//! Shared types for the salon front desk.
//!
//! This crate holds the session state that the caller carries between turns
//! and the treatment catalog the dialogue engine reasons about. Every other
//! crate in the workspace depends on it; it depends on nothing internal.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod voice;

/// Maximum number of characters of the raw utterance kept as `booking_time`.
pub const MAX_BOOKING_TIME_CHARS: usize = 50;

/// Services offered by the salon.
///
/// Serialized as the label the front desk speaks, so the state a browser
/// holds reads naturally (`"basic facial"`, `"身體按摩"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Treatment {
    /// Entry-level facial.
    #[serde(rename = "basic facial")]
    BasicFacial,
    /// Deep-cleanse facial.
    #[serde(rename = "深層清潔 facial")]
    DeepCleanseFacial,
    /// Pico laser course.
    #[serde(rename = "皮秒激光療程")]
    PicoLaser,
    /// Full body massage.
    #[serde(rename = "身體按摩")]
    BodyMassage,
}

impl Treatment {
    /// Every treatment, in catalog order.
    pub const ALL: [Treatment; 4] = [
        Self::BasicFacial,
        Self::DeepCleanseFacial,
        Self::PicoLaser,
        Self::BodyMassage,
    ];

    /// Returns the spoken label for this treatment.
    pub fn label(self) -> &'static str {
        match self {
            Self::BasicFacial => "basic facial",
            Self::DeepCleanseFacial => "深層清潔 facial",
            Self::PicoLaser => "皮秒激光療程",
            Self::BodyMassage => "身體按摩",
        }
    }

    /// Looks a treatment up by its label.
    ///
    /// Returns `None` if the label is not in the catalog.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.label() == label.trim())
    }
}

impl std::fmt::Display for Treatment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// The memory of one conversation.
///
/// The caller owns this value: it is handed to the dialogue engine at each
/// turn and a new snapshot comes back. Fields are first-write-wins; once set
/// they are only cleared by a reset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    /// The service the customer has chosen, if any.
    #[serde(default)]
    pub treatment: Option<Treatment>,
    /// Raw utterance text in which the customer mentioned a time.
    ///
    /// Opaque display text, at most [`MAX_BOOKING_TIME_CHARS`] characters.
    #[serde(default)]
    pub booking_time: Option<String>,
}

/// Errors produced when decoding a caller-supplied state.
#[derive(Debug, Error)]
pub enum StateError {
    /// The payload was not a valid state object.
    #[error("invalid conversation state: {0}")]
    Invalid(#[from] serde_json::Error),
}

impl ConversationState {
    /// Returns the state of a fresh session.
    pub fn reset() -> Self {
        Self::default()
    }

    /// Returns `true` if nothing is known about the customer yet.
    pub fn is_empty(&self) -> bool {
        self.treatment.is_none() && self.booking_time.is_none()
    }

    /// Decodes a state from its JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Invalid`] for malformed JSON, unknown treatment
    /// labels, or fields of the wrong type.
    pub fn from_json(raw: &str) -> Result<Self, StateError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut state: Self = serde_json::from_str(raw)?;
        if let Some(time) = state.booking_time.take() {
            state.booking_time = clip_booking_time(&time);
        }
        Ok(state)
    }

    /// Decodes a state, treating anything unparseable as a fresh session.
    pub fn from_json_lossy(raw: &str) -> Self {
        match Self::from_json(raw) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!("discarding caller state: {}", e);
                Self::default()
            }
        }
    }
}

/// Trims `raw` and keeps at most [`MAX_BOOKING_TIME_CHARS`] characters.
///
/// Returns `None` when nothing is left after trimming.
pub fn clip_booking_time(raw: &str) -> Option<String> {
    let clipped: String = raw.trim().chars().take(MAX_BOOKING_TIME_CHARS).collect();
    if clipped.is_empty() {
        None
    } else {
        Some(clipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn treatment_label_round_trip() {
        for t in Treatment::ALL {
            assert_eq!(Treatment::from_label(t.label()), Some(t));
        }
        assert_eq!(Treatment::from_label("hair cut"), None);
    }

    #[test]
    fn state_serializes_labels_and_nulls() {
        let state = ConversationState {
            treatment: Some(Treatment::BasicFacial),
            booking_time: None,
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["treatment"], "basic facial");
        assert!(json["booking_time"].is_null());

        let empty = serde_json::to_value(ConversationState::reset()).unwrap();
        assert_eq!(
            empty,
            serde_json::json!({"treatment": null, "booking_time": null})
        );
    }

    #[test]
    fn state_decodes_wire_form() {
        let state =
            ConversationState::from_json(r#"{"treatment":"身體按摩","booking_time":"聽日三點"}"#)
                .unwrap();
        assert_eq!(state.treatment, Some(Treatment::BodyMassage));
        assert_eq!(state.booking_time.as_deref(), Some("聽日三點"));

        let partial = ConversationState::from_json("{}").unwrap();
        assert!(partial.is_empty());
    }

    #[test]
    fn malformed_state_becomes_empty() {
        assert!(ConversationState::from_json("not json").is_err());
        assert!(ConversationState::from_json_lossy("not json").is_empty());
        assert!(ConversationState::from_json_lossy(r#"{"treatment":"nails"}"#).is_empty());
        assert!(ConversationState::from_json_lossy(r#"[1,2]"#).is_empty());
        assert!(ConversationState::from_json_lossy("").is_empty());
    }

    #[test]
    fn oversized_booking_time_is_clipped() {
        let long = "星".repeat(80);
        let state =
            ConversationState::from_json(&format!(r#"{{"booking_time":"{}"}}"#, long)).unwrap();
        assert_eq!(
            state.booking_time.map(|t| t.chars().count()),
            Some(MAX_BOOKING_TIME_CHARS)
        );
    }
}
