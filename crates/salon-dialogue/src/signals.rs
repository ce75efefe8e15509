//! Lexical signal sets.
//!
//! Every keyword decision in the engine goes through a [`SignalSet`]. Terms
//! are stored lowercase and matched against the lowercased utterance, so
//! Latin tokens are case-insensitive while CJK text is unaffected.

/// An ordered list of terms; the set matches if any term occurs.
#[derive(Debug, Clone, Copy)]
pub struct SignalSet {
    terms: &'static [&'static str],
    whole_word: bool,
}

impl SignalSet {
    /// Terms that match anywhere in the text.
    pub const fn substrings(terms: &'static [&'static str]) -> Self {
        Self {
            terms,
            whole_word: false,
        }
    }

    /// Terms that only match when not glued to other Latin letters, so `am`
    /// matches "3 am" and "10am" but not "name".
    pub const fn words(terms: &'static [&'static str]) -> Self {
        Self {
            terms,
            whole_word: true,
        }
    }

    /// Returns `true` if any term occurs in `text`.
    pub fn matches(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.terms.iter().any(|term| {
            if self.whole_word {
                contains_word(&lowered, term)
            } else {
                lowered.contains(term)
            }
        })
    }
}

fn contains_word(haystack: &str, word: &str) -> bool {
    haystack.match_indices(word).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + word.len()..].chars().next();
        !before.is_some_and(|c| c.is_ascii_alphabetic())
            && !after.is_some_and(|c| c.is_ascii_alphabetic())
    })
}
