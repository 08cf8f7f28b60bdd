use once_cell::sync::Lazy;
use regex::Regex;

// "Letter" throughout these heuristics means ASCII plus the extended-Latin
// accented range, so French/German/Czech requests pass.
static NON_LETTERS_ONLY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^A-Za-z\u{00C0}-\u{024F}]+$").unwrap());
static LETTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z\u{00C0}-\u{024F}]").unwrap());
static CONSONANT_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[bcdfghjklmnpqrstvwxz]{6,}").unwrap());
static WORDLIKE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z\u{00C0}-\u{024F}]{2,}").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    /// Contains a blocked term.
    Inappropriate,
    /// Structurally not a usable request.
    Gibberish,
}

/// Pre-retrieval gate for raw queries. Pure and deterministic; runs before
/// any network call so unusable input never costs an embedding request.
pub struct InputValidator {
    blocked_words: Vec<String>,
}

impl InputValidator {
    pub fn new(blocked_words: Vec<String>) -> Self {
        Self {
            blocked_words: blocked_words
                .into_iter()
                .map(|word| word.to_lowercase())
                .filter(|word| !word.is_empty())
                .collect(),
        }
    }

    /// The block-list check wins over the gibberish heuristics, so an
    /// offensive-but-mangled query is reported as inappropriate.
    pub fn validate(&self, text: &str) -> ValidationResult {
        if self.is_inappropriate(text) {
            return ValidationResult::Inappropriate;
        }
        if looks_like_gibberish(text) {
            return ValidationResult::Gibberish;
        }
        ValidationResult::Valid
    }

    fn is_inappropriate(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.blocked_words.iter().any(|word| lower.contains(word))
    }
}

/// Heuristic gibberish detection over the trimmed query; first matching
/// rule wins.
fn looks_like_gibberish(text: &str) -> bool {
    let s = text.trim();
    let total_chars = s.chars().count();

    if total_chars < 3 {
        return true;
    }
    // no letters at all
    if NON_LETTERS_ONLY.is_match(s) {
        return true;
    }
    // mostly digits/symbols
    let letters = LETTER.find_iter(s).count();
    if (letters as f64) / (total_chars as f64) < 0.5 {
        return true;
    }
    // improbable consonant cluster, e.g. keyboard mash
    if CONSONANT_RUN.is_match(s) {
        return true;
    }
    // e.g. "aaaaa"
    if has_identical_run(s, 5) {
        return true;
    }
    // no word-like token anywhere
    if !WORDLIKE_TOKEN.is_match(s) {
        return true;
    }
    false
}

// The regex crate has no backreferences, so repeated-character runs are
// found with a direct scan. Case-sensitive on purpose.
fn has_identical_run(s: &str, min_len: usize) -> bool {
    let mut run = 0usize;
    let mut prev: Option<char> = None;
    for ch in s.chars() {
        if Some(ch) == prev {
            run += 1;
        } else {
            prev = Some(ch);
            run = 1;
        }
        if run >= min_len {
            return true;
        }
    }
    false
}
