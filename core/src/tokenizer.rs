use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref NON_WORD: Regex = Regex::new(r"[^\p{L}\p{N}\s]+").expect("valid regex");
}

/// Tokenize text: lowercase, strip every character that is not a letter,
/// digit, or whitespace, then split on whitespace runs.
///
/// Punctuation collapses by removal, so "U.S." becomes "us" rather than
/// two tokens. Empty input yields an empty sequence.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let stripped = NON_WORD.replace_all(&lowered, "");
    stripped.split_whitespace().map(str::to_string).collect()
}
