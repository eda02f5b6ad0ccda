//! Sender-name extraction.
//!
//! Tries an ordered list of relational patterns ("from X", "by X",
//! "X sent you", "X paid you"). The captured name must be 2–50 characters of
//! letters and spaces after trimming; anything else (digits, punctuation,
//! single letters, UPI handles) is treated as no sender. A missing sender is
//! never a classification failure.

use std::sync::LazyLock;

use regex::Regex;

const MIN_NAME_LEN: usize = 2;
const MAX_NAME_LEN: usize = 50;

/// Relational patterns, tried in order. The name run is bounded by a
/// following "on"/"via"/"to" or end of string so trailing clauses like
/// "on 12-05" or "via UPI" never leak into the capture.
static SENDER_PATTERNS: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)from\s+([A-Za-z\s]+?)(?:\s+on|\s+via|\s+to|$)")
            .expect("valid from pattern"),
        Regex::new(r"(?i)by\s+([A-Za-z\s]+?)(?:\s+on|\s+via|\s+to|$)").expect("valid by pattern"),
        Regex::new(r"(?i)([A-Za-z\s]+?)\s+sent you").expect("valid sent-you pattern"),
        Regex::new(r"(?i)([A-Za-z\s]+?)\s+paid you").expect("valid paid-you pattern"),
    ]
});

fn is_valid_name(name: &str) -> bool {
    (MIN_NAME_LEN..=MAX_NAME_LEN).contains(&name.len())
        && name.chars().all(|c| c.is_ascii_alphabetic() || c == ' ')
}

/// Extract the sender name from `text`, if a pattern matches and the
/// captured name passes validation.
pub fn extract(text: &str) -> Option<String> {
    for pattern in SENDER_PATTERNS.iter() {
        let Some(caps) = pattern.captures(text) else {
            continue;
        };
        let name = caps[1].trim();
        if is_valid_name(name) {
            return Some(name.to_string());
        }
    }
    None
}
