//! Amount extraction.
//!
//! Tries an ordered list of Indian currency patterns (₹, Rs/Rs., INR) and
//! returns the first match that parses to a positive number, normalized to
//! exactly two decimal places. Thousands separators are stripped before
//! parsing, so `"Rs. 1,500"` yields `"1500.00"`.

use std::sync::LazyLock;

use regex::Regex;

/// Currency patterns, tried in order. Each captures a decimal number with
/// optional thousands separators and up to two fractional digits.
static AMOUNT_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        // ₹150, ₹ 1,500.00
        Regex::new(r"₹\s*(\d+(?:,\d+)*(?:\.\d{1,2})?)").expect("valid ₹ pattern"),
        // Rs 150, rs. 1,500
        Regex::new(r"(?i)Rs\.?\s*(\d+(?:,\d+)*(?:\.\d{1,2})?)").expect("valid Rs pattern"),
        // INR 150
        Regex::new(r"(?i)INR\s*(\d+(?:,\d+)*(?:\.\d{1,2})?)").expect("valid INR pattern"),
    ]
});

/// Extract the payment amount from `text`, formatted to two decimal places.
///
/// Returns `None` when no pattern yields a parseable positive number.
pub fn extract(text: &str) -> Option<String> {
    for pattern in AMOUNT_PATTERNS.iter() {
        let Some(caps) = pattern.captures(text) else {
            continue;
        };
        let raw = caps[1].replace(',', "");
        if let Ok(value) = raw.parse::<f64>() {
            if value > 0.0 {
                return Some(format!("{value:.2}"));
            }
        }
    }
    None
}
