//! Utility functions shared by the rating pipeline

use std::cmp::Ordering;

/// One piece of a natural sort key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum KeyPart {
    Number(u64),
    Text(String),
}

/// Split a string into alternating text and number parts so that
/// `round_2` sorts before `round_10`.
pub fn natural_sort_key(value: &str) -> Vec<KeyPart> {
    let mut parts = Vec::new();
    let mut digits = String::new();
    let mut text = String::new();

    for ch in value.chars() {
        if ch.is_ascii_digit() {
            if !text.is_empty() {
                parts.push(KeyPart::Text(std::mem::take(&mut text)));
            }
            digits.push(ch);
        } else {
            if !digits.is_empty() {
                parts.push(number_part(&std::mem::take(&mut digits)));
            }
            text.push(ch);
        }
    }
    if !digits.is_empty() {
        parts.push(number_part(&digits));
    }
    if !text.is_empty() {
        parts.push(KeyPart::Text(text));
    }
    parts
}

fn number_part(digits: &str) -> KeyPart {
    // Absurdly long digit runs fall back to text comparison
    digits
        .parse::<u64>()
        .map(KeyPart::Number)
        .unwrap_or_else(|_| KeyPart::Text(digits.to_string()))
}

/// Compare two strings in natural order, falling back to plain order on ties
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    natural_sort_key(a)
        .cmp(&natural_sort_key(b))
        .then_with(|| a.cmp(b))
}

/// Round to one decimal place
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Clamp into `[0, 1]`
pub fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Percentage of `part` in `total`, 0 when `total` is 0
pub fn percentage(part: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    f64::from(part) / f64::from(total) * 100.0
}

/// Number of characters outside the ASCII range
pub fn non_ascii_count(value: &str) -> usize {
    value.chars().filter(|c| !c.is_ascii()).count()
}
