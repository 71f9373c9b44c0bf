//! Homework number extraction from post titles.

use once_cell::sync::Lazy;
use regex::Regex;

static HOMEWORK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:HW|Homework)\s*0*(\d+)").expect("homework pattern is valid")
});

/// Finds "HW06", "hw 6", "Homework 0012" and the like, with leading zeros stripped.
/// A number too large for `u32` counts as no match.
pub fn extract_homework_number(title: &str) -> Option<u32> {
    HOMEWORK_RE
        .captures(title)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
