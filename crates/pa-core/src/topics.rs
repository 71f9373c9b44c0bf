//! Topic tags derived from post text.
//!
//! Patterns are plain substrings of the lower-cased `title + " " + content`.
//! Some carry a leading or trailing space so that e.g. "adamw" does not also
//! count as "adam" and "soap" does not match inside longer words. Output order
//! is the rule-table order.

/// `(label, patterns)` in output order.
pub const TOPIC_RULES: &[(&str, &[&str])] = &[
    ("Muon", &["muon"]),
    ("MuP", &["mup", "μp"]),
    ("Shampoo", &["shampoo"]),
    ("SOAP", &["soap "]),
    ("AdamW", &["adamw"]),
    ("Adam", &[" adam", "adam "]),
    ("SGD", &["sgd"]),
    ("Lion", &["lion optimizer", " lion"]),
    ("Polar Express", &["polar express"]),
    ("Adafactor", &["adafactor"]),
];

/// Returns every label whose patterns occur in the text, once each.
pub fn extract_topics(title: Option<&str>, content: Option<&str>) -> Vec<&'static str> {
    let text = format!("{} {}", title.unwrap_or(""), content.unwrap_or("")).to_lowercase();

    TOPIC_RULES
        .iter()
        .filter(|(_, patterns)| patterns.iter().any(|p| text.contains(p)))
        .map(|(label, _)| *label)
        .collect()
}
