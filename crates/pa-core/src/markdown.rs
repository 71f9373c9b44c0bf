//! Reading aids computed from a post's markdown body.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Heading;

const WORDS_PER_MINUTE: usize = 200;

static HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#{1,3})\s+(.+)$").expect("heading pattern is valid"));
static NON_SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s-]").expect("slug pattern is valid"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Estimated minutes to read `content`; 0 when there is no content.
pub fn reading_time_minutes(content: Option<&str>) -> u32 {
    let Some(content) = content else {
        return 0;
    };
    let words = content.split_whitespace().count().max(1);
    words.div_ceil(WORDS_PER_MINUTE) as u32
}

/// Level 1-3 markdown headings, in document order.
pub fn table_of_contents(content: &str) -> Vec<Heading> {
    content
        .lines()
        .filter_map(|line| {
            let caps = HEADING_RE.captures(line)?;
            let level = caps[1].len() as u8;
            let text = caps[2].trim().to_string();
            let id = slugify(&text);
            Some(Heading { id, text, level })
        })
        .collect()
}

fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = NON_SLUG_RE.replace_all(&lowered, "");
    WHITESPACE_RE.replace_all(&stripped, "-").into_owned()
}
