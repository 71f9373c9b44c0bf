//! # Sort & Paginate

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::models::Post;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Descending `posted_at`.
    #[default]
    Newest,
    /// Ascending `posted_at`.
    Oldest,
}

impl SortKey {
    /// Unknown keys, including the unimplemented `most_referenced`, mean `Newest`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("oldest") => SortKey::Oldest,
            _ => SortKey::Newest,
        }
    }
}

/// Stable sort by timestamp. Undated posts go last in either direction.
pub fn sort_posts(posts: &mut [Post], key: SortKey) {
    posts.sort_by(|a, b| match (a.posted_at, b.posted_at) {
        (Some(x), Some(y)) => match key {
            SortKey::Newest => y.cmp(&x),
            SortKey::Oldest => x.cmp(&y),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// A window of a sequence plus the size of the whole sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
}

/// Returns `items[(page-1)*size .. (page-1)*size + size]`, clamped to the
/// sequence. Page numbers are 1-indexed; page 0, size 0, or a page past the
/// end yield an empty window, never an error.
pub fn paginate<T>(items: Vec<T>, page: usize, page_size: usize) -> Page<T> {
    let total = items.len();
    let start = page
        .checked_sub(1)
        .and_then(|p| p.checked_mul(page_size))
        .unwrap_or(usize::MAX);
    let items = items
        .into_iter()
        .skip(start)
        .take(page_size)
        .collect();
    Page { items, total }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn dated(id: &str, day: Option<u32>) -> Post {
        Post {
            id: id.into(),
            title: String::new(),
            content: None,
            author: None,
            posted_at: day.map(|d| Utc.with_ymd_and_hms(2025, 10, d, 0, 0, 0).unwrap()),
            url: None,
            category: None,
            links: vec![],
            attachments: vec![],
        }
    }

    fn ids(posts: &[Post]) -> Vec<&str> {
        posts.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_parse_sort_key() {
        assert_eq!(SortKey::parse(Some("oldest")), SortKey::Oldest);
        assert_eq!(SortKey::parse(Some("OLDEST")), SortKey::Oldest);
        assert_eq!(SortKey::parse(Some("newest")), SortKey::Newest);
        assert_eq!(SortKey::parse(Some("most_referenced")), SortKey::Newest);
        assert_eq!(SortKey::parse(None), SortKey::Newest);
    }

    #[test]
    fn test_sort_directions() {
        let mut posts = vec![dated("a", Some(2)), dated("b", None), dated("c", Some(3)), dated("d", Some(1))];
        sort_posts(&mut posts, SortKey::Newest);
        assert_eq!(ids(&posts), vec!["c", "a", "d", "b"]);
        sort_posts(&mut posts, SortKey::Oldest);
        assert_eq!(ids(&posts), vec!["d", "a", "c", "b"]);
    }

    #[test]
    fn test_sort_is_stable_for_equal_timestamps() {
        let mut posts = vec![dated("x", Some(5)), dated("y", Some(5)), dated("z", Some(5))];
        sort_posts(&mut posts, SortKey::Newest);
        assert_eq!(ids(&posts), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_pagination_windows() {
        let items: Vec<usize> = (0..45).collect();

        let first = paginate(items.clone(), 1, 20);
        assert_eq!(first.items, (0..20).collect::<Vec<_>>());
        assert_eq!(first.total, 45);

        let third = paginate(items.clone(), 3, 20);
        assert_eq!(third.items, (40..45).collect::<Vec<_>>());

        let tenth = paginate(items, 10, 20);
        assert!(tenth.items.is_empty());
        assert_eq!(tenth.total, 45);
    }

    #[test]
    fn test_degenerate_pages() {
        let items: Vec<usize> = (0..5).collect();
        assert!(paginate(items.clone(), 0, 20).items.is_empty());
        assert!(paginate(items.clone(), 1, 0).items.is_empty());
        assert!(paginate(items, usize::MAX, usize::MAX).items.is_empty());
    }
}
