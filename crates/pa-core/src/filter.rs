//! # Filter Engine
//!
//! A conjunction of optional facets. An unset facet is skipped entirely; the
//! tag facet alone is disjunctive across its own values.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::models::Post;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostFilter {
    /// Case-insensitive substring of title, content or author name.
    /// Blank queries are ignored.
    pub query: Option<String>,
    /// Case-insensitive exact author display name.
    pub author: Option<String>,
    /// Accepted homework numbers; empty means unconstrained.
    pub homework: BTreeSet<u32>,
    /// Accepted topic tags, any-of, case-insensitive; empty means unconstrained.
    pub tags: Vec<String>,
    /// Only `true` constrains.
    pub has_attachments: bool,
    /// Inclusive lower bound on `posted_at`.
    pub date_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `posted_at`.
    pub date_to: Option<DateTime<Utc>>,
}

impl PostFilter {
    pub fn is_empty(&self) -> bool {
        let matcher = Matcher::new(self);
        matcher.query.is_none()
            && matcher.author.is_none()
            && matcher.tags.is_empty()
            && self.homework.is_empty()
            && !self.has_attachments
            && self.date_from.is_none()
            && self.date_to.is_none()
    }

    pub fn matches(&self, post: &Post) -> bool {
        Matcher::new(self).matches(post)
    }

    /// Keeps the posts satisfying every facet, preserving their order.
    pub fn apply(&self, posts: Vec<Post>) -> Vec<Post> {
        let matcher = Matcher::new(self);
        posts.into_iter().filter(|p| matcher.matches(p)).collect()
    }
}

/// Lower-cased needles, computed once per filter pass.
struct Matcher<'a> {
    filter: &'a PostFilter,
    query: Option<String>,
    author: Option<String>,
    tags: Vec<String>,
}

impl<'a> Matcher<'a> {
    fn new(filter: &'a PostFilter) -> Self {
        let normalized = |s: &Option<String>| {
            s.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_lowercase)
        };
        Self {
            query: normalized(&filter.query),
            author: normalized(&filter.author),
            tags: filter
                .tags
                .iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
            filter,
        }
    }

    fn matches(&self, post: &Post) -> bool {
        self.matches_query(post)
            && self.matches_author(post)
            && self.matches_homework(post)
            && self.matches_tags(post)
            && self.matches_attachments(post)
            && self.matches_dates(post)
    }

    fn matches_query(&self, post: &Post) -> bool {
        let Some(q) = &self.query else { return true };
        post.title.to_lowercase().contains(q)
            || post
                .content
                .as_deref()
                .is_some_and(|c| c.to_lowercase().contains(q))
            || post
                .author_name()
                .is_some_and(|a| a.to_lowercase().contains(q))
    }

    fn matches_author(&self, post: &Post) -> bool {
        let Some(author) = &self.author else { return true };
        post.author_name()
            .is_some_and(|name| name.to_lowercase() == *author)
    }

    fn matches_homework(&self, post: &Post) -> bool {
        if self.filter.homework.is_empty() {
            return true;
        }
        post.homework()
            .is_some_and(|n| self.filter.homework.contains(&n))
    }

    fn matches_tags(&self, post: &Post) -> bool {
        if self.tags.is_empty() {
            return true;
        }
        post.tags()
            .iter()
            .map(|t| t.to_lowercase())
            .any(|t| self.tags.contains(&t))
    }

    fn matches_attachments(&self, post: &Post) -> bool {
        !self.filter.has_attachments || post.has_attachments()
    }

    fn matches_dates(&self, post: &Post) -> bool {
        let (from, to) = (self.filter.date_from, self.filter.date_to);
        if from.is_none() && to.is_none() {
            return true;
        }
        let Some(posted) = post.posted_at else {
            return false;
        };
        from.map_or(true, |f| posted >= f) && to.map_or(true, |t| posted <= t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Attachment, Author};
    use chrono::TimeZone;

    fn post(id: &str, title: &str, content: &str, author: Option<&str>) -> Post {
        Post {
            id: id.into(),
            title: title.into(),
            content: Some(content.into()),
            author: author.map(Author::named),
            posted_at: Some(Utc.with_ymd_and_hms(2025, 10, 1, 12, 0, 0).unwrap()),
            url: None,
            category: None,
            links: vec![],
            attachments: vec![],
        }
    }

    fn ids(posts: &[Post]) -> Vec<&str> {
        posts.iter().map(|p| p.id.as_str()).collect()
    }

    fn corpus() -> Vec<Post> {
        let mut with_file = post("3", "HW6 shampoo", "notes", Some("Carol"));
        with_file.attachments.push(Attachment::from_filename("report.pdf"));
        vec![
            post("1", "Participation D: HW06 Muon", "We tried muon and sgd", Some("Alice")),
            post("2", "Homework 5 writeup", "Muon again", Some("Bob")),
            with_file,
            post("4", "Untitled", "nothing here", None),
        ]
    }

    #[test]
    fn test_empty_filter_keeps_everything() {
        let filter = PostFilter::default();
        assert!(filter.is_empty());
        assert_eq!(ids(&filter.apply(corpus())), vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_blank_query_is_absent() {
        let filter = PostFilter {
            query: Some("   ".into()),
            ..Default::default()
        };
        assert!(filter.is_empty());
        assert_eq!(filter.apply(corpus()).len(), 4);
    }

    #[test]
    fn test_query_matches_title_content_or_author() {
        let by_title = PostFilter { query: Some("WRITEUP".into()), ..Default::default() };
        assert_eq!(ids(&by_title.apply(corpus())), vec!["2"]);

        let by_content = PostFilter { query: Some("sgd".into()), ..Default::default() };
        assert_eq!(ids(&by_content.apply(corpus())), vec!["1"]);

        let by_author = PostFilter { query: Some("caro".into()), ..Default::default() };
        assert_eq!(ids(&by_author.apply(corpus())), vec!["3"]);
    }

    #[test]
    fn test_facets_are_conjunctive() {
        let text_only = PostFilter { query: Some("muon".into()), ..Default::default() };
        assert_eq!(ids(&text_only.apply(corpus())), vec!["1", "2"]);

        let both = PostFilter {
            query: Some("muon".into()),
            author: Some("alice".into()),
            ..Default::default()
        };
        assert_eq!(ids(&both.apply(corpus())), vec!["1"]);
    }

    #[test]
    fn test_author_is_exact_not_substring() {
        let filter = PostFilter { author: Some("ali".into()), ..Default::default() };
        assert!(filter.apply(corpus()).is_empty());
        let filter = PostFilter { author: Some("ALICE".into()), ..Default::default() };
        assert_eq!(ids(&filter.apply(corpus())), vec!["1"]);
    }

    #[test]
    fn test_homework_set() {
        let filter = PostFilter {
            homework: [6].into_iter().collect(),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(corpus())), vec!["1", "3"]);

        let filter = PostFilter {
            homework: [5, 6].into_iter().collect(),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(corpus())), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_tag_set_is_any_of_and_case_insensitive() {
        let filter = PostFilter { tags: vec!["muon".into()], ..Default::default() };
        assert_eq!(ids(&filter.apply(corpus())), vec!["1", "2"]);

        let filter = PostFilter {
            tags: vec!["Shampoo".into(), "SGD".into()],
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(corpus())), vec!["1", "3"]);

        let filter = PostFilter { tags: vec!["".into()], ..Default::default() };
        assert!(filter.is_empty());
    }

    #[test]
    fn test_has_attachments() {
        let filter = PostFilter { has_attachments: true, ..Default::default() };
        assert_eq!(ids(&filter.apply(corpus())), vec!["3"]);
    }

    #[test]
    fn test_date_range_bounds_are_inclusive() {
        let mut posts = corpus();
        posts[0].posted_at = Some(Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap());
        posts[3].posted_at = None;

        let at = Utc.with_ymd_and_hms(2025, 10, 1, 12, 0, 0).unwrap();
        let filter = PostFilter {
            date_from: Some(at),
            date_to: Some(at),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(posts.clone())), vec!["2", "3"]);

        let filter = PostFilter {
            date_to: Some(Utc.with_ymd_and_hms(2025, 9, 30, 0, 0, 0).unwrap()),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(posts)), vec!["1"]);
    }

    #[test]
    fn test_date_only_upper_bound_keeps_last_instant_of_day() {
        let mut posts = corpus();
        posts.truncate(1);
        posts[0].posted_at = Some(
            Utc.with_ymd_and_hms(2025, 10, 31, 23, 59, 59).unwrap()
                + chrono::Duration::microseconds(999_500),
        );
        let filter = PostFilter {
            date_to: crate::dates::parse_upper_bound("2025-10-31"),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(posts)), vec!["1"]);
    }
}
