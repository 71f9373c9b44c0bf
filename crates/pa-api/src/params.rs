//! Query-string parsing. Every field arrives as raw text so a malformed value
//! degrades to "unset" instead of rejecting the request. A repeated key keeps
//! its first value.

use actix_web::web;
use pa_core::dates::{parse_timestamp, parse_upper_bound};
use pa_core::{ListQuery, PostFilter, SortKey};

/// Decodes a raw query string into key/value pairs in request order.
/// Undecodable input yields no pairs.
fn query_pairs(raw: &str) -> Vec<(String, String)> {
    web::Query::<Vec<(String, String)>>::from_query(raw)
        .map(web::Query::into_inner)
        .unwrap_or_default()
}

fn keep_first(slot: &mut Option<String>, value: String) {
    if slot.is_none() {
        *slot = Some(value);
    }
}

#[derive(Debug, Default)]
pub struct PostsParams {
    pub q: Option<String>,
    pub student_id: Option<String>,
    pub author: Option<String>,
    pub tags: Option<String>,
    pub homework: Option<String>,
    pub has_attachments: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub sort_by: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

impl PostsParams {
    pub fn from_query_string(raw: &str) -> Self {
        let mut params = Self::default();
        for (key, value) in query_pairs(raw) {
            let slot = match key.as_str() {
                "q" => &mut params.q,
                "student_id" => &mut params.student_id,
                "author" => &mut params.author,
                "tags" => &mut params.tags,
                "homework" => &mut params.homework,
                "has_attachments" => &mut params.has_attachments,
                "date_from" => &mut params.date_from,
                "date_to" => &mut params.date_to,
                "sort_by" => &mut params.sort_by,
                "page" => &mut params.page,
                "page_size" => &mut params.page_size,
                _ => continue,
            };
            keep_first(slot, value);
        }
        params
    }

    pub fn into_query(self) -> ListQuery {
        let filter = PostFilter {
            query: non_blank(self.q),
            author: non_blank(self.student_id).or_else(|| non_blank(self.author)),
            homework: comma_list(self.homework.as_deref())
                .filter_map(|t| t.parse().ok())
                .collect(),
            tags: comma_list(self.tags.as_deref()).map(str::to_string).collect(),
            has_attachments: flag(self.has_attachments.as_deref()),
            date_from: self.date_from.as_deref().and_then(parse_timestamp),
            date_to: self.date_to.as_deref().and_then(parse_upper_bound),
        };

        ListQuery {
            filter,
            sort: SortKey::parse(self.sort_by.as_deref()),
            page: number(self.page.as_deref()),
            page_size: number(self.page_size.as_deref()),
        }
    }
}

#[derive(Debug, Default)]
pub struct LimitParams {
    pub limit: Option<String>,
}

impl LimitParams {
    pub fn from_query_string(raw: &str) -> Self {
        let mut params = Self::default();
        for (key, value) in query_pairs(raw) {
            if key == "limit" {
                keep_first(&mut params.limit, value);
            }
        }
        params
    }

    pub fn limit(&self) -> Option<usize> {
        number(self.limit.as_deref())
    }
}

fn non_blank(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn comma_list(raw: Option<&str>) -> impl Iterator<Item = &str> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn flag(raw: Option<&str>) -> bool {
    matches!(
        raw.map(|s| s.trim().to_ascii_lowercase()).as_deref(),
        Some("true" | "1" | "yes")
    )
}

/// Non-negative integers only; anything else is unset.
fn number(raw: Option<&str>) -> Option<usize> {
    raw.and_then(|s| s.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_formed_params() {
        let q = PostsParams {
            q: Some("  muon ".into()),
            author: Some("Alice".into()),
            tags: Some("Muon, ,SGD".into()),
            homework: Some("3,x,05".into()),
            has_attachments: Some("YES".into()),
            date_from: Some("2025-10-01".into()),
            date_to: Some("2025-10-31".into()),
            sort_by: Some("oldest".into()),
            page: Some("2".into()),
            page_size: Some("10".into()),
            ..Default::default()
        }
        .into_query();

        assert_eq!(q.filter.query.as_deref(), Some("muon"));
        assert_eq!(q.filter.author.as_deref(), Some("Alice"));
        assert_eq!(q.filter.tags, vec!["Muon", "SGD"]);
        assert_eq!(q.filter.homework.into_iter().collect::<Vec<_>>(), vec![3, 5]);
        assert!(q.filter.has_attachments);
        assert_eq!(
            q.filter.date_to.unwrap().to_rfc3339(),
            "2025-10-31T23:59:59.999999999+00:00"
        );
        assert_eq!(q.sort, SortKey::Oldest);
        assert_eq!((q.page, q.page_size), (Some(2), Some(10)));
    }

    #[test]
    fn test_malformed_params_fall_back() {
        let q = PostsParams {
            q: Some("   ".into()),
            homework: Some("abc".into()),
            has_attachments: Some("false".into()),
            date_from: Some("yesterday".into()),
            sort_by: Some("most_referenced".into()),
            page: Some("-1".into()),
            page_size: Some("ten".into()),
            ..Default::default()
        }
        .into_query();

        assert!(q.filter.is_empty());
        assert_eq!(q.sort, SortKey::Newest);
        assert_eq!((q.page, q.page_size), (None, None));
    }

    #[test]
    fn test_student_id_takes_precedence() {
        let q = PostsParams {
            student_id: Some("Bo".into()),
            author: Some("Al".into()),
            ..Default::default()
        }
        .into_query();
        assert_eq!(q.filter.author.as_deref(), Some("Bo"));
    }

    #[test]
    fn test_limit() {
        assert_eq!(LimitParams { limit: Some("3".into()) }.limit(), Some(3));
        assert_eq!(LimitParams { limit: Some("lots".into()) }.limit(), None);
        assert_eq!(LimitParams::default().limit(), None);
    }

    #[test]
    fn test_repeated_keys_keep_first_value() {
        let params = PostsParams::from_query_string("page=1&page=2&tags=Muon&tags=SGD&q=a%20b&x=1");
        assert_eq!(params.page.as_deref(), Some("1"));
        assert_eq!(params.tags.as_deref(), Some("Muon"));
        assert_eq!(params.q.as_deref(), Some("a b"));

        let q = params.into_query();
        assert_eq!(q.page, Some(1));
        assert_eq!(q.filter.tags, vec!["Muon"]);

        assert_eq!(LimitParams::from_query_string("limit=2&limit=9").limit(), Some(2));
        assert_eq!(LimitParams::from_query_string("").limit(), None);
    }
}
