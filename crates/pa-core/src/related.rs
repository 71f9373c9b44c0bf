//! # Related-Posts Ranker
//!
//! Additive pairwise scoring of every other post against a reference post.
//! A linear scan per lookup; corpora stay in the low thousands.

use chrono::Duration;

use crate::models::Post;

/// Scoring weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelatedWeights {
    pub same_homework: u32,
    pub per_shared_tag: u32,
    pub same_author: u32,
    /// Optional bonus for posts within a time window of the reference post.
    /// Off by default.
    pub recency: Option<(Duration, u32)>,
}

impl Default for RelatedWeights {
    fn default() -> Self {
        Self {
            same_homework: 10,
            per_shared_tag: 3,
            same_author: 2,
            recency: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPost {
    pub post: Post,
    pub score: u32,
}

/// Derived signals of one post, computed once per ranking pass.
struct Signals {
    homework: Option<u32>,
    tags: Vec<String>,
}

impl Signals {
    fn of(post: &Post) -> Self {
        Self {
            homework: post.homework(),
            tags: post.tags(),
        }
    }
}

impl RelatedWeights {
    /// Score of `candidate` against `reference`.
    pub fn score(&self, reference: &Post, candidate: &Post) -> u32 {
        self.score_with(reference, &Signals::of(reference), candidate)
    }

    fn score_with(&self, reference: &Post, signals: &Signals, candidate: &Post) -> u32 {
        let theirs = Signals::of(candidate);
        let mut score = 0;

        if let (Some(a), Some(b)) = (signals.homework, theirs.homework) {
            if a == b {
                score += self.same_homework;
            }
        }

        let shared = theirs
            .tags
            .iter()
            .filter(|t| signals.tags.contains(t))
            .count() as u32;
        score += shared * self.per_shared_tag;

        if let (Some(a), Some(b)) = (reference.author_name(), candidate.author_name()) {
            if a == b {
                score += self.same_author;
            }
        }

        if let Some((window, bonus)) = self.recency {
            if let (Some(a), Some(b)) = (reference.posted_at, candidate.posted_at) {
                if a - b <= window && b - a <= window {
                    score += bonus;
                }
            }
        }

        score
    }

    /// Up to `limit` posts with a positive score, best first. Equal scores keep
    /// corpus order. The reference post (matched by id) is never included.
    pub fn related_posts(&self, reference: &Post, corpus: &[Post], limit: usize) -> Vec<ScoredPost> {
        let signals = Signals::of(reference);

        let mut scored: Vec<ScoredPost> = corpus
            .iter()
            .filter(|p| p.id != reference.id)
            .filter_map(|p| {
                let score = self.score_with(reference, &signals, p);
                (score > 0).then(|| ScoredPost {
                    post: p.clone(),
                    score,
                })
            })
            .collect();

        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored.truncate(limit);
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Author;
    use chrono::{TimeZone, Utc};

    fn post(id: &str, title: &str, content: &str, author: &str, day: u32) -> Post {
        Post {
            id: id.into(),
            title: title.into(),
            content: Some(content.into()),
            author: Some(Author::named(author)),
            posted_at: Some(Utc.with_ymd_and_hms(2025, 10, day, 0, 0, 0).unwrap()),
            url: None,
            category: None,
            links: vec![],
            attachments: vec![],
        }
    }

    fn reference() -> Post {
        post("a", "HW6 optimizer notes", "muon versus sgd", "Alice", 1)
    }

    #[test]
    fn test_scores() {
        let weights = RelatedWeights::default();
        let a = reference();
        let b = post("b", "HW 6 results", "muon only", "Bob", 2);
        let c = post("c", "HW5 results", "nothing shared", "Alice", 3);
        let d = post("d", "Lecture recap", "nothing shared", "Dan", 4);

        assert_eq!(weights.score(&a, &b), 13);
        assert_eq!(weights.score(&a, &c), 2);
        assert_eq!(weights.score(&a, &d), 0);
    }

    #[test]
    fn test_ranking_excludes_zero_and_reference() {
        let weights = RelatedWeights::default();
        let a = reference();
        let corpus = vec![
            post("d", "Lecture recap", "nothing shared", "Dan", 4),
            post("c", "HW5 results", "nothing shared", "Alice", 3),
            a.clone(),
            post("b", "HW 6 results", "muon only", "Bob", 2),
        ];

        let related = weights.related_posts(&a, &corpus, 5);
        let ids: Vec<(&str, u32)> = related.iter().map(|s| (s.post.id.as_str(), s.score)).collect();
        assert_eq!(ids, vec![("b", 13), ("c", 2)]);
    }

    #[test]
    fn test_ties_keep_corpus_order_and_limit_applies() {
        let weights = RelatedWeights::default();
        let a = reference();
        let corpus = vec![
            post("x", "misc", "sgd", "Zed", 2),
            post("y", "misc", "muon", "Yan", 2),
            post("z", "misc", "sgd", "Xi", 2),
        ];
        let related = weights.related_posts(&a, &corpus, 2);
        let ids: Vec<&str> = related.iter().map(|s| s.post.id.as_str()).collect();
        assert_eq!(ids, vec!["x", "y"]);
    }

    #[test]
    fn test_missing_signals_never_match() {
        let weights = RelatedWeights::default();
        let mut a = post("a", "misc", "", "Alice", 1);
        a.author = None;
        let mut b = post("b", "misc", "", "Bob", 1);
        b.author = None;
        assert_eq!(weights.score(&a, &b), 0);
    }

    #[test]
    fn test_optional_recency_bonus() {
        let weights = RelatedWeights {
            recency: Some((Duration::days(7), 1)),
            ..Default::default()
        };
        let a = reference();
        let near = post("n", "misc", "", "Nia", 5);
        let far = post("f", "misc", "", "Fay", 30);
        assert_eq!(weights.score(&a, &near), 1);
        assert_eq!(weights.score(&a, &far), 0);
    }
}
