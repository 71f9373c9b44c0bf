//! # Aggregate Reporters
//!
//! Read-only views derived from a whole corpus.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Duration, Utc};

use crate::models::{DashboardStats, Post, PostView, Student, StudentCount, StudentProfile, TagCount};
use crate::paginate::{sort_posts, SortKey};

const TOP_N: usize = 10;

/// Case-insensitive alphabetical order, raw text breaking ties.
fn alphabetical(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// One entry per distinct (trimmed) author name with its post count,
/// sorted by display name. Unattributed posts count toward no one.
pub fn student_roster(posts: &[Post]) -> Vec<Student> {
    let mut counts: HashMap<&str, (usize, Option<&str>)> = HashMap::new();
    for post in posts {
        let Some(author) = &post.author else { continue };
        let name = author.display_name.trim();
        if name.is_empty() {
            continue;
        }
        let entry = counts.entry(name).or_insert((0, None));
        entry.0 += 1;
        if entry.1.is_none() {
            entry.1 = author.email.as_deref();
        }
    }

    let mut entries: Vec<_> = counts.into_iter().collect();
    entries.sort_by(|(a, _), (b, _)| alphabetical(a, b));

    entries
        .into_iter()
        .enumerate()
        .map(|(index, (name, (post_count, email)))| Student {
            id: format!("student-{index}"),
            display_name: name.to_string(),
            email: email.map(str::to_string),
            post_count,
        })
        .collect()
}

/// Every topic tag present in the corpus, deduplicated and sorted.
pub fn tag_catalog(posts: &[Post]) -> Vec<String> {
    let mut tags: Vec<String> = posts
        .iter()
        .flat_map(|p| p.tags())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    tags.sort_by(|a, b| alphabetical(a, b));
    tags
}

/// Corpus-wide counters. `recent_window` is measured back from `now`.
pub fn dashboard(posts: &[Post], now: DateTime<Utc>, recent_window: Duration) -> DashboardStats {
    let cutoff = now - recent_window;
    let recent_posts = posts
        .iter()
        .filter(|p| p.posted_at.is_some_and(|t| t > cutoff))
        .count();

    let mut tag_counts: HashMap<String, usize> = HashMap::new();
    for tag in posts.iter().flat_map(|p| p.tags()) {
        *tag_counts.entry(tag).or_default() += 1;
    }
    let popular_tags = top_n(tag_counts)
        .into_iter()
        .map(|(tag, count)| TagCount { tag, count })
        .collect();

    let roster = student_roster(posts);
    let total_students = roster.len();
    let student_counts = roster
        .into_iter()
        .map(|s| (s.display_name, s.post_count))
        .collect();
    let top_students = top_n(student_counts)
        .into_iter()
        .map(|(display_name, count)| StudentCount { display_name, count })
        .collect();

    DashboardStats {
        total_posts: posts.len(),
        total_students,
        recent_posts,
        popular_tags,
        top_students,
    }
}

/// Everything one author posted, newest first, with the tags and homework
/// numbers they covered. `None` when the name matches no post.
pub fn student_profile(posts: &[Post], name: &str) -> Option<StudentProfile> {
    let wanted = name.trim().to_lowercase();
    let mut own: Vec<Post> = posts
        .iter()
        .filter(|p| p.author_name().is_some_and(|a| a.trim().to_lowercase() == wanted))
        .cloned()
        .collect();
    if own.is_empty() {
        return None;
    }
    // Spelling of the first post in corpus order.
    let display_name = own
        .iter()
        .find_map(|p| p.author_name())
        .map(|a| a.trim().to_string())
        .unwrap_or_default();
    sort_posts(&mut own, SortKey::Newest);

    let tags = tag_catalog(&own);
    let homework_numbers: BTreeSet<u32> = own.iter().filter_map(Post::homework).collect();
    let dates = own.iter().filter_map(|p| p.posted_at);
    let first_posted_at = dates.clone().min();
    let last_posted_at = dates.max();

    Some(StudentProfile {
        display_name,
        post_count: own.len(),
        tags,
        homework_numbers: homework_numbers.into_iter().collect(),
        first_posted_at,
        last_posted_at,
        posts: own.into_iter().map(PostView::from).collect(),
    })
}

/// Highest counts first, ties alphabetical.
fn top_n(counts: HashMap<String, usize>) -> Vec<(String, usize)> {
    let mut entries: Vec<_> = counts.into_iter().collect();
    entries.sort_by(|(a_name, a), (b_name, b)| {
        b.cmp(a).then_with(|| alphabetical(a_name, b_name))
    });
    entries.truncate(TOP_N);
    entries
}
