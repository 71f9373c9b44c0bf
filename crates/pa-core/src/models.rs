//! # Domain Models
//!
//! These structs represent the entities of the participation archive.
//! A corpus is rebuilt from its source on every request, so nothing here is
//! mutated after loading. Tags and homework numbers are never stored: they are
//! derived from the text through [`crate::topics`] and [`crate::homework`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::homework::extract_homework_number;
use crate::links::link_domain;
use crate::topics::extract_topics;

/// A single forum post from the archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Unique within one load of the corpus, not across reloads.
    pub id: String,
    pub title: String,
    /// Markdown body.
    pub content: Option<String>,
    /// Posts may be unattributed.
    pub author: Option<Author>,
    /// `None` when the source carried no parseable timestamp.
    pub posted_at: Option<DateTime<Utc>>,
    /// Origin URL on the forum.
    pub url: Option<String>,
    pub category: Option<String>,
    pub links: Vec<Link>,
    pub attachments: Vec<Attachment>,
}

impl Post {
    /// Topic tags derived from title and content.
    pub fn tags(&self) -> Vec<String> {
        extract_topics(Some(&self.title), self.content.as_deref())
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Homework number derived from the title.
    pub fn homework(&self) -> Option<u32> {
        extract_homework_number(&self.title)
    }

    pub fn author_name(&self) -> Option<&str> {
        self.author.as_ref().map(|a| a.display_name.as_str())
    }

    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }
}

/// The author reference embedded in a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    /// Foreign key in the relational store; absent for the delimited-text source.
    pub id: Option<String>,
    /// The join key between posts and students.
    pub display_name: String,
    pub email: Option<String>,
}

impl Author {
    pub fn named(display_name: impl Into<String>) -> Self {
        Self {
            id: None,
            display_name: display_name.into(),
            email: None,
        }
    }
}

/// A roster entry. `post_count` is recomputed per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub post_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    Github,
    Personal,
    Documentation,
    Other,
}

impl LinkType {
    /// Parses a stored classification; unknown values yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "github" => Some(LinkType::Github),
            "personal" => Some(LinkType::Personal),
            "documentation" => Some(LinkType::Documentation),
            "other" => Some(LinkType::Other),
            _ => None,
        }
    }
}

/// A URL referenced by a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub id: String,
    pub url: String,
    pub title: Option<String>,
    pub link_type: LinkType,
    /// Host parsed from `url`, or `url` itself when it does not parse.
    pub domain: String,
}

impl Link {
    /// Builds an unclassified link the way the delimited-text source does:
    /// the URL doubles as the identifier and the type is always `Other`.
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            id: url.clone(),
            domain: link_domain(&url),
            title: None,
            link_type: LinkType::Other,
            url,
        }
    }
}

/// A file attached to a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    /// Equal to `filename` for the delimited-text source, so duplicates are possible.
    pub id: String,
    pub filename: String,
    pub file_type: Option<String>,
    pub file_size: Option<i64>,
    pub download_url: Option<String>,
    pub preview_url: Option<String>,
    pub is_image: bool,
    pub is_pdf: bool,
}

impl Attachment {
    pub fn from_filename(filename: impl Into<String>) -> Self {
        let filename = filename.into();
        Self {
            id: filename.clone(),
            is_pdf: filename.to_lowercase().ends_with(".pdf"),
            is_image: false,
            file_type: None,
            file_size: None,
            download_url: None,
            preview_url: None,
            filename,
        }
    }
}

/// A post as emitted to callers, annotated with its derived metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub tags: Vec<String>,
    pub homework: Option<u32>,
}

impl From<Post> for PostView {
    fn from(post: Post) -> Self {
        let tags = post.tags();
        let homework = post.homework();
        Self {
            post,
            tags,
            homework,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    pub id: String,
    pub text: String,
    pub level: u8,
}

/// The single-post response.
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub view: PostView,
    pub reading_time_minutes: u32,
    pub table_of_contents: Vec<Heading>,
    pub related: Vec<PostView>,
}

/// One page of a filtered listing.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub posts: Vec<PostView>,
    /// Size of the filtered set before pagination.
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentCount {
    pub display_name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_posts: usize,
    pub total_students: usize,
    pub recent_posts: usize,
    pub popular_tags: Vec<TagCount>,
    pub top_students: Vec<StudentCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentProfile {
    pub display_name: String,
    pub post_count: usize,
    pub tags: Vec<String>,
    pub homework_numbers: Vec<u32>,
    pub first_posted_at: Option<DateTime<Utc>>,
    pub last_posted_at: Option<DateTime<Utc>>,
    pub posts: Vec<PostView>,
}

/// Freshness report for the backing source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorpusStatus {
    pub backend: String,
    pub exists: bool,
    pub record_count: Option<usize>,
    pub last_modified: Option<DateTime<Utc>>,
    pub size_bytes: Option<u64>,
}

impl CorpusStatus {
    pub fn absent(backend: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            exists: false,
            record_count: None,
            last_modified: None,
            size_bytes: None,
        }
    }
}
