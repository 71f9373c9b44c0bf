//! # ArchiveService
//!
//! Orchestrates one request: load the corpus from the configured source,
//! narrow it with the filter engine, order and window it, then annotate each
//! emitted post with its derived metadata. Nothing is cached between calls.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::error::{AppError, Result};
use crate::filter::PostFilter;
use crate::markdown::{reading_time_minutes, table_of_contents};
use crate::models::{
    CorpusStatus, DashboardStats, Post, PostDetail, PostView, SearchResult, Student, StudentProfile,
};
use crate::paginate::{paginate, sort_posts, SortKey};
use crate::related::RelatedWeights;
use crate::reports;
use crate::traits::CorpusSource;

/// Listing defaults, normally filled from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingOptions {
    pub default_page_size: usize,
    pub related_limit: usize,
    pub recent_days: i64,
}

impl Default for ListingOptions {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            related_limit: 5,
            recent_days: 30,
        }
    }
}

/// A parsed `listPosts` request. `None` page fields take the defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub filter: PostFilter,
    pub sort: SortKey,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

pub struct ArchiveService {
    source: Arc<dyn CorpusSource>,
    options: ListingOptions,
    weights: RelatedWeights,
}

impl ArchiveService {
    pub fn new(source: Arc<dyn CorpusSource>, options: ListingOptions) -> Self {
        Self {
            source,
            options,
            weights: RelatedWeights::default(),
        }
    }

    pub fn with_weights(mut self, weights: RelatedWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn options(&self) -> &ListingOptions {
        &self.options
    }

    /// The full corpus, or `None` when the source does not exist.
    async fn corpus(&self) -> Result<Option<Vec<Post>>> {
        match self.source.load_corpus().await {
            Ok(posts) => {
                log::debug!("loaded {} posts from {}", posts.len(), self.source.backend_name());
                Ok(Some(posts))
            }
            Err(AppError::SourceAbsent(what)) => {
                log::info!("{} source absent ({what}); serving empty corpus", self.source.backend_name());
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Filters, sorts and pages the corpus. A missing source yields an empty
    /// first page at the default size.
    pub async fn list_posts(&self, query: ListQuery) -> Result<SearchResult> {
        let Some(posts) = self.corpus().await? else {
            return Ok(SearchResult {
                posts: vec![],
                total: 0,
                page: 1,
                page_size: self.options.default_page_size,
            });
        };

        let page = query.page.unwrap_or(1);
        let page_size = query.page_size.unwrap_or(self.options.default_page_size);

        let mut filtered = query.filter.apply(posts);
        sort_posts(&mut filtered, query.sort);
        let window = paginate(filtered, page, page_size);

        Ok(SearchResult {
            posts: window.items.into_iter().map(PostView::from).collect(),
            total: window.total,
            page,
            page_size,
        })
    }

    /// One post with reading aids and its related posts.
    pub async fn get_post(&self, id: &str) -> Result<PostDetail> {
        let corpus = self.require_corpus().await?;
        let post = find(&corpus, id)?;

        let related = self
            .weights
            .related_posts(post, &corpus, self.options.related_limit)
            .into_iter()
            .map(|s| PostView::from(s.post))
            .collect();
        let reading_time_minutes = reading_time_minutes(post.content.as_deref());
        let table_of_contents = post
            .content
            .as_deref()
            .map(table_of_contents)
            .unwrap_or_default();

        Ok(PostDetail {
            view: PostView::from(post.clone()),
            reading_time_minutes,
            table_of_contents,
            related,
        })
    }

    /// Up to `limit` posts related to `id`, best first.
    pub async fn related_posts(&self, id: &str, limit: Option<usize>) -> Result<Vec<PostView>> {
        let corpus = self.require_corpus().await?;
        let post = find(&corpus, id)?;
        let limit = limit.unwrap_or(self.options.related_limit);

        Ok(self
            .weights
            .related_posts(post, &corpus, limit)
            .into_iter()
            .map(|s| PostView::from(s.post))
            .collect())
    }

    pub async fn list_students(&self) -> Result<Vec<Student>> {
        Ok(self
            .corpus()
            .await?
            .map(|posts| reports::student_roster(&posts))
            .unwrap_or_default())
    }

    pub async fn list_tags(&self) -> Result<Vec<String>> {
        Ok(self
            .corpus()
            .await?
            .map(|posts| reports::tag_catalog(&posts))
            .unwrap_or_default())
    }

    pub async fn dashboard(&self, now: DateTime<Utc>) -> Result<DashboardStats> {
        let posts = self.corpus().await?.unwrap_or_default();
        Ok(reports::dashboard(
            &posts,
            now,
            Duration::days(self.options.recent_days),
        ))
    }

    pub async fn student_profile(&self, name: &str) -> Result<StudentProfile> {
        let corpus = self.require_corpus().await?;
        reports::student_profile(&corpus, name).ok_or_else(|| AppError::not_found("Student", name))
    }

    pub async fn corpus_status(&self) -> Result<CorpusStatus> {
        self.source.status().await
    }

    /// Like `corpus`, but an absent source is an error for single-record lookups.
    async fn require_corpus(&self) -> Result<Vec<Post>> {
        self.source.load_corpus().await
    }
}

fn find<'a>(corpus: &'a [Post], id: &str) -> Result<&'a Post> {
    corpus
        .iter()
        .find(|p| p.id == id)
        .ok_or_else(|| AppError::not_found("Post", id))
}
