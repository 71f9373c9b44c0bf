//! # pa-source-postgres
//!
//! Relational implementation of `CorpusSource`.
//!
//! Reads the `posts`, `students`, `attachments` and `links` tables written by
//! the ingestion job. Hidden posts are never returned. The pool is owned by the
//! caller and passed in; this crate never opens connections on its own.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pa_core::error::{AppError, Result};
use pa_core::links::{classify_link, link_domain};
use pa_core::models::{Attachment, Author, CorpusStatus, Link, LinkType, Post};
use pa_core::traits::CorpusSource;
use serde::Deserialize;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::Row;

const BACKEND: &str = "postgres";

/// SQLSTATE for `undefined_table`.
const UNDEFINED_TABLE: &str = "42P01";

const CORPUS_QUERY: &str = r#"
SELECT
    p.id::text                 AS id,
    p.title                    AS title,
    p.content                  AS content,
    p.posted_at::timestamptz   AS posted_at,
    p.url                      AS url,
    p.category                 AS category,
    s.id::text                 AS author_id,
    s.display_name             AS author_name,
    s.email                    AS author_email,
    COALESCE((
        SELECT json_agg(json_build_object(
            'id', a.id::text, 'filename', a.filename, 'file_type', a.file_type,
            'file_size', a.file_size, 'download_url', a.download_url,
            'preview_url', a.preview_url, 'is_image', a.is_image, 'is_pdf', a.is_pdf
        ) ORDER BY a.id)
        FROM attachments a WHERE a.post_id = p.id
    ), '[]'::json)             AS attachments,
    COALESCE((
        SELECT json_agg(json_build_object(
            'id', l.id::text, 'url', l.url, 'title', l.title,
            'link_type', l.link_type, 'domain', l.domain
        ) ORDER BY l.id)
        FROM links l WHERE l.post_id = p.id
    ), '[]'::json)             AS links
FROM posts p
LEFT JOIN students s ON p.author_id = s.id
WHERE p.is_hidden = false
ORDER BY p.posted_at DESC NULLS LAST, p.id
"#;

const STATUS_QUERY: &str = r#"
SELECT
    COUNT(*)                                         AS record_count,
    MAX(COALESCE(updated_at, posted_at))::timestamptz AS last_modified
FROM posts
WHERE is_hidden = false
"#;

/// Opens the pool the binary hands to [`PgCorpusSource::new`].
pub async fn connect_pool(database_url: &str, max_connections: u32) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .map_err(map_sqlx_error)
}

pub struct PgCorpusSource {
    pool: PgPool,
}

impl PgCorpusSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Waits for checked-out connections to return, then closes the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl CorpusSource for PgCorpusSource {
    fn backend_name(&self) -> &'static str {
        BACKEND
    }

    async fn load_corpus(&self) -> Result<Vec<Post>> {
        let rows = sqlx::query(CORPUS_QUERY)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.iter()
            .map(|row| PostRow::from_row(row).map(PostRow::into_post))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(map_sqlx_error)
    }

    async fn status(&self) -> Result<CorpusStatus> {
        let row = match sqlx::query(STATUS_QUERY).fetch_one(&self.pool).await {
            Ok(row) => row,
            Err(e) if is_undefined_table(&e) => return Ok(CorpusStatus::absent(BACKEND)),
            Err(e) => return Err(map_sqlx_error(e)),
        };
        let count: i64 = row.try_get("record_count").map_err(map_sqlx_error)?;
        let last_modified: Option<DateTime<Utc>> =
            row.try_get("last_modified").map_err(map_sqlx_error)?;

        Ok(CorpusStatus {
            backend: BACKEND.to_string(),
            exists: true,
            record_count: Some(usize::try_from(count).unwrap_or_default()),
            last_modified,
            size_bytes: None,
        })
    }
}

fn is_undefined_table(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => db.code().as_deref() == Some(UNDEFINED_TABLE),
        _ => false,
    }
}

/// Logging happens where the error becomes an HTTP response, not here.
fn map_sqlx_error(e: sqlx::Error) -> AppError {
    if is_undefined_table(&e) {
        AppError::SourceAbsent(e.to_string())
    } else {
        AppError::internal(format!("postgres corpus query failed: {e}"))
    }
}

/// One post row as selected by `CORPUS_QUERY`.
#[derive(Debug, Clone, Default)]
struct PostRow {
    id: String,
    title: Option<String>,
    content: Option<String>,
    posted_at: Option<DateTime<Utc>>,
    url: Option<String>,
    category: Option<String>,
    author_id: Option<String>,
    author_name: Option<String>,
    author_email: Option<String>,
    links: Vec<LinkRow>,
    attachments: Vec<AttachmentRow>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct LinkRow {
    id: Option<String>,
    url: String,
    title: Option<String>,
    link_type: Option<String>,
    domain: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct AttachmentRow {
    id: Option<String>,
    filename: String,
    file_type: Option<String>,
    file_size: Option<i64>,
    download_url: Option<String>,
    preview_url: Option<String>,
    is_image: Option<bool>,
    is_pdf: Option<bool>,
}

impl PostRow {
    fn from_row(row: &PgRow) -> std::result::Result<Self, sqlx::Error> {
        let Json(links): Json<Vec<LinkRow>> = row.try_get("links")?;
        let Json(attachments): Json<Vec<AttachmentRow>> = row.try_get("attachments")?;
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            content: row.try_get("content")?,
            posted_at: row.try_get("posted_at")?,
            url: row.try_get("url")?,
            category: row.try_get("category")?,
            author_id: row.try_get("author_id")?,
            author_name: row.try_get("author_name")?,
            author_email: row.try_get("author_email")?,
            links,
            attachments,
        })
    }

    fn into_post(self) -> Post {
        // A dangling author_id leaves the post unattributed.
        let author = match (self.author_id, self.author_name) {
            (id, Some(name)) => Some(Author {
                id,
                display_name: name,
                email: self.author_email,
            }),
            (_, None) => None,
        };

        Post {
            id: self.id,
            title: self.title.unwrap_or_default(),
            content: self.content,
            author,
            posted_at: self.posted_at,
            url: self.url,
            category: self.category,
            links: self.links.into_iter().map(LinkRow::into_link).collect(),
            attachments: self
                .attachments
                .into_iter()
                .map(AttachmentRow::into_attachment)
                .collect(),
        }
    }
}

impl LinkRow {
    fn into_link(self) -> Link {
        let domain = self
            .domain
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| link_domain(&self.url));
        let link_type = self
            .link_type
            .as_deref()
            .and_then(LinkType::parse)
            .unwrap_or_else(|| classify_link(&self.url, &domain));

        Link {
            id: self.id.unwrap_or_else(|| self.url.clone()),
            url: self.url,
            title: self.title,
            link_type,
            domain,
        }
    }
}

impl AttachmentRow {
    fn into_attachment(self) -> Attachment {
        let is_pdf = self
            .is_pdf
            .unwrap_or_else(|| self.filename.to_lowercase().ends_with(".pdf"));
        Attachment {
            id: self.id.unwrap_or_else(|| self.filename.clone()),
            filename: self.filename,
            file_type: self.file_type,
            file_size: self.file_size,
            download_url: self.download_url,
            preview_url: self.preview_url,
            is_image: self.is_image.unwrap_or(false),
            is_pdf,
        }
    }
}
