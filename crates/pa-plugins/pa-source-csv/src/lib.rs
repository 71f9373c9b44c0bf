//! # pa-source-csv
//!
//! Delimited-text implementation of `CorpusSource`.
//!
//! The export is a header-row CSV with the columns `id, title, content,
//! author, posted_at, url, links, attachments` (plus an optional `category`).
//! `links` and `attachments` hold several values joined by `"; "`.
//! Exports are hand-edited often enough that rows may be ragged or carry stray
//! quotes: such rows are coerced or skipped, never fatal to the load.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use csv::{ByteRecord, ReaderBuilder, StringRecord};
use pa_core::dates::parse_timestamp;
use pa_core::error::{AppError, Result};
use pa_core::models::{Attachment, Author, CorpusStatus, Link, Post};
use pa_core::traits::CorpusSource;

/// Separator for multi-valued cells.
pub const MULTI_VALUE_SEPARATOR: &str = "; ";

const BACKEND: &str = "csv";

pub struct CsvCorpusSource {
    path: PathBuf,
}

impl CsvCorpusSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the raw file; a missing file is `SourceAbsent`, anything else `Internal`.
    async fn read(&self) -> Result<Vec<u8>> {
        tokio::fs::read(&self.path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => AppError::SourceAbsent(self.path.display().to_string()),
            _ => AppError::internal(format!("reading {}: {e}", self.path.display())),
        })
    }
}

#[async_trait]
impl CorpusSource for CsvCorpusSource {
    fn backend_name(&self) -> &'static str {
        BACKEND
    }

    async fn load_corpus(&self) -> Result<Vec<Post>> {
        let bytes = self.read().await?;
        parse_corpus(&bytes)
    }

    async fn status(&self) -> Result<CorpusStatus> {
        let meta = match tokio::fs::metadata(&self.path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(CorpusStatus::absent(BACKEND)),
            Err(e) => return Err(AppError::internal(e)),
        };
        let last_modified = meta.modified().ok().map(DateTime::<Utc>::from);
        let record_count = self.load_corpus().await?.len();

        Ok(CorpusStatus {
            backend: BACKEND.to_string(),
            exists: true,
            record_count: Some(record_count),
            last_modified,
            size_bytes: Some(meta.len()),
        })
    }
}

/// Column positions resolved from the header row; absent columns read as empty.
#[derive(Debug, Default)]
struct Columns {
    id: Option<usize>,
    title: Option<usize>,
    content: Option<usize>,
    author: Option<usize>,
    posted_at: Option<usize>,
    url: Option<usize>,
    category: Option<usize>,
    links: Option<usize>,
    attachments: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Self {
        let mut cols = Columns::default();
        for (idx, name) in headers.iter().enumerate() {
            let slot = match name.trim_start_matches('\u{feff}').trim().to_lowercase().as_str() {
                "id" => &mut cols.id,
                "title" => &mut cols.title,
                "content" => &mut cols.content,
                "author" => &mut cols.author,
                "posted_at" => &mut cols.posted_at,
                "url" => &mut cols.url,
                "category" => &mut cols.category,
                "links" => &mut cols.links,
                "attachments" => &mut cols.attachments,
                _ => continue,
            };
            slot.get_or_insert(idx);
        }
        cols
    }
}

/// Parses a whole export. Only an unreadable header row fails the load.
pub fn parse_corpus(bytes: &[u8]) -> Result<Vec<Post>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| AppError::internal(format!("unreadable CSV header: {e}")))?
        .clone();
    let columns = Columns::from_headers(&headers);
    if columns.id.is_none() {
        log::warn!("CSV header has no `id` column; every row will be skipped");
    }

    let mut posts = Vec::new();
    let mut seen = HashSet::new();
    let mut record = ByteRecord::new();
    let mut row = 0usize;

    loop {
        row += 1;
        match reader.read_byte_record(&mut record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                log::warn!("skipping unreadable CSV row {row}: {e}");
                continue;
            }
        }
        let Some(post) = post_from_record(&columns, &record) else {
            log::warn!("skipping CSV row {row}: missing id");
            continue;
        };
        if !seen.insert(post.id.clone()) {
            log::warn!("skipping CSV row {row}: duplicate id {}", post.id);
            continue;
        }
        posts.push(post);
    }

    Ok(posts)
}

fn post_from_record(columns: &Columns, record: &ByteRecord) -> Option<Post> {
    let field = |col: Option<usize>| -> Option<String> {
        col.and_then(|i| record.get(i))
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .filter(|s| !s.trim().is_empty())
    };

    let id = field(columns.id)?.trim().to_string();
    let posted_at = field(columns.posted_at).and_then(|raw| {
        let parsed = parse_timestamp(&raw);
        if parsed.is_none() {
            log::debug!("post {id}: unparseable posted_at {raw:?}");
        }
        parsed
    });

    Some(Post {
        title: field(columns.title).unwrap_or_default(),
        content: field(columns.content),
        author: field(columns.author).map(Author::named),
        posted_at,
        url: field(columns.url),
        category: field(columns.category),
        links: split_multi(field(columns.links))
            .map(Link::from_url)
            .collect(),
        attachments: split_multi(field(columns.attachments))
            .map(Attachment::from_filename)
            .collect(),
        id,
    })
}

/// Splits on the exact separator and drops empty tokens.
fn split_multi(cell: Option<String>) -> impl Iterator<Item = String> {
    cell.map(|raw| {
        raw.split(MULTI_VALUE_SEPARATOR)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>()
    })
    .unwrap_or_default()
    .into_iter()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pa_core::models::LinkType;
    use std::io::Write;

    const HEADER: &str = "id,title,author,content,posted_at,url,links,attachments\n";

    fn parse(body: &str) -> Vec<Post> {
        parse_corpus(format!("{HEADER}{body}").as_bytes()).unwrap()
    }

    #[test]
    fn test_parses_a_well_formed_row() {
        let posts = parse(
            "7,Participation D: HW06 Muon,Alice,\"Line one\nLine two, with comma\",2025-10-01T12:00:00Z,https://edstem.org/7,https://github.com/x; not a url,a.pdf; b.png\n",
        );
        assert_eq!(posts.len(), 1);
        let p = &posts[0];
        assert_eq!(p.id, "7");
        assert_eq!(p.author_name(), Some("Alice"));
        assert_eq!(p.content.as_deref(), Some("Line one\nLine two, with comma"));
        assert!(p.posted_at.is_some());
        assert_eq!(p.links.len(), 2);
        assert_eq!(p.links[0].domain, "github.com");
        assert_eq!(p.links[1].domain, "not a url");
        assert!(p.links.iter().all(|l| l.link_type == LinkType::Other));
        assert_eq!(p.attachments[0].id, "a.pdf");
        assert!(p.attachments[0].is_pdf);
        assert_eq!(p.homework(), Some(6));
    }

    #[test]
    fn test_multi_values_split_on_exact_separator() {
        let posts = parse("1,t,a,c,,,; https://a.com; ;https://b.com,x.txt; x.txt; \n");
        let urls: Vec<&str> = posts[0].links.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a.com", ";https://b.com"]);
        // Duplicate filenames are kept.
        assert_eq!(posts[0].attachments.len(), 2);
    }

    #[test]
    fn test_ragged_rows_are_tolerated() {
        let posts = parse("1,short row\n2,t,a,c,2025-10-01,u,,,extra,columns\n");
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].title, "short row");
        assert!(posts[0].author.is_none());
        assert!(posts[0].links.is_empty());
        assert_eq!(posts[1].url.as_deref(), Some("u"));
    }

    #[test]
    fn test_stray_quotes_do_not_fail_the_load() {
        let posts = parse("1,He said \"hi\" loudly,a,c,,,,\n2,next,b,c,,,,\n");
        assert_eq!(posts.len(), 2);
        assert!(posts[0].title.contains("hi"));
    }

    #[test]
    fn test_rows_without_id_and_duplicates_are_skipped() {
        let posts = parse(",no id,a,c,,,,\n1,first,a,c,,,,\n1,second,a,c,,,,\n");
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "first");
    }

    #[test]
    fn test_bad_timestamp_is_coerced_to_none() {
        let posts = parse("1,t,a,c,last tuesday,,,\n");
        assert!(posts[0].posted_at.is_none());
    }

    #[test]
    fn test_column_order_follows_header() {
        let csv = "title,id,posted_at\nHello,99,2025-01-01\n";
        let posts = parse_corpus(csv.as_bytes()).unwrap();
        assert_eq!(posts[0].id, "99");
        assert_eq!(posts[0].title, "Hello");
        assert!(posts[0].content.is_none());
    }

    #[test]
    fn test_empty_file_is_empty_corpus() {
        assert!(parse_corpus(b"").unwrap().is_empty());
        assert!(parse_corpus(HEADER.as_bytes()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_from_disk_and_status() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{HEADER}1,a,x,c,,,,\n2,b,y,c,,,,\n").unwrap();
        let source = CsvCorpusSource::new(file.path());

        assert_eq!(source.load_corpus().await.unwrap().len(), 2);
        let status = source.status().await.unwrap();
        assert!(status.exists);
        assert_eq!(status.record_count, Some(2));
        assert!(status.size_bytes.unwrap() > 0);
    }

    #[tokio::test]
    async fn test_missing_file_is_source_absent() {
        let dir = tempfile::tempdir().unwrap();
        let source = CsvCorpusSource::new(dir.path().join("missing.csv"));

        assert!(matches!(source.load_corpus().await, Err(AppError::SourceAbsent(_))));
        assert_eq!(source.status().await.unwrap(), CorpusStatus::absent("csv"));
    }

    #[tokio::test]
    async fn test_other_io_failures_are_internal() {
        let dir = tempfile::tempdir().unwrap();
        let source = CsvCorpusSource::new(dir.path());
        assert!(matches!(source.load_corpus().await, Err(AppError::Internal(_))));
    }
}
