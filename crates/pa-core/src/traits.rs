//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{CorpusStatus, Post};

/// Read-only access to the post corpus.
///
/// Every call rereads the backing source; implementations hold no cache.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CorpusSource: Send + Sync {
    /// Short backend label for logs and status reports.
    fn backend_name(&self) -> &'static str;

    /// Loads every visible post in source order.
    /// Fails with `AppError::SourceAbsent` when the file or table does not exist.
    async fn load_corpus(&self) -> Result<Vec<Post>>;

    async fn status(&self) -> Result<CorpusStatus>;
}

/// A signed, expiring session handed out after a successful login.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SessionToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Shared-secret credential verification and session issuance.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Verifies the site password against the configured hash.
    async fn verify_password(&self, password: &str) -> bool;

    /// Issues a fresh session token.
    fn issue_session(&self) -> SessionToken;

    /// True if `token` was issued by this provider and has not expired.
    fn validate_session(&self, token: &str) -> bool;
}
