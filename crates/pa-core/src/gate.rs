//! Authorization gate consulted before serving any archive read.

use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::traits::{AuthProvider, SessionToken};

#[derive(Clone)]
pub struct AuthGate {
    required: bool,
    provider: Option<Arc<dyn AuthProvider>>,
}

impl AuthGate {
    /// A gate that lets every request through.
    pub fn open() -> Self {
        Self {
            required: false,
            provider: None,
        }
    }

    /// `required` decides whether sessions are checked at all.
    pub fn new(required: bool, provider: Arc<dyn AuthProvider>) -> Self {
        Self {
            required,
            provider: Some(provider),
        }
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Short-circuits with `Unauthorized` when authentication is required and
    /// `session` is missing or invalid. A required gate without a provider
    /// rejects everything.
    pub fn check(&self, session: Option<&str>) -> Result<()> {
        if !self.required {
            return Ok(());
        }
        let valid = match (&self.provider, session) {
            (Some(provider), Some(token)) => provider.validate_session(token),
            _ => false,
        };
        if valid {
            Ok(())
        } else {
            Err(AppError::Unauthorized("Authentication required".into()))
        }
    }

    /// Exchanges the shared secret for a session.
    pub async fn login(&self, password: &str) -> Result<SessionToken> {
        let Some(provider) = &self.provider else {
            return Err(AppError::Unauthorized("login is not configured".into()));
        };
        if provider.verify_password(password).await {
            Ok(provider.issue_session())
        } else {
            log::warn!("rejected login attempt");
            Err(AppError::Unauthorized("invalid credentials".into()))
        }
    }
}
