//! # pa-config
//!
//! Layered settings for the archive server. Later layers win:
//! built-in defaults, `config/default.toml`, the file named by `PA_CONFIG`,
//! then `PA_`-prefixed environment variables (`PA_SOURCE__BACKEND=postgres`).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use pa_core::service::ListingOptions;
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

pub const ENV_PREFIX: &str = "PA";
pub const CONFIG_FILE_VAR: &str = "PA_CONFIG";
const BASE_FILE: &str = "config/default";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub source: SourceSettings,
    pub auth: AuthSettings,
    pub listing: ListingSettings,
    pub site: SiteSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Csv,
    Postgres,
}

#[derive(Debug, Deserialize)]
pub struct SourceSettings {
    pub backend: Backend,
    pub csv_path: PathBuf,
    pub database_url: Option<SecretString>,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize)]
pub struct AuthSettings {
    pub require_auth: bool,
    /// Argon2 PHC string of the shared site password.
    pub site_password_hash: Option<SecretString>,
    /// HMAC key for session tokens.
    pub session_secret: Option<SecretString>,
    pub session_ttl_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListingSettings {
    pub default_page_size: usize,
    pub related_limit: usize,
    pub recent_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteSettings {
    pub title: String,
    pub description: String,
}

impl From<&ListingSettings> for ListingOptions {
    fn from(l: &ListingSettings) -> Self {
        ListingOptions {
            default_page_size: l.default_page_size,
            related_limit: l.related_limit,
            recent_days: l.recent_days,
        }
    }
}

impl Settings {
    /// Loads from the process environment, honouring `.env` files.
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = dotenvy::dotenv() {
            log::debug!("loaded environment from {}", path.display());
        }
        let extra = std::env::var_os(CONFIG_FILE_VAR).map(PathBuf::from);
        Self::load_from(extra.as_deref(), None)
    }

    /// `env` replaces the process environment when given.
    pub fn load_from(
        extra_file: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, SettingsError> {
        let mut builder = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("source.backend", "csv")?
            .set_default("source.csv_path", "data/participation_d_posts.csv")?
            .set_default("source.max_connections", 5)?
            .set_default("auth.require_auth", false)?
            .set_default("auth.session_ttl_hours", 168)?
            .set_default("listing.default_page_size", 20)?
            .set_default("listing.related_limit", 5)?
            .set_default("listing.recent_days", 30)?
            .set_default("site.title", "Special Participation D Website")?
            .set_default(
                "site.description",
                "Browse and search student submissions for extra credit participation",
            )?
            .add_source(File::with_name(BASE_FILE).required(false));

        if let Some(path) = extra_file {
            builder = builder.add_source(File::from(path).required(true));
        }

        let settings: Settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.source.backend == Backend::Postgres && self.source.database_url.is_none() {
            return Err(SettingsError::Invalid(
                "source.database_url is required for the postgres backend".into(),
            ));
        }
        if self.source.max_connections == 0 {
            return Err(SettingsError::Invalid("source.max_connections must be positive".into()));
        }
        if self.auth.require_auth && self.auth.session_secret.is_none() {
            return Err(SettingsError::Invalid(
                "auth.session_secret is required when auth.require_auth is set".into(),
            ));
        }
        if self.auth.session_ttl_hours <= 0 {
            return Err(SettingsError::Invalid("auth.session_ttl_hours must be positive".into()));
        }
        if self.listing.default_page_size == 0 {
            return Err(SettingsError::Invalid("listing.default_page_size must be positive".into()));
        }
        Ok(())
    }

    pub fn listing_options(&self) -> ListingOptions {
        ListingOptions::from(&self.listing)
    }
}
