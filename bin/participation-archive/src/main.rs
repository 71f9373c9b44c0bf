//! # Participation Archive Binary
//!
//! The entry point that assembles the application. Corpus backends and the
//! auth provider are compiled in by cargo features; configuration picks the
//! backend at runtime.
//!
//! `participation-archive hash-password [PASSWORD]` prints the Argon2 PHC
//! string for `auth.site_password_hash` instead of starting the server. The
//! password is read from stdin when not given as an argument.

use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::{bail, Context};
use pa_api::{configure_routes, middleware, AppState, SiteInfo};
use pa_config::{AuthSettings, Backend, Settings, SourceSettings};
use pa_core::{ArchiveService, AuthGate, AuthProvider, CorpusSource};

#[cfg(feature = "source-csv")]
use pa_source_csv::CsvCorpusSource;

#[cfg(feature = "source-postgres")]
use pa_source_postgres::PgCorpusSource;

#[cfg(feature = "auth-simple")]
use pa_auth_simple::SimpleAuthProvider;

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Serve,
    HashPassword(Option<String>),
}

impl Command {
    fn parse(mut args: impl Iterator<Item = String>) -> Self {
        match args.next().as_deref() {
            Some("hash-password") => Command::HashPassword(args.next()),
            _ => Command::Serve,
        }
    }
}

#[cfg(feature = "auth-simple")]
fn print_password_hash(password: Option<String>) -> anyhow::Result<()> {
    let password = match password {
        Some(p) => p,
        None => {
            let mut line = String::new();
            std::io::stdin()
                .read_line(&mut line)
                .context("reading password from stdin")?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };
    if password.is_empty() {
        bail!("refusing to hash an empty password");
    }
    println!("{}", pa_auth_simple::hash_password(&password)?);
    Ok(())
}

#[cfg(not(feature = "auth-simple"))]
fn print_password_hash(_: Option<String>) -> anyhow::Result<()> {
    bail!("hash-password needs the auth-simple feature")
}

/// The selected corpus source plus whatever must be released at shutdown.
struct OpenedSource {
    source: Arc<dyn CorpusSource>,
    #[cfg(feature = "source-postgres")]
    postgres: Option<Arc<PgCorpusSource>>,
}

impl OpenedSource {
    fn shared(source: Arc<dyn CorpusSource>) -> Self {
        Self {
            source,
            #[cfg(feature = "source-postgres")]
            postgres: None,
        }
    }

    #[cfg(feature = "source-postgres")]
    async fn close(self) {
        if let Some(pg) = self.postgres {
            pg.close().await;
            log::info!("postgres pool closed");
        }
    }

    #[cfg(not(feature = "source-postgres"))]
    async fn close(self) {}
}

#[cfg(feature = "source-csv")]
fn csv_source(settings: &SourceSettings) -> anyhow::Result<OpenedSource> {
    log::info!("reading corpus from {}", settings.csv_path.display());
    Ok(OpenedSource::shared(Arc::new(CsvCorpusSource::new(&settings.csv_path))))
}

#[cfg(not(feature = "source-csv"))]
fn csv_source(_: &SourceSettings) -> anyhow::Result<OpenedSource> {
    bail!("source.backend = \"csv\" but this binary was built without the source-csv feature")
}

#[cfg(feature = "source-postgres")]
async fn postgres_source(settings: &SourceSettings) -> anyhow::Result<OpenedSource> {
    use secrecy::ExposeSecret;

    let Some(url) = &settings.database_url else {
        bail!("source.database_url is required for the postgres backend");
    };
    let pool = pa_source_postgres::connect_pool(url.expose_secret(), settings.max_connections)
        .await
        .context("connecting to postgres")?;
    let pg = Arc::new(PgCorpusSource::new(pool));
    Ok(OpenedSource {
        source: pg.clone(),
        postgres: Some(pg),
    })
}

#[cfg(not(feature = "source-postgres"))]
async fn postgres_source(_: &SourceSettings) -> anyhow::Result<OpenedSource> {
    bail!("source.backend = \"postgres\" but this binary was built without the source-postgres feature")
}

#[cfg(feature = "auth-simple")]
fn auth_provider(auth: AuthSettings) -> anyhow::Result<Option<Arc<dyn AuthProvider>>> {
    let Some(secret) = &auth.session_secret else {
        return Ok(None);
    };
    if auth.site_password_hash.is_none() {
        log::warn!("auth.site_password_hash is unset; logins will always fail");
    }
    let provider = SimpleAuthProvider::new(
        auth.site_password_hash,
        secret,
        chrono::Duration::hours(auth.session_ttl_hours),
    )?;
    Ok(Some(Arc::new(provider)))
}

#[cfg(not(feature = "auth-simple"))]
fn auth_provider(_: AuthSettings) -> anyhow::Result<Option<Arc<dyn AuthProvider>>> {
    Ok(None)
}

fn build_gate(auth: AuthSettings) -> anyhow::Result<AuthGate> {
    let required = auth.require_auth;
    match (auth_provider(auth)?, required) {
        (Some(provider), _) => Ok(AuthGate::new(required, provider)),
        (None, false) => Ok(AuthGate::open()),
        (None, true) => bail!("auth.require_auth is set but no auth provider is available"),
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    if let Command::HashPassword(password) = Command::parse(std::env::args().skip(1)) {
        return print_password_hash(password);
    }

    // Loading settings also pulls in `.env`, so RUST_LOG may come from there.
    let settings = Settings::load().context("loading configuration")?;
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let opened = match settings.source.backend {
        Backend::Csv => csv_source(&settings.source)?,
        Backend::Postgres => postgres_source(&settings.source).await?,
    };

    let listing = settings.listing_options();
    let gate = build_gate(settings.auth)?;
    let state = web::Data::new(AppState {
        service: ArchiveService::new(opened.source.clone(), listing),
        gate,
        site: SiteInfo {
            title: settings.site.title,
            description: settings.site.description,
        },
    });

    let host = settings.server.host;
    let port = settings.server.port;
    log::info!(
        "Participation archive starting on http://{host}:{port} ({} backend, auth {})",
        opened.source.backend_name(),
        if state.gate.is_required() { "required" } else { "off" },
    );

    let served = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::security_headers())
            .wrap(middleware::cors_policy())
            .wrap(middleware::standard_middleware())
            .configure(configure_routes)
    })
    .bind((host.as_str(), port))
    .with_context(|| format!("binding {host}:{port}"))?
    .run()
    .await;

    opened.close().await;
    served.context("HTTP server failed")
}
