//! # pa-api
//!
//! The web routing layer for the participation archive.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod params;

use actix_web::web;

pub use error::ApiError;
pub use handlers::{AppState, SiteInfo};

/// Mounts the JSON API under `/api` plus the `/health` probe.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health)).service(
        web::scope("/api")
            .route("/site", web::get().to(handlers::site_info))
            .route("/auth/login", web::post().to(handlers::login))
            .route("/posts", web::get().to(handlers::list_posts))
            .route("/posts/{id}", web::get().to(handlers::get_post))
            .route("/posts/{id}/related", web::get().to(handlers::related_posts))
            .route("/students", web::get().to(handlers::list_students))
            .route("/students/{name}", web::get().to(handlers::student_profile))
            .route("/tags", web::get().to(handlers::list_tags))
            .route("/dashboard", web::get().to(handlers::dashboard))
            .route("/status", web::get().to(handlers::corpus_status)),
    );
}
