//! # pa-api Handlers
//!
//! Each handler checks the authorization gate, calls the archive service and
//! serializes the result. Reads are never cached.

use actix_web::cookie::{time, Cookie, SameSite};
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use pa_core::{ArchiveService, AuthGate};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::ApiError;
use crate::middleware::{session_token, SESSION_COOKIE};
use crate::params::{LimitParams, PostsParams};

type ApiResult = Result<HttpResponse, ApiError>;

/// Site branding returned by `/api/site`.
#[derive(Debug, Clone, Serialize)]
pub struct SiteInfo {
    pub title: String,
    pub description: String,
}

/// State shared across all Actix-web workers.
pub struct AppState {
    pub service: ArchiveService,
    pub gate: AuthGate,
    pub site: SiteInfo,
}

impl AppState {
    fn authorize(&self, req: &HttpRequest) -> Result<(), ApiError> {
        let token = session_token(req);
        self.gate.check(token.as_deref())?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

pub async fn list_posts(
    data: web::Data<AppState>,
    req: HttpRequest,
) -> ApiResult {
    data.authorize(&req)?;
    let query = PostsParams::from_query_string(req.query_string()).into_query();
    let result = data.service.list_posts(query).await?;
    Ok(HttpResponse::Ok().json(result))
}

pub async fn get_post(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> ApiResult {
    data.authorize(&req)?;
    let detail = data.service.get_post(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(detail))
}

pub async fn related_posts(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> ApiResult {
    data.authorize(&req)?;
    let limit = LimitParams::from_query_string(req.query_string()).limit();
    let related = data.service.related_posts(&path.into_inner(), limit).await?;
    Ok(HttpResponse::Ok().json(related))
}

pub async fn list_students(data: web::Data<AppState>, req: HttpRequest) -> ApiResult {
    data.authorize(&req)?;
    Ok(HttpResponse::Ok().json(data.service.list_students().await?))
}

pub async fn student_profile(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> ApiResult {
    data.authorize(&req)?;
    let profile = data.service.student_profile(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(profile))
}

pub async fn list_tags(data: web::Data<AppState>, req: HttpRequest) -> ApiResult {
    data.authorize(&req)?;
    Ok(HttpResponse::Ok().json(data.service.list_tags().await?))
}

pub async fn dashboard(data: web::Data<AppState>, req: HttpRequest) -> ApiResult {
    data.authorize(&req)?;
    Ok(HttpResponse::Ok().json(data.service.dashboard(Utc::now()).await?))
}

pub async fn corpus_status(data: web::Data<AppState>, req: HttpRequest) -> ApiResult {
    data.authorize(&req)?;
    Ok(HttpResponse::Ok().json(data.service.corpus_status().await?))
}

/// Public: the client needs it to decide whether to show a login form.
pub async fn site_info(data: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "title": data.site.title,
        "description": data.site.description,
        "require_auth": data.gate.is_required(),
    }))
}

pub async fn login(data: web::Data<AppState>, body: web::Json<LoginRequest>) -> ApiResult {
    let session = data.gate.login(&body.password).await?;
    let max_age = (session.expires_at - Utc::now()).num_seconds().max(0);
    let cookie = Cookie::build(SESSION_COOKIE, session.token.clone())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(max_age))
        .finish();

    log::info!("issued session expiring at {}", session.expires_at);
    Ok(HttpResponse::Ok().cookie(cookie).json(session))
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}
