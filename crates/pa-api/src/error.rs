//! Maps domain errors onto HTTP responses.

use std::fmt;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use pa_core::AppError;
use serde_json::json;

/// Wrapper so `AppError` can be returned straight from handlers.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(e: AppError) -> Self {
        ApiError(e)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            AppError::SourceAbsent(_) | AppError::NotFound(..) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match &self.0 {
            AppError::NotFound(kind, _) => format!("{kind} not found"),
            AppError::SourceAbsent(_) => "Not found".to_string(),
            AppError::Unauthorized(_) => "Authentication required".to_string(),
            AppError::Internal(detail) => {
                log::error!("request failed: {detail}");
                "Internal server error".to_string()
            }
        };
        HttpResponse::build(self.status_code()).json(json!({ "error": message }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let status = |e: AppError| ApiError(e).status_code();
        assert_eq!(status(AppError::not_found("Post", "9")), StatusCode::NOT_FOUND);
        assert_eq!(status(AppError::SourceAbsent("x.csv".into())), StatusCode::NOT_FOUND);
        assert_eq!(status(AppError::Unauthorized("no".into())), StatusCode::UNAUTHORIZED);
        assert_eq!(status(AppError::internal("boom")), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
