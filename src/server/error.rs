//! Error-to-HTTP response conversion for the JSON API.
//!
//! Handlers return `Result<T, AppError>`; catalog errors convert with `?`.

use anistream_common::Error;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// JSON body of an API error.
///
/// Also stored in the response extensions so the request-id middleware can
/// fill in `request_id` after the handler has run.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
    pub request_id: Option<String>,
}

/// Wrapper so we can implement `IntoResponse` for an external type.
#[derive(Debug)]
pub struct AppError {
    inner: Error,
    request_id: Option<String>,
}

impl AppError {
    pub fn new(inner: Error) -> Self {
        Self {
            inner,
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, id: String) -> Self {
        self.request_id = Some(id);
        self
    }
}

impl From<Error> for AppError {
    fn from(e: Error) -> Self {
        Self::new(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.inner.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                error = %self.inner,
                "Server error in API handler"
            );
        }

        let body = ErrorBody {
            error: self.inner.to_string(),
            code: self.inner.code(),
            request_id: self.request_id,
        };

        let mut response = (status, Json(body.clone())).into_response();
        response.extensions_mut().insert(body);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[test]
    fn not_found_produces_404() {
        let err = AppError::new(Error::not_found("anime", 7));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn conflict_produces_409() {
        let response = AppError::new(Error::conflict("episode 1 exists")).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn storage_error_produces_500() {
        let response = AppError::new(Error::storage("animes", "bad json")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn body_carries_code_and_request_id() {
        let response = AppError::new(Error::validation("title must not be empty"))
            .with_request_id("req-123".into())
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["code"], "validation_error");
        assert_eq!(json["request_id"], "req-123");
        assert_eq!(json["error"], "Validation error: title must not be empty");
    }
}
