//! Request ID middleware.
//!
//! Generates a UUID for each request (or extracts an existing `x-request-id`
//! header), runs the request inside a tracing span carrying it, and returns
//! it in the response. JSON error bodies get the id filled in.

use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;
use tracing::Instrument;
use uuid::Uuid;

use super::error::ErrorBody;

/// Header name used for the request identifier.
pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Middleware that generates or extracts a request ID.
pub async fn request_id_middleware(request: Request<Body>, next: Next) -> Response {
    let id = request
        .headers()
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(String::from)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let span = tracing::info_span!("request", request_id = %id);
    let mut response = next.run(request).instrument(span).await;

    if let Some(body) = response.extensions_mut().remove::<ErrorBody>() {
        if body.request_id.is_none() {
            response = with_request_id(response, body, &id);
        }
    }

    if let Ok(val) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(X_REQUEST_ID.clone(), val);
    }

    response
}

fn with_request_id(response: Response, body: ErrorBody, id: &str) -> Response {
    let body = ErrorBody {
        request_id: Some(id.to_string()),
        ..body
    };
    match serde_json::to_vec(&body) {
        Ok(bytes) => {
            let (parts, _) = response.into_parts();
            Response::from_parts(parts, Body::from(bytes))
        }
        Err(e) => {
            tracing::warn!("Failed to re-encode error body: {e}");
            response
        }
    }
}
