//! Episode video streaming.
//!
//! Local sources are served straight from disk with HTTP range support so
//! players can seek; remote sources are handed back to the client as a
//! redirect.
//!
//! # Routes
//!
//! - `GET /animes/{id}/episodes/{episode}/server/{server}` - Stream one
//!   server slot of an episode (`server` is 0-based)

mod direct;
mod range;

pub use direct::{serve_file, serve_source, stream_episode};
pub use range::{parse_range_header, ByteRange, RangeSpec};

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use crate::server::AppContext;

/// Errors raised while resolving or streaming a video.
///
/// Every variant maps to a status code with an empty body; players only
/// look at the status and headers.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    #[error("malformed range header: {0}")]
    MalformedRange(String),

    #[error("range not satisfiable for resource of {size} bytes")]
    RangeNotSatisfiable { size: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog error: {0}")]
    Catalog(anistream_common::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl StreamError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            Self::MalformedRange(_) => StatusCode::BAD_REQUEST,
            Self::RangeNotSatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
            Self::Io(_) | Self::Catalog(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for StreamError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Streaming failed");
        } else {
            tracing::debug!(status = %status, "Streaming request rejected: {self}");
        }

        let mut response = (status, Body::empty()).into_response();
        if let Self::RangeNotSatisfiable { size } = self {
            if let Ok(value) = HeaderValue::from_str(&format!("bytes */{size}")) {
                response.headers_mut().insert(header::CONTENT_RANGE, value);
            }
        }
        response
    }
}

/// Create the episode streaming router.
pub fn episode_router() -> Router<AppContext> {
    Router::new().route(
        "/animes/:id/episodes/:episode/server/:server",
        get(stream_episode),
    )
}
