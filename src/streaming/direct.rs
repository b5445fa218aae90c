//! Direct streaming with HTTP range requests.
//!
//! Serves episode video files with support for HTTP range requests, or
//! redirects to the source when it lives on a remote host.

use anistream_common::{source::resolve_under, AnimeId, VideoSource};
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::Response,
};
use futures::TryStreamExt;
use std::io::SeekFrom;
use std::path::Path as FsPath;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use super::range::{parse_range_header, ByteRange};
use super::StreamError;
use crate::catalog::ResolveError;
use crate::config::StreamingConfig;
use crate::server::AppContext;

/// Every episode is served as MP4 regardless of the file extension.
const VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Stream one server slot of an episode.
///
/// `GET /api/animes/:id/episodes/:episode/server/:server`
pub async fn stream_episode(
    State(ctx): State<AppContext>,
    Path((anime_id, episode, server)): Path<(u64, u32, usize)>,
    headers: HeaderMap,
) -> Result<Response, StreamError> {
    let anime_id = AnimeId::new(anime_id);

    // Catalog documents are read with blocking file I/O.
    let catalog = ctx.catalog.clone();
    let resolved =
        tokio::task::spawn_blocking(move || catalog.resolve_video_source(anime_id, episode, server))
            .await
            .map_err(|e| StreamError::Internal(format!("catalog lookup task failed: {e}")))?;

    let source = match resolved {
        Ok(source) => source,
        Err(ResolveError::Catalog(e)) => return Err(StreamError::Catalog(e)),
        Err(missing) => {
            tracing::warn!(%anime_id, episode, server, "Video source not found: {missing}");
            return Err(StreamError::ResourceNotFound(missing.to_string()));
        }
    };

    let range = match headers.get(header::RANGE) {
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| StreamError::MalformedRange("<non-ascii>".to_string()))?,
        ),
        None => None,
    };

    serve_source(
        &source,
        &ctx.config.storage.content_root,
        range,
        &ctx.config.streaming,
    )
    .await
}

/// Serve a resolved source: redirect remote URLs, stream local files.
pub async fn serve_source(
    source: &VideoSource,
    content_root: &FsPath,
    range_header: Option<&str>,
    options: &StreamingConfig,
) -> Result<Response, StreamError> {
    match source {
        VideoSource::Remote(url) => redirect(url),
        VideoSource::Local(relative) => {
            let path = resolve_under(content_root, relative).ok_or_else(|| {
                tracing::warn!("Refusing local source outside content root: {relative}");
                StreamError::ResourceNotFound(relative.clone())
            })?;
            serve_file(&path, range_header, options).await
        }
    }
}

fn redirect(url: &str) -> Result<Response, StreamError> {
    tracing::debug!("Redirecting to remote source {url}");
    Response::builder()
        .status(StatusCode::FOUND)
        .header(header::LOCATION, url)
        .body(Body::empty())
        .map_err(|e| StreamError::Internal(e.to_string()))
}

/// Serve a local file, honoring an optional `Range` header value.
///
/// Size and existence are read fresh on every call. The body is read in
/// `options.chunk_size` pieces, so memory stays bounded regardless of file
/// size; the file handle is released when the body is dropped, including
/// when the client disconnects mid-stream.
pub async fn serve_file(
    path: &FsPath,
    range_header: Option<&str>,
    options: &StreamingConfig,
) -> Result<Response, StreamError> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(m) if m.is_file() => m,
        Ok(_) => return Err(StreamError::ResourceNotFound(path.display().to_string())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StreamError::ResourceNotFound(path.display().to_string()))
        }
        Err(e) => return Err(StreamError::Io(e)),
    };
    let file_size = metadata.len();

    let range = range_header
        .map(|value| parse_range_header(value)?.resolve(file_size))
        .transpose()?;

    let mut file = File::open(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => StreamError::ResourceNotFound(path.display().to_string()),
        _ => StreamError::Io(e),
    })?;

    let mut builder = Response::builder()
        .header(header::CONTENT_TYPE, VIDEO_CONTENT_TYPE)
        .header(header::ACCEPT_RANGES, "bytes");
    if let Some(ref cache_control) = options.cache_control {
        builder = builder.header(header::CACHE_CONTROL, cache_control.as_str());
    }

    let body = match range {
        Some(window) => {
            let ByteRange { start, end } = window;
            tracing::debug!(
                "Serving bytes {start}-{end}/{file_size} of {}",
                path.display()
            );

            file.seek(SeekFrom::Start(start)).await?;
            builder = builder
                .status(StatusCode::PARTIAL_CONTENT)
                .header(header::CONTENT_RANGE, window.content_range(file_size))
                .header(header::CONTENT_LENGTH, window.length());

            body_from_reader(file.take(window.length()), options.chunk_size, path)
        }
        None => {
            builder = builder
                .status(StatusCode::OK)
                .header(header::CONTENT_LENGTH, file_size);

            body_from_reader(file, options.chunk_size, path)
        }
    };

    builder
        .body(body)
        .map_err(|e| StreamError::Internal(e.to_string()))
}

fn body_from_reader<R>(reader: R, chunk_size: usize, path: &FsPath) -> Body
where
    R: tokio::io::AsyncRead + Send + 'static,
{
    let path = path.display().to_string();
    let stream = ReaderStream::with_capacity(reader, chunk_size).inspect_err(move |e| {
        tracing::error!("Read failed mid-stream for {path}: {e}");
    });
    Body::from_stream(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use http_body_util::BodyExt;

    fn fixture(len: usize) -> (tempfile::TempDir, std::path::PathBuf, Vec<u8>) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("episode.mp4");
        let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &data).unwrap();
        (dir, path, data)
    }

    fn header_str<'a>(resp: &'a Response, name: header::HeaderName) -> &'a str {
        resp.headers().get(name).unwrap().to_str().unwrap()
    }

    async fn body_bytes(resp: Response) -> Vec<u8> {
        resp.into_body().collect().await.unwrap().to_bytes().to_vec()
    }

    #[tokio::test]
    async fn full_file_without_range() {
        let (_dir, path, data) = fixture(1000);
        let resp = serve_file(&path, None, &StreamingConfig::default())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(header_str(&resp, header::CONTENT_LENGTH), "1000");
        assert_eq!(header_str(&resp, header::CONTENT_TYPE), "video/mp4");
        assert!(resp.headers().get(header::CONTENT_RANGE).is_none());
        assert_eq!(body_bytes(resp).await, data);
    }

    #[tokio::test]
    async fn closed_range_is_byte_exact() {
        let (_dir, path, data) = fixture(1000);
        let resp = serve_file(&path, Some("bytes=200-499"), &StreamingConfig::default())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(header_str(&resp, header::CONTENT_RANGE), "bytes 200-499/1000");
        assert_eq!(header_str(&resp, header::CONTENT_LENGTH), "300");
        assert_eq!(header_str(&resp, header::ACCEPT_RANGES), "bytes");
        assert_eq!(body_bytes(resp).await, &data[200..=499]);
    }

    #[tokio::test]
    async fn open_range_runs_to_end() {
        let (_dir, path, data) = fixture(1000);
        let resp = serve_file(&path, Some("bytes=900-"), &StreamingConfig::default())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(header_str(&resp, header::CONTENT_RANGE), "bytes 900-999/1000");
        assert_eq!(header_str(&resp, header::CONTENT_LENGTH), "100");
        assert_eq!(body_bytes(resp).await, &data[900..]);
    }

    #[tokio::test]
    async fn small_chunks_still_cover_the_window() {
        let (_dir, path, data) = fixture(10_000);
        let options = StreamingConfig {
            chunk_size: 7,
            cache_control: Some("max-age=60".into()),
        };
        let resp = serve_file(&path, Some("bytes=1234-5678"), &options)
            .await
            .unwrap();

        assert_eq!(header_str(&resp, header::CACHE_CONTROL), "max-age=60");
        assert_eq!(body_bytes(resp).await, &data[1234..=5678]);
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result = serve_file(
            &dir.path().join("nope.mp4"),
            None,
            &StreamingConfig::default(),
        )
        .await;
        assert_matches!(result, Err(StreamError::ResourceNotFound(_)));
    }

    #[tokio::test]
    async fn directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result = serve_file(dir.path(), None, &StreamingConfig::default()).await;
        assert_matches!(result, Err(StreamError::ResourceNotFound(_)));
    }

    #[tokio::test]
    async fn malformed_and_unsatisfiable_ranges() {
        let (_dir, path, _) = fixture(100);
        let options = StreamingConfig::default();

        assert_matches!(
            serve_file(&path, Some("bytes=abc-"), &options).await,
            Err(StreamError::MalformedRange(_))
        );
        assert_matches!(
            serve_file(&path, Some("bytes=100-"), &options).await,
            Err(StreamError::RangeNotSatisfiable { size: 100 })
        );
        assert_matches!(
            serve_file(&path, Some("bytes=50-10"), &options).await,
            Err(StreamError::RangeNotSatisfiable { .. })
        );
    }

    #[tokio::test]
    async fn remote_source_redirects() {
        let source = VideoSource::classify("https://example.com/video.mp4");
        let resp = serve_source(
            &source,
            FsPath::new("/definitely/not/here"),
            Some("bytes=0-10"),
            &StreamingConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(
            header_str(&resp, header::LOCATION),
            "https://example.com/video.mp4"
        );
    }

    #[tokio::test]
    async fn local_source_resolves_under_root() {
        let (dir, _path, data) = fixture(64);
        let source = VideoSource::classify("episode.mp4");
        let resp = serve_source(&source, dir.path(), None, &StreamingConfig::default())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_bytes(resp).await, data);
    }

    #[tokio::test]
    async fn local_source_cannot_escape_root() {
        let (dir, _path, _) = fixture(64);
        let root = dir.path().join("videos");
        std::fs::create_dir(&root).unwrap();
        let source = VideoSource::classify("../episode.mp4");
        let result = serve_source(&source, &root, None, &StreamingConfig::default()).await;
        assert_matches!(result, Err(StreamError::ResourceNotFound(_)));
    }
}
