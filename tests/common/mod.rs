//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates temporary data and content
//! directories, a file-backed catalog, and a full [`AppContext`]. The
//! [`TestHarness::with_server`] constructor starts Axum on a random port for
//! HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;

use anistream::catalog::{CatalogService, NewAnime, NewEpisode};
use anistream::config::Config;
use anistream::server::{create_router, AppContext};
use anistream_common::{AnimeId, VideoServer};
use axum::Router;
use tempfile::TempDir;

/// Size of the generated fixture video.
pub const VIDEO_LEN: usize = 1000;

/// Test harness wrapping a fully-constructed [`AppContext`] backed by
/// temporary directories.
pub struct TestHarness {
    pub ctx: AppContext,
    pub data_dir: TempDir,
    pub content_root: TempDir,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a harness; storage paths in `config` are replaced with
    /// temporary directories.
    pub fn with_config(mut config: Config) -> Self {
        let data_dir = tempfile::tempdir().expect("failed to create data dir");
        let content_root = tempfile::tempdir().expect("failed to create content root");
        config.storage.data_dir = data_dir.path().to_path_buf();
        config.storage.content_root = content_root.path().to_path_buf();

        let ctx = AppContext::open(config).expect("failed to open store");
        Self {
            ctx,
            data_dir,
            content_root,
        }
    }

    pub fn catalog(&self) -> &CatalogService {
        &self.ctx.catalog
    }

    pub fn router(&self) -> Router {
        create_router(self.ctx.clone(), None)
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::with_server_config(Config::default()).await
    }

    pub async fn with_server_config(config: Config) -> (Self, SocketAddr) {
        let harness = Self::with_config(config);
        let app = harness.router();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }

    /// Write a file under the content root and return its absolute path.
    pub fn write_video(&self, relative: &str, data: &[u8]) -> PathBuf {
        let path = self.content_root.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create video dir");
        }
        std::fs::write(&path, data).expect("failed to write video");
        path
    }

    /// Seed one anime whose episode 1 has a local server (index 0), a remote
    /// server (index 1) and a server pointing at a missing file (index 2).
    ///
    /// Returns the anime id and the local file contents.
    pub fn seed_streamable(&self) -> (AnimeId, Vec<u8>) {
        let data = video_bytes(VIDEO_LEN);
        self.write_video("frieren/01.mp4", &data);

        let anime = self
            .catalog()
            .create_anime(NewAnime {
                title: "Frieren".into(),
                genres: vec!["Fantasy".into()],
                ..Default::default()
            })
            .expect("failed to create anime");

        self.catalog()
            .add_episode(
                anime.id,
                NewEpisode {
                    number: 1,
                    title: None,
                    servers: vec![
                        server("local", "frieren/01.mp4"),
                        server("mirror", "https://cdn.example.com/frieren/01.mp4"),
                        server("broken", "frieren/missing.mp4"),
                    ],
                },
            )
            .expect("failed to add episode");

        (anime.id, data)
    }
}

pub fn server(name: &str, source: &str) -> VideoServer {
    VideoServer {
        name: name.into(),
        source: source.into(),
    }
}

/// Deterministic, non-repeating-per-256 byte pattern.
pub fn video_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
