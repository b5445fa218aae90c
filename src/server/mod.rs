use crate::catalog::CatalogService;
use crate::config::Config;
use crate::streaming;
use anistream_store::{JsonFileStore, Store};
use anyhow::{Context, Result};
use axum::{
    http::{header, Method, StatusCode},
    middleware,
    response::IntoResponse,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

pub mod error;
pub mod request_id;
pub mod routes_animes;
pub mod routes_episodes;
pub mod routes_schedule;
pub mod routes_trending;

pub use error::AppError;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub catalog: Arc<CatalogService>,
}

impl AppContext {
    pub fn new(config: Config, catalog: CatalogService) -> Self {
        Self {
            config: Arc::new(config),
            catalog: Arc::new(catalog),
        }
    }

    /// Open the JSON file store under `storage.data_dir`.
    pub fn open(config: Config) -> Result<Self> {
        let backend = JsonFileStore::open(&config.storage.data_dir).with_context(|| {
            format!(
                "Failed to open data directory: {:?}",
                config.storage.data_dir
            )
        })?;
        let catalog = CatalogService::new(Store::new(backend));
        Ok(Self::new(config, catalog))
    }
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext, static_dir: Option<PathBuf>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::RANGE])
        .expose_headers([
            header::CONTENT_RANGE,
            header::ACCEPT_RANGES,
            header::CONTENT_LENGTH,
        ]);

    let mut app = Router::new()
        // Health check
        .route("/health", get(health_check))
        .nest("/api", api_routes())
        .layer(middleware::from_fn(request_id::request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx);

    // SPA fallback: serves index.html for any route that doesn't match a file
    if let Some(dir) = static_dir {
        if dir.exists() {
            tracing::info!("Serving static files from {:?}", dir);
            let index_path = dir.join("index.html");
            app = app.fallback_service(
                ServeDir::new(&dir)
                    .append_index_html_on_directories(true)
                    .not_found_service(ServeFile::new(index_path)),
            );
        }
    }

    app
}

fn api_routes() -> Router<AppContext> {
    routes_animes::anime_routes()
        .merge(routes_episodes::episode_routes())
        .merge(routes_trending::trending_routes())
        .merge(routes_schedule::schedule_routes())
        .merge(streaming::episode_router())
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Start the HTTP server and run until a shutdown signal arrives.
pub async fn start_server(config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let static_dir = config.server.static_dir.clone();
    let ctx = AppContext::open(config)?;
    let app = create_router(ctx, static_dir);

    tracing::info!("Starting server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
