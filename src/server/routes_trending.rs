//! Trending list routes.

use anistream_common::{Anime, TrendingConfig};
use axum::{extract::State, routing::get, Json, Router};

use super::error::AppError;
use super::AppContext;

/// Create trending routes.
pub fn trending_routes() -> Router<AppContext> {
    Router::new()
        .route("/trending", get(get_trending))
        .route(
            "/trending/config",
            get(get_trending_config).put(put_trending_config),
        )
}

async fn get_trending(State(ctx): State<AppContext>) -> Result<Json<Vec<Anime>>, AppError> {
    Ok(Json(ctx.catalog.trending()?))
}

async fn get_trending_config(
    State(ctx): State<AppContext>,
) -> Result<Json<TrendingConfig>, AppError> {
    Ok(Json(ctx.catalog.trending_config()?))
}

async fn put_trending_config(
    State(ctx): State<AppContext>,
    Json(config): Json<TrendingConfig>,
) -> Result<Json<TrendingConfig>, AppError> {
    Ok(Json(ctx.catalog.set_trending_config(config)?))
}
