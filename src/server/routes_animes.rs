//! Anime catalog routes.
//!
//! Listing, search, CRUD, view counting, genres and related titles.

use anistream_common::{Anime, AnimeId};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::error::AppError;
use super::AppContext;
use crate::catalog::{AnimePatch, AnimeQuery, NewAnime, DEFAULT_RELATED_LIMIT};

/// Create anime routes.
pub fn anime_routes() -> Router<AppContext> {
    Router::new()
        .route("/animes", get(list_animes).post(create_anime))
        .route(
            "/animes/:id",
            get(get_anime).put(update_anime).delete(delete_anime),
        )
        .route("/animes/:id/view", post(record_view))
        .route("/animes/:id/related", get(related_animes))
        .route("/genres", get(list_genres))
}

#[derive(Debug, Deserialize)]
pub struct RelatedQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ViewResponse {
    pub id: AnimeId,
    pub views: u64,
}

async fn list_animes(
    State(ctx): State<AppContext>,
    Query(query): Query<AnimeQuery>,
) -> Result<Json<Vec<Anime>>, AppError> {
    Ok(Json(ctx.catalog.list_animes(&query)?))
}

async fn get_anime(
    State(ctx): State<AppContext>,
    Path(id): Path<u64>,
) -> Result<Json<Anime>, AppError> {
    Ok(Json(ctx.catalog.get_anime(AnimeId::new(id))?))
}

async fn create_anime(
    State(ctx): State<AppContext>,
    Json(new): Json<NewAnime>,
) -> Result<(StatusCode, Json<Anime>), AppError> {
    let anime = ctx.catalog.create_anime(new)?;
    Ok((StatusCode::CREATED, Json(anime)))
}

async fn update_anime(
    State(ctx): State<AppContext>,
    Path(id): Path<u64>,
    Json(patch): Json<AnimePatch>,
) -> Result<Json<Anime>, AppError> {
    Ok(Json(ctx.catalog.update_anime(AnimeId::new(id), patch)?))
}

async fn delete_anime(
    State(ctx): State<AppContext>,
    Path(id): Path<u64>,
) -> Result<StatusCode, AppError> {
    ctx.catalog.delete_anime(AnimeId::new(id))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn record_view(
    State(ctx): State<AppContext>,
    Path(id): Path<u64>,
) -> Result<Json<ViewResponse>, AppError> {
    let id = AnimeId::new(id);
    let views = ctx.catalog.record_view(id)?;
    Ok(Json(ViewResponse { id, views }))
}

async fn related_animes(
    State(ctx): State<AppContext>,
    Path(id): Path<u64>,
    Query(query): Query<RelatedQuery>,
) -> Result<Json<Vec<Anime>>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_RELATED_LIMIT);
    Ok(Json(ctx.catalog.related(AnimeId::new(id), limit)?))
}

async fn list_genres(State(ctx): State<AppContext>) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(ctx.catalog.genres()?))
}
