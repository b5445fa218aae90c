//! Episode routes, including batch ingestion.

use anistream_common::{AnimeId, Episode};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use super::error::AppError;
use super::AppContext;
use crate::catalog::{EpisodeBatch, EpisodePatch, IngestReport, NewEpisode};

/// Create episode routes.
pub fn episode_routes() -> Router<AppContext> {
    Router::new()
        .route("/animes/:id/episodes", get(list_episodes).post(add_episode))
        .route("/animes/:id/episodes/batch", post(ingest_episodes))
        .route(
            "/animes/:id/episodes/:episode",
            get(get_episode).put(update_episode).delete(delete_episode),
        )
}

async fn list_episodes(
    State(ctx): State<AppContext>,
    Path(id): Path<u64>,
) -> Result<Json<Vec<Episode>>, AppError> {
    Ok(Json(ctx.catalog.list_episodes(AnimeId::new(id))?))
}

async fn get_episode(
    State(ctx): State<AppContext>,
    Path((id, episode)): Path<(u64, u32)>,
) -> Result<Json<Episode>, AppError> {
    Ok(Json(ctx.catalog.get_episode(AnimeId::new(id), episode)?))
}

async fn add_episode(
    State(ctx): State<AppContext>,
    Path(id): Path<u64>,
    Json(new): Json<NewEpisode>,
) -> Result<(StatusCode, Json<Episode>), AppError> {
    let episode = ctx.catalog.add_episode(AnimeId::new(id), new)?;
    Ok((StatusCode::CREATED, Json(episode)))
}

async fn update_episode(
    State(ctx): State<AppContext>,
    Path((id, episode)): Path<(u64, u32)>,
    Json(patch): Json<EpisodePatch>,
) -> Result<Json<Episode>, AppError> {
    Ok(Json(
        ctx.catalog
            .update_episode(AnimeId::new(id), episode, patch)?,
    ))
}

async fn delete_episode(
    State(ctx): State<AppContext>,
    Path((id, episode)): Path<(u64, u32)>,
) -> Result<StatusCode, AppError> {
    ctx.catalog.delete_episode(AnimeId::new(id), episode)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Accepts either a JSON episode list or `{html, server_name, start_number}`.
async fn ingest_episodes(
    State(ctx): State<AppContext>,
    Path(id): Path<u64>,
    Json(batch): Json<EpisodeBatch>,
) -> Result<Json<IngestReport>, AppError> {
    Ok(Json(ctx.catalog.ingest_episodes(AnimeId::new(id), batch)?))
}
