//! Weekly schedule routes.

use anistream_common::{Error, ScheduleEntry, ScheduleId, Weekday};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;

use super::error::AppError;
use super::AppContext;
use crate::catalog::{NewScheduleEntry, ScheduleEntryPatch, WeeklyDay};

/// Create schedule routes.
pub fn schedule_routes() -> Router<AppContext> {
    Router::new()
        .route("/schedule", get(list_schedule).post(create_entry))
        .route("/schedule/weekly", get(weekly_schedule))
        .route("/schedule/:id", put(update_entry).delete(delete_entry))
}

/// `day` accepts full names or three-letter abbreviations.
#[derive(Debug, Deserialize)]
pub struct ScheduleQuery {
    pub day: Option<String>,
}

async fn list_schedule(
    State(ctx): State<AppContext>,
    Query(query): Query<ScheduleQuery>,
) -> Result<Json<Vec<ScheduleEntry>>, AppError> {
    let day = query
        .day
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .map(|d| d.parse::<Weekday>().map_err(Error::Validation))
        .transpose()?;
    Ok(Json(ctx.catalog.list_schedule(day)?))
}

async fn weekly_schedule(
    State(ctx): State<AppContext>,
) -> Result<Json<Vec<WeeklyDay>>, AppError> {
    Ok(Json(ctx.catalog.weekly_schedule()?))
}

async fn create_entry(
    State(ctx): State<AppContext>,
    Json(new): Json<NewScheduleEntry>,
) -> Result<(StatusCode, Json<ScheduleEntry>), AppError> {
    let entry = ctx.catalog.create_schedule_entry(new)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn update_entry(
    State(ctx): State<AppContext>,
    Path(id): Path<u64>,
    Json(patch): Json<ScheduleEntryPatch>,
) -> Result<Json<ScheduleEntry>, AppError> {
    Ok(Json(
        ctx.catalog
            .update_schedule_entry(ScheduleId::new(id), patch)?,
    ))
}

async fn delete_entry(
    State(ctx): State<AppContext>,
    Path(id): Path<u64>,
) -> Result<StatusCode, AppError> {
    ctx.catalog.delete_schedule_entry(ScheduleId::new(id))?;
    Ok(StatusCode::NO_CONTENT)
}
