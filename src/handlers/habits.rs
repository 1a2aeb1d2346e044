use super::{reference_day, today};
use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::habits;
use crate::models::{CategorySummary, HabitPatch, HabitView, ListQuery, NewHabit, ToggleRequest};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use uuid::Uuid;

pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<HabitView>>, AppError> {
    let reference = reference_day(query.date)?;
    let owner = user.id();
    let mut views = state.store.read(|data| habits::list(data, owner, reference)).await;
    if let Some(limit) = query.limit {
        views.truncate(limit);
    }
    Ok(Json(views))
}

pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<NewHabit>,
) -> Result<(StatusCode, Json<HabitView>), AppError> {
    let owner = user.id();
    let view = state
        .store
        .mutate(|data| habits::create(data, owner, payload, today()))
        .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<HabitPatch>,
) -> Result<Json<HabitView>, AppError> {
    let owner = user.id();
    let view = state
        .store
        .mutate(|data| habits::update(data, owner, id, patch, today()))
        .await?;
    Ok(Json(view))
}

pub async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let owner = user.id();
    state.store.mutate(|data| habits::delete(data, owner, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<ToggleRequest>,
) -> Result<Json<HabitView>, AppError> {
    let owner = user.id();
    let view = state
        .store
        .mutate(|data| habits::toggle(data, owner, id, request, today()))
        .await?;
    Ok(Json(view))
}

pub async fn completions(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<NaiveDate>>, AppError> {
    let owner = user.id();
    let days = state
        .store
        .read(|data| habits::completions(data, owner, id))
        .await?;
    Ok(Json(days))
}

pub async fn categories(State(state): State<AppState>, user: CurrentUser) -> Json<Vec<CategorySummary>> {
    let owner = user.id();
    Json(state.store.read(|data| habits::categories(data, owner)).await)
}
