use super::{check_year, today};
use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::{
    CalendarEvent, CalendarQuery, EventPatch, JournalEntry, JournalPatch, ListQuery, MonthView,
    NewEvent, NewJournalEntry, NewTask, Task, TaskPatch,
};
use crate::state::AppState;
use crate::{calendar, journal, tasks};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Datelike;
use uuid::Uuid;

pub async fn list_entries(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> Json<Vec<JournalEntry>> {
    let owner = user.id();
    Json(state.store.read(|data| journal::list(data, owner, query.limit)).await)
}

pub async fn get_entry(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<JournalEntry>, AppError> {
    let owner = user.id();
    let entry = state.store.read(|data| journal::get(data, owner, id)).await?;
    Ok(Json(entry))
}

pub async fn create_entry(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<NewJournalEntry>,
) -> Result<(StatusCode, Json<JournalEntry>), AppError> {
    let owner = user.id();
    let entry = state
        .store
        .mutate(|data| journal::create(data, owner, payload))
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn update_entry(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<JournalPatch>,
) -> Result<Json<JournalEntry>, AppError> {
    let owner = user.id();
    let entry = state
        .store
        .mutate(|data| journal::update(data, owner, id, patch))
        .await?;
    Ok(Json(entry))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let owner = user.id();
    state.store.mutate(|data| journal::delete(data, owner, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn export_entries(State(state): State<AppState>, user: CurrentUser) -> impl IntoResponse {
    let owner = user.id();
    let text = state
        .store
        .read(|data| journal::export_text(&journal::list(data, owner, None)))
        .await;
    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"journal.txt\""),
        ],
        text,
    )
}

pub async fn list_tasks(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> Json<Vec<Task>> {
    let owner = user.id();
    Json(state.store.read(|data| tasks::list(data, owner, query.limit)).await)
}

pub async fn create_task(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<NewTask>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    let owner = user.id();
    let task = state
        .store
        .mutate(|data| tasks::create(data, owner, payload))
        .await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_task(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<TaskPatch>,
) -> Result<Json<Task>, AppError> {
    let owner = user.id();
    let task = state
        .store
        .mutate(|data| tasks::update(data, owner, id, patch))
        .await?;
    Ok(Json(task))
}

pub async fn toggle_task(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Task>, AppError> {
    let owner = user.id();
    let task = state.store.mutate(|data| tasks::toggle(data, owner, id)).await?;
    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let owner = user.id();
    state.store.mutate(|data| tasks::delete(data, owner, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_events(State(state): State<AppState>, user: CurrentUser) -> Json<Vec<CalendarEvent>> {
    let owner = user.id();
    Json(state.store.read(|data| calendar::list(data, owner)).await)
}

pub async fn create_event(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<NewEvent>,
) -> Result<(StatusCode, Json<CalendarEvent>), AppError> {
    let owner = user.id();
    let event = state
        .store
        .mutate(|data| calendar::create(data, owner, payload))
        .await?;
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn update_event(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<EventPatch>,
) -> Result<Json<CalendarEvent>, AppError> {
    let owner = user.id();
    let event = state
        .store
        .mutate(|data| calendar::update(data, owner, id, patch))
        .await?;
    Ok(Json(event))
}

pub async fn delete_event(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let owner = user.id();
    state.store.mutate(|data| calendar::delete(data, owner, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn month(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<MonthView>, AppError> {
    let view = load_month(&state, &user, query).await?;
    Ok(Json(view))
}

pub(crate) async fn load_month(
    state: &AppState,
    user: &CurrentUser,
    query: CalendarQuery,
) -> Result<MonthView, AppError> {
    let now = today();
    let year = check_year(query.year.unwrap_or(now.year()))?;
    let month = query.month.unwrap_or(now.month());
    let owner = user.id();
    let events = state.store.read(|data| calendar::list(data, owner)).await;
    calendar::month_view(&events, year, month)
}
