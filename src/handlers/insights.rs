use super::{reference_day, today};
use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::insights::{build_dashboard_at, build_insights_at};
use crate::models::{DashboardResponse, InsightsResponse, ListQuery};
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    Json,
};

pub async fn get_insights(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<InsightsResponse>, AppError> {
    let reference = reference_day(query.date)?;
    let owner = user.id();
    Ok(Json(
        state
            .store
            .read(|data| build_insights_at(reference, data, owner))
            .await,
    ))
}

pub async fn get_dashboard(State(state): State<AppState>, user: CurrentUser) -> Json<DashboardResponse> {
    let owner = user.id();
    Json(
        state
            .store
            .read(|data| build_dashboard_at(today(), data, owner))
            .await,
    )
}
