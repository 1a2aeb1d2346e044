use crate::auth::{clear_session_cookie, session_cookie, CurrentUser};
use crate::errors::AppError;
use crate::models::{PublicUser, SessionResponse, SignInRequest, SignUpRequest};
use crate::state::AppState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

pub async fn sign_up(
    State(state): State<AppState>,
    Json(payload): Json<SignUpRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = state
        .auth
        .sign_up(&payload.name, &payload.email, &payload.password)
        .await?;
    Ok((StatusCode::CREATED, with_cookie(&state, session)))
}

pub async fn sign_in(
    State(state): State<AppState>,
    Json(payload): Json<SignInRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = state.auth.sign_in(&payload.email, &payload.password).await?;
    Ok(with_cookie(&state, session))
}

pub async fn sign_out(State(state): State<AppState>, user: CurrentUser) -> impl IntoResponse {
    state.auth.sign_out(&user.token).await;
    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, clear_session_cookie())],
    )
}

pub async fn current(user: CurrentUser) -> Json<PublicUser> {
    Json(user.user)
}

fn with_cookie(state: &AppState, session: SessionResponse) -> Response {
    let cookie = session_cookie(&session.token, state.auth.ttl());
    ([(header::SET_COOKIE, cookie)], Json(session)).into_response()
}
