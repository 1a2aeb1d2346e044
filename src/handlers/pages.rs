use super::records::load_month;
use super::today;
use crate::auth::{clear_session_cookie, session_cookie, CurrentUser, ProviderProfile};
use crate::errors::AppError;
use crate::insights::{build_dashboard_at, build_insights_at};
use crate::models::{CalendarQuery, OAuthProvider, SessionResponse, SignInRequest, SignUpRequest};
use crate::state::AppState;
use crate::ui::{self, Page};
use crate::{habits, journal, tasks};
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Deserialize, Default)]
pub struct PageQuery {
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub provider: String,
    pub state: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

fn error_message(code: Option<&str>) -> Option<&'static str> {
    match code? {
        "oauth" => Some("Sign-in with the provider failed. Please try again."),
        "unknown-provider" => Some("That sign-in provider is not supported."),
        "save-failed" => Some("Your change could not be saved. Please try again."),
        "invalid" => Some("Some fields are missing or invalid."),
        "not-found" => Some("That item no longer exists."),
        _ => Some("Something went wrong. Please try again."),
    }
}

pub(super) fn to_login() -> Response {
    Redirect::to(Page::Login.path()).into_response()
}

fn signed_in(state: &AppState, session: &SessionResponse) -> Response {
    let cookie = session_cookie(&session.token, state.auth.ttl());
    ([(header::SET_COOKIE, cookie)], Redirect::to(Page::Dashboard.path())).into_response()
}

fn form_error(err: AppError, render: fn(Option<&str>) -> String) -> Response {
    (err.status(), Html(render(Some(&err.to_string())))).into_response()
}

pub async fn home(user: Option<CurrentUser>) -> Html<String> {
    Html(ui::render_home(user.as_ref().map(|u| &u.user)))
}

pub async fn login_page(user: Option<CurrentUser>, Query(query): Query<PageQuery>) -> Response {
    if user.is_some() {
        return Redirect::to(Page::Dashboard.path()).into_response();
    }
    Html(ui::render_login(error_message(query.error.as_deref()))).into_response()
}

pub async fn login_submit(State(state): State<AppState>, Form(form): Form<SignInRequest>) -> Response {
    match state.auth.sign_in(&form.email, &form.password).await {
        Ok(session) => signed_in(&state, &session),
        Err(err) => form_error(err, ui::render_login),
    }
}

pub async fn signup_page(user: Option<CurrentUser>, Query(query): Query<PageQuery>) -> Response {
    if user.is_some() {
        return Redirect::to(Page::Dashboard.path()).into_response();
    }
    Html(ui::render_signup(error_message(query.error.as_deref()))).into_response()
}

pub async fn signup_submit(State(state): State<AppState>, Form(form): Form<SignUpRequest>) -> Response {
    match state.auth.sign_up(&form.name, &form.email, &form.password).await {
        Ok(session) => signed_in(&state, &session),
        Err(err) => form_error(err, ui::render_signup),
    }
}

pub async fn sign_out(State(state): State<AppState>, user: Option<CurrentUser>) -> Response {
    if let Some(user) = user {
        state.auth.sign_out(&user.token).await;
    }
    ([(header::SET_COOKIE, clear_session_cookie())], Redirect::to(Page::Home.path())).into_response()
}

pub async fn oauth_start(State(state): State<AppState>, Path(provider): Path<String>) -> Response {
    let Some(provider) = OAuthProvider::parse(&provider) else {
        return Redirect::to("/auth/login?error=unknown-provider").into_response();
    };
    let token = state.auth.begin_oauth(provider).await;
    Html(ui::render_consent(provider, &token)).into_response()
}

pub async fn oauth_callback(State(state): State<AppState>, Query(query): Query<CallbackQuery>) -> Response {
    let failed = || Redirect::to("/auth/login?error=oauth").into_response();
    let Some(provider) = OAuthProvider::parse(&query.provider) else {
        return failed();
    };
    let Some(email) = query.email else {
        return failed();
    };

    let profile = ProviderProfile {
        email,
        name: query.name,
    };
    match state
        .auth
        .sign_in_with_provider(provider, &query.state, profile)
        .await
    {
        Ok(session) => signed_in(&state, &session),
        Err(err) => {
            warn!(provider = provider.as_str(), "oauth callback rejected: {err}");
            failed()
        }
    }
}

pub async fn dashboard(State(state): State<AppState>, user: Option<CurrentUser>) -> Response {
    let Some(user) = user else {
        return to_login();
    };
    let owner = user.id();
    let view = state
        .store
        .read(|data| build_dashboard_at(today(), data, owner))
        .await;
    Html(ui::render_dashboard(&user.user, &view)).into_response()
}

pub async fn journal_page(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    Query(query): Query<PageQuery>,
) -> Response {
    let Some(user) = user else {
        return to_login();
    };
    let owner = user.id();
    let entries = state.store.read(|data| journal::list(data, owner, None)).await;
    let error = error_message(query.error.as_deref());
    Html(ui::render_journal(&user.user, &entries, error)).into_response()
}

pub async fn tasks_page(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    Query(query): Query<PageQuery>,
) -> Response {
    let Some(user) = user else {
        return to_login();
    };
    let owner = user.id();
    let list = state.store.read(|data| tasks::list(data, owner, None)).await;
    Html(ui::render_tasks(&user.user, &list, error_message(query.error.as_deref()))).into_response()
}

pub async fn habits_page(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    Query(query): Query<PageQuery>,
) -> Response {
    let Some(user) = user else {
        return to_login();
    };
    let owner = user.id();
    let (views, categories) = state
        .store
        .read(|data| (habits::list(data, owner, today()), habits::categories(data, owner)))
        .await;
    let error = error_message(query.error.as_deref());
    Html(ui::render_habits(&user.user, &views, &categories, error)).into_response()
}

pub async fn insights_page(State(state): State<AppState>, user: Option<CurrentUser>) -> Response {
    let Some(user) = user else {
        return to_login();
    };
    let owner = user.id();
    let insights = state
        .store
        .read(|data| build_insights_at(today(), data, owner))
        .await;
    Html(ui::render_insights(&user.user, &insights)).into_response()
}

pub async fn calendar_page(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    Query(query): Query<CalendarQuery>,
    Query(page): Query<PageQuery>,
) -> Response {
    let Some(user) = user else {
        return to_login();
    };
    let error = error_message(page.error.as_deref());
    match load_month(&state, &user, query).await {
        Ok(month) => Html(ui::render_calendar(&user.user, &month, error)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn toggle_habit(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Response {
    let Some(user) = user else {
        return to_login();
    };
    let owner = user.id();
    let result = state
        .store
        .mutate(|data| habits::toggle(data, owner, id, Default::default(), today()))
        .await;
    back(&headers, Page::Habits, result.err())
}

pub async fn toggle_task(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Response {
    let Some(user) = user else {
        return to_login();
    };
    let owner = user.id();
    let result = state.store.mutate(|data| tasks::toggle(data, owner, id)).await;
    back(&headers, Page::Tasks, result.err())
}

/// Redirects to the app page the form was posted from, or `fallback`.
fn back(headers: &HeaderMap, fallback: Page, error: Option<AppError>) -> Response {
    after_submit(referring_page(headers).unwrap_or(fallback), error)
}

/// Post/redirect/get: back to `page`, carrying an error code on failure.
pub(super) fn after_submit(page: Page, error: Option<AppError>) -> Response {
    let Some(err) = error else {
        return Redirect::to(page.path()).into_response();
    };
    warn!(page = page.path(), "form submission failed: {err}");
    let code = match err {
        AppError::Validation(_) => "invalid",
        AppError::NotFound(_) => "not-found",
        _ => "save-failed",
    };
    Redirect::to(&format!("{}?error={code}", page.path())).into_response()
}

fn referring_page(headers: &HeaderMap) -> Option<Page> {
    let referer = headers.get(header::REFERER)?.to_str().ok()?;
    let path = referer
        .split_once("://")
        .map(|(_, rest)| rest.find('/').map_or("/", |at| &rest[at..]))
        .unwrap_or(referer);
    let path = path.split(['?', '#']).next().unwrap_or(path);
    Page::ALL
        .into_iter()
        .find(|page| page.requires_session() && page.path() == path)
}
