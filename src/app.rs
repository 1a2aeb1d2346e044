use crate::handlers::{auth, forms, habits, insights, pages, records};
use crate::state::AppState;
use axum::{
    routing::{get, patch, post},
    Router,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(page_routes())
        .nest("/api", api_routes())
        .with_state(state)
}

fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::home))
        .route("/auth/login", get(pages::login_page).post(pages::login_submit))
        .route("/auth/signup", get(pages::signup_page).post(pages::signup_submit))
        .route("/auth/signout", post(pages::sign_out))
        .route("/auth/oauth/:provider", get(pages::oauth_start))
        .route("/auth/callback", get(pages::oauth_callback))
        .route("/dashboard", get(pages::dashboard))
        .route("/journal", get(pages::journal_page).post(forms::create_entry))
        .route("/journal/:id", post(forms::update_entry))
        .route("/journal/:id/delete", post(forms::delete_entry))
        .route("/tasks", get(pages::tasks_page).post(forms::create_task))
        .route("/tasks/:id/toggle", post(pages::toggle_task))
        .route("/tasks/:id/delete", post(forms::delete_task))
        .route("/habits", get(pages::habits_page).post(forms::create_habit))
        .route("/habits/:id/toggle", post(pages::toggle_habit))
        .route("/habits/:id/delete", post(forms::delete_habit))
        .route("/insights", get(pages::insights_page))
        .route("/calendar", get(pages::calendar_page))
        .route("/calendar/events", post(forms::create_event))
        .route("/calendar/events/:id/delete", post(forms::delete_event))
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(auth::sign_up))
        .route("/auth/signin", post(auth::sign_in))
        .route("/auth/signout", post(auth::sign_out))
        .route("/auth/session", get(auth::current))
        .route("/habits", get(habits::list).post(habits::create))
        .route("/habits/categories", get(habits::categories))
        .route("/habits/:id", patch(habits::update).delete(habits::delete))
        .route("/habits/:id/toggle", post(habits::toggle))
        .route("/habits/:id/completions", get(habits::completions))
        .route("/journal", get(records::list_entries).post(records::create_entry))
        .route("/journal/export", get(records::export_entries))
        .route(
            "/journal/:id",
            get(records::get_entry)
                .patch(records::update_entry)
                .delete(records::delete_entry),
        )
        .route("/tasks", get(records::list_tasks).post(records::create_task))
        .route("/tasks/:id", patch(records::update_task).delete(records::delete_task))
        .route("/tasks/:id/toggle", post(records::toggle_task))
        .route("/events", get(records::list_events).post(records::create_event))
        .route("/events/:id", patch(records::update_event).delete(records::delete_event))
        .route("/calendar", get(records::month))
        .route("/insights", get(insights::get_insights))
        .route("/dashboard", get(insights::get_dashboard))
}
