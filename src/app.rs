use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/runs", post(handlers::submit_run))
        .route("/calendar/select", get(handlers::select_date))
        .route("/calendar/prev", post(handlers::previous_month))
        .route("/calendar/next", post(handlers::next_month))
        .route("/calendar/today", post(handlers::current_month))
        .route("/api/runs", get(handlers::list_runs).post(handlers::create_run))
        .route("/api/days/:date", get(handlers::get_day))
        .route("/api/calendar", get(handlers::get_calendar))
        .route("/api/status", get(handlers::get_status))
        .route("/api/reload", post(handlers::reload))
        .with_state(state)
}
