use crate::calendar::CalendarCell;
use crate::dates::parse_date_key;
use crate::errors::AppError;
use crate::models::{
    CalendarResponse, DayResponse, Run, RunForm, RunRequest, SelectQuery, StatusResponse,
};
use crate::state::{AppState, RunLog};
use crate::ui::render_index;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{Html, Redirect},
    Form, Json,
};
use std::time::Instant;
use tracing::warn;

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let controller = state.controller.lock().await;
    Html(render_index(&*controller, Instant::now()))
}

pub async fn submit_run(State(state): State<AppState>, Form(form): Form<RunForm>) -> Redirect {
    let mut controller = state.controller.lock().await;
    // The outcome is shown on the status line of the next page load.
    let _ = controller.submit_form(&form).await;
    Redirect::to("/")
}

pub async fn select_date(
    State(state): State<AppState>,
    Query(query): Query<SelectQuery>,
) -> Result<Redirect, AppError> {
    let mut controller = state.controller.lock().await;
    controller.select_date(&query.date)?;
    Ok(Redirect::to("/"))
}

pub async fn previous_month(State(state): State<AppState>) -> Result<Redirect, AppError> {
    state.controller.lock().await.previous_month()?;
    Ok(Redirect::to("/"))
}

pub async fn next_month(State(state): State<AppState>) -> Result<Redirect, AppError> {
    state.controller.lock().await.next_month()?;
    Ok(Redirect::to("/"))
}

pub async fn current_month(State(state): State<AppState>) -> Result<Redirect, AppError> {
    state.controller.lock().await.show_today()?;
    Ok(Redirect::to("/"))
}

pub async fn list_runs(State(state): State<AppState>) -> Json<Vec<Run>> {
    let controller = state.controller.lock().await;
    Json(controller.records().to_vec())
}

pub async fn create_run(
    State(state): State<AppState>,
    payload: Result<Json<RunRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Run>), AppError> {
    // Unreadable bodies go through the same validation as bad values so the
    // caller gets a 400 and the status line says why.
    let (date, kilometers) = match payload {
        Ok(Json(request)) => {
            let kilometers = request.kilometers();
            (request.date, kilometers)
        }
        Err(rejection) => {
            warn!("unreadable run payload: {rejection}");
            (String::new(), f64::NAN)
        }
    };

    let mut controller = state.controller.lock().await;
    let run = controller.submit(&date, kilometers).await?;
    Ok((StatusCode::CREATED, Json(run)))
}

pub async fn get_day(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<DayResponse>, AppError> {
    parse_date_key(&date).map_err(|err| AppError::bad_request(err.to_string()))?;

    let controller = state.controller.lock().await;
    let totals = controller.runs().totals_for(&date);
    Ok(Json(DayResponse {
        count: totals.count,
        total_km: totals.sum,
        runs: controller.runs().runs_for(&date),
        date,
    }))
}

pub async fn get_calendar(State(state): State<AppState>) -> Json<CalendarResponse> {
    let controller = state.controller.lock().await;
    let grid = controller.widget();
    let marked = grid
        .cells()
        .iter()
        .filter_map(|cell| cell.run_date().map(str::to_string))
        .collect();

    Json(CalendarResponse {
        year: grid.year(),
        month: grid.month(),
        marked,
        skipped: controller.last_sync().skipped,
    })
}

pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let controller = state.controller.lock().await;
    Json(status_response(&*controller))
}

pub async fn reload(State(state): State<AppState>) -> Result<Json<StatusResponse>, AppError> {
    let mut controller = state.controller.lock().await;
    if let Err(err) = controller.load().await {
        warn!("reload requested over the API failed: {err}");
        return Err(err.into());
    }
    Ok(Json(status_response(&*controller)))
}

fn status_response(controller: &RunLog) -> StatusResponse {
    let status = controller.status(Instant::now());
    StatusResponse {
        phase: controller.phase().as_str().to_string(),
        message: status.map(|status| status.message.clone()),
        is_error: status.is_some_and(|status| status.is_error()),
    }
}
