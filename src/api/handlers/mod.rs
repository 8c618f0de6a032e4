use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, FixedOffset, Local, Utc};
use serde::Deserialize;

use halflife_core::{aggregate, trailing_history, DEFAULT_HISTORY_DAYS};

use crate::db::Database;
use crate::models::*;

/// Longest history window a client may ask for.
pub const MAX_HISTORY_DAYS: u32 = 90;

type ApiResult<T> = Result<T, (StatusCode, String)>;

// ============================================================
// Error Handling
// ============================================================

/// Log a storage failure and return a sanitized message naming only the
/// action that failed.
fn storage_error(action: &'static str) -> impl Fn(anyhow::Error) -> (StatusCode, String) {
    move |e| {
        tracing::error!("Failed to {}: {:#}", action, e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to {}", action),
        )
    }
}

/// Validation failures are safe to show to the client as-is.
fn rejected(e: ValidationError) -> (StatusCode, String) {
    tracing::warn!("Rejected dose input: {}", e);
    (StatusCode::BAD_REQUEST, e.to_string())
}

fn dose_not_found() -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, "Dose not found".to_string())
}

/// Current time in the server's local zone, keeping its UTC offset so that
/// calendar days line up with the server's wall clock.
fn local_now() -> DateTime<FixedOffset> {
    let now = Local::now();
    now.with_timezone(now.offset())
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Doses
// ============================================================

pub async fn list_doses(
    State(db): State<Database>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<Dose>>> {
    db.list_doses(&user_id)
        .map(Json)
        .map_err(storage_error("fetch doses"))
}

pub async fn get_dose(
    State(db): State<Database>,
    Path((user_id, id)): Path<(String, String)>,
) -> ApiResult<Json<Dose>> {
    db.get_dose(&user_id, &id)
        .map_err(storage_error("fetch dose"))?
        .map(Json)
        .ok_or_else(dose_not_found)
}

pub async fn create_dose(
    State(db): State<Database>,
    Path(user_id): Path<String>,
    Json(input): Json<DoseInput>,
) -> ApiResult<(StatusCode, Json<Dose>)> {
    let now = Utc::now();
    let dose = input.validate(now).map_err(rejected)?.or_timestamp(now);

    db.create_dose(&user_id, dose)
        .map(|d| (StatusCode::CREATED, Json(d)))
        .map_err(storage_error("add dose"))
}

pub async fn update_dose(
    State(db): State<Database>,
    Path((user_id, id)): Path<(String, String)>,
    Json(input): Json<DoseInput>,
) -> ApiResult<Json<Dose>> {
    let dose = input.validate(Utc::now()).map_err(rejected)?;

    db.update_dose(&user_id, &id, dose)
        .map_err(storage_error("update dose"))?
        .map(Json)
        .ok_or_else(dose_not_found)
}

pub async fn delete_dose(
    State(db): State<Database>,
    Path((user_id, id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    if db
        .delete_dose(&user_id, &id)
        .map_err(storage_error("delete dose"))?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(dose_not_found())
    }
}

pub async fn clear_doses(
    State(db): State<Database>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<ClearedResponse>> {
    db.clear_doses(&user_id)
        .map(|deleted| Json(ClearedResponse { deleted }))
        .map_err(storage_error("clear doses"))
}

/// Stored rows and their count, for inspecting what the server actually holds.
pub async fn dump_doses(
    State(db): State<Database>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<DoseLogDump>> {
    let doses = db
        .stored_doses(&user_id)
        .map_err(storage_error("fetch debug info"))?;
    tracing::debug!(user_id, count = doses.len(), "Dumped dose log");

    Ok(Json(DoseLogDump {
        total_doses: doses.len(),
        doses,
    }))
}

// ============================================================
// Load
// ============================================================

/// Query parameters for the current load.
#[derive(Debug, Deserialize)]
pub struct LoadQuery {
    /// Evaluation instant. Its UTC offset decides where calendar days begin.
    /// Defaults to now in the server's local zone.
    pub at: Option<DateTime<FixedOffset>>,
}

pub async fn current_load(
    State(db): State<Database>,
    Path(user_id): Path<String>,
    Query(query): Query<LoadQuery>,
) -> ApiResult<Json<LoadView>> {
    let doses = db
        .list_doses(&user_id)
        .map_err(storage_error("fetch doses"))?;
    let at = query.at.unwrap_or_else(local_now);

    Ok(Json(aggregate(&doses, &at).into()))
}

/// Query parameters for the trailing history.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Last day of the window, evaluated at this wall-clock time. Defaults to
    /// now in the server's local zone.
    pub end: Option<DateTime<FixedOffset>>,
    /// Window length. Defaults to 14.
    pub days: Option<u32>,
}

pub async fn load_history(
    State(db): State<Database>,
    Path(user_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<HistoryView>> {
    let days = query.days.unwrap_or(DEFAULT_HISTORY_DAYS);
    if !(1..=MAX_HISTORY_DAYS).contains(&days) {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("days must be between 1 and {}", MAX_HISTORY_DAYS),
        ));
    }

    let doses = db
        .list_doses(&user_id)
        .map_err(storage_error("fetch doses"))?;
    let end = query.end.unwrap_or_else(local_now);

    Ok(Json(trailing_history(&doses, &end, days).into()))
}
