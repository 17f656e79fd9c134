//! Caller endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use edt_common::db::models::{Caller, CallerDetail};
use edt_common::requests::{CallerChanges, NewCaller};

use crate::extract::ValidJson;
use crate::services::callers;
use crate::{ApiResult, AppState};

/// GET /api/callers
pub async fn list_callers(State(state): State<AppState>) -> ApiResult<Json<Vec<CallerDetail>>> {
    Ok(Json(callers::list_callers(&state.db).await?))
}

/// POST /api/callers
pub async fn create_caller(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<NewCaller>,
) -> ApiResult<(StatusCode, Json<Caller>)> {
    let caller = callers::create_caller(&state.db, request).await?;
    Ok((StatusCode::CREATED, Json(caller)))
}

/// GET /api/callers/:id
pub async fn get_caller(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<CallerDetail>> {
    Ok(Json(callers::get_caller(&state.db, &id).await?))
}

/// GET /api/callers/phone/:phone_number
pub async fn get_caller_by_phone(
    State(state): State<AppState>,
    Path(phone_number): Path<String>,
) -> ApiResult<Json<CallerDetail>> {
    Ok(Json(
        callers::get_caller_by_phone(&state.db, &phone_number).await?,
    ))
}

/// PATCH /api/callers/:id
pub async fn update_caller(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidJson(changes): ValidJson<CallerChanges>,
) -> ApiResult<Json<Caller>> {
    Ok(Json(callers::update_caller(&state.db, &id, changes).await?))
}

/// DELETE /api/callers/:id
pub async fn delete_caller(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    callers::delete_caller(&state.db, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn caller_routes() -> Router<AppState> {
    Router::new()
        .route("/api/callers", get(list_callers).post(create_caller))
        .route("/api/callers/phone/:phone_number", get(get_caller_by_phone))
        .route(
            "/api/callers/:id",
            get(get_caller).patch(update_caller).delete(delete_caller),
        )
}
