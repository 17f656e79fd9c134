//! Dispatch endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use edt_common::db::models::{Dispatch, DispatchDetail};
use edt_common::requests::{AutoDispatch, DispatchChanges, NewDispatch};
use tracing::debug;

use crate::extract::ValidJson;
use crate::services::dispatch;
use crate::{ApiResult, AppState};

/// GET /api/dispatches
pub async fn list_dispatches(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<DispatchDetail>>> {
    Ok(Json(dispatch::list_dispatches(&state.db).await?))
}

/// GET /api/dispatches/active
pub async fn list_active_dispatches(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<DispatchDetail>>> {
    Ok(Json(dispatch::list_open_dispatches(&state.db).await?))
}

/// POST /api/dispatches
///
/// **Errors:**
/// - 404 NOT_FOUND: session or responder missing
/// - 409 INVALID_STATE: session closed to dispatch, or responder not AVAILABLE
pub async fn create_dispatch(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<NewDispatch>,
) -> ApiResult<(StatusCode, Json<Dispatch>)> {
    debug!(
        session_id = %request.session_id,
        responder_id = %request.responder_id,
        "Dispatch requested"
    );
    let created = dispatch::create_dispatch(&state.db, request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// POST /api/dispatches/auto
pub async fn auto_dispatch(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<AutoDispatch>,
) -> ApiResult<(StatusCode, Json<Dispatch>)> {
    let created = dispatch::auto_dispatch(&state.db, request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/dispatches/:id
pub async fn get_dispatch(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DispatchDetail>> {
    Ok(Json(dispatch::get_dispatch(&state.db, &id).await?))
}

/// PATCH /api/dispatches/:id
pub async fn update_dispatch(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidJson(changes): ValidJson<DispatchChanges>,
) -> ApiResult<Json<Dispatch>> {
    Ok(Json(dispatch::update_dispatch(&state.db, &id, changes).await?))
}

/// DELETE /api/dispatches/:id
pub async fn delete_dispatch(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    dispatch::delete_dispatch(&state.db, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Build dispatch routes
pub fn dispatch_routes() -> Router<AppState> {
    Router::new()
        .route("/api/dispatches", get(list_dispatches).post(create_dispatch))
        .route("/api/dispatches/active", get(list_active_dispatches))
        .route("/api/dispatches/auto", post(auto_dispatch))
        .route(
            "/api/dispatches/:id",
            get(get_dispatch)
                .patch(update_dispatch)
                .delete(delete_dispatch),
        )
}
