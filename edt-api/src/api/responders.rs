//! Responder endpoints

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use edt_common::db::models::{Responder, ResponderDetail, ResponderType, ResponderWithLocation};
use edt_common::requests::{
    AvailableResponderFilter, NewResponder, ResponderChanges, ResponderStatusChange,
};

use crate::extract::ValidJson;
use crate::services::responders;
use crate::{ApiResult, AppState};

/// GET /api/responders
pub async fn list_responders(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<ResponderWithLocation>>> {
    Ok(Json(responders::list_responders(&state.db).await?))
}

/// POST /api/responders
///
/// Status defaults to AVAILABLE. 409 DUPLICATE_VALUE when the identifier
/// is taken.
pub async fn create_responder(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<NewResponder>,
) -> ApiResult<(StatusCode, Json<Responder>)> {
    let responder = responders::create_responder(&state.db, request).await?;
    Ok((StatusCode::CREATED, Json(responder)))
}

/// GET /api/responders/available?emergencyType=&locationId=
pub async fn list_available(
    State(state): State<AppState>,
    filter: Result<Query<AvailableResponderFilter>, QueryRejection>,
) -> ApiResult<Json<Vec<ResponderWithLocation>>> {
    let Query(filter) = filter?;
    Ok(Json(
        responders::list_available_responders(&state.db, &filter).await?,
    ))
}

/// GET /api/responders/type/:type
pub async fn list_by_type(
    State(state): State<AppState>,
    responder_type: Result<Path<ResponderType>, PathRejection>,
) -> ApiResult<Json<Vec<ResponderWithLocation>>> {
    let Path(responder_type) = responder_type?;
    Ok(Json(
        responders::list_responders_by_type(&state.db, responder_type).await?,
    ))
}

/// GET /api/responders/:id
pub async fn get_responder(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ResponderDetail>> {
    Ok(Json(responders::get_responder(&state.db, &id).await?))
}

/// PATCH /api/responders/:id
pub async fn update_responder(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidJson(changes): ValidJson<ResponderChanges>,
) -> ApiResult<Json<Responder>> {
    Ok(Json(
        responders::update_responder(&state.db, &id, changes).await?,
    ))
}

/// PATCH /api/responders/:id/status
pub async fn update_responder_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidJson(change): ValidJson<ResponderStatusChange>,
) -> ApiResult<Json<Responder>> {
    Ok(Json(
        responders::update_responder_status(&state.db, &id, change.status).await?,
    ))
}

/// DELETE /api/responders/:id
///
/// 409 INVALID_STATE while any dispatch references the responder.
pub async fn delete_responder(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    responders::delete_responder(&state.db, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Build responder routes
pub fn responder_routes() -> Router<AppState> {
    Router::new()
        .route("/api/responders", get(list_responders).post(create_responder))
        .route("/api/responders/available", get(list_available))
        .route("/api/responders/type/:type", get(list_by_type))
        .route(
            "/api/responders/:id",
            get(get_responder)
                .patch(update_responder)
                .delete(delete_responder),
        )
        .route("/api/responders/:id/status", patch(update_responder_status))
}
