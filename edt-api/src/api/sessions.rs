//! Session endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use edt_common::db::models::{Session, SessionDetail, SessionTranscript};
use edt_common::requests::{NewSession, NewTranscriptEntry, SessionChanges, SessionStatusChange};

use crate::extract::ValidJson;
use crate::services::sessions;
use crate::{ApiResult, AppState};

/// GET /api/sessions
pub async fn list_sessions(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<SessionDetail>>> {
    Ok(Json(sessions::list_sessions(&state.db).await?))
}

/// GET /api/sessions/active
pub async fn list_active_sessions(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<SessionDetail>>> {
    Ok(Json(sessions::list_active_sessions(&state.db).await?))
}

/// POST /api/sessions
pub async fn create_session(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<NewSession>,
) -> ApiResult<(StatusCode, Json<Session>)> {
    let session = sessions::create_session(&state.db, request).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// GET /api/sessions/:id
///
/// Includes caller, location, transcript and dispatches with their responder.
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SessionDetail>> {
    Ok(Json(sessions::get_session(&state.db, &id).await?))
}

/// PATCH /api/sessions/:id
pub async fn update_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidJson(changes): ValidJson<SessionChanges>,
) -> ApiResult<Json<Session>> {
    Ok(Json(sessions::update_session(&state.db, &id, changes).await?))
}

/// PATCH /api/sessions/:id/status
///
/// 409 INVALID_STATE for a transition the workflow does not allow.
pub async fn update_session_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidJson(change): ValidJson<SessionStatusChange>,
) -> ApiResult<Json<Session>> {
    Ok(Json(
        sessions::update_session_status(&state.db, &id, change.status).await?,
    ))
}

/// POST /api/sessions/:id/transcript
pub async fn add_transcript_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidJson(request): ValidJson<NewTranscriptEntry>,
) -> ApiResult<(StatusCode, Json<SessionTranscript>)> {
    let entry = sessions::add_transcript_entry(&state.db, &id, request).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// DELETE /api/sessions/:id
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    sessions::delete_session(&state.db, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Build session routes
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/api/sessions", get(list_sessions).post(create_session))
        .route("/api/sessions/active", get(list_active_sessions))
        .route(
            "/api/sessions/:id",
            get(get_session).patch(update_session).delete(delete_session),
        )
        .route("/api/sessions/:id/status", patch(update_session_status))
        .route("/api/sessions/:id/transcript", post(add_transcript_entry))
}
