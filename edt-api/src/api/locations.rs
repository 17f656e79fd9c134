//! Location endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use edt_common::db::models::{Location, LocationDetail};
use edt_common::requests::{LocationChanges, NewLocation};

use crate::extract::ValidJson;
use crate::services::locations;
use crate::{ApiResult, AppState};

pub async fn list_locations(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<LocationDetail>>> {
    Ok(Json(locations::list_locations(&state.db).await?))
}

pub async fn create_location(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<NewLocation>,
) -> ApiResult<(StatusCode, Json<Location>)> {
    let location = locations::create_location(&state.db, request).await?;
    Ok((StatusCode::CREATED, Json(location)))
}

pub async fn list_by_city(
    State(state): State<AppState>,
    Path(city): Path<String>,
) -> ApiResult<Json<Vec<LocationDetail>>> {
    Ok(Json(locations::list_locations_by_city(&state.db, &city).await?))
}

pub async fn list_by_district(
    State(state): State<AppState>,
    Path(district): Path<String>,
) -> ApiResult<Json<Vec<LocationDetail>>> {
    Ok(Json(
        locations::list_locations_by_district(&state.db, &district).await?,
    ))
}

pub async fn get_location(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<LocationDetail>> {
    Ok(Json(locations::get_location(&state.db, &id).await?))
}

pub async fn update_location(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidJson(changes): ValidJson<LocationChanges>,
) -> ApiResult<Json<Location>> {
    Ok(Json(locations::update_location(&state.db, &id, changes).await?))
}

pub async fn delete_location(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    locations::delete_location(&state.db, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Build location routes
pub fn location_routes() -> Router<AppState> {
    Router::new()
        .route("/api/locations", get(list_locations).post(create_location))
        .route("/api/locations/city/:city", get(list_by_city))
        .route("/api/locations/district/:district", get(list_by_district))
        .route(
            "/api/locations/:id",
            get(get_location)
                .patch(update_location)
                .delete(delete_location),
        )
}
