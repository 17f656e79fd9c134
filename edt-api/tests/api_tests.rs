//! Integration tests for edt-api HTTP endpoints
//!
//! Tests cover:
//! - Status codes per operation (201 create, 204 delete)
//! - Error body shape and codes
//! - camelCase payloads and enum validation
//! - The dispatch workflow driven over HTTP

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use edt_api::{build_router, AppState};
use edt_common::db::init::init_in_memory;
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot` method

/// Test helper: Create app over a fresh in-memory database
async fn setup_app() -> Router {
    let db = init_in_memory().await.expect("in-memory database");
    build_router(AppState::new(db))
}

/// Test helper: Send a request and decode the JSON reply (Null when empty)
async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");

    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Should parse JSON")
    };
    (status, value)
}

async fn create_responder(app: &Router, identifier: &str, responder_type: &str) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/responders",
        Some(json!({ "responderType": responder_type, "identifier": identifier })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body
}

async fn create_session(app: &Router, emergency_type: &str) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/sessions",
        Some(json!({
            "phoneNumber": "+91-44-7000",
            "emergencyType": emergency_type,
            "priorityLevel": 2
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_app().await;

    let (status, body) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "edt-api");
    assert!(body["version"].is_string());
    assert!(body["uptime_seconds"].is_u64());
}

#[tokio::test]
async fn test_health_reports_build_identification() {
    let app = setup_app().await;

    let (_, body) = send(&app, "GET", "/health", None).await;

    let build = &body["build"];
    let git_hash = build["git_hash"].as_str().unwrap();
    assert!(git_hash == "unknown" || git_hash.len() >= 8);
    let timestamp = build["timestamp"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
    assert!(matches!(build["profile"].as_str(), Some("debug" | "release")));
}

// =============================================================================
// Entity shape and validation
// =============================================================================

#[tokio::test]
async fn test_responder_created_with_camel_case_fields() {
    let app = setup_app().await;

    let body = create_responder(&app, "AMB-001", "AMBULANCE").await;

    assert_eq!(body["responderType"], "AMBULANCE");
    assert_eq!(body["status"], "AVAILABLE");
    assert!(body["id"].is_string());
    assert!(body["createdAt"].is_string());
    assert!(body.get("responder_type").is_none());
}

#[tokio::test]
async fn test_unknown_enum_value_rejected() {
    let app = setup_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/responders",
        Some(json!({ "responderType": "HELICOPTER", "identifier": "HEL-1" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_FAILED");
    assert!(body["error"]["fields"].is_array());
}

#[tokio::test]
async fn test_out_of_range_priority_rejected() {
    let app = setup_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/sessions",
        Some(json!({ "priorityLevel": 9 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["fields"][0]["field"], "priorityLevel");
}

#[tokio::test]
async fn test_malformed_body_rejected() {
    let app = setup_app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/callers")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_duplicate_identifier_conflict() {
    let app = setup_app().await;
    create_responder(&app, "POL-101", "POLICE").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/responders",
        Some(json!({ "responderType": "POLICE", "identifier": "POL-101" })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "DUPLICATE_VALUE");
}

#[tokio::test]
async fn test_missing_entity_not_found() {
    let app = setup_app().await;

    for uri in [
        "/api/callers/nope",
        "/api/locations/nope",
        "/api/responders/nope",
        "/api/sessions/nope",
        "/api/dispatches/nope",
        "/api/callers/phone/000",
    ] {
        let (status, body) = send(&app, "GET", uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }
}

// =============================================================================
// Dispatch workflow over HTTP
// =============================================================================

#[tokio::test]
async fn test_dispatch_lifecycle() {
    let app = setup_app().await;
    let session = create_session(&app, "MEDICAL").await;
    let responder = create_responder(&app, "AMB-001", "AMBULANCE").await;
    let session_id = session["id"].as_str().unwrap();
    let responder_id = responder["id"].as_str().unwrap();

    let (status, dispatch) = send(
        &app,
        "POST",
        "/api/dispatches",
        Some(json!({ "sessionId": session_id, "responderId": responder_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(dispatch["status"], "DISPATCHED");
    let dispatch_id = dispatch["id"].as_str().unwrap();

    // Responder no longer offered
    let (_, available) = send(&app, "GET", "/api/responders/available", None).await;
    assert_eq!(available.as_array().unwrap().len(), 0);

    let (status, updated) = send(
        &app,
        "PATCH",
        &format!("/api/dispatches/{}", dispatch_id),
        Some(json!({ "status": "ARRIVED", "arrivalTime": "2024-05-01T10:15:00Z" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "ARRIVED");

    let (_, detail) = send(&app, "GET", &format!("/api/dispatches/{}", dispatch_id), None).await;
    assert_eq!(detail["responder"]["status"], "ON_SCENE");
    assert_eq!(detail["session"]["id"], session_id);

    let (_, active) = send(&app, "GET", "/api/dispatches/active", None).await;
    assert_eq!(active.as_array().unwrap().len(), 1);

    let (status, body) = send(&app, "DELETE", &format!("/api/dispatches/{}", dispatch_id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (_, responder) = send(&app, "GET", &format!("/api/responders/{}", responder_id), None).await;
    assert_eq!(responder["status"], "AVAILABLE");
}

#[tokio::test]
async fn test_dispatch_to_closed_session_conflict() {
    let app = setup_app().await;
    let session = create_session(&app, "FIRE").await;
    let responder = create_responder(&app, "FIRE-201", "FIRE").await;
    let session_id = session["id"].as_str().unwrap();

    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/api/sessions/{}/status", session_id),
        Some(json!({ "status": "DROPPED" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        "POST",
        "/api/dispatches",
        Some(json!({ "sessionId": session_id, "responderId": responder["id"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "INVALID_STATE");
}

#[tokio::test]
async fn test_illegal_session_transition_conflict() {
    let app = setup_app().await;
    let session = create_session(&app, "POLICE").await;

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/api/sessions/{}/status", session["id"].as_str().unwrap()),
        Some(json!({ "status": "COMPLETED" })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "INVALID_STATE");
    assert!(body["error"]["message"].as_str().unwrap().contains("COMPLETED"));
}

#[tokio::test]
async fn test_auto_dispatch_and_available_filter() {
    let app = setup_app().await;
    create_responder(&app, "AMB-001", "AMBULANCE").await;
    create_responder(&app, "POL-101", "POLICE").await;
    let session = create_session(&app, "POLICE").await;

    let (_, police) = send(
        &app,
        "GET",
        "/api/responders/available?emergencyType=POLICE",
        None,
    )
    .await;
    assert_eq!(police.as_array().unwrap().len(), 1);
    assert_eq!(police[0]["identifier"], "POL-101");

    let (status, _) = send(
        &app,
        "GET",
        "/api/responders/available?emergencyType=FLOOD",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, dispatch) = send(
        &app,
        "POST",
        "/api/dispatches/auto",
        Some(json!({ "sessionId": session["id"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(dispatch["responderId"], police[0]["id"]);
}

// =============================================================================
// Sessions, transcript, callers, locations
// =============================================================================

#[tokio::test]
async fn test_session_detail_includes_transcript_and_caller() {
    let app = setup_app().await;
    let (status, caller) = send(
        &app,
        "POST",
        "/api/callers",
        Some(json!({ "phoneNumber": "+91-44-7000", "name": "Lakshmi" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let session = create_session(&app, "MEDICAL").await;
    let session_id = session["id"].as_str().unwrap();
    assert_eq!(session["callerId"], caller["id"]);

    let (status, entry) = send(
        &app,
        "POST",
        &format!("/api/sessions/{}/transcript", session_id),
        Some(json!({ "content": "My father fainted", "speakerType": "CALLER" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(entry["speakerType"], "CALLER");

    let (_, detail) = send(&app, "GET", &format!("/api/sessions/{}", session_id), None).await;
    assert_eq!(detail["caller"]["name"], "Lakshmi");
    assert_eq!(detail["transcriptEntries"][0]["content"], "My father fainted");
    assert!(detail["dispatches"].as_array().unwrap().is_empty());

    let (_, by_phone) = send(&app, "GET", "/api/callers/phone/+91-44-7000", None).await;
    assert_eq!(by_phone["sessions"].as_array().unwrap().len(), 1);

    let (_, active) = send(&app, "GET", "/api/sessions/active", None).await;
    assert_eq!(active.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_session_lists_include_transcript_and_dispatches() {
    let app = setup_app().await;
    let responder = create_responder(&app, "AMB-007", "AMBULANCE").await;
    let session = create_session(&app, "MEDICAL").await;
    let session_id = session["id"].as_str().unwrap();

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/sessions/{}/transcript", session_id),
        Some(json!({ "content": "Chest pain, conscious", "speakerType": "OPERATOR" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, dispatch) = send(
        &app,
        "POST",
        "/api/dispatches",
        Some(json!({ "sessionId": session_id, "responderId": responder["id"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", dispatch);

    for uri in ["/api/sessions", "/api/sessions/active"] {
        let (status, list) = send(&app, "GET", uri, None).await;
        assert_eq!(status, StatusCode::OK, "{}", uri);

        let entries = list.as_array().unwrap();
        assert_eq!(entries.len(), 1, "{}", uri);
        let listed = &entries[0];
        assert_eq!(listed["id"], session["id"]);
        assert_eq!(listed["status"], "ACTIVE");
        assert!(listed["caller"].is_null());
        assert!(listed["location"].is_null());
        assert_eq!(
            listed["transcriptEntries"][0]["content"],
            "Chest pain, conscious"
        );
        assert_eq!(listed["dispatches"][0]["id"], dispatch["id"]);
        assert_eq!(listed["dispatches"][0]["responder"]["identifier"], "AMB-007");
        assert_eq!(listed["dispatches"][0]["responder"]["status"], "DISPATCHED");
    }
}

#[tokio::test]
async fn test_location_routes() {
    let app = setup_app().await;

    let (status, location) = send(
        &app,
        "POST",
        "/api/locations",
        Some(json!({
            "address": "4 Fort Road",
            "city": "Salem",
            "district": "Salem",
            "gpsCoordinates": "11.6643,78.1460"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(location["gpsCoordinates"], "11.6643,78.1460");
    let location_id = location["id"].as_str().unwrap();

    let (_, by_city) = send(&app, "GET", "/api/locations/city/Salem", None).await;
    assert_eq!(by_city.as_array().unwrap().len(), 1);
    assert!(by_city[0]["responders"].is_array());

    let (status, updated) = send(
        &app,
        "PATCH",
        &format!("/api/locations/{}", location_id),
        Some(json!({ "landmark": "Opposite bus stand" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["landmark"], "Opposite bus stand");
    assert_eq!(updated["address"], "4 Fort Road");

    let (status, _) = send(&app, "DELETE", &format!("/api/locations/{}", location_id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, by_district) = send(&app, "GET", "/api/locations/district/Salem", None).await;
    assert!(by_district.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_responder_type_route_validates_path() {
    let app = setup_app().await;
    create_responder(&app, "FIRE-201", "FIRE").await;

    let (status, body) = send(&app, "GET", "/api/responders/type/FIRE", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "GET", "/api/responders/type/BOAT", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
