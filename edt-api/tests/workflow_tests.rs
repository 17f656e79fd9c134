//! Dispatch workflow tests against an in-memory store

use edt_api::services::{dispatch, responders, sessions};
use edt_common::db::init::init_in_memory;
use edt_common::db::models::{
    DispatchStatus, EmergencyType, Responder, ResponderStatus, ResponderType, Session,
    SessionStatus,
};
use edt_common::requests::{
    AutoDispatch, DispatchChanges, NewDispatch, NewResponder, NewSession, ResponderChanges,
};
use edt_common::Error;
use sqlx::SqlitePool;

async fn new_session(pool: &SqlitePool, emergency: Option<EmergencyType>) -> Session {
    sessions::create_session(
        pool,
        NewSession {
            phone_number: Some("+91-44-5550".to_string()),
            emergency_type: emergency,
            description: Some("Collapsed at bus stop".to_string()),
            priority_level: Some(1),
            ..NewSession::default()
        },
    )
    .await
    .expect("session created")
}

async fn new_responder(pool: &SqlitePool, responder_type: ResponderType, id: &str) -> Responder {
    responders::create_responder(pool, NewResponder::new(responder_type, id))
        .await
        .expect("responder created")
}

async fn responder_status(pool: &SqlitePool, id: &str) -> ResponderStatus {
    responders::get_responder(pool, id)
        .await
        .expect("responder exists")
        .responder
        .status
}

async fn dispatch_count(pool: &SqlitePool) -> usize {
    dispatch::list_dispatches(pool).await.unwrap().len()
}

#[tokio::test]
async fn test_create_dispatch_claims_responder() {
    let pool = init_in_memory().await.unwrap();
    let session = new_session(&pool, Some(EmergencyType::Medical)).await;
    let responder = new_responder(&pool, ResponderType::Ambulance, "AMB-1").await;

    let created = dispatch::create_dispatch(&pool, NewDispatch::new(&session.id, &responder.id))
        .await
        .unwrap();

    assert_eq!(created.status, DispatchStatus::Dispatched);
    assert!(created.arrival_time.is_none());
    assert_eq!(responder_status(&pool, &responder.id).await, ResponderStatus::Dispatched);
}

#[tokio::test]
async fn test_dispatch_status_drives_responder_status() {
    let pool = init_in_memory().await.unwrap();
    let expected = [
        (DispatchStatus::EnRoute, ResponderStatus::OnRoute),
        (DispatchStatus::Arrived, ResponderStatus::OnScene),
        (DispatchStatus::Completed, ResponderStatus::Available),
        (DispatchStatus::Dispatched, ResponderStatus::Dispatched),
        (DispatchStatus::Cancelled, ResponderStatus::Available),
    ];

    let session = new_session(&pool, Some(EmergencyType::Fire)).await;
    let responder = new_responder(&pool, ResponderType::Fire, "FIRE-1").await;
    let created = dispatch::create_dispatch(&pool, NewDispatch::new(&session.id, &responder.id))
        .await
        .unwrap();

    for (dispatch_status, responder_expected) in expected {
        let updated =
            dispatch::update_dispatch(&pool, &created.id, DispatchChanges::status(dispatch_status))
                .await
                .unwrap();
        assert_eq!(updated.status, dispatch_status);
        assert_eq!(
            responder_status(&pool, &responder.id).await,
            responder_expected,
            "after setting dispatch to {}",
            dispatch_status
        );
    }
}

#[tokio::test]
async fn test_update_without_status_leaves_responder_alone() {
    let pool = init_in_memory().await.unwrap();
    let session = new_session(&pool, Some(EmergencyType::Police)).await;
    let responder = new_responder(&pool, ResponderType::Police, "POL-1").await;
    let created = dispatch::create_dispatch(&pool, NewDispatch::new(&session.id, &responder.id))
        .await
        .unwrap();

    // Operator overrides the responder by hand
    responders::update_responder_status(&pool, &responder.id, ResponderStatus::Returning)
        .await
        .unwrap();

    let updated = dispatch::update_dispatch(
        &pool,
        &created.id,
        DispatchChanges {
            notes: Some("Suspect left on foot".to_string()),
            ..DispatchChanges::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(updated.notes.as_deref(), Some("Suspect left on foot"));
    assert_eq!(updated.status, DispatchStatus::Dispatched);
    assert_eq!(responder_status(&pool, &responder.id).await, ResponderStatus::Returning);
}

#[tokio::test]
async fn test_dispatch_to_dropped_session_rejected() {
    let pool = init_in_memory().await.unwrap();
    let session = new_session(&pool, Some(EmergencyType::Medical)).await;
    sessions::update_session_status(&pool, &session.id, SessionStatus::Dropped)
        .await
        .unwrap();
    let responder = new_responder(&pool, ResponderType::Ambulance, "AMB-1").await;

    let result = dispatch::create_dispatch(&pool, NewDispatch::new(&session.id, &responder.id)).await;

    assert!(matches!(result, Err(Error::InvalidState(_))));
    assert_eq!(dispatch_count(&pool).await, 0);
    assert_eq!(responder_status(&pool, &responder.id).await, ResponderStatus::Available);
}

#[tokio::test]
async fn test_dispatch_preconditions_first_failure_wins() {
    let pool = init_in_memory().await.unwrap();

    // Missing session beats missing responder
    match dispatch::create_dispatch(&pool, NewDispatch::new("no-session", "no-responder")).await {
        Err(Error::NotFound { entity, .. }) => assert_eq!(entity, "Session"),
        other => panic!("expected missing session, got {:?}", other),
    }

    // Closed session beats missing responder
    let session = new_session(&pool, None).await;
    sessions::update_session_status(&pool, &session.id, SessionStatus::NonEmergency)
        .await
        .unwrap();
    let result = dispatch::create_dispatch(&pool, NewDispatch::new(&session.id, "no-responder")).await;
    assert!(matches!(result, Err(Error::InvalidState(_))));

    // Open session, missing responder
    let open = new_session(&pool, None).await;
    match dispatch::create_dispatch(&pool, NewDispatch::new(&open.id, "no-responder")).await {
        Err(Error::NotFound { entity, .. }) => assert_eq!(entity, "Responder"),
        other => panic!("expected missing responder, got {:?}", other),
    }
}

#[tokio::test]
async fn test_busy_responder_rejected() {
    let pool = init_in_memory().await.unwrap();
    let first = new_session(&pool, Some(EmergencyType::Medical)).await;
    let second = new_session(&pool, Some(EmergencyType::Medical)).await;
    let responder = new_responder(&pool, ResponderType::Ambulance, "AMB-1").await;

    dispatch::create_dispatch(&pool, NewDispatch::new(&first.id, &responder.id))
        .await
        .unwrap();
    let result = dispatch::create_dispatch(&pool, NewDispatch::new(&second.id, &responder.id)).await;

    assert!(matches!(result, Err(Error::InvalidState(_))));
    assert_eq!(dispatch_count(&pool).await, 1);
}

#[tokio::test]
async fn test_responder_identifier_uniqueness() {
    let pool = init_in_memory().await.unwrap();
    let original = new_responder(&pool, ResponderType::Ambulance, "AMB-1").await;
    let other = new_responder(&pool, ResponderType::Ambulance, "AMB-2").await;

    let duplicate = responders::create_responder(
        &pool,
        NewResponder::new(ResponderType::Police, "AMB-1"),
    )
    .await;
    match duplicate {
        Err(Error::DuplicateValue { field, value }) => {
            assert_eq!(field, "identifier");
            assert_eq!(value, "AMB-1");
        }
        other => panic!("expected duplicate, got {:?}", other),
    }

    let rename = responders::update_responder(
        &pool,
        &other.id,
        ResponderChanges {
            identifier: Some("AMB-1".to_string()),
            ..ResponderChanges::default()
        },
    )
    .await;
    assert!(matches!(rename, Err(Error::DuplicateValue { .. })));
    assert_eq!(
        responders::get_responder(&pool, &other.id).await.unwrap().responder.identifier,
        "AMB-2"
    );

    let self_update = responders::update_responder(
        &pool,
        &original.id,
        ResponderChanges {
            identifier: Some("AMB-1".to_string()),
            ..ResponderChanges::default()
        },
    )
    .await;
    assert!(self_update.is_ok());
}

#[tokio::test]
async fn test_delete_dispatch_releases_responder() {
    let pool = init_in_memory().await.unwrap();
    let session = new_session(&pool, Some(EmergencyType::Medical)).await;
    let responder = new_responder(&pool, ResponderType::Ambulance, "AMB-1").await;
    let created = dispatch::create_dispatch(&pool, NewDispatch::new(&session.id, &responder.id))
        .await
        .unwrap();
    dispatch::update_dispatch(&pool, &created.id, DispatchChanges::status(DispatchStatus::Arrived))
        .await
        .unwrap();
    assert_eq!(responder_status(&pool, &responder.id).await, ResponderStatus::OnScene);

    dispatch::delete_dispatch(&pool, &created.id).await.unwrap();

    assert_eq!(responder_status(&pool, &responder.id).await, ResponderStatus::Available);
    assert!(matches!(
        dispatch::get_dispatch(&pool, &created.id).await,
        Err(Error::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_missing_dispatch_not_found() {
    let pool = init_in_memory().await.unwrap();

    let update =
        dispatch::update_dispatch(&pool, "gone", DispatchChanges::status(DispatchStatus::Completed))
            .await;
    assert!(matches!(update, Err(Error::NotFound { entity: "Dispatch", .. })));

    let delete = dispatch::delete_dispatch(&pool, "gone").await;
    assert!(matches!(delete, Err(Error::NotFound { entity: "Dispatch", .. })));
}

#[tokio::test]
async fn test_full_call_lifecycle_and_redispatch() {
    let pool = init_in_memory().await.unwrap();
    let session = new_session(&pool, Some(EmergencyType::Medical)).await;
    let responder = new_responder(&pool, ResponderType::Ambulance, "AMB-1").await;

    sessions::update_session_status(&pool, &session.id, SessionStatus::EmergencyVerified)
        .await
        .unwrap();

    let first = dispatch::create_dispatch(&pool, NewDispatch::new(&session.id, &responder.id))
        .await
        .unwrap();
    dispatch::update_dispatch(&pool, &first.id, DispatchChanges::status(DispatchStatus::Arrived))
        .await
        .unwrap();
    assert_eq!(responder_status(&pool, &responder.id).await, ResponderStatus::OnScene);

    dispatch::update_dispatch(&pool, &first.id, DispatchChanges::status(DispatchStatus::Completed))
        .await
        .unwrap();
    assert_eq!(responder_status(&pool, &responder.id).await, ResponderStatus::Available);

    // Freed responder takes another call
    let next_call = new_session(&pool, Some(EmergencyType::Medical)).await;
    let second = dispatch::create_dispatch(&pool, NewDispatch::new(&next_call.id, &responder.id))
        .await
        .unwrap();
    assert_eq!(second.status, DispatchStatus::Dispatched);

    let detail = responders::get_responder(&pool, &responder.id).await.unwrap();
    assert_eq!(detail.dispatches.len(), 2);

    let open = dispatch::list_open_dispatches(&pool).await.unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].dispatch.id, second.id);
    assert_eq!(open[0].session.id, next_call.id);
}

#[tokio::test]
async fn test_auto_dispatch_picks_matching_type() {
    let pool = init_in_memory().await.unwrap();
    let session = new_session(&pool, Some(EmergencyType::Fire)).await;
    new_responder(&pool, ResponderType::Ambulance, "AMB-1").await;
    let engine = new_responder(&pool, ResponderType::Fire, "FIRE-1").await;

    let created = dispatch::auto_dispatch(
        &pool,
        AutoDispatch {
            session_id: session.id.clone(),
            location_id: None,
            notes: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(created.responder_id, engine.id);

    // The only fire unit is now busy
    let again = dispatch::auto_dispatch(
        &pool,
        AutoDispatch {
            session_id: session.id.clone(),
            location_id: None,
            notes: None,
        },
    )
    .await;
    assert!(matches!(again, Err(Error::InvalidState(_))));
}

fn auto(session: &Session) -> AutoDispatch {
    AutoDispatch {
        session_id: session.id.clone(),
        location_id: None,
        notes: None,
    }
}

async fn session_status(pool: &SqlitePool, id: &str) -> SessionStatus {
    sessions::get_session(pool, id)
        .await
        .expect("session exists")
        .session
        .status
}

#[tokio::test]
async fn test_auto_dispatch_moves_verified_session_to_dispatched() {
    let pool = init_in_memory().await.unwrap();
    let session = new_session(&pool, Some(EmergencyType::Medical)).await;
    new_responder(&pool, ResponderType::Ambulance, "AMB-1").await;
    sessions::update_session_status(&pool, &session.id, SessionStatus::EmergencyVerified)
        .await
        .unwrap();

    dispatch::auto_dispatch(&pool, auto(&session)).await.unwrap();

    assert_eq!(session_status(&pool, &session.id).await, SessionStatus::Dispatched);
}

#[tokio::test]
async fn test_auto_dispatch_leaves_active_session_status() {
    let pool = init_in_memory().await.unwrap();
    let session = new_session(&pool, Some(EmergencyType::Medical)).await;
    new_responder(&pool, ResponderType::Ambulance, "AMB-1").await;

    dispatch::auto_dispatch(&pool, auto(&session)).await.unwrap();

    assert_eq!(session_status(&pool, &session.id).await, SessionStatus::Active);
}

#[tokio::test]
async fn test_auto_dispatch_failure_keeps_session_verified() {
    let pool = init_in_memory().await.unwrap();
    let session = new_session(&pool, Some(EmergencyType::Medical)).await;
    let responder = new_responder(&pool, ResponderType::Ambulance, "AMB-1").await;
    sessions::update_session_status(&pool, &session.id, SessionStatus::EmergencyVerified)
        .await
        .unwrap();

    fail_on(
        &pool,
        r#"
        CREATE TRIGGER fail_session_update BEFORE UPDATE ON sessions
        BEGIN SELECT RAISE(ABORT, 'simulated store failure'); END
        "#,
    )
    .await;

    let result = dispatch::auto_dispatch(&pool, auto(&session)).await;

    assert!(matches!(result, Err(Error::Database(_))));
    assert_eq!(dispatch_count(&pool).await, 0);
    assert_eq!(responder_status(&pool, &responder.id).await, ResponderStatus::Available);
    assert_eq!(
        session_status(&pool, &session.id).await,
        SessionStatus::EmergencyVerified
    );
}

#[tokio::test]
async fn test_auto_dispatch_prefers_newest_responder() {
    let pool = init_in_memory().await.unwrap();
    let session = new_session(&pool, Some(EmergencyType::Medical)).await;
    new_responder(&pool, ResponderType::Ambulance, "AMB-1").await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let newer = new_responder(&pool, ResponderType::Ambulance, "AMB-0").await;

    let created = dispatch::auto_dispatch(&pool, auto(&session)).await.unwrap();

    assert_eq!(created.responder_id, newer.id);
}

#[tokio::test]
async fn test_auto_dispatch_needs_emergency_type() {
    let pool = init_in_memory().await.unwrap();
    new_responder(&pool, ResponderType::Other, "OTHER-1").await;

    for emergency in [None, Some(EmergencyType::Other)] {
        let session = new_session(&pool, emergency).await;
        let result = dispatch::auto_dispatch(
            &pool,
            AutoDispatch {
                session_id: session.id,
                location_id: None,
                notes: None,
            },
        )
        .await;
        assert!(matches!(result, Err(Error::InvalidState(_))));
    }
}

#[tokio::test]
async fn test_responder_with_dispatch_history_cannot_be_deleted() {
    let pool = init_in_memory().await.unwrap();
    let session = new_session(&pool, Some(EmergencyType::Police)).await;
    let responder = new_responder(&pool, ResponderType::Police, "POL-1").await;
    let created = dispatch::create_dispatch(&pool, NewDispatch::new(&session.id, &responder.id))
        .await
        .unwrap();
    dispatch::update_dispatch(&pool, &created.id, DispatchChanges::status(DispatchStatus::Completed))
        .await
        .unwrap();

    let result = responders::delete_responder(&pool, &responder.id).await;
    assert!(matches!(result, Err(Error::InvalidState(_))));

    dispatch::delete_dispatch(&pool, &created.id).await.unwrap();
    responders::delete_responder(&pool, &responder.id).await.unwrap();
}

// ----------------------------------------------------------------------
// Atomicity: a trigger aborts the second write of each paired operation
// ----------------------------------------------------------------------

async fn fail_on(pool: &SqlitePool, trigger: &str) {
    sqlx::query(trigger).execute(pool).await.unwrap();
}

#[tokio::test]
async fn test_create_dispatch_is_all_or_nothing() {
    let pool = init_in_memory().await.unwrap();
    let session = new_session(&pool, Some(EmergencyType::Medical)).await;
    let responder = new_responder(&pool, ResponderType::Ambulance, "AMB-1").await;

    fail_on(
        &pool,
        r#"
        CREATE TRIGGER fail_dispatch_insert BEFORE INSERT ON dispatches
        BEGIN SELECT RAISE(ABORT, 'simulated store failure'); END
        "#,
    )
    .await;

    let result = dispatch::create_dispatch(&pool, NewDispatch::new(&session.id, &responder.id)).await;

    assert!(matches!(result, Err(Error::Database(_))));
    assert_eq!(dispatch_count(&pool).await, 0);
    assert_eq!(responder_status(&pool, &responder.id).await, ResponderStatus::Available);
}

#[tokio::test]
async fn test_update_dispatch_status_is_all_or_nothing() {
    let pool = init_in_memory().await.unwrap();
    let session = new_session(&pool, Some(EmergencyType::Medical)).await;
    let responder = new_responder(&pool, ResponderType::Ambulance, "AMB-1").await;
    let created = dispatch::create_dispatch(&pool, NewDispatch::new(&session.id, &responder.id))
        .await
        .unwrap();

    fail_on(
        &pool,
        r#"
        CREATE TRIGGER fail_responder_update BEFORE UPDATE ON responders
        BEGIN SELECT RAISE(ABORT, 'simulated store failure'); END
        "#,
    )
    .await;

    let result =
        dispatch::update_dispatch(&pool, &created.id, DispatchChanges::status(DispatchStatus::Arrived))
            .await;

    assert!(matches!(result, Err(Error::Database(_))));
    let stored = dispatch::get_dispatch(&pool, &created.id).await.unwrap();
    assert_eq!(stored.dispatch.status, DispatchStatus::Dispatched);
    assert_eq!(stored.responder.status, ResponderStatus::Dispatched);
}

#[tokio::test]
async fn test_delete_dispatch_is_all_or_nothing() {
    let pool = init_in_memory().await.unwrap();
    let session = new_session(&pool, Some(EmergencyType::Medical)).await;
    let responder = new_responder(&pool, ResponderType::Ambulance, "AMB-1").await;
    let created = dispatch::create_dispatch(&pool, NewDispatch::new(&session.id, &responder.id))
        .await
        .unwrap();

    fail_on(
        &pool,
        r#"
        CREATE TRIGGER fail_responder_update BEFORE UPDATE ON responders
        BEGIN SELECT RAISE(ABORT, 'simulated store failure'); END
        "#,
    )
    .await;

    let result = dispatch::delete_dispatch(&pool, &created.id).await;

    assert!(matches!(result, Err(Error::Database(_))));
    let stored = dispatch::get_dispatch(&pool, &created.id).await.unwrap();
    assert_eq!(stored.responder.status, ResponderStatus::Dispatched);
}
