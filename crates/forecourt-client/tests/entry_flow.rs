//! End-to-end form flows against the stub backend.

mod support;

use axum::http::Method;
use forecourt_client::{
    ClientError, EntryApp, Notice, NoticeLevel, SubmissionOutcome, SubmissionState, SubmitStrategy,
};
use forecourt_core::{Money, RowId, ValidationError, Volume};
use serde_json::json;
use std::time::Duration;

use support::{app, StubBackend};

/// Employee 7 selected, one Petrol row on G1: opening 100 (last closing),
/// closing 150, testing 5, cash 450. Sells 45 L for 450.00.
async fn petrol_shift(app: &EntryApp) -> RowId {
    let controller = &app.controller;
    controller.load_reference_data().await;
    controller.select_employee(7).unwrap();

    let row = controller.add_row();
    controller.select_gun(&row, "G1").await.unwrap();
    controller.select_product(&row, "Petrol").await.unwrap();
    controller.set_closing(&row, Some(Volume::from_litres(150))).unwrap();
    controller.set_testing(&row, Some(Volume::from_litres(5))).unwrap();
    controller.set_cash_received(Some(Money::from_major_minor(450, 0)));
    row
}

#[tokio::test]
async fn test_reference_failure_degrades_to_empty_list() {
    let (stub, base_url) = StubBackend::start().await;
    stub.with_reference_data();
    stub.respond_text(Method::GET, "/active", 500, "boom");
    let app = app(&base_url, SubmitStrategy::Combined);

    let data = app.controller.load_reference_data().await;

    assert!(data.employees.is_empty());
    let names: Vec<_> = data.products.iter().map(|p| p.product_name.as_str()).collect();
    assert_eq!(names, vec!["Petrol", "Diesel"]);
    assert_eq!(app.notices().drain(), vec![Notice::error("Failed to load employees.")]);
}

#[tokio::test]
async fn test_enrichment_fills_tank_state_and_opening() {
    let (stub, base_url) = StubBackend::start().await;
    stub.with_reference_data();
    let app = app(&base_url, SubmitStrategy::Combined);

    let row = petrol_shift(&app).await;
    let view = app.controller.view();
    let line = view.rows.iter().find(|r| r.row_id == row).unwrap();

    assert_eq!(line.opening, Some(Volume::from_litres(100)));
    assert_eq!(line.current_level, Volume::from_litres(1000));
    assert_eq!(line.tank_capacity, Volume::from_litres(5000));
    assert_eq!(line.sales_volume, Volume::from_litres(45));
    assert_eq!(line.sales_value, Money::from_major_minor(450, 0));
    assert!(view.totals.short_collections.is_zero());

    let lookups = stub.requests_to(Method::GET, "/sales/last");
    assert_eq!(lookups.len(), 1);
    assert_eq!(lookups[0].query.as_deref(), Some("productName=Petrol&gun=G1"));
}

#[tokio::test]
async fn test_last_closing_failure_leaves_opening_and_notifies() {
    let (stub, base_url) = StubBackend::start().await;
    stub.with_reference_data();
    stub.respond(Method::GET, "/sales/last", 500, json!({"message": "db down"}));
    let app = app(&base_url, SubmitStrategy::Combined);
    app.controller.load_reference_data().await;

    let row = app.controller.add_row();
    app.controller
        .set_opening(&row, Some(Volume::from_litres(80)))
        .unwrap();
    app.controller.select_gun(&row, "G1").await.unwrap();
    app.controller.select_product(&row, "Petrol").await.unwrap();

    let view = app.controller.view();
    assert_eq!(view.rows[0].opening, Some(Volume::from_litres(80)));
    assert_eq!(
        app.notices().drain(),
        vec![Notice::error("Error fetching last closing for Petrol - G1")]
    );
}

#[tokio::test]
async fn test_stale_tank_state_is_discarded() {
    let (stub, base_url) = StubBackend::start().await;
    stub.with_reference_data();
    stub.respond_slow(
        Method::GET,
        "/inventory/latest",
        200,
        json!([
            {"productId": 1, "currentLevel": 1000.0, "tankCapacity": 5000.0},
            {"productId": 2, "currentLevel": 800.0, "tankCapacity": 4000.0}
        ]),
        Duration::from_millis(200),
    );
    let app = app(&base_url, SubmitStrategy::Combined);
    app.controller.load_reference_data().await;
    let row = app.controller.add_row();

    let first = {
        let controller = app.controller.clone();
        let row = row.clone();
        tokio::spawn(async move { controller.select_product(&row, "Petrol").await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    app.controller.select_product(&row, "Diesel").await.unwrap();
    first.await.unwrap().unwrap();

    let view = app.controller.view();
    assert_eq!(view.rows[0].product_name, "Diesel");
    assert_eq!(view.rows[0].current_level, Volume::from_litres(800));
    assert_eq!(view.rows[0].tank_capacity, Volume::from_litres(4000));
}

#[tokio::test]
async fn test_manual_opening_survives_late_last_closing() {
    let (stub, base_url) = StubBackend::start().await;
    stub.with_reference_data();
    stub.respond_slow(
        Method::GET,
        "/sales/last",
        200,
        json!({"lastClosing": 100.0}),
        Duration::from_millis(200),
    );
    let app = app(&base_url, SubmitStrategy::Combined);
    app.controller.load_reference_data().await;
    let row = app.controller.add_row();
    app.controller.select_product(&row, "Petrol").await.unwrap();

    let lookup = {
        let controller = app.controller.clone();
        let row = row.clone();
        tokio::spawn(async move { controller.select_gun(&row, "G1").await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    app.controller
        .set_opening(&row, Some(Volume::from_litres(42)))
        .unwrap();
    lookup.await.unwrap().unwrap();

    assert_eq!(stub.requests_to(Method::GET, "/sales/last").len(), 1);
    let view = app.controller.view();
    assert_eq!(view.rows[0].gun, "G1");
    assert_eq!(view.rows[0].opening, Some(Volume::from_litres(42)));
}

#[tokio::test]
async fn test_combined_submission_sends_one_request() {
    let (stub, base_url) = StubBackend::start().await;
    stub.with_reference_data();
    stub.respond(Method::POST, "/entryData", 201, json!({"entryId": 9}));
    let app = app(&base_url, SubmitStrategy::Combined);
    petrol_shift(&app).await;

    let receipt = app.coordinator.submit().await.unwrap();
    assert_eq!(receipt.requests, 1);

    let writes = stub.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].path, "/entryData");
    assert_eq!(writes[0].idempotency_key.as_deref(), Some(receipt.idempotency_key.as_str()));

    let body = &writes[0].body;
    assert_eq!(body["entrySaleData"]["date"], "2026-03-14 18:30:00");
    assert_eq!(body["entrySaleData"]["employeeId"], 7);
    assert_eq!(body["entrySaleData"]["products"][0]["productName"], "Petrol");
    assert_eq!(body["entrySaleData"]["products"][0]["opening"], 100.0);
    assert_eq!(body["entryCollectionData"]["cashReceived"], 450.0);
    assert_eq!(
        body["inventoryData"],
        json!([{"productId": 1, "quantity": 45.0, "metric": "Liters (Sale)", "employeeId": 7}])
    );

    assert!(app.controller.view().rows.is_empty());
    assert_eq!(app.controller.form().with_form(|f| f.employee_id()), None);
    assert!(matches!(
        app.coordinator.state(),
        SubmissionState::Finished(SubmissionOutcome::Succeeded(_))
    ));
    let notices = app.notices().drain();
    assert_eq!(notices.last().unwrap().level, NoticeLevel::Success);
    assert_eq!(notices.last().unwrap().message, "Sales & Collections submitted successfully");
}

#[tokio::test]
async fn test_split_submission_sends_record_per_endpoint() {
    let (stub, base_url) = StubBackend::start().await;
    stub.with_reference_data();
    for path in ["/sales", "/collections", "/inventory"] {
        stub.respond(Method::POST, path, 200, json!({}));
    }
    let app = app(&base_url, SubmitStrategy::Split);
    petrol_shift(&app).await;

    let diesel = app.controller.add_row();
    app.controller.select_gun(&diesel, "G2").await.unwrap();
    app.controller.select_product(&diesel, "Diesel").await.unwrap();
    app.controller
        .set_closing(&diesel, Some(Volume::from_litres(200)))
        .unwrap();
    app.controller
        .set_cash_received(Some(Money::from_major_minor(1350, 0)));

    let receipt = app.coordinator.submit().await.unwrap();
    assert_eq!(receipt.requests, 4);

    let writes = stub.writes();
    assert_eq!(writes.len(), 4);
    let key = receipt.idempotency_key;
    let sales = stub.requests_to(Method::POST, "/sales");
    assert_eq!(sales[0].idempotency_key, Some(format!("{key}-sales")));
    assert_eq!(sales[0].body["products"].as_array().unwrap().len(), 2);

    let mut inventory: Vec<_> = stub
        .requests_to(Method::POST, "/inventory")
        .into_iter()
        .map(|r| (r.body["productId"].as_i64().unwrap(), r.body["quantity"].as_f64().unwrap(), r.idempotency_key))
        .collect();
    inventory.sort_by_key(|(id, _, _)| *id);
    assert_eq!(inventory[0], (1, 45.0, Some(format!("{key}-inventory-1"))));
    assert_eq!(inventory[1], (2, 100.0, Some(format!("{key}-inventory-2"))));
}

#[tokio::test]
async fn test_backend_message_is_surfaced_and_form_kept() {
    let (stub, base_url) = StubBackend::start().await;
    stub.with_reference_data();
    stub.respond(
        Method::POST,
        "/entryData",
        409,
        json!({"message": "Entry already exists for this shift"}),
    );
    let app = app(&base_url, SubmitStrategy::Combined);
    petrol_shift(&app).await;
    app.notices().drain();

    let err = app.coordinator.submit().await.unwrap_err();
    assert_eq!(err.submission_message(), "Entry already exists for this shift");
    assert_eq!(
        app.notices().drain(),
        vec![Notice::error("Entry already exists for this shift")]
    );
    assert_eq!(app.controller.view().rows.len(), 1);
}

#[tokio::test]
async fn test_validation_failure_sends_nothing() {
    let (stub, base_url) = StubBackend::start().await;
    stub.with_reference_data();
    let app = app(&base_url, SubmitStrategy::Combined);
    petrol_shift(&app).await;
    app.controller
        .set_cash_received(Some(Money::from_major_minor(400, 0)));

    let err = app.coordinator.submit().await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Validation(ValidationError::ShortCollections { .. })
    ));
    assert_eq!(err.submission_message(), "Short collections cannot be less than -10");
    assert!(stub.writes().is_empty());
}

#[tokio::test]
async fn test_second_submit_while_in_flight_is_rejected() {
    let (stub, base_url) = StubBackend::start().await;
    stub.with_reference_data();
    stub.respond_slow(
        Method::POST,
        "/entryData",
        201,
        json!({}),
        Duration::from_millis(300),
    );
    let app = app(&base_url, SubmitStrategy::Combined);
    petrol_shift(&app).await;

    let first = {
        let coordinator = app.coordinator.clone();
        tokio::spawn(async move { coordinator.submit().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(matches!(
        app.coordinator.submit().await,
        Err(ClientError::AlreadySubmitting)
    ));
    first.await.unwrap().unwrap();
    assert_eq!(stub.requests_to(Method::POST, "/entryData").len(), 1);
}

#[tokio::test]
async fn test_login_attaches_bearer_token() {
    let (stub, base_url) = StubBackend::start().await;
    stub.with_reference_data();
    stub.respond(
        Method::POST,
        "/login",
        200,
        json!({"username": "asha", "token": "t0k3n", "role": "ADMIN"}),
    );
    let app = app(&base_url, SubmitStrategy::Combined);

    let session = app.api().login("asha", "secret").await.unwrap();
    assert_eq!(session.display_name(), "asha");
    app.controller.load_reference_data().await;

    let active = stub.requests_to(Method::GET, "/active");
    assert_eq!(active[0].authorization.as_deref(), Some("Bearer t0k3n"));

    app.api().logout();
    app.controller.load_reference_data().await;
    let active = stub.requests_to(Method::GET, "/active");
    assert_eq!(active[1].authorization, None);
}
