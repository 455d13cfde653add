// libs/booking-cell/tests/handlers_test.rs

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use booking_cell::router::booking_routes;
use booking_cell::BookingCellState;
use shared_models::BookingStatus;
use shared_utils::test_utils::{MockBackendResponses, TestConfig};

fn create_app(mock_server: &MockServer) -> Router {
    let config = TestConfig::with_backend(mock_server.uri()).to_app_config();
    let state = BookingCellState::new(&config).expect("state should build");
    booking_routes(Arc::new(state))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let request = match body {
        Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, json)
}

async fn mount_assignable_booking(mock_server: &MockServer, booking_id: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/bookings/{}", booking_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            MockBackendResponses::booking_envelope(MockBackendResponses::booking_document(
                booking_id,
                BookingStatus::Pending,
            )),
        ))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/bookings/{}/available-professionals", booking_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            MockBackendResponses::available_professionals(vec![
                MockBackendResponses::professional("P1", "Priya"),
                MockBackendResponses::professional("P2", "Omar"),
            ]),
        ))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_open_select_commit_flow() {
    let mock_server = MockServer::start().await;
    mount_assignable_booking(&mock_server, "B1").await;

    Mock::given(method("PUT"))
        .and(path("/bookings/B1/assign"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            MockBackendResponses::booking_envelope(MockBackendResponses::assigned_booking_document(
                "B1",
                BookingStatus::Pending,
                "P2",
            )),
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = create_app(&mock_server);

    let (status, opened) = send(&app, "POST", "/B1/assignment", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(opened["interaction"]["phase"], "ready");
    assert_eq!(opened["interaction"]["candidates"].as_array().unwrap().len(), 2);
    assert_eq!(opened["interaction"]["candidates"][0]["source"], "primary");

    let (status, selection) = send(
        &app,
        "PUT",
        "/assignment/selection",
        Some(json!({ "professional_id": "P2" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(selection["selected"], true);
    assert_eq!(selection["interaction"]["selected_candidate_id"], "P2");

    let (status, committed) = send(&app, "POST", "/assignment/commit", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(committed["booking"]["professional"]["_id"], "P2");
    assert!(committed["actions"]
        .as_array()
        .unwrap()
        .contains(&json!("start_service")));

    let (status, _) = send(&app, "GET", "/assignment", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_selection_is_reported_not_applied() {
    let mock_server = MockServer::start().await;
    mount_assignable_booking(&mock_server, "B1").await;

    let app = create_app(&mock_server);
    send(&app, "POST", "/B1/assignment", None).await;

    let (status, selection) = send(
        &app,
        "PUT",
        "/assignment/selection",
        Some(json!({ "professional_id": "P404" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(selection["selected"], false);
    assert!(selection["interaction"]["selected_candidate_id"].is_null());

    let (status, body) = send(&app, "POST", "/assignment/commit", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_blank_cancellation_reason_is_rejected_without_backend_calls() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/bookings/B2/cancel"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let app = create_app(&mock_server);
    let (status, body) = send(&app, "POST", "/B2/cancel", Some(json!({ "reason": "   " }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("reason"));
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_cancel_returns_confirmed_booking() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/bookings/B2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            MockBackendResponses::booking_envelope(MockBackendResponses::booking_document(
                "B2",
                BookingStatus::Pending,
            )),
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/bookings/B2/cancel"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            MockBackendResponses::booking_envelope(
                MockBackendResponses::cancelled_booking_document("B2", "rain"),
            ),
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = create_app(&mock_server);
    let (status, body) = send(&app, "POST", "/B2/cancel", Some(json!({ "reason": " rain " }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["booking"]["status"], "cancelled");
    assert_eq!(body["booking"]["cancellationReason"], "rain");
}

#[tokio::test]
async fn test_illegal_status_change_is_conflict() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/bookings/B3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            MockBackendResponses::booking_envelope(MockBackendResponses::assigned_booking_document(
                "B3",
                BookingStatus::Completed,
                "P1",
            )),
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/bookings/B3/status"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let app = create_app(&mock_server);
    let (status, body) = send(&app, "PATCH", "/B3/status", Some(json!({ "status": "ongoing" }))).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("completed"));
}

#[tokio::test]
async fn test_backend_failure_on_commit_is_bad_gateway() {
    let mock_server = MockServer::start().await;
    mount_assignable_booking(&mock_server, "B1").await;

    Mock::given(method("PUT"))
        .and(path("/bookings/B1/assign"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database unavailable"))
        .mount(&mock_server)
        .await;

    let app = create_app(&mock_server);
    send(&app, "POST", "/B1/assignment", None).await;
    send(
        &app,
        "PUT",
        "/assignment/selection",
        Some(json!({ "professional_id": "P1" })),
    )
    .await;

    let (status, _) = send(&app, "POST", "/assignment/commit", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let (status, body) = send(&app, "GET", "/assignment", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["interaction"]["phase"], "ready");
    assert_eq!(body["interaction"]["selected_candidate_id"], "P1");
    assert!(body["interaction"]["last_error"].as_str().is_some());
}

#[tokio::test]
async fn test_get_booking_lists_actions() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/bookings/B1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            MockBackendResponses::booking_envelope(MockBackendResponses::booking_document(
                "B1",
                BookingStatus::Pending,
            )),
        ))
        .mount(&mock_server)
        .await;

    let app = create_app(&mock_server);
    let (status, body) = send(&app, "GET", "/B1", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["booking"]["_id"], "B1");
    assert_eq!(body["actions"], json!(["assign_professional", "cancel"]));
}

#[tokio::test]
async fn test_assignment_endpoints_without_interaction() {
    let mock_server = MockServer::start().await;
    let app = create_app(&mock_server);

    let (status, _) = send(&app, "GET", "/assignment", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", "/assignment", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "POST", "/assignment/retry", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_opening_assignment_for_completed_booking_is_conflict() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/bookings/B5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            MockBackendResponses::booking_envelope(MockBackendResponses::assigned_booking_document(
                "B5",
                BookingStatus::Completed,
                "P1",
            )),
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/bookings/B5/available-professionals"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let app = create_app(&mock_server);
    let (status, _) = send(&app, "POST", "/B5/assignment", None).await;

    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, "GET", "/assignment", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
