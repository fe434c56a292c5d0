//! Integration tests for the HTTP API.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::NaiveDate;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use roombook::clock::FixedClock;
use roombook::scheduler::Scheduler;
use roombook::store::RoomStore;

async fn test_app() -> Router {
    let store = Arc::new(RoomStore::in_memory());
    store.create_room("Room 1", 4).await.unwrap();
    let clock = Arc::new(FixedClock::on(NaiveDate::from_ymd_opt(2021, 12, 1).unwrap()));
    roombook::http::router(Arc::new(Scheduler::new(store, clock)))
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

async fn book(app: &Router, name: &str, start: &str, end: &str) -> StatusCode {
    app.clone()
        .oneshot(json_request(
            "POST",
            "/reservation",
            json!({ "name": name, "start": start, "end": end }),
        ))
        .await
        .unwrap()
        .status()
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_livez() {
    let app = test_app().await;

    let response = app.oneshot(empty_request("GET", "/livez")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"ok");
}

// ============================================================================
// Reservations
// ============================================================================

#[tokio::test]
async fn test_walkthrough() {
    let app = test_app().await;
    assert_eq!(book(&app, "Foo", "05/12/2021", "07/12/2021").await, StatusCode::CREATED);
    assert_eq!(book(&app, "Bar", "09/12/2021", "11/12/2021").await, StatusCode::CREATED);
    assert_eq!(book(&app, "Baz", "12/12/2021", "13/12/2021").await, StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/availability?start=20/12/2021&end=22/12/2021"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!(true));

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/reservation",
            json!({ "name": "Qux", "start": "09/12/2021", "end": "11/12/2021" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["statusCode"], 400);
    assert_eq!(body["message"], "room is not available on those dates");

    assert_eq!(book(&app, "Qux", "01/12/2021", "02/12/2021").await, StatusCode::CREATED);
}

#[tokio::test]
async fn test_create_returns_location_and_body() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/reservation",
            json!({ "name": "Foo", "startDate": "20/12/2021", "endDate": "23/12/2021" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers()[header::LOCATION], "/reservation/1");
    assert_eq!(
        body_json(response).await,
        json!({
            "reservationNumber": 1,
            "name": "Foo",
            "start": "20/12/2021",
            "end": "23/12/2021",
        })
    );

    let response = app
        .oneshot(empty_request("GET", "/reservation/1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["name"], "Foo");
}

#[tokio::test]
async fn test_create_rejects_bad_dates() {
    let app = test_app().await;
    assert_eq!(book(&app, "Foo", "2021-12-20", "23/12/2021").await, StatusCode::BAD_REQUEST);
    assert_eq!(book(&app, "Foo", "23/12/2021", "20/12/2021").await, StatusCode::BAD_REQUEST);
    assert_eq!(book(&app, "Foo", "20/12/2021", "24/12/2021").await, StatusCode::BAD_REQUEST);
    assert_eq!(book(&app, "Foo", "30/11/2021", "01/12/2021").await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_inverted_range_over_booking() {
    let app = test_app().await;
    assert_eq!(book(&app, "Foo", "09/12/2021", "11/12/2021").await, StatusCode::CREATED);

    for (start, end) in [("10/12/2021", "09/12/2021"), ("20/11/2021", "18/11/2021")] {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/reservation",
                json!({ "name": "Bar", "start": start, "end": end }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{start}..{end}");
        let body = body_json(response).await;
        assert_eq!(body["statusCode"], 400);
        assert_eq!(body["message"], "end date is before start date");
    }
}

#[tokio::test]
async fn test_malformed_body_is_400() {
    let app = test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/reservation")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["statusCode"], 400);
}

#[tokio::test]
async fn test_get_missing_is_404() {
    let app = test_app().await;

    let response = app
        .oneshot(empty_request("GET", "/reservation/42"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["statusCode"], 404);
    assert_eq!(body["message"], "reservation 42 not found");
}

#[tokio::test]
async fn test_update_then_cancel() {
    let app = test_app().await;
    assert_eq!(book(&app, "Foo", "05/12/2021", "07/12/2021").await, StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/reservation/1",
            json!({ "name": "Foo Jr", "start": "06/12/2021", "end": "08/12/2021" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/reservation/1"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["name"], "Foo Jr");
    assert_eq!(body["start"], "06/12/2021");

    let response = app
        .clone()
        .oneshot(empty_request("DELETE", "/reservation/1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(empty_request("DELETE", "/reservation/1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_missing_is_404() {
    let app = test_app().await;

    let response = app
        .oneshot(json_request(
            "PUT",
            "/reservation/7",
            json!({ "name": "Foo", "start": "06/12/2021", "end": "08/12/2021" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_availability_bad_input_is_false() {
    let app = test_app().await;

    for uri in [
        "/availability?start=nope&end=22/12/2021",
        "/availability?start=22/12/2021",
        "/availability?start=22/12/2021&end=20/12/2021",
        "/availability?start=20/11/2021&end=22/11/2021",
    ] {
        let response = app.clone().oneshot(empty_request("GET", uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        assert_eq!(body_json(response).await, json!(false), "{uri}");
    }
}
