use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use mishwar_api::auth::{IdTokenClaims, JwtTokenVerifier};
use mishwar_api::{app, AppState};
use mishwar_domain::identity::MockTokenVerifier;
use mishwar_domain::trip::{DriverRef, Trip, TripDraft};
use mishwar_notify::{Dispatcher, MockPushProvider};
use mishwar_store::{MemoryTripRepository, MemoryUserTokenRepository};

const ALICE: &str = "mock:driver-1::Alice";
const BADR: &str = "mock:driver-2::Badr";

fn state_with_trips(trips: Vec<Trip>) -> AppState {
    let trips = Arc::new(MemoryTripRepository::with_trips(trips));
    let user_tokens = Arc::new(MemoryUserTokenRepository::new());
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::new(MockPushProvider),
        user_tokens.clone(),
    ));
    AppState {
        trips,
        user_tokens,
        dispatcher,
        verifier: Arc::new(MockTokenVerifier),
    }
}

fn test_state() -> AppState {
    state_with_trips(Vec::new())
}

async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, Value) {
    let response = app(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn request(
    state: &AppState,
    method: Method,
    uri: &str,
    bearer: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    send(state, request).await
}

/// Sends an arbitrary body, with or without a content type, for requests
/// the JSON helper above cannot express.
async fn raw_request(
    state: &AppState,
    method: Method,
    uri: &str,
    bearer: Option<&str>,
    content_type: Option<&str>,
    body: &str,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();
    send(state, request).await
}

fn draft_body() -> Value {
    json!({
        "fromCity": "Riyadh",
        "toCity": "Jeddah",
        "date": "2026-09-01",
        "time": "08:30",
        "carModel": "Camry",
        "carColor": "White",
        "price": 120.0,
        "phoneNumber": "+966501234567",
        "totalSeats": 4
    })
}

fn seeded_trip(driver_id: &str, booked: &[&str], age_minutes: i64) -> Trip {
    let draft = TripDraft {
        from_city: "Riyadh".to_string(),
        to_city: "Jeddah".to_string(),
        date: "2026-09-01".to_string(),
        time: "08:30".to_string(),
        car_model: "Camry".to_string(),
        car_color: "White".to_string(),
        price: 120.0,
        phone_number: "+966501234567".to_string(),
        notes: None,
        total_seats: 4,
    };
    let driver = DriverRef {
        id: driver_id.to_string(),
        name: Some("Alice".to_string()),
    };
    let mut trip = Trip::new(draft, &driver);
    trip.booked_users = booked.iter().map(|s| s.to_string()).collect();
    trip.available_seats = trip.total_seats - booked.len() as i32;
    trip.created_at = Utc::now() - Duration::minutes(age_minutes);
    trip.updated_at = trip.created_at;
    trip
}

#[tokio::test]
async fn test_health_endpoint() {
    let state = test_state();
    let (status, body) = request(&state, Method::GET, "/api/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let state = test_state();
    let (status, body) = request(
        &state,
        Method::POST,
        "/api/v1/trips",
        None,
        Some(draft_body()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Authentication token is missing");

    let (status, body) = request(
        &state,
        Method::GET,
        "/api/v1/trips/mine",
        Some("mock:"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid or expired token");
}

#[tokio::test]
async fn test_create_and_list_trip() {
    let state = test_state();

    let (status, body) = request(
        &state,
        Method::POST,
        "/api/v1/trips",
        Some(ALICE),
        Some(draft_body()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Trip created successfully");

    let trip = &body["trip"];
    assert_eq!(trip["driverId"], "driver-1");
    assert_eq!(trip["driverName"], "Alice");
    assert_eq!(trip["totalSeats"], 4);
    assert_eq!(trip["availableSeats"], 4);
    assert_eq!(trip["bookedUsers"], json!([]));
    assert!(trip.get("notes").is_none());

    // Public listing shows the new trip without authentication.
    let (status, body) = request(&state, Method::GET, "/api/v1/trips", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["trips"].as_array().unwrap().len(), 1);
    assert_eq!(body["trips"][0]["id"], trip["id"]);
    assert_eq!(body["nextCursor"], Value::Null);
}

#[tokio::test]
async fn test_create_trip_validation_failure_shape() {
    let state = test_state();
    let mut body = draft_body();
    body["fromCity"] = json!("   ");
    body["date"] = json!("2026-1-05");
    body["price"] = json!(0);

    let (status, body) = request(&state, Method::POST, "/api/v1/trips", Some(ALICE), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation failed");

    let errors = body["errors"].as_array().unwrap();
    let paths: Vec<&str> = errors.iter().map(|e| e["path"].as_str().unwrap()).collect();
    assert!(paths.contains(&"fromCity"));
    assert!(paths.contains(&"date"));
    assert!(paths.contains(&"price"));
    let date_error = errors.iter().find(|e| e["path"] == "date").unwrap();
    assert_eq!(date_error["message"], "date must be in YYYY-MM-DD format");
}

#[tokio::test]
async fn test_unreadable_body_reports_field_level_errors() {
    let state = test_state();

    // A required field that never arrives.
    let mut body = draft_body();
    body.as_object_mut().unwrap().remove("fromCity");
    let (status, body) = request(&state, Method::POST, "/api/v1/trips", Some(ALICE), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation failed");
    assert_eq!(body["errors"][0]["path"], "fromCity");
    assert_eq!(body["errors"][0]["message"], "fromCity is required");

    // A field of the wrong type.
    let mut body = draft_body();
    body["price"] = json!("120");
    let (status, body) = request(&state, Method::POST, "/api/v1/trips", Some(ALICE), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation failed");
    assert_eq!(body["errors"][0]["path"], "price");
    assert!(body["errors"][0]["message"]
        .as_str()
        .unwrap()
        .contains("invalid type"));

    // Patches are screened the same way, before any trip lookup.
    let (status, body) = request(
        &state,
        Method::PATCH,
        &format!("/api/v1/trips/{}", Uuid::new_v4()),
        Some(ALICE),
        Some(json!({ "totalSeats": "three" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation failed");
    assert_eq!(body["errors"][0]["path"], "totalSeats");
}

#[tokio::test]
async fn test_non_json_body_reports_validation_failure() {
    let state = test_state();

    let (status, body) = raw_request(
        &state,
        Method::POST,
        "/api/v1/trips",
        Some(ALICE),
        Some("application/json"),
        "{ this is not json",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation failed");
    assert_eq!(
        body["errors"][0]["message"],
        "Request body must be valid JSON"
    );

    // Bodies sent without a JSON content type never reach the parser.
    let (status, body) = raw_request(
        &state,
        Method::POST,
        "/api/v1/trips",
        Some(ALICE),
        None,
        &draft_body().to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation failed");
    assert_eq!(
        body["errors"][0]["message"],
        "Content-Type must be application/json"
    );
}

#[tokio::test]
async fn test_mistyped_token_field_reports_validation_failure() {
    let state = test_state();

    let (status, body) = request(
        &state,
        Method::POST,
        "/api/v1/devices",
        Some(ALICE),
        Some(json!({ "token": 7 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation failed");
    assert_eq!(body["errors"][0]["path"], "token");

    let (status, body) = request(
        &state,
        Method::POST,
        "/api/v1/notifications/test",
        Some(ALICE),
        Some(json!({ "token": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation failed");
    assert_eq!(body["errors"][0]["path"], "token");
}

#[tokio::test]
async fn test_duplicate_query_parameters_are_rejected() {
    let state = test_state();
    let (status, body) = request(
        &state,
        Method::GET,
        "/api/v1/trips?limit=5&limit=6",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation failed");
    assert!(body["errors"][0]["message"]
        .as_str()
        .unwrap()
        .contains("duplicate field"));
}

#[tokio::test]
async fn test_list_filters_match_exact_city() {
    let state = state_with_trips(vec![
        seeded_trip("driver-1", &[], 10),
        {
            let mut t = seeded_trip("driver-2", &[], 20);
            t.from_city = "Abha".to_string();
            t
        },
    ]);

    let (status, body) = request(
        &state,
        Method::GET,
        "/api/v1/trips?fromCity=Riyadh",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["trips"].as_array().unwrap().len(), 1);
    assert_eq!(body["trips"][0]["fromCity"], "Riyadh");

    // Blank filters are ignored.
    let (_, body) = request(
        &state,
        Method::GET,
        "/api/v1/trips?fromCity=%20%20",
        None,
        None,
    )
    .await;
    assert_eq!(body["trips"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_list_rejects_bad_limit() {
    let state = test_state();
    for bad in ["abc", "0", "-5"] {
        let (status, body) = request(
            &state,
            Method::GET,
            &format!("/api/v1/trips?limit={bad}"),
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "accepted limit={bad}");
        assert_eq!(body["message"], "limit must be a positive number");
    }
}

#[tokio::test]
async fn test_pagination_walks_and_terminates() {
    let state = state_with_trips(vec![
        seeded_trip("driver-1", &[], 10),
        seeded_trip("driver-1", &[], 20),
        seeded_trip("driver-1", &[], 30),
    ]);

    let mut seen = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let uri = match &cursor {
            Some(c) => format!("/api/v1/trips?limit=1&cursor={c}"),
            None => "/api/v1/trips?limit=1".to_string(),
        };
        let (status, body) = request(&state, Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::OK);

        let trips = body["trips"].as_array().unwrap();
        if trips.is_empty() {
            assert_eq!(body["nextCursor"], Value::Null);
            break;
        }
        assert_eq!(trips.len(), 1);
        seen.push(trips[0]["id"].as_str().unwrap().to_string());
        match body["nextCursor"].as_str() {
            Some(next) => cursor = Some(next.to_string()),
            None => break,
        }
    }
    assert_eq!(seen.len(), 3);

    // Newest first.
    let (_, body) = request(&state, Method::GET, "/api/v1/trips", None, None).await;
    let all: Vec<String> = body["trips"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(seen, all);
}

#[tokio::test]
async fn test_unknown_cursor_is_rejected() {
    let state = state_with_trips(vec![seeded_trip("driver-1", &[], 10)]);

    let uri = format!("/api/v1/trips?cursor={}", Uuid::new_v4());
    let (status, body) = request(&state, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid cursor provided");

    let (status, body) = request(
        &state,
        Method::GET,
        "/api/v1/trips?cursor=not-a-uuid",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid cursor provided");
}

#[tokio::test]
async fn test_my_trips_only_shows_caller() {
    let state = test_state();
    for token in [ALICE, BADR] {
        let (status, _) = request(
            &state,
            Method::POST,
            "/api/v1/trips",
            Some(token),
            Some(draft_body()),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = request(&state, Method::GET, "/api/v1/trips/mine", Some(ALICE), None).await;
    assert_eq!(status, StatusCode::OK);
    let trips = body["trips"].as_array().unwrap();
    assert_eq!(trips.len(), 1);
    assert_eq!(trips[0]["driverId"], "driver-1");
    assert_eq!(trips[0]["availableSeats"], trips[0]["totalSeats"]);
}

#[tokio::test]
async fn test_update_checks_ownership_and_existence() {
    let trip = seeded_trip("driver-1", &[], 10);
    let id = trip.id;
    let state = state_with_trips(vec![trip]);

    let patch = json!({ "price": 95.0 });
    let (status, body) = request(
        &state,
        Method::PATCH,
        &format!("/api/v1/trips/{id}"),
        Some(BADR),
        Some(patch.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You are not allowed to modify this trip");

    let (status, body) = request(
        &state,
        Method::PATCH,
        &format!("/api/v1/trips/{}", Uuid::new_v4()),
        Some(ALICE),
        Some(patch.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Trip not found");

    // Unparseable ids read as missing trips.
    let (status, _) = request(
        &state,
        Method::PATCH,
        "/api/v1/trips/whatever",
        Some(ALICE),
        Some(patch.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = request(
        &state,
        Method::PATCH,
        &format!("/api/v1/trips/{id}"),
        Some(ALICE),
        Some(patch),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["price"], 95.0);
}

#[tokio::test]
async fn test_update_rejects_empty_patch() {
    let trip = seeded_trip("driver-1", &[], 10);
    let id = trip.id;
    let state = state_with_trips(vec![trip]);

    let (status, body) = request(
        &state,
        Method::PATCH,
        &format!("/api/v1/trips/{id}"),
        Some(ALICE),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation failed");
    assert_eq!(
        body["errors"][0]["message"],
        "At least one field must be provided to update"
    );
}

#[tokio::test]
async fn test_seat_ledger_through_the_api() {
    // 4 seats, 2 booked, 2 available.
    let trip = seeded_trip("driver-1", &["u1", "u2"], 10);
    let id = trip.id;
    let state = state_with_trips(vec![trip]);

    // Shrinking capacity clamps availability to what is left.
    let (status, body) = request(
        &state,
        Method::PATCH,
        &format!("/api/v1/trips/{id}"),
        Some(ALICE),
        Some(json!({ "totalSeats": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalSeats"], 3);
    assert_eq!(body["availableSeats"], 1);

    // Capacity below the booked count is refused outright.
    let (status, _) = request(
        &state,
        Method::PATCH,
        &format!("/api/v1/trips/{id}"),
        Some(ALICE),
        Some(json!({ "totalSeats": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // An explicit availableSeats beyond capacity is also refused.
    let (status, _) = request(
        &state,
        Method::PATCH,
        &format!("/api/v1/trips/{id}"),
        Some(ALICE),
        Some(json!({ "availableSeats": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_trip_flow() {
    let trip = seeded_trip("driver-1", &[], 10);
    let id = trip.id;
    let state = state_with_trips(vec![trip]);

    let (status, body) = request(
        &state,
        Method::DELETE,
        &format!("/api/v1/trips/{id}"),
        Some(BADR),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You are not allowed to delete this trip");

    let (status, _) = request(
        &state,
        Method::DELETE,
        &format!("/api/v1/trips/{id}"),
        Some(ALICE),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = request(
        &state,
        Method::DELETE,
        &format!("/api/v1/trips/{id}"),
        Some(ALICE),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = request(&state, Method::GET, "/api/v1/trips", None, None).await;
    assert!(body["trips"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_device_registration() {
    let state = test_state();

    let (status, _) = request(
        &state,
        Method::POST,
        "/api/v1/devices",
        Some(ALICE),
        Some(json!({ "token": "device-token-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = request(
        &state,
        Method::POST,
        "/api/v1/devices",
        Some(ALICE),
        Some(json!({ "token": "  " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Device token is required");
}

#[tokio::test]
async fn test_send_test_notification() {
    let state = test_state();

    let (status, body) = request(
        &state,
        Method::POST,
        "/api/v1/notifications/test",
        Some(ALICE),
        Some(json!({ "token": "device-token-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["targetCount"], 1);
    assert_eq!(body["successCount"], 1);
    assert_eq!(body["failureCount"], 0);

    let (status, body) = request(
        &state,
        Method::POST,
        "/api/v1/notifications/test",
        Some(ALICE),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Device token is required");
}

#[tokio::test]
async fn test_jwt_verifier_end_to_end() {
    let mut state = test_state();
    state.verifier = Arc::new(JwtTokenVerifier::new("integration-secret".to_string()));

    let claims = IdTokenClaims {
        sub: "driver-9".to_string(),
        email: Some("dana@example.com".to_string()),
        exp: 4102444800,
        display_name: Some("Dana".to_string()),
        full_name: None,
        name: None,
        username: None,
        first_name: None,
        last_name: None,
    };
    let token = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(b"integration-secret"),
    )
    .unwrap();

    let (status, body) = request(
        &state,
        Method::POST,
        "/api/v1/trips",
        Some(&token),
        Some(draft_body()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["trip"]["driverId"], "driver-9");
    assert_eq!(body["trip"]["driverName"], "Dana");

    let forged = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(b"other-secret"),
    )
    .unwrap();
    let (status, body) = request(
        &state,
        Method::POST,
        "/api/v1/trips",
        Some(&forged),
        Some(draft_body()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid or expired token");
}
