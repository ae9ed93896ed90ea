use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use delivery_dispatch::api::rest::router;
use delivery_dispatch::config::Config;
use delivery_dispatch::state::AppState;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

fn test_config() -> Config {
    Config {
        http_port: 0,
        log_level: "info".to_string(),
        base_price_per_km: 2000,
        default_demand: 5.0,
        event_buffer_size: 64,
    }
}

fn setup() -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(&test_config()));
    (router(state.clone()), state)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn bogota_delivery(client_id: Uuid) -> Value {
    json!({
        "client_id": client_id,
        "pickup": {
            "address": "Cra 7 #45-10",
            "location": { "lat": 4.60, "lng": -74.08 }
        },
        "dropoff": {
            "address": "Cll 100 #19-20",
            "location": { "lat": 4.65, "lng": -74.05 }
        },
        "demand": 5.0,
        "hour": 8
    })
}

async fn create_delivery(app: &axum::Router, client_id: Uuid) -> Value {
    let response = app
        .clone()
        .oneshot(json_request("POST", "/deliveries", bogota_delivery(client_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

async fn claim(app: &axum::Router, delivery_id: &str, courier_id: Uuid) -> axum::response::Response {
    app.clone()
        .oneshot(json_request(
            "POST",
            &format!("/deliveries/{delivery_id}/claim"),
            json!({ "courier_id": courier_id }),
        ))
        .await
        .unwrap()
}

async fn advance(
    app: &axum::Router,
    delivery_id: &str,
    courier_id: Uuid,
    event: &str,
) -> axum::response::Response {
    app.clone()
        .oneshot(json_request(
            "POST",
            &format!("/deliveries/{delivery_id}/advance"),
            json!({ "courier_id": courier_id, "event": event }),
        ))
        .await
        .unwrap()
}

#[tokio::test]
async fn health_returns_ok() {
    let (app, _state) = setup();
    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["deliveries"], 0);
    assert_eq!(body["couriers_tracked"], 0);
}

#[tokio::test]
async fn metrics_returns_prometheus_format() {
    let (app, _state) = setup();
    let response = app.oneshot(get_request("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.contains("text/plain"));

    let body = body_string(response).await;
    assert!(body.contains("deliveries_created_total"));
}

// Scenario: Bogotá pair at peak hour with mid demand. 6.478 km at 2000/km,
// times 1.3 (peak) * 1.25 (demand 5) * 1.1296 (distance), rounded to 24000.
#[tokio::test]
async fn create_delivery_quotes_peak_hour_price() {
    let (app, _state) = setup();
    let delivery = create_delivery(&app, Uuid::from_u128(1)).await;

    assert_eq!(delivery["status"], "pending");
    assert!(delivery["messenger_id"].is_null());

    let distance = delivery["distance_km"].as_f64().unwrap();
    assert!((distance - 6.478).abs() < 0.01);

    assert_eq!(delivery["price"], 24000);

    let eta = delivery["estimated_minutes"].as_i64().unwrap();
    assert!((10..=120).contains(&eta));
}

#[tokio::test]
async fn create_delivery_identical_points_returns_400() {
    let (app, _state) = setup();
    let mut payload = bogota_delivery(Uuid::from_u128(1));
    payload["dropoff"] = payload["pickup"].clone();

    let response = app
        .oneshot(json_request("POST", "/deliveries", payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_delivery_out_of_range_coordinates_returns_400() {
    let (app, _state) = setup();
    let mut payload = bogota_delivery(Uuid::from_u128(1));
    payload["pickup"]["location"]["lat"] = json!(95.0);

    let response = app
        .oneshot(json_request("POST", "/deliveries", payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_nonexistent_delivery_returns_404() {
    let (app, _state) = setup();
    let fake_id = "00000000-0000-0000-0000-000000000000";
    let response = app
        .oneshot(get_request(&format!("/deliveries/{fake_id}")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn available_listing_drops_claimed_deliveries() {
    let (app, _state) = setup();
    let client = Uuid::from_u128(1);
    let courier = Uuid::from_u128(100);

    let first = create_delivery(&app, client).await;
    let second = create_delivery(&app, client).await;

    let response = app.clone().oneshot(get_request("/deliveries/available")).await.unwrap();
    let listing = body_json(response).await;
    assert_eq!(listing.as_array().unwrap().len(), 2);

    let first_id = first["id"].as_str().unwrap();
    let response = claim(&app, first_id, courier).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(get_request("/deliveries/available")).await.unwrap();
    let listing = body_json(response).await;
    let remaining = listing.as_array().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0]["id"], second["id"]);
}

#[tokio::test]
async fn concurrent_claims_produce_exactly_one_winner() {
    let (app, _state) = setup();
    let delivery = create_delivery(&app, Uuid::from_u128(1)).await;
    let delivery_id = delivery["id"].as_str().unwrap().to_string();

    let mut handles = Vec::new();
    for seed in 0..8u128 {
        let app = app.clone();
        let delivery_id = delivery_id.clone();
        handles.push(tokio::spawn(async move {
            let response = claim(&app, &delivery_id, Uuid::from_u128(100 + seed)).await;
            response.status()
        }));
    }

    let mut won = 0;
    let mut lost = 0;
    for handle in handles {
        match handle.await.unwrap() {
            StatusCode::OK => won += 1,
            StatusCode::CONFLICT => lost += 1,
            other => panic!("unexpected claim status: {other}"),
        }
    }

    assert_eq!(won, 1);
    assert_eq!(lost, 7);
}

#[tokio::test]
async fn skipping_pickup_returns_409_and_keeps_status() {
    let (app, _state) = setup();
    let courier = Uuid::from_u128(100);
    let delivery = create_delivery(&app, Uuid::from_u128(1)).await;
    let id = delivery["id"].as_str().unwrap();

    assert_eq!(claim(&app, id, courier).await.status(), StatusCode::OK);

    let response = advance(&app, id, courier, "mark_in_transit").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .clone()
        .oneshot(get_request(&format!("/deliveries/{id}")))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["status"], "accepted");
}

#[tokio::test]
async fn non_assignee_advance_returns_403() {
    let (app, _state) = setup();
    let courier = Uuid::from_u128(100);
    let rival = Uuid::from_u128(200);
    let delivery = create_delivery(&app, Uuid::from_u128(1)).await;
    let id = delivery["id"].as_str().unwrap();

    assert_eq!(claim(&app, id, courier).await.status(), StatusCode::OK);

    let response = advance(&app, id, rival, "mark_picked_up").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn full_flow_with_ratings_reaches_completed() {
    let (app, _state) = setup();
    let client = Uuid::from_u128(1);
    let courier = Uuid::from_u128(100);
    let delivery = create_delivery(&app, client).await;
    let id = delivery["id"].as_str().unwrap();

    assert_eq!(claim(&app, id, courier).await.status(), StatusCode::OK);
    for event in ["mark_picked_up", "mark_in_transit", "mark_delivered"] {
        let response = advance(&app, id, courier, event).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    // Client rates first: rating sticks, status stays delivered.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/deliveries/{id}/rating"),
            json!({ "rater_id": client, "role": "client", "rating": 5, "comment": "great" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "delivered");
    assert_eq!(body["client_rating"]["rating"], 5);
    assert_eq!(body["client_rating"]["comment"], "great");

    // Duplicate client rating is rejected.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/deliveries/{id}/rating"),
            json!({ "rater_id": client, "role": "client", "rating": 4 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Courier's rating closes it out.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/deliveries/{id}/rating"),
            json!({ "rater_id": courier, "role": "messenger", "rating": 4, "comment": "ok" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "completed");
    assert_eq!(body["messenger_rating"]["rating"], 4);
}

#[tokio::test]
async fn rating_before_delivered_returns_403() {
    let (app, _state) = setup();
    let client = Uuid::from_u128(1);
    let delivery = create_delivery(&app, client).await;
    let id = delivery["id"].as_str().unwrap();

    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/deliveries/{id}/rating"),
            json!({ "rater_id": client, "role": "client", "rating": 5 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn update_position_rejects_invalid_coordinates() {
    let (app, _state) = setup();
    let courier = Uuid::from_u128(100);

    let response = app
        .oneshot(json_request(
            "PATCH",
            &format!("/couriers/{courier}/position"),
            json!({ "location": { "lat": 120.0, "lng": 0.0 } }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn route_view_orders_stops_from_courier_position() {
    let (app, _state) = setup();
    let client = Uuid::from_u128(1);
    let courier = Uuid::from_u128(100);

    // Far pickup first, near pickup second.
    let far = json!({
        "client_id": client,
        "pickup": {
            "address": "far pickup",
            "location": { "lat": 4.70, "lng": -74.10 }
        },
        "dropoff": {
            "address": "far dropoff",
            "location": { "lat": 4.72, "lng": -74.11 }
        },
        "demand": 5.0,
        "hour": 12
    });
    let near = json!({
        "client_id": client,
        "pickup": {
            "address": "near pickup",
            "location": { "lat": 4.61, "lng": -74.08 }
        },
        "dropoff": {
            "address": "near dropoff",
            "location": { "lat": 4.63, "lng": -74.09 }
        },
        "demand": 5.0,
        "hour": 12
    });

    let mut ids = Vec::new();
    for payload in [far, near] {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/deliveries", payload))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        ids.push(body["id"].as_str().unwrap().to_string());
    }

    for id in &ids {
        assert_eq!(claim(&app, id, courier).await.status(), StatusCode::OK);
    }

    // No position yet: the route view has nothing to order from.
    let response = app
        .clone()
        .oneshot(get_request(&format!("/couriers/{courier}/route")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/couriers/{courier}/position"),
            json!({ "location": { "lat": 4.60, "lng": -74.08 } }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get_request(&format!("/couriers/{courier}/route")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let route = body_json(response).await;
    let stops = route.as_array().unwrap();
    assert_eq!(stops.len(), 2);
    assert_eq!(stops[0]["address"], "near pickup");
    assert_eq!(stops[1]["address"], "far pickup");
}
