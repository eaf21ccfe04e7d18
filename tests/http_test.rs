mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use common::start_system;
use retail_billing::api::{router, AppState, TENANT_HEADER};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn call(app: &Router, method: &str, uri: &str, tenant: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(tenant) = tenant {
        request = request.header(TENANT_HEADER, tenant);
    }
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn stock(app: &Router, tenant: &str, name: &str, unit_price: u64, quantity: u32) -> u64 {
    let (status, body) = call(
        app,
        "POST",
        "/api/inventory",
        Some(tenant),
        Some(json!({ "name": name, "unitPrice": unit_price, "quantity": quantity })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["id"].as_u64().unwrap()
}

#[tokio::test]
async fn test_requests_without_tenant_are_unauthorized() {
    let (system, _transport) = start_system();
    let app = router(AppState::from_system(&system));

    for (method, uri) in [("GET", "/api/sales"), ("GET", "/api/messaging/status")] {
        let (status, body) = call(&app, method, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["msg"].is_string());
    }
    let (status, _) = call(&app, "GET", "/api/sales", Some("   "), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    drop(app);
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_sale_lifecycle_over_http() {
    let (system, _transport) = start_system();
    let app = router(AppState::from_system(&system));
    let para = stock(&app, "shop-a", "Paracetamol", 250, 10).await;

    let (status, invoice) = call(
        &app,
        "POST",
        "/api/sales",
        Some("shop-a"),
        Some(json!({
            "customerName": "Meera",
            "items": [{ "medicine": para, "quantity": 2 }, { "medicine": format!("item_{para}"), "quantity": 1 }],
            "paymentMethod": "card"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{invoice}");
    assert_eq!(invoice["total"], 750);
    assert_eq!(invoice["paymentMethod"], "card");
    assert_eq!(invoice["lines"][0]["name"], "Paracetamol");
    assert_eq!(invoice["lines"][0]["lineTotal"], 500);
    let id = invoice["id"].as_str().unwrap().to_string();

    let (status, item) = call(&app, "GET", &format!("/api/inventory/item_{para}"), Some("shop-a"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item["quantity"], 7);

    let (status, listed) = call(&app, "GET", "/api/sales", Some("shop-a"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, fetched) = call(&app, "GET", &format!("/api/sales/{id}"), Some("shop-a"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, invoice);

    let (status, _) = call(&app, "GET", &format!("/api/sales/{id}"), Some("shop-b"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, listed) = call(&app, "GET", "/api/sales", Some("shop-b"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(listed.as_array().unwrap().is_empty());

    drop(app);
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_sale_errors_map_to_status_codes() {
    let (system, _transport) = start_system();
    let app = router(AppState::from_system(&system));
    let item = stock(&app, "shop-a", "Insulin", 4000, 1).await;

    let (status, body) = call(
        &app,
        "POST",
        "/api/sales",
        Some("shop-a"),
        Some(json!({ "customerName": "Meera", "items": [{ "medicine": item, "quantity": 2 }] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let msg = body["msg"].as_str().unwrap();
    assert!(msg.contains("Insulin") && msg.contains("available 1"), "{msg}");

    let (status, _) = call(
        &app,
        "POST",
        "/api/sales",
        Some("shop-a"),
        Some(json!({ "items": [{ "medicine": item, "quantity": 1 }] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        "POST",
        "/api/sales",
        Some("shop-a"),
        Some(json!({ "customerName": "Meera", "items": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        "POST",
        "/api/sales",
        Some("shop-a"),
        Some(json!({ "customerName": "Meera", "items": [{ "medicine": 404, "quantity": 1 }] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(
        &app,
        "POST",
        "/api/sales",
        Some("shop-b"),
        Some(json!({ "customerName": "Meera", "items": [{ "medicine": item, "quantity": 1 }] })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call(
        &app,
        "POST",
        "/api/sales",
        Some("shop-a"),
        Some(json!({ "customerName": "Meera", "items": [{ "medicine": item, "quantity": -1 }] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["msg"].is_string());

    let (status, _) = call(&app, "GET", "/api/sales/not-an-id", Some("shop-a"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Nothing was sold.
    let (_, item) = call(&app, "GET", &format!("/api/inventory/{item}"), Some("shop-a"), None).await;
    assert_eq!(item["quantity"], 1);

    drop(app);
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_messaging_status_starts_session() {
    let (system, transport) = start_system();
    let app = router(AppState::from_system(&system));

    let (status, body) = call(&app, "GET", "/api/messaging/status", Some("shop-a"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isReady"], false);
    assert_eq!(body["status"], "INITIALIZING");
    assert!(body["pairingChallenge"].is_null());

    let shop = common::tenant("shop-a");
    assert!(transport.wait_started(&shop, 1, std::time::Duration::from_secs(2)).await);
    assert!(transport.connect(&shop));
    assert!(system.sessions.wait_until_ready(&shop, std::time::Duration::from_secs(2)).await);

    let (_, body) = call(&app, "GET", "/api/messaging/status", Some("shop-a"), None).await;
    assert_eq!(body["isReady"], true);
    assert_eq!(body["status"], "CONNECTED");
    assert_eq!(transport.start_count(&shop), 1);

    drop(app);
    system.shutdown().await.unwrap();
}
