//! HTTP surface: status codes, headers, and route protection.

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use portal_service::build_router;
use tower::util::ServiceExt;
use uuid::Uuid;

fn json_post(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-forwarded-for", "198.51.100.99")
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn malformed_enlist_payloads_are_rejected_without_side_effects() {
    let state = common::test_state().await;
    let app = build_router(state).await.unwrap();

    let response = app
        .clone()
        .oneshot(json_post("/enlist", "{not json".to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Valid JSON, invalid email.
    let response = app
        .oneshot(json_post(
            "/enlist",
            serde_json::json!({
                "userId": "IP-KQ7M2XWB",
                "accessKey": "k",
                "accessToken": "t",
                "fullName": "X",
                "email": "not-an-email"
            })
            .to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn bad_login_credentials_return_an_opaque_401() {
    let state = common::test_state().await;
    let app = build_router(state).await.unwrap();

    let response = app
        .oneshot(json_post(
            "/auth/login",
            serde_json::json!({
                "identifier": "IP-ZZZZ9999",
                "accessKey": "0000000000000000"
            })
            .to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "Invalid credentials");
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn throttled_logins_carry_a_retry_after_header() {
    let state = common::test_state().await;
    let app = build_router(state).await.unwrap();

    let attempt = || {
        json_post(
            "/auth/login",
            serde_json::json!({
                "identifier": "IP-RRRR2222",
                "accessKey": "0000000000000000"
            })
            .to_string(),
        )
    };

    for _ in 0..6 {
        let response = app.clone().oneshot(attempt()).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let response = app.oneshot(attempt()).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = response
        .headers()
        .get("retry-after")
        .expect("retry-after header missing")
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(retry_after > 0);
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn admin_routes_require_an_administrator_session() {
    let state = common::test_state().await;

    // Mint one admin and one client session straight from the service.
    let admin_token = state.sessions.issue(Uuid::new_v4(), true).unwrap();
    let client_token = state.sessions.issue(Uuid::new_v4(), false).unwrap();

    let app = build_router(state).await.unwrap();

    let provision_body = serde_json::json!({ "role": "client" }).to_string();

    // No token: 401.
    let response = app
        .clone()
        .oneshot(json_post("/admin/provision", provision_body.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Client session: 403.
    let mut request = json_post("/admin/provision", provision_body.clone());
    request.headers_mut().insert(
        "authorization",
        format!("Bearer {}", client_token).parse().unwrap(),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Admin session: provisioned, credentials returned exactly once.
    let mut request = json_post("/admin/provision", provision_body);
    request.headers_mut().insert(
        "authorization",
        format!("Bearer {}", admin_token).parse().unwrap(),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["account"]["status"], "pending");
    let user_id = json["credentials"]["userId"].as_str().unwrap();
    assert!(user_id.starts_with("IP-"));
    assert_eq!(json["credentials"]["accessKey"].as_str().unwrap().len(), 32);
    assert_eq!(json["credentials"]["accessToken"].as_str().unwrap().len(), 64);
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn responses_carry_security_and_request_id_headers() {
    let state = common::test_state().await;
    let app = build_router(state).await.unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/properties/available")
                .header("x-forwarded-for", "198.51.100.99")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
}
