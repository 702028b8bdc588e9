// Integration tests for the relays against a live stub backend and frontend
use actix_web::http::{header, Method, StatusCode};
use actix_web::{test, web, App};
use serde_json::{json, Value};

use docreq_gateway::configure_services;
use docreq_gateway::testing::constants::{TEST_LIFETIME_SECS, TEST_USERNAME};
use docreq_gateway::testing::upstream::{
    STUB_CURRENT_PASSWORD, STUB_PAGE, STUB_PASSWORD, STUB_PDF,
};
use docreq_gateway::testing::{
    assert_admin_session, assert_json_error, assert_status, session_cookie_value,
    RequestBuilder, StubUpstream, TestFixtures,
};

/// Gateway whose backend and frontend are both the stub
macro_rules! stub_gateway_app {
    ($upstream:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(TestFixtures::settings()))
                .app_data(web::Data::new(TestFixtures::token_service()))
                .app_data(web::Data::new(TestFixtures::cookie_factory()))
                .app_data(web::Data::new($upstream.backend()))
                .app_data(web::Data::new($upstream.frontend()))
                .configure(configure_services),
        )
        .await
    };
}

fn header_str<'a>(resp: &'a actix_web::dev::ServiceResponse, name: &str) -> &'a str {
    resp.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

// ===============================
// LOGIN AND PASSWORD CHANGE
// ===============================

#[actix_web::test]
async fn test_login_issues_session_cookie() {
    let upstream = StubUpstream::start().unwrap();
    let app = stub_gateway_app!(upstream);

    let req = RequestBuilder::api_post(
        "/api/login",
        json!({"username": TEST_USERNAME, "password": STUB_PASSWORD}),
    )
    .to_test_request()
    .to_request();
    let resp = test::call_service(&app, req).await;

    assert_status(resp.response(), 200);
    let set_cookie = header_str(&resp, "set-cookie").to_string();
    for attribute in [
        format!("Max-Age={TEST_LIFETIME_SECS}"),
        "HttpOnly".to_string(),
        "SameSite=Strict".to_string(),
        "Path=/".to_string(),
    ] {
        assert!(set_cookie.contains(&attribute), "{attribute} missing from {set_cookie}");
    }

    let token = session_cookie_value(&resp).unwrap();
    let session = TestFixtures::token_service()
        .verify_session_token(&token)
        .unwrap();
    assert_admin_session(&session, TEST_USERNAME);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"ok": true}));
    upstream.stop().await;
}

#[actix_web::test]
async fn test_login_rejected_by_backend() {
    let upstream = StubUpstream::start().unwrap();
    let app = stub_gateway_app!(upstream);

    let req = RequestBuilder::api_post(
        "/api/login",
        json!({"username": TEST_USERNAME, "password": "wrong-password"}),
    )
    .to_test_request()
    .to_request();
    let resp = test::call_service(&app, req).await;

    assert_status(resp.response(), 401);
    assert!(session_cookie_value(&resp).is_none());
    let body: Value = test::read_body_json(resp).await;
    assert_json_error(&body, "invalid credentials");
    upstream.stop().await;
}

#[actix_web::test]
async fn test_change_password_success() {
    let upstream = StubUpstream::start().unwrap();
    let app = stub_gateway_app!(upstream);

    let req = RequestBuilder::api_post(
        "/api/admin/change-password",
        json!({"currentPassword": STUB_CURRENT_PASSWORD, "newPassword": "brand-new-secret"}),
    )
    .with_session_token(&TestFixtures::valid_token())
    .to_test_request()
    .to_request();
    let resp = test::call_service(&app, req).await;

    assert_status(resp.response(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"message": "password changed successfully"}));
    upstream.stop().await;
}

#[actix_web::test]
async fn test_change_password_mirrors_backend_error() {
    let upstream = StubUpstream::start().unwrap();
    let app = stub_gateway_app!(upstream);

    let req = RequestBuilder::api_post(
        "/api/admin/change-password",
        json!({"currentPassword": "not-the-password", "newPassword": "brand-new-secret"}),
    )
    .with_session_token(&TestFixtures::valid_token())
    .to_test_request()
    .to_request();
    let resp = test::call_service(&app, req).await;

    assert_status(resp.response(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_json_error(&body, "current password is incorrect");
    upstream.stop().await;
}

// ===============================
// BACKEND RELAYS
// ===============================

#[actix_web::test]
async fn test_submit_mirrors_backend_status_and_body() {
    let upstream = StubUpstream::start().unwrap();
    let app = stub_gateway_app!(upstream);

    let req = RequestBuilder::api_post("/api/submit", json!({"studentName": "Ada"}))
        .to_test_request()
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::CREATED);
    assert!(header_str(&resp, "content-type").starts_with("application/json"));
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"received": {"studentName": "Ada"}}));
    upstream.stop().await;
}

#[actix_web::test]
async fn test_request_list_mirrors_headers_and_cookies() {
    let upstream = StubUpstream::start().unwrap();
    let app = stub_gateway_app!(upstream);
    let token = TestFixtures::valid_token();

    let req = RequestBuilder::api(Method::GET, "/api/requests?status=pending&page=2")
        .header("host", "admin.example.org")
        .with_session_token(&token)
        .to_test_request()
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_status(resp.response(), 200);
    assert_eq!(header_str(&resp, "x-total-count"), "2");
    assert!(header_str(&resp, "set-cookie").contains("backend-seen=1"));

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["query"], "status=pending&page=2");
    assert_eq!(body["cookie"], format!("session={token}"));
    assert_eq!(body["forwardedHost"], "admin.example.org");
    upstream.stop().await;
}

#[actix_web::test]
async fn test_request_list_mirrors_error_status() {
    let upstream = StubUpstream::start().unwrap();
    let app = stub_gateway_app!(upstream);

    let req = RequestBuilder::api(Method::GET, "/api/requests?status=bogus")
        .to_test_request()
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_json_error(&body, "unknown status");
    upstream.stop().await;
}

#[actix_web::test]
async fn test_request_mutations_reach_their_backend_paths() {
    let upstream = StubUpstream::start().unwrap();
    let app = stub_gateway_app!(upstream);

    let req = RequestBuilder::api(Method::PUT, "/api/requests/REQ-1/status")
        .header("host", "admin.example.org")
        .json_body(json!({"status": "approved"}))
        .to_test_request()
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_status(resp.response(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["path"], "/api/requests/REQ-1/status");
    assert_eq!(body["forwardedHost"], "admin.example.org");
    assert_eq!(body["body"], r#"{"status":"approved"}"#);

    let req = RequestBuilder::api(Method::POST, "/api/requests")
        .header("host", "admin.example.org")
        .json_body(json!({"bulk": true}))
        .to_test_request()
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["method"], "POST");
    assert_eq!(body["path"], "/api/requests");
    assert_eq!(body["forwardedHost"], Value::Null);
    upstream.stop().await;
}

#[actix_web::test]
async fn test_pdf_binary_passthrough() {
    let upstream = StubUpstream::start().unwrap();
    let app = stub_gateway_app!(upstream);

    let req = RequestBuilder::api(Method::GET, "/api/pdf/REQ-1")
        .to_test_request()
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_status(resp.response(), 200);
    assert_eq!(header_str(&resp, "content-type"), "application/pdf");
    assert_eq!(
        header_str(&resp, "content-disposition"),
        "attachment; filename=\"REQ-1.pdf\""
    );
    let body = test::read_body(resp).await;
    assert_eq!(&body[..], STUB_PDF);
    upstream.stop().await;
}

#[actix_web::test]
async fn test_pdf_upstream_failure_keeps_status() {
    let upstream = StubUpstream::start().unwrap();
    let app = stub_gateway_app!(upstream);

    let req = RequestBuilder::api(Method::GET, "/api/pdf/REQ-404")
        .to_test_request()
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_status(resp.response(), 404);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"error": "failed to generate pdf"}));
    upstream.stop().await;
}

#[actix_web::test]
async fn test_officials_reply_is_always_json() {
    let upstream = StubUpstream::start().unwrap();
    let app = stub_gateway_app!(upstream);

    // Plain text becomes a JSON string
    let req = RequestBuilder::api(Method::GET, "/api/backend/officials")
        .to_test_request()
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_status(resp.response(), 200);
    assert!(header_str(&resp, "content-type").starts_with("application/json"));
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!("registrar office"));

    // An empty reply becomes null
    let req = RequestBuilder::api(Method::POST, "/api/backend/officials")
        .to_test_request()
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, Value::Null);

    // JSON passes through unchanged
    let req = RequestBuilder::api(Method::PUT, "/api/backend/officials")
        .json_body(json!({"name": "Dean of Students"}))
        .to_test_request()
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"name": "Dean of Students"}));
    upstream.stop().await;
}

// ===============================
// PAGES
// ===============================

#[actix_web::test]
async fn test_admin_page_served_with_session() {
    let upstream = StubUpstream::start().unwrap();
    let app = stub_gateway_app!(upstream);

    let req = RequestBuilder::browser("/admin/requests?page=2")
        .with_session_token(&TestFixtures::valid_token())
        .to_test_request()
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_status(resp.response(), 200);
    assert_eq!(header_str(&resp, "x-stub-path"), "/admin/requests");
    let body = test::read_body(resp).await;
    assert_eq!(&body[..], STUB_PAGE.as_bytes());
    upstream.stop().await;
}

#[actix_web::test]
async fn test_public_page_served_anonymously() {
    let upstream = StubUpstream::start().unwrap();
    let app = stub_gateway_app!(upstream);

    let req = RequestBuilder::browser("/track/REQ-1").to_test_request().to_request();
    let resp = test::call_service(&app, req).await;

    assert_status(resp.response(), 200);
    assert_eq!(header_str(&resp, "x-stub-path"), "/track/REQ-1");
    upstream.stop().await;
}

#[actix_web::test]
async fn test_disguised_admin_paths_never_reach_frontend() {
    let upstream = StubUpstream::start().unwrap();
    let app = stub_gateway_app!(upstream);

    for uri in ["//admin", "/x/../admin/requests", "/%2e%2e/admin", "/%61dmin"] {
        let req = RequestBuilder::api(Method::GET, uri).to_test_request().to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{uri}");
        assert!(resp.headers().get("x-stub-path").is_none(), "{uri}");
    }

    // Past the gate the path itself is still refused
    for uri in ["//admin", "/x/../admin/requests", "/http://evil.example/steal"] {
        let req = RequestBuilder::api(Method::GET, uri)
            .with_session_token(&TestFixtures::valid_token())
            .to_test_request()
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
        assert!(resp.headers().get(header::CONTENT_TYPE).is_some());
        let body: Value = test::read_body_json(resp).await;
        assert_json_error(&body, "invalid request path");
    }
    upstream.stop().await;
}
