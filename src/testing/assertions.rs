//! Assertion helpers for gateway tests

use actix_web::dev::ServiceResponse;
use actix_web::HttpResponse;
use serde_json::Value;

use crate::models::SessionPayload;
use crate::session::SESSION_COOKIE_NAME;

/// Assert that an HTTP response has the expected status code
///
/// # Panics
///
/// Panics if the response status does not match the expected status code.
pub fn assert_status(response: &HttpResponse, expected_status: u16) {
    assert_eq!(
        response.status().as_u16(),
        expected_status,
        "Expected status {expected_status}, got {}",
        response.status()
    );
}

/// Assert that a service response redirects to `location`
///
/// # Panics
///
/// Panics if the response is not a redirect to `location`.
pub fn assert_redirect_to(response: &ServiceResponse, location: &str) {
    assert!(
        response.status().is_redirection(),
        "Expected redirect, got {}",
        response.status()
    );
    assert_eq!(
        response
            .headers()
            .get("location")
            .and_then(|value| value.to_str().ok()),
        Some(location)
    );
}

/// Return the session cookie a response sets, if any
#[must_use]
pub fn session_cookie_value(response: &ServiceResponse) -> Option<String> {
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        .map(|cookie| cookie.value().to_string())
}

/// Assert that a JSON body is `{"error": expected}` plus optional fields
///
/// # Panics
///
/// Panics if the `error` field is missing or differs.
pub fn assert_json_error(json: &Value, expected: &str) {
    assert_eq!(
        json.get("error").and_then(Value::as_str),
        Some(expected),
        "Expected error '{expected}' in {json}"
    );
}

/// Assert that a payload is an admin session for `username`
///
/// # Panics
///
/// Panics if the subject or user name differ.
pub fn assert_admin_session(payload: &SessionPayload, username: &str) {
    assert_eq!(payload.sub, crate::models::ADMIN_SUBJECT);
    assert_eq!(payload.username, username);
}
