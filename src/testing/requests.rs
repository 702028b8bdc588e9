//! HTTP request builders for testing handlers

use actix_web::cookie::Cookie;
use actix_web::http::Method;
use actix_web::{test, HttpRequest};
use serde_json::Value;

use super::constants::TEST_USER_AGENT;
use crate::session::SESSION_COOKIE_NAME;

/// Builder for creating HTTP requests for testing
pub struct RequestBuilder {
    method: Method,
    uri: String,
    headers: Vec<(String, String)>,
    cookies: Vec<Cookie<'static>>,
    body: Option<Value>,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestBuilder {
    /// Create a new request builder
    #[must_use]
    pub fn new() -> Self {
        Self {
            method: Method::GET,
            uri: "/".to_string(),
            headers: Vec::new(),
            cookies: Vec::new(),
            body: None,
        }
    }

    /// Set the HTTP method
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Set the request URI
    #[must_use]
    pub fn uri(mut self, uri: &str) -> Self {
        self.uri = uri.to_string();
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Set common browser headers
    #[must_use]
    pub fn browser_headers(self) -> Self {
        self.header("User-Agent", TEST_USER_AGENT).header(
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        )
    }

    /// Set common API headers
    #[must_use]
    pub fn api_headers(self) -> Self {
        self.header("User-Agent", "docreq-tests/1.0")
            .header("Accept", "application/json")
    }

    /// Add a cookie to the request
    #[must_use]
    pub fn with_cookie(mut self, cookie: Cookie<'static>) -> Self {
        self.cookies.push(cookie);
        self
    }

    /// Add the session cookie carrying `token`
    #[must_use]
    pub fn with_session_token(self, token: &str) -> Self {
        self.with_cookie(Cookie::new(SESSION_COOKIE_NAME, token.to_string()))
    }

    /// Set JSON body
    #[must_use]
    pub fn json_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Build a `TestRequest` for `call_service`
    #[must_use]
    pub fn to_test_request(self) -> test::TestRequest {
        let mut req = test::TestRequest::default()
            .method(self.method)
            .uri(&self.uri);

        for (name, value) in self.headers {
            req = req.insert_header((name, value));
        }

        for cookie in self.cookies {
            req = req.cookie(cookie);
        }

        if let Some(body) = self.body {
            req = req.set_json(body);
        }

        req
    }

    /// Build the final `HttpRequest`
    #[must_use]
    pub fn build(self) -> HttpRequest {
        self.to_test_request().to_http_request()
    }
}

/// Quick builder functions for common request types
impl RequestBuilder {
    /// A browser-like GET request
    #[must_use]
    pub fn browser(uri: &str) -> Self {
        Self::new().uri(uri).browser_headers()
    }

    /// A JSON API request
    #[must_use]
    pub fn api(method: Method, uri: &str) -> Self {
        Self::new().method(method).uri(uri).api_headers()
    }

    /// A JSON API POST with `body`
    #[must_use]
    pub fn api_post(uri: &str, body: Value) -> Self {
        Self::api(Method::POST, uri).json_body(body)
    }
}
