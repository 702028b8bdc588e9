//! HTTP response handling system
//!
//! A single entry point for the JSON error bodies, redirects and upstream URL
//! helpers used by the gateway handlers. Common bodies are serialized once
//! and reused.

use actix_web::{cookie::Cookie, http::header, http::StatusCode, HttpResponse};
use serde_json::{json, Value};

// ===============================
// CACHED RESPONSES FOR PERFORMANCE
// ===============================

static CACHED_RESPONSES: std::sync::LazyLock<CachedResponses> =
    std::sync::LazyLock::new(CachedResponses::new);

/// Pre-serialized bodies for errors returned on hot paths
struct CachedResponses {
    unauthorized: String,
    bad_request: String,
    server_error: String,
    bad_gateway: String,
    proxy_error: String,
    method_not_allowed: String,
}

impl CachedResponses {
    fn new() -> Self {
        Self {
            unauthorized: Self::create_json("unauthorized"),
            bad_request: Self::create_json("bad request"),
            server_error: Self::create_json("internal server error"),
            bad_gateway: Self::create_json("Backend forwarding failed"),
            proxy_error: Self::create_json("proxy error"),
            method_not_allowed: Self::create_json("method not allowed"),
        }
    }

    fn create_json(error: &str) -> String {
        json!({ "error": error }).to_string()
    }

    fn respond(status: StatusCode, body: &str) -> HttpResponse {
        HttpResponse::build(status)
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .body(body.to_owned())
    }
}

/// Unified response builder that handles all types of HTTP responses
pub struct ResponseBuilder;

impl ResponseBuilder {
    // ===============================
    // ERROR RESPONSE METHODS
    // ===============================

    /// `{"error": message}` with an arbitrary status
    #[must_use]
    pub fn error(status: StatusCode) -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(status)
    }

    #[must_use]
    pub fn bad_request() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(StatusCode::BAD_REQUEST)
    }

    #[must_use]
    pub fn unauthorized() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(StatusCode::UNAUTHORIZED)
    }

    #[must_use]
    pub fn internal_server_error() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(StatusCode::INTERNAL_SERVER_ERROR)
    }

    #[must_use]
    pub fn bad_gateway() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(StatusCode::BAD_GATEWAY)
    }

    #[must_use]
    pub fn method_not_allowed() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(StatusCode::METHOD_NOT_ALLOWED)
    }

    /// 500 `{"error":"proxy error"}` used when a relay fails locally
    #[must_use]
    pub fn proxy_error() -> HttpResponse {
        CachedResponses::respond(
            StatusCode::INTERNAL_SERVER_ERROR,
            &CACHED_RESPONSES.proxy_error,
        )
    }

    // ===============================
    // SUCCESS RESPONSE METHODS
    // ===============================

    /// Create a redirect response (302 Found) with optional cookies
    #[must_use]
    pub fn redirect(location: &str) -> RedirectBuilder {
        RedirectBuilder::new(location)
    }

    /// 200 with a JSON body
    #[must_use]
    pub fn ok_json<T: serde::Serialize>(data: &T) -> HttpResponse {
        HttpResponse::Ok().json(data)
    }
}

// ===============================
// BUILDER TYPES
// ===============================

/// Builder for error responses with fluent interface
pub struct ErrorResponseBuilder {
    status: StatusCode,
    message: Option<String>,
    additional_fields: Option<Value>,
}

impl ErrorResponseBuilder {
    fn new(status: StatusCode) -> Self {
        Self {
            status,
            message: None,
            additional_fields: None,
        }
    }

    /// Set the `error` message
    #[must_use]
    pub fn with_message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }

    /// Add additional JSON fields to the response
    #[must_use]
    pub fn with_additional_fields(mut self, fields: Value) -> Self {
        self.additional_fields = Some(fields);
        self
    }

    /// Build the final `HttpResponse`
    #[must_use]
    pub fn build(self) -> HttpResponse {
        if self.message.is_none() && self.additional_fields.is_none() {
            if let Some(cached) = self.cached_body() {
                return CachedResponses::respond(self.status, cached);
            }
        }
        self.build_custom_response()
    }

    fn cached_body(&self) -> Option<&'static str> {
        let cached = &*CACHED_RESPONSES;
        match self.status {
            StatusCode::UNAUTHORIZED => Some(&cached.unauthorized),
            StatusCode::BAD_REQUEST => Some(&cached.bad_request),
            StatusCode::INTERNAL_SERVER_ERROR => Some(&cached.server_error),
            StatusCode::BAD_GATEWAY => Some(&cached.bad_gateway),
            StatusCode::METHOD_NOT_ALLOWED => Some(&cached.method_not_allowed),
            _ => None,
        }
    }

    fn build_custom_response(self) -> HttpResponse {
        let message = self.message.unwrap_or_else(|| {
            self.status
                .canonical_reason()
                .unwrap_or("error")
                .to_lowercase()
        });
        let mut json_body = json!({ "error": message });

        if let Some(Value::Object(map)) = self.additional_fields {
            for (key, value) in map {
                json_body[key] = value;
            }
        }

        HttpResponse::build(self.status)
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .json(json_body)
    }
}

/// Builder for redirect responses
pub struct RedirectBuilder {
    location: String,
    cookies: Vec<Cookie<'static>>,
    status: StatusCode,
}

impl RedirectBuilder {
    fn new(location: &str) -> Self {
        Self {
            location: location.to_string(),
            cookies: Vec::new(),
            status: StatusCode::FOUND,
        }
    }

    /// Add a cookie to the redirect response
    #[must_use]
    pub fn with_cookie(mut self, cookie: Cookie<'static>) -> Self {
        self.cookies.push(cookie);
        self
    }

    /// Use 303 See Other so a POST is followed by a GET
    #[must_use]
    pub fn see_other(mut self) -> Self {
        self.status = StatusCode::SEE_OTHER;
        self
    }

    #[must_use]
    pub fn build(self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status);
        for cookie in self.cookies {
            builder.cookie(cookie);
        }
        builder
            .append_header((header::LOCATION, self.location))
            .finish()
    }
}

// ===============================
// UTILITY FUNCTIONS
// ===============================

/// Convert Actix HTTP method to reqwest method
///
/// # Errors
///
/// Returns an `HttpResponse` error if the HTTP method is not supported
pub fn convert_http_method(
    method: &actix_web::http::Method,
) -> Result<reqwest::Method, HttpResponse> {
    match method.as_str() {
        "GET" => Ok(reqwest::Method::GET),
        "POST" => Ok(reqwest::Method::POST),
        "PUT" => Ok(reqwest::Method::PUT),
        "DELETE" => Ok(reqwest::Method::DELETE),
        "PATCH" => Ok(reqwest::Method::PATCH),
        "HEAD" => Ok(reqwest::Method::HEAD),
        "OPTIONS" => Ok(reqwest::Method::OPTIONS),
        _ => Err(ResponseBuilder::method_not_allowed().build()),
    }
}

/// Why a request path could not be mapped onto an upstream URL
#[derive(Debug, thiserror::Error)]
pub enum UpstreamUrlError {
    #[error("invalid upstream URL: {0}")]
    Parse(#[from] url::ParseError),
    #[error("path traversal or URL protocol in request path: {0}")]
    UnsafePath(String),
    #[error("request URL {0} does not match the configured upstream")]
    OutsideBase(String),
}

/// Whether `path` names exactly one location below the root.
///
/// Rejects `.`/`..` segments and empty segments (`//`). Also rejects embedded
/// URL schemes, control characters, backslashes and their percent-encoded
/// forms along with encoded dots. Only the trailing segment may be empty.
#[must_use]
pub fn is_safe_request_path(path: &str) -> bool {
    let lowered = path.to_ascii_lowercase();
    if lowered.contains("://")
        || lowered.chars().any(char::is_control)
        || lowered.contains('\\')
        || lowered.contains("%2e")
        || lowered.contains("%5c")
    {
        return false;
    }

    let segments: Vec<&str> = path.strip_prefix('/').unwrap_or(path).split('/').collect();
    let last = segments.len() - 1;
    segments.iter().enumerate().all(|(i, segment)| {
        *segment != "." && *segment != ".." && (i == last || !segment.is_empty())
    })
}

/// Join an admin-configured base URL with a request path (and optional query).
///
/// The path is checked with [`is_safe_request_path`] before joining, and the
/// result must keep the base's scheme, host, port and path prefix.
///
/// # Errors
///
/// Returns an error if the base URL cannot be parsed, the path is unsafe, or
/// the joined URL leaves the base
pub fn build_upstream_url(
    base_url: &str,
    path_and_query: &str,
) -> Result<String, UpstreamUrlError> {
    use log::{debug, warn};
    use url::Url;

    let path = path_and_query
        .split_once('?')
        .map_or(path_and_query, |(path, _)| path);
    if !is_safe_request_path(path) {
        warn!("Rejected unsafe upstream path: {path}");
        return Err(UpstreamUrlError::UnsafePath(path.to_string()));
    }

    // A trailing slash keeps any base path segment; "./" keeps a first
    // segment containing ':' from parsing as a scheme
    let base = Url::parse(&format!("{}/", base_url.trim_end_matches('/')))?;
    let relative = format!("./{}", path_and_query.trim_start_matches('/'));
    let final_url = base.join(&relative)?;

    if final_url.scheme() != base.scheme()
        || final_url.host_str() != base.host_str()
        || final_url.port_or_known_default() != base.port_or_known_default()
        || !final_url.path().starts_with(base.path())
    {
        warn!("Upstream URL {final_url} escapes base {base}");
        return Err(UpstreamUrlError::OutsideBase(final_url.to_string()));
    }

    debug!("Built upstream URL: {final_url}");
    Ok(final_url.to_string())
}

/// Map a reqwest status onto the actix equivalent
#[must_use]
pub fn convert_status(status: reqwest::StatusCode) -> StatusCode {
    StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_json(response: HttpResponse) -> Value {
        let bytes = to_bytes(response.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[actix_web::test]
    async fn test_cached_error_bodies() {
        let response = ResponseBuilder::unauthorized().build();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await, json!({"error": "unauthorized"}));

        let response = ResponseBuilder::method_not_allowed().build();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            body_json(response).await,
            json!({"error": "method not allowed"})
        );

        let response = ResponseBuilder::proxy_error();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await, json!({"error": "proxy error"}));
    }

    #[actix_web::test]
    async fn test_custom_error_with_fields() {
        let response = ResponseBuilder::bad_gateway()
            .with_message("proxy error")
            .with_additional_fields(json!({"detail": "connection refused"}))
            .build();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            body_json(response).await,
            json!({"error": "proxy error", "detail": "connection refused"})
        );
    }

    #[actix_web::test]
    async fn test_uncached_status_uses_reason_phrase() {
        let response = ResponseBuilder::error(StatusCode::FORBIDDEN).build();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(response).await, json!({"error": "forbidden"}));
    }

    #[test]
    fn test_see_other_redirect() {
        let response = ResponseBuilder::redirect("/")
            .with_cookie(Cookie::new("session", ""))
            .see_other()
            .build();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");
        assert!(response.headers().get(header::SET_COOKIE).is_some());
    }

    #[test]
    fn test_convert_http_method() {
        assert_eq!(
            convert_http_method(&actix_web::http::Method::PUT).unwrap(),
            reqwest::Method::PUT
        );
        assert!(convert_http_method(&actix_web::http::Method::TRACE).is_err());
    }

    #[test]
    fn test_upstream_url_building() {
        assert_eq!(
            build_upstream_url("http://backend:8080/", "/api/requests?page=2").unwrap(),
            "http://backend:8080/api/requests?page=2"
        );
        assert_eq!(
            build_upstream_url("http://host/base", "/api/submit").unwrap(),
            "http://host/base/api/submit"
        );
        assert!(build_upstream_url("not a url", "/x").is_err());
    }

    #[test]
    fn test_upstream_url_rejects_traversal_and_foreign_hosts() {
        for path in [
            "//admin",
            "/x/../admin",
            "/./admin",
            "/%2e%2e/admin",
            "/%2E./admin",
            "/http://evil.example/steal",
            "/x\\..\\admin",
        ] {
            assert!(
                matches!(
                    build_upstream_url("http://frontend:3000", path),
                    Err(UpstreamUrlError::UnsafePath(_))
                ),
                "expected {path:?} to be rejected"
            );
        }
    }

    #[test]
    fn test_upstream_url_stays_under_base() {
        // A scheme-like first segment is a path, not a new URL
        assert_eq!(
            build_upstream_url("http://frontend:3000", "/javascript:alert").unwrap(),
            "http://frontend:3000/javascript:alert"
        );
        // Traversal-looking text in the query is not part of the path
        assert_eq!(
            build_upstream_url("http://host/base", "/track?next=../admin//x").unwrap(),
            "http://host/base/track?next=../admin//x"
        );
        assert_eq!(
            build_upstream_url("http://frontend:3000", "/admin/").unwrap(),
            "http://frontend:3000/admin/"
        );
    }

    #[test]
    fn test_safe_request_paths() {
        assert!(is_safe_request_path("/"));
        assert!(is_safe_request_path("/admin/requests/REQ-1"));
        assert!(is_safe_request_path("/_next/static/app.js"));
        assert!(is_safe_request_path("/file.v2.tar.gz"));
        assert!(!is_safe_request_path("/admin//x"));
        assert!(!is_safe_request_path("/admin/.."));
    }
}
