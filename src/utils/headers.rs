//! HTTP header processing for the backend relays

use actix_web::{http::header, HttpRequest, HttpResponseBuilder};
use reqwest::RequestBuilder;

/// Determine if a request came from a browser vs an API client
/// Browsers typically send Accept headers that include text/html
#[must_use]
pub fn is_browser_request(req: &HttpRequest) -> bool {
    if let Some(accept_header) = req.headers().get(header::ACCEPT) {
        if let Ok(accept_str) = accept_header.to_str() {
            return accept_str.contains("text/html")
                || accept_str.contains("application/xhtml+xml");
        }
    }

    // Fallback: check User-Agent for common browser patterns
    if let Some(user_agent) = req.headers().get(header::USER_AGENT) {
        if let Ok(ua_str) = user_agent.to_str() {
            let ua_lower = ua_str.to_lowercase();
            return ua_lower.contains("mozilla")
                || ua_lower.contains("chrome")
                || ua_lower.contains("safari")
                || ua_lower.contains("firefox")
                || ua_lower.contains("edge");
        }
    }

    false
}

/// Check if a header is a hop-by-hop header that should not be forwarded
///
/// Based on RFC 2616 Section 13.5.1
#[must_use]
pub fn is_hop_by_hop_header(name: &str) -> bool {
    matches!(
        name.to_lowercase().as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailers"
            | "transfer-encoding"
            | "upgrade"
    )
}

// ===============================
// REQUEST HEADER FORWARDING
// ===============================

/// Which incoming headers a relay passes upstream.
///
/// Backend routes forward a fixed, small set; everything else is dropped.
/// Frontend page requests use `passthrough` and forward every end-to-end
/// header instead.
#[derive(Debug, Clone, Default)]
pub struct RequestHeaderProcessor {
    /// Forward everything except hop-by-hop headers, `Host` and
    /// `Content-Length`
    pub passthrough: bool,
    /// Forward the raw `Cookie` header
    pub forward_cookie: bool,
    /// Send the incoming `Host` as `x-forwarded-host`
    pub forward_host: bool,
    /// Forward `Content-Type`, using this value when the request has none
    pub content_type: Option<&'static str>,
}

impl RequestHeaderProcessor {
    /// Cookie only (list and PDF relays)
    #[must_use]
    pub fn cookie_only() -> Self {
        Self {
            forward_cookie: true,
            ..Self::default()
        }
    }

    /// Cookie, content type and forwarded host (mutating relays)
    #[must_use]
    pub fn for_mutation(forward_host: bool) -> Self {
        Self {
            forward_cookie: true,
            forward_host,
            content_type: Some("application/json"),
            ..Self::default()
        }
    }

    /// All end-to-end headers (frontend pages)
    #[must_use]
    pub fn for_passthrough() -> Self {
        Self {
            passthrough: true,
            ..Self::default()
        }
    }

    /// Copy the configured headers from `req` onto `request_builder`
    pub fn forward_request_headers(
        &self,
        req: &HttpRequest,
        mut request_builder: RequestBuilder,
    ) -> RequestBuilder {
        if self.passthrough {
            for (name, value) in req.headers() {
                let name_str = name.as_str();
                if is_hop_by_hop_header(name_str)
                    || name_str == "host"
                    || name_str == "content-length"
                {
                    continue;
                }
                if let Ok(value_str) = value.to_str() {
                    request_builder = request_builder.header(name_str, value_str);
                }
            }
            return request_builder;
        }

        if self.forward_cookie {
            if let Some(cookie) = header_str(req, header::COOKIE) {
                request_builder = request_builder.header(reqwest::header::COOKIE, cookie);
            }
        }

        if self.forward_host {
            if let Some(host) = header_str(req, header::HOST) {
                request_builder = request_builder.header("x-forwarded-host", host);
            }
        }

        if let Some(default_type) = self.content_type {
            let content_type = header_str(req, header::CONTENT_TYPE).unwrap_or(default_type);
            request_builder = request_builder.header(reqwest::header::CONTENT_TYPE, content_type);
        }

        request_builder
    }
}

fn header_str(req: &HttpRequest, name: header::HeaderName) -> Option<&str> {
    req.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
}

// ===============================
// RESPONSE HEADER FORWARDING
// ===============================

/// Copy upstream headers onto the client response, skipping hop-by-hop
/// headers.
///
/// `content-length` is dropped because actix sets it from the body it
/// actually sends.
pub fn forward_response_headers(
    upstream_headers: &reqwest::header::HeaderMap,
    response_builder: &mut HttpResponseBuilder,
) {
    for (name, value) in upstream_headers {
        let name_str = name.as_str();
        if is_hop_by_hop_header(name_str) || name_str.eq_ignore_ascii_case("content-length") {
            continue;
        }
        if let Ok(value_str) = value.to_str() {
            response_builder.append_header((name_str, value_str));
        }
    }
}
