//! Frontend page passthrough and the admin page gate

use actix_web::{web, HttpRequest, HttpResponse};
use log::{debug, error, warn};

use crate::backend::{BackendClient, BackendError};
use crate::handlers::auth::require_session;
use crate::handlers::proxy::relay_response;
use crate::session::SessionTokenService;
use crate::utils::headers::RequestHeaderProcessor;
use crate::utils::responses::{convert_http_method, ResponseBuilder};

/// Client for the server that renders the public and admin pages
#[derive(Clone, Debug)]
pub struct FrontendClient(pub BackendClient);

impl FrontendClient {
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self(BackendClient::new(base_url))
    }
}

/// Prefix of the pages that need an admin session
const ADMIN_PREFIX: &str = "/admin";

/// Resolve `path` the way an upstream server would before routing it:
/// percent-decoded, backslashes as separators, empty and `.` segments
/// dropped, `..` applied.
#[must_use]
pub fn canonical_path(path: &str) -> String {
    let decoded = urlencoding::decode(path)
        .map_or_else(|_| path.to_string(), std::borrow::Cow::into_owned)
        .replace('\\', "/");

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    format!("/{}", segments.join("/"))
}

/// Whether `path` resolves to `/admin` or anything below it
#[must_use]
pub fn is_admin_path(path: &str) -> bool {
    let canonical = canonical_path(path).to_ascii_lowercase();
    canonical == ADMIN_PREFIX
        || canonical
            .strip_prefix(ADMIN_PREFIX)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// `/admin` and everything below it: only with a valid session
pub async fn admin_page(
    req: HttpRequest,
    body: web::Bytes,
    tokens: web::Data<SessionTokenService>,
    frontend: web::Data<FrontendClient>,
) -> HttpResponse {
    if let Err(rejection) = require_session(&req, &tokens) {
        debug!("Anonymous request for {} rejected", req.path());
        return rejection;
    }
    proxy_to_frontend(&req, body, &frontend).await
}

/// Public pages and assets. Paths that only resolve to `/admin` upstream
/// (`//admin`, `/x/../admin`, `/%61dmin`) are gated like the admin routes.
pub async fn frontend_page(
    req: HttpRequest,
    body: web::Bytes,
    tokens: web::Data<SessionTokenService>,
    frontend: web::Data<FrontendClient>,
) -> HttpResponse {
    if is_admin_path(req.path()) {
        return admin_page(req, body, tokens, frontend).await;
    }
    proxy_to_frontend(&req, body, &frontend).await
}

async fn proxy_to_frontend(
    req: &HttpRequest,
    body: web::Bytes,
    frontend: &FrontendClient,
) -> HttpResponse {
    let method = match convert_http_method(req.method()) {
        Ok(method) => method,
        Err(response) => return response,
    };

    let path_and_query = match req.query_string() {
        "" => req.path().to_string(),
        query => format!("{}?{query}", req.path()),
    };
    let body = (!body.is_empty()).then(|| body.to_vec());

    let result = match frontend
        .0
        .forward(
            req,
            method,
            &path_and_query,
            &RequestHeaderProcessor::for_passthrough(),
            body,
        )
        .await
    {
        Ok(upstream) => relay_response(upstream).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(response) => response,
        Err(BackendError::Url(e)) => {
            warn!("Refused to proxy {path_and_query}: {e}");
            ResponseBuilder::bad_request()
                .with_message("invalid request path")
                .build()
        }
        Err(e) => {
            error!("Frontend proxy error for {path_and_query}: {e}");
            ResponseBuilder::bad_gateway()
                .with_message("frontend unavailable")
                .build()
        }
    }
}
