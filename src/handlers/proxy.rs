//! Relays from the public gateway to the document request backend.
//!
//! The gateway does not interpret request data. Each route picks which
//! incoming headers travel upstream and mirrors what the backend answers.

use actix_web::{http::header, web, HttpRequest, HttpResponse};
use log::{error, warn};
use reqwest::Method;
use serde_json::{json, Value};

use crate::backend::{text_to_json, BackendClient, BackendError};
use crate::utils::headers::{forward_response_headers, RequestHeaderProcessor};
use crate::utils::responses::{convert_status, ResponseBuilder};

/// Append the raw query string, if any, to `path`
fn path_with_query(path: &str, query: &str) -> String {
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{query}")
    }
}

/// Mirror an upstream response: status, end-to-end headers and body bytes
///
/// # Errors
///
/// Returns an error if the upstream body cannot be read
pub async fn relay_response(upstream: reqwest::Response) -> Result<HttpResponse, BackendError> {
    let mut response_builder = HttpResponse::build(convert_status(upstream.status()));
    forward_response_headers(upstream.headers(), &mut response_builder);
    let body = upstream.bytes().await?;
    Ok(response_builder.body(body))
}

/// `POST /api/submit`: public request form submission
pub async fn submit(
    req: HttpRequest,
    body: web::Bytes,
    backend: web::Data<BackendClient>,
) -> HttpResponse {
    match forward_submission(&req, &body, &backend).await {
        Ok(response) => response,
        Err(detail) => {
            error!("Submit proxy error: {detail}");
            ResponseBuilder::bad_gateway()
                .with_message("proxy error")
                .with_additional_fields(json!({ "detail": detail }))
                .build()
        }
    }
}

async fn forward_submission(
    req: &HttpRequest,
    body: &[u8],
    backend: &BackendClient,
) -> Result<HttpResponse, String> {
    let submission: Value = serde_json::from_slice(body).map_err(|e| e.to_string())?;
    let payload = serde_json::to_vec(&submission).map_err(|e| e.to_string())?;

    let headers = RequestHeaderProcessor {
        content_type: Some("application/json"),
        ..RequestHeaderProcessor::default()
    };
    let upstream = backend
        .forward(req, Method::POST, "/api/submit", &headers, Some(payload))
        .await
        .map_err(|e| e.to_string())?;

    let status = convert_status(upstream.status());
    let content_type = upstream
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("application/json")
        .to_string();
    let text = upstream.text().await.map_err(|e| e.to_string())?;

    Ok(HttpResponse::build(status)
        .insert_header((header::CONTENT_TYPE, content_type))
        .body(text))
}

/// `GET /api/requests`: admin list with the caller's query string
pub async fn list_requests(req: HttpRequest, backend: web::Data<BackendClient>) -> HttpResponse {
    let headers = RequestHeaderProcessor {
        forward_cookie: true,
        forward_host: true,
        ..RequestHeaderProcessor::default()
    };
    let path = path_with_query("/api/requests", req.query_string());
    relay_or_proxy_error(&req, &backend, Method::GET, &path, &headers, None).await
}

/// `PUT|POST /api/requests`: forwarded to the same backend path
pub async fn forward_requests(
    req: HttpRequest,
    body: web::Bytes,
    backend: web::Data<BackendClient>,
) -> HttpResponse {
    let Ok(method) = crate::utils::responses::convert_http_method(req.method()) else {
        return ResponseBuilder::method_not_allowed().build();
    };
    let path = path_with_query(req.path(), req.query_string());
    relay_or_proxy_error(
        &req,
        &backend,
        method,
        &path,
        &RequestHeaderProcessor::for_mutation(false),
        Some(body.to_vec()),
    )
    .await
}

/// `PUT /api/requests/{id}/status`
pub async fn update_request_status(
    req: HttpRequest,
    body: web::Bytes,
    backend: web::Data<BackendClient>,
) -> HttpResponse {
    let path = path_with_query(req.path(), req.query_string());
    relay_or_proxy_error(
        &req,
        &backend,
        Method::PUT,
        &path,
        &RequestHeaderProcessor::for_mutation(true),
        Some(body.to_vec()),
    )
    .await
}

/// `GET /api/requests/{id}/status` is not a read endpoint
pub async fn request_status_method_not_allowed() -> HttpResponse {
    ResponseBuilder::method_not_allowed().build()
}

async fn relay_or_proxy_error(
    req: &HttpRequest,
    backend: &BackendClient,
    method: Method,
    path: &str,
    headers: &RequestHeaderProcessor,
    body: Option<Vec<u8>>,
) -> HttpResponse {
    let result = match backend.forward(req, method, path, headers, body).await {
        Ok(upstream) => relay_response(upstream).await,
        Err(e) => Err(e),
    };
    result.unwrap_or_else(|e| {
        error!("Proxy error for {path}: {e}");
        ResponseBuilder::proxy_error()
    })
}

/// `GET /api/pdf/{id}`: generated request document
pub async fn download_pdf(
    req: HttpRequest,
    id: web::Path<String>,
    backend: web::Data<BackendClient>,
) -> HttpResponse {
    let path = format!("/api/pdf/{}", urlencoding::encode(&id));
    let upstream = match backend
        .forward(&req, Method::GET, &path, &RequestHeaderProcessor::cookie_only(), None)
        .await
    {
        Ok(upstream) => upstream,
        Err(e) => {
            error!("PDF proxy error: {e}");
            return ResponseBuilder::proxy_error();
        }
    };

    if !upstream.status().is_success() {
        warn!("Backend could not generate PDF {id}: {}", upstream.status());
        return ResponseBuilder::error(convert_status(upstream.status()))
            .with_message("failed to generate pdf")
            .build();
    }

    relay_response(upstream).await.unwrap_or_else(|e| {
        error!("PDF proxy error: {e}");
        ResponseBuilder::proxy_error()
    })
}

/// `GET|POST|PUT /api/backend/officials`: JSON relay to `/api/officials`
pub async fn officials(
    req: HttpRequest,
    body: web::Bytes,
    backend: web::Data<BackendClient>,
) -> HttpResponse {
    let Ok(method) = crate::utils::responses::convert_http_method(req.method()) else {
        return ResponseBuilder::method_not_allowed().build();
    };

    // Bodies that are not JSON are dropped rather than rejected
    let payload = serde_json::from_slice::<Value>(&body)
        .ok()
        .and_then(|value| serde_json::to_vec(&value).ok());

    let headers = RequestHeaderProcessor {
        content_type: Some("application/json"),
        ..RequestHeaderProcessor::default()
    };

    let reply = match backend
        .forward(&req, method, "/api/officials", &headers, payload)
        .await
    {
        Ok(upstream) => {
            let status = convert_status(upstream.status());
            upstream.text().await.map(|text| (status, text_to_json(&text)))
        }
        Err(e) => {
            error!("Officials forwarding error: {e}");
            return ResponseBuilder::bad_gateway().build();
        }
    };

    match reply {
        Ok((status, data)) => HttpResponse::build(status).json(data),
        Err(e) => {
            error!("Officials forwarding error: {e}");
            ResponseBuilder::bad_gateway().build()
        }
    }
}
