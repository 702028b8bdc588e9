//! Client for the document request backend.
//!
//! The backend owns students, requests, officials and PDF generation. This
//! gateway only relays to it, plus two calls of its own: admin credential
//! verification at login and the password change.

use log::{debug, warn};
use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::models::{AdminCredentials, BackendPasswordChange};
use crate::utils::headers::RequestHeaderProcessor;
use crate::utils::responses::{build_upstream_url, UpstreamUrlError};

const USER_AGENT: &str = concat!("docreq-gateway/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("cannot build upstream URL: {0}")]
    Url(#[from] UpstreamUrlError),
    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Status and decoded JSON body of a backend reply
#[derive(Debug)]
pub struct BackendReply {
    pub status: reqwest::StatusCode,
    pub body: Value,
}

impl BackendReply {
    /// Read the whole body; an empty body is `null` and non-JSON text is kept
    /// as a JSON string
    async fn read(response: reqwest::Response) -> Result<Self, BackendError> {
        let status = response.status();
        let text = response.text().await?;
        Ok(Self {
            status,
            body: text_to_json(&text),
        })
    }

    /// The backend's `error` field, if it sent one
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.body.get("error").and_then(Value::as_str)
    }
}

/// Interpret a backend body as JSON, falling back to a plain string
#[must_use]
pub fn text_to_json(text: &str) -> Value {
    if text.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Shared HTTP client bound to the backend base URL
#[derive(Clone, Debug)]
pub struct BackendClient {
    base_url: String,
    http: Client,
}

impl BackendClient {
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Start a request to `path_and_query` on the backend
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be built
    pub fn request(&self, method: Method, path_and_query: &str) -> Result<RequestBuilder, BackendError> {
        Ok(self
            .target(method, path_and_query)?
            .header(reqwest::header::USER_AGENT, USER_AGENT))
    }

    fn target(&self, method: Method, path_and_query: &str) -> Result<RequestBuilder, BackendError> {
        let url = build_upstream_url(&self.base_url, path_and_query)?;
        debug!("Upstream {method} {url}");
        Ok(self.http.request(method, url))
    }

    /// Send a prepared request
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached
    pub async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, BackendError> {
        request.send().await.map_err(|e| {
            warn!("Backend request to {} failed: {e}", self.base_url);
            BackendError::Transport(e)
        })
    }

    /// Relay a request to `path_and_query`, copying the headers selected by
    /// `headers` from the incoming request
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be built or the upstream cannot be
    /// reached
    pub async fn forward(
        &self,
        req: &actix_web::HttpRequest,
        method: Method,
        path_and_query: &str,
        headers: &RequestHeaderProcessor,
        body: Option<Vec<u8>>,
    ) -> Result<reqwest::Response, BackendError> {
        // Passthrough keeps the caller's own User-Agent
        let builder = if headers.passthrough {
            self.target(method, path_and_query)?
        } else {
            self.request(method, path_and_query)?
        };
        let mut request = headers.forward_request_headers(req, builder);
        if let Some(body) = body {
            request = request.body(body);
        }
        self.send(request).await
    }

    /// POST a JSON body and read the JSON reply
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached or the body cannot
    /// be read
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
        extra_headers: &[(&str, &str)],
    ) -> Result<BackendReply, BackendError> {
        let mut request = self.request(Method::POST, path)?.json(body);
        for (name, value) in extra_headers {
            request = request.header(*name, *value);
        }
        BackendReply::read(self.send(request).await?).await
    }

    /// Ask the backend whether `username`/`password` are valid admin
    /// credentials; any 2xx reply means yes
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached
    pub async fn verify_admin(&self, username: &str, password: &str) -> Result<bool, BackendError> {
        let credentials = AdminCredentials { username, password };
        let request = self.request(Method::POST, "/api/admin/verify")?.json(&credentials);
        let response = self.send(request).await?;
        Ok(response.status().is_success())
    }

    /// Change the password of `admin_user`
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached or the reply cannot
    /// be read
    pub async fn change_password(
        &self,
        admin_user: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<BackendReply, BackendError> {
        let body = BackendPasswordChange {
            current_password,
            new_password,
        };
        self.post_json(
            "/api/admin/change-password",
            &body,
            &[("X-Admin-User", admin_user)],
        )
        .await
    }
}
