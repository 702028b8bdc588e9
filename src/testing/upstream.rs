//! Stub backend and frontend served on a loopback port
//!
//! One server answers both roles: the backend API routes the gateway relays
//! to, and a catch-all page for the frontend passthrough.

use std::net::TcpListener;

use actix_web::dev::ServerHandle;
use actix_web::{http::header, web, App, HttpRequest, HttpResponse, HttpServer};
use serde_json::{json, Value};

use super::constants::TEST_USERNAME;
use crate::backend::BackendClient;
use crate::handlers::FrontendClient;

/// Password the stub accepts for [`TEST_USERNAME`]
pub const STUB_PASSWORD: &str = "correct-horse";

/// Current password the stub expects on a password change
pub const STUB_CURRENT_PASSWORD: &str = "old-secret";

/// Document served for request `REQ-1`
pub const STUB_PDF: &[u8] = b"%PDF-1.4\n%\xe2\xe3\xcf\xd3\n1 0 obj\n<<>>\nendobj\n";

/// Body of every frontend page
pub const STUB_PAGE: &str = "<html><body>stub page</body></html>";

/// A running stub upstream
pub struct StubUpstream {
    url: String,
    handle: ServerHandle,
}

impl StubUpstream {
    /// Bind `127.0.0.1:0` and serve the stub routes on the current runtime
    ///
    /// # Errors
    ///
    /// Returns an error if the loopback listener cannot be bound
    pub fn start() -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;

        let server = HttpServer::new(|| {
            App::new()
                .configure(stub_routes)
                .default_service(web::route().to(stub_page))
        })
        .workers(1)
        .disable_signals()
        .shutdown_timeout(0)
        .listen(listener)?
        .run();

        let handle = server.handle();
        actix_web::rt::spawn(server);

        Ok(Self {
            url: format!("http://{addr}"),
            handle,
        })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Backend client pointed at the stub
    #[must_use]
    pub fn backend(&self) -> BackendClient {
        BackendClient::new(&self.url)
    }

    /// Frontend client pointed at the stub
    #[must_use]
    pub fn frontend(&self) -> FrontendClient {
        FrontendClient::new(&self.url)
    }

    pub async fn stop(self) {
        self.handle.stop(false).await;
    }
}

fn stub_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/admin/verify", web::post().to(verify))
        .route("/api/admin/change-password", web::post().to(change_password))
        .route("/api/submit", web::post().to(submit))
        .route("/api/requests", web::get().to(list_requests))
        .route("/api/requests", web::put().to(echo_request))
        .route("/api/requests", web::post().to(echo_request))
        .route("/api/requests/{id}/status", web::put().to(echo_request))
        .route("/api/pdf/{id}", web::get().to(pdf))
        .route("/api/officials", web::get().to(officials_text))
        .route("/api/officials", web::post().to(officials_empty))
        .route("/api/officials", web::put().to(officials_echo));
}

fn header_value(req: &HttpRequest, name: &str) -> Value {
    req.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map_or(Value::Null, |value| Value::String(value.to_string()))
}

async fn verify(body: web::Json<Value>) -> HttpResponse {
    if body["username"] == TEST_USERNAME && body["password"] == STUB_PASSWORD {
        HttpResponse::Ok().json(json!({"ok": true}))
    } else {
        HttpResponse::Unauthorized().json(json!({"error": "invalid credentials"}))
    }
}

async fn change_password(req: HttpRequest, body: web::Json<Value>) -> HttpResponse {
    if header_value(&req, "x-admin-user") != TEST_USERNAME {
        return HttpResponse::Forbidden().json(json!({"error": "unknown admin"}));
    }
    if body["current_password"] != STUB_CURRENT_PASSWORD {
        return HttpResponse::BadRequest().json(json!({"error": "current password is incorrect"}));
    }
    HttpResponse::Ok().json(json!({"message": "updated"}))
}

async fn submit(body: web::Json<Value>) -> HttpResponse {
    HttpResponse::Created().json(json!({"received": body.into_inner()}))
}

/// Echoes what the gateway forwarded. `status=bogus` is refused with 422.
async fn list_requests(req: HttpRequest) -> HttpResponse {
    if req.query_string().contains("status=bogus") {
        return HttpResponse::UnprocessableEntity().json(json!({"error": "unknown status"}));
    }
    HttpResponse::Ok()
        .insert_header(("x-total-count", "2"))
        .append_header((header::SET_COOKIE, "backend-seen=1; Path=/"))
        .json(json!({
            "query": req.query_string(),
            "cookie": header_value(&req, "cookie"),
            "forwardedHost": header_value(&req, "x-forwarded-host"),
        }))
}

async fn echo_request(req: HttpRequest, body: web::Bytes) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "method": req.method().as_str(),
        "path": req.path(),
        "body": String::from_utf8_lossy(&body),
        "forwardedHost": header_value(&req, "x-forwarded-host"),
    }))
}

async fn pdf(req: HttpRequest) -> HttpResponse {
    if req.match_info().get("id") != Some("REQ-1") {
        return HttpResponse::NotFound().json(json!({"error": "no such request"}));
    }
    HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, "application/pdf"))
        .insert_header((
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"REQ-1.pdf\"",
        ))
        .body(STUB_PDF)
}

async fn officials_text() -> HttpResponse {
    HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, "text/plain"))
        .body("registrar office")
}

async fn officials_empty() -> HttpResponse {
    HttpResponse::Ok().finish()
}

async fn officials_echo(body: web::Bytes) -> HttpResponse {
    HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .body(body)
}

async fn stub_page(req: HttpRequest) -> HttpResponse {
    HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, "text/html; charset=utf-8"))
        .insert_header(("x-stub-path", req.path().to_string()))
        .body(STUB_PAGE)
}
