// HTTP request handlers for the document request gateway
pub mod auth;
pub mod health;
pub mod pages;
pub mod proxy;

use actix_web::web;

// Re-export the main handler functions
pub use auth::{change_password, login, logout, me, require_session};
pub use health::health;
pub use pages::{admin_page, frontend_page, FrontendClient};
pub use proxy::{
    download_pdf, forward_requests, list_requests, officials, request_status_method_not_allowed,
    submit, update_request_status,
};

/// Register every gateway route.
///
/// Expects `SessionTokenService`, `CookieFactory`, `BackendClient` and
/// `FrontendClient` as app data.
pub fn configure_services(cfg: &mut web::ServiceConfig) {
    cfg
        // Session endpoints
        .route("/api/login", web::post().to(login))
        .route("/api/logout", web::get().to(logout))
        .route("/api/logout", web::post().to(logout))
        .route("/api/me", web::get().to(me))
        .route("/api/admin/change-password", web::post().to(change_password))
        // Backend relays
        .route("/api/submit", web::post().to(submit))
        .route("/api/requests", web::get().to(list_requests))
        .route("/api/requests", web::put().to(forward_requests))
        .route("/api/requests", web::post().to(forward_requests))
        .route(
            "/api/requests/{id}/status",
            web::put().to(update_request_status),
        )
        .route(
            "/api/requests/{id}/status",
            web::get().to(request_status_method_not_allowed),
        )
        .route("/api/pdf/{id}", web::get().to(download_pdf))
        .route("/api/backend/officials", web::get().to(officials))
        .route("/api/backend/officials", web::post().to(officials))
        .route("/api/backend/officials", web::put().to(officials))
        // Health endpoint
        .route("/ping", web::get().to(health))
        // Admin pages require a session for every method
        .route("/admin", web::route().to(admin_page))
        .route("/admin/{tail:.*}", web::route().to(admin_page))
        // Everything else is a public frontend page
        .default_service(web::route().to(frontend_page));
}
