use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use log::{error, info, warn};
use serde_json::json;

use crate::backend::BackendClient;
use crate::models::{ChangePasswordRequest, LoginRequest, MeResponse, SessionPayload};
use crate::session::{session_from_request, CookieFactory, SessionTokenService};
use crate::utils::headers::is_browser_request;
use crate::utils::responses::ResponseBuilder;

/// Where anonymous page views are sent
pub const LOGIN_PATH: &str = "/login";

/// Minimum length accepted for a new admin password
pub const MIN_PASSWORD_LEN: usize = 6;

/// Authenticate `req` or produce the rejection for an anonymous caller:
/// a redirect to the login page for browsers, 401 JSON otherwise.
///
/// # Errors
///
/// Returns the rejection response when the request carries no valid session
pub fn require_session(
    req: &HttpRequest,
    tokens: &SessionTokenService,
) -> Result<SessionPayload, HttpResponse> {
    session_from_request(req, tokens).ok_or_else(|| {
        if is_browser_request(req) {
            ResponseBuilder::redirect(LOGIN_PATH).build()
        } else {
            ResponseBuilder::unauthorized().build()
        }
    })
}

/// `POST /api/login`
///
/// Verifies the credentials with the backend, then issues a signed session
/// cookie valid for the configured session lifetime.
pub async fn login(
    body: web::Bytes,
    backend: web::Data<BackendClient>,
    tokens: web::Data<SessionTokenService>,
    cookies: web::Data<CookieFactory>,
) -> HttpResponse {
    let Ok(request) = serde_json::from_slice::<LoginRequest>(&body) else {
        return ResponseBuilder::bad_request().build();
    };

    let (Some(username), Some(password)) = (
        request.username.filter(|u| !u.is_empty()),
        request.password.filter(|p| !p.is_empty()),
    ) else {
        return ResponseBuilder::bad_request()
            .with_message("missing credentials")
            .build();
    };

    match backend.verify_admin(&username, &password).await {
        Ok(true) => {}
        Ok(false) => {
            info!("Rejected login for '{username}'");
            return ResponseBuilder::unauthorized()
                .with_message("invalid credentials")
                .build();
        }
        Err(e) => {
            error!("Login error: {e}");
            return ResponseBuilder::bad_gateway()
                .with_message("authentication backend unavailable")
                .build();
        }
    }

    let payload = SessionPayload::admin(
        &username,
        Utc::now().timestamp(),
        cookies.session_lifetime_secs(),
    );
    let token = match tokens.create_session_token(&payload) {
        Ok(token) => token,
        Err(e) => {
            error!("Failed to create session token: {e}");
            return ResponseBuilder::internal_server_error().build();
        }
    };

    info!("Admin '{username}' signed in");
    HttpResponse::Ok()
        .cookie(cookies.create_session_cookie(token))
        .json(json!({ "ok": true }))
}

/// `GET|POST /api/logout`: clear the cookie and send the browser home
pub async fn logout(cookies: web::Data<CookieFactory>) -> HttpResponse {
    ResponseBuilder::redirect("/")
        .with_cookie(cookies.create_expired_cookie())
        .see_other()
        .build()
}

/// `GET /api/me`: report the current session, if any
pub async fn me(req: HttpRequest, tokens: web::Data<SessionTokenService>) -> HttpResponse {
    match session_from_request(&req, &tokens) {
        Some(session) => ResponseBuilder::ok_json(&MeResponse {
            authenticated: true,
            session: Some(session),
        }),
        None => HttpResponse::Unauthorized().json(MeResponse {
            authenticated: false,
            session: None,
        }),
    }
}

/// `POST /api/admin/change-password`
pub async fn change_password(
    req: HttpRequest,
    body: web::Bytes,
    backend: web::Data<BackendClient>,
    tokens: web::Data<SessionTokenService>,
) -> HttpResponse {
    let Some(session) = session_from_request(&req, &tokens) else {
        return ResponseBuilder::unauthorized().build();
    };

    let Ok(request) = serde_json::from_slice::<ChangePasswordRequest>(&body) else {
        return ResponseBuilder::bad_request().build();
    };

    let (Some(current), Some(new)) = (
        request.current_password.filter(|p| !p.is_empty()),
        request.new_password.filter(|p| !p.is_empty()),
    ) else {
        return ResponseBuilder::bad_request()
            .with_message("current password and new password are required")
            .build();
    };

    if new.chars().count() < MIN_PASSWORD_LEN {
        return ResponseBuilder::bad_request()
            .with_message("new password must be at least 6 characters long")
            .build();
    }

    let admin_user = if session.username.is_empty() {
        crate::models::ADMIN_SUBJECT
    } else {
        session.username.as_str()
    };

    match backend.change_password(admin_user, &current, &new).await {
        Ok(reply) if reply.status.is_success() => {
            info!("Password changed for '{admin_user}'");
            ResponseBuilder::ok_json(&json!({ "message": "password changed successfully" }))
        }
        Ok(reply) => {
            warn!(
                "Backend refused password change for '{admin_user}': {}",
                reply.status
            );
            let message = reply
                .error_message()
                .unwrap_or("failed to change password")
                .to_string();
            ResponseBuilder::error(crate::utils::responses::convert_status(reply.status))
                .with_message(&message)
                .build()
        }
        Err(e) => {
            error!("Change password error: {e}");
            ResponseBuilder::internal_server_error().build()
        }
    }
}
