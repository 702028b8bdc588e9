use serde::{Deserialize, Serialize};

/// Subject carried by every admin session
pub const ADMIN_SUBJECT: &str = "admin";

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

/// Claims carried inside a signed session token.
///
/// Field names are the wire names. Unknown fields and wrong types are
/// rejected when decoding so a token either matches this shape exactly or
/// is treated as malformed.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SessionPayload {
    /// Principal identifier, always [`ADMIN_SUBJECT`] for tokens minted here
    pub sub: String,
    /// Display name echoed back to the UI, not used for authorization
    pub username: String,
    /// Expiry as seconds since the Unix epoch
    pub exp: i64,
}

impl SessionPayload {
    /// Build an admin payload that expires `lifetime_secs` after `now`
    #[must_use]
    pub fn admin(username: &str, now: i64, lifetime_secs: i64) -> Self {
        Self {
            sub: ADMIN_SUBJECT.to_string(),
            username: username.to_string(),
            exp: now.saturating_add(lifetime_secs),
        }
    }

    /// Whether the payload is still inside its validity window at `now`.
    /// The expiry instant itself is already outside it.
    #[must_use]
    pub fn is_live_at(&self, now: i64) -> bool {
        now < self.exp
    }
}

/// Body of `POST /api/login`
#[derive(Deserialize, Debug, Default)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Credentials forwarded to the backend for verification
#[derive(Serialize, Debug)]
pub struct AdminCredentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Body of `POST /api/admin/change-password` as sent by the admin UI
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: Option<String>,
    #[serde(default)]
    pub new_password: Option<String>,
}

/// Body the backend expects for a password change
#[derive(Serialize, Debug)]
pub struct BackendPasswordChange<'a> {
    pub current_password: &'a str,
    pub new_password: &'a str,
}

/// Response of `GET /api/me`
#[derive(Serialize, Deserialize, Debug)]
pub struct MeResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionPayload>,
}
