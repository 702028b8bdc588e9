//! Test fixtures providing pre-built test objects

use chrono::Utc;

use crate::backend::BackendClient;
use crate::handlers::FrontendClient;
use crate::models::SessionPayload;
use crate::session::{CookieFactory, SessionTokenService};
use crate::settings::GatewaySettings;

use super::constants::{
    TEST_LIFETIME_SECS, TEST_NOW, TEST_SECRET, TEST_USERNAME, UNREACHABLE_UPSTREAM,
};

/// Central fixture provider for all test data
pub struct TestFixtures;

impl TestFixtures {
    /// Token service keyed with [`TEST_SECRET`]
    ///
    /// # Panics
    ///
    /// Never for the fixed test secret
    #[must_use]
    pub fn token_service() -> SessionTokenService {
        SessionTokenService::new(TEST_SECRET).expect("test secret is a valid HMAC key")
    }

    /// Token service keyed with a different secret
    ///
    /// # Panics
    ///
    /// Never for the fixed secret
    #[must_use]
    pub fn other_token_service() -> SessionTokenService {
        SessionTokenService::new(b"some-other-secret").expect("valid HMAC key")
    }

    /// Cookie factory with secure cookies off, as in development
    #[must_use]
    pub fn cookie_factory() -> CookieFactory {
        CookieFactory::new(false, TEST_LIFETIME_SECS)
    }

    /// Backend client pointed at an address nothing listens on
    #[must_use]
    pub fn unreachable_backend() -> BackendClient {
        BackendClient::new(UNREACHABLE_UPSTREAM)
    }

    /// Frontend client pointed at an address nothing listens on
    #[must_use]
    pub fn unreachable_frontend() -> FrontendClient {
        FrontendClient::new(UNREACHABLE_UPSTREAM)
    }

    /// Default settings with a configured secret
    #[must_use]
    pub fn settings() -> GatewaySettings {
        let mut settings = GatewaySettings::default();
        settings.session.auth_secret = String::from_utf8_lossy(TEST_SECRET).into_owned();
        settings
    }

    /// Admin session issued at [`TEST_NOW`]
    #[must_use]
    pub fn admin_payload() -> SessionPayload {
        SessionPayload::admin(TEST_USERNAME, TEST_NOW, TEST_LIFETIME_SECS)
    }

    /// Admin session valid for the next eight hours of wall-clock time
    #[must_use]
    pub fn live_payload() -> SessionPayload {
        SessionPayload::admin(TEST_USERNAME, Utc::now().timestamp(), TEST_LIFETIME_SECS)
    }

    /// Admin session that expired an hour ago
    #[must_use]
    pub fn expired_payload() -> SessionPayload {
        let issued_at = Utc::now().timestamp() - TEST_LIFETIME_SECS - 3600;
        SessionPayload::admin(TEST_USERNAME, issued_at, TEST_LIFETIME_SECS)
    }

    /// Signed token for [`Self::live_payload`]
    ///
    /// # Panics
    ///
    /// Never; the payload always serializes
    #[must_use]
    pub fn valid_token() -> String {
        Self::token_service()
            .create_session_token(&Self::live_payload())
            .expect("payload serializes")
    }

    /// Signed token for [`Self::expired_payload`]
    ///
    /// # Panics
    ///
    /// Never; the payload always serializes
    #[must_use]
    pub fn expired_token() -> String {
        Self::token_service()
            .create_session_token(&Self::expired_payload())
            .expect("payload serializes")
    }
}
