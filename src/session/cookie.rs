use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::{http::header, HttpRequest};

use crate::models::SessionPayload;
use crate::session::token::SessionTokenService;

/// Name of the cookie carrying the signed session token
pub const SESSION_COOKIE_NAME: &str = "session";

/// Options for cookie creation
pub struct CookieOptions {
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
    pub path: String,
    pub max_age: Duration,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            http_only: true,
            secure: true,
            same_site: SameSite::Strict,
            path: "/".to_string(),
            max_age: Duration::hours(8),
        }
    }
}

/// Builds the session cookie and its clearing counterpart with one set of
/// attributes, so issue and logout always agree on name, path and flags.
#[derive(Clone, Debug)]
pub struct CookieFactory {
    cookie_secure: bool,
    session_lifetime_secs: i64,
}

impl CookieFactory {
    #[must_use]
    pub fn new(cookie_secure: bool, session_lifetime_secs: i64) -> Self {
        Self {
            cookie_secure,
            session_lifetime_secs,
        }
    }

    /// Lifetime shared by the cookie `Max-Age` and the token `exp`
    #[must_use]
    pub fn session_lifetime_secs(&self) -> i64 {
        self.session_lifetime_secs
    }

    /// Generic cookie builder honoring the factory's `secure` setting
    #[must_use]
    pub fn create_cookie(&self, name: &str, value: String, options: CookieOptions) -> Cookie<'static> {
        Cookie::build(name.to_owned(), value)
            .http_only(options.http_only)
            .secure(self.cookie_secure && options.secure)
            .same_site(options.same_site)
            .path(options.path)
            .max_age(options.max_age)
            .finish()
    }

    /// Session cookie holding `token`
    #[must_use]
    pub fn create_session_cookie(&self, token: String) -> Cookie<'static> {
        self.create_cookie(
            SESSION_COOKIE_NAME,
            token,
            CookieOptions {
                max_age: Duration::seconds(self.session_lifetime_secs),
                ..Default::default()
            },
        )
    }

    /// Empty session cookie with `Max-Age=0`
    #[must_use]
    pub fn create_expired_cookie(&self) -> Cookie<'static> {
        self.create_cookie(
            SESSION_COOKIE_NAME,
            String::new(),
            CookieOptions {
                max_age: Duration::ZERO,
                ..Default::default()
            },
        )
    }
}

/// Find the `session` value in a raw `Cookie` header and percent-decode it
#[must_use]
pub fn token_from_cookie_header(cookie_header: &str) -> Option<String> {
    cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE_NAME)
        .and_then(|(_, value)| urlencoding::decode(value).ok())
        .map(std::borrow::Cow::into_owned)
        .filter(|value| !value.is_empty())
}

/// Authenticate a request by its `session` cookie.
///
/// Returns `None` for a missing cookie as well as for any rejected token.
#[must_use]
pub fn session_from_request(
    req: &HttpRequest,
    tokens: &SessionTokenService,
) -> Option<SessionPayload> {
    let token = req
        .headers()
        .get_all(header::COOKIE)
        .filter_map(|value| value.to_str().ok())
        .find_map(token_from_cookie_header)?;
    tokens.verify_session_token(&token)
}
