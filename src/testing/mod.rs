//! Testing utilities for the gateway
//!
//! Shared by unit tests and, behind the `testing` feature, by the
//! integration tests under `tests/`.
//!
//! - [`fixtures`] - Pre-built test data (token service, payloads, settings)
//! - [`requests`] - HTTP request builders for testing handlers
//! - [`assertions`] - Assertion helpers for responses and tokens
//! - [`upstream`] - Stub backend and frontend on a loopback port
//!
//! ```ignore
//! use docreq_gateway::testing::{RequestBuilder, TestFixtures};
//!
//! let token = TestFixtures::valid_token();
//! let req = RequestBuilder::browser("/admin")
//!     .with_session_token(&token)
//!     .build();
//! ```

pub mod assertions;
pub mod fixtures;
pub mod requests;
pub mod upstream;

// Re-export commonly used items for convenience
pub use assertions::*;
pub use fixtures::TestFixtures;
pub use requests::RequestBuilder;
pub use upstream::StubUpstream;

/// Common test constants
pub mod constants {
    /// Signing secret used by every fixture
    pub const TEST_SECRET: &[u8] = b"test-secret-for-session-tokens!!";

    /// Admin user name carried by fixture sessions
    pub const TEST_USERNAME: &str = "registrar";

    /// Fixed "now" for deterministic token checks (2024-01-01T00:00:00Z)
    pub const TEST_NOW: i64 = 1_704_067_200;

    /// Session lifetime used by fixtures, in seconds
    pub const TEST_LIFETIME_SECS: i64 = 8 * 60 * 60;

    /// Default test user agent string
    pub const TEST_USER_AGENT: &str =
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

    /// An address nothing listens on, for upstream failure paths
    pub const UNREACHABLE_UPSTREAM: &str = "http://127.0.0.1:9";
}
