#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![deny(warnings)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the docreq gateway
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod backend;
pub mod handlers;
pub mod models;
pub mod session;
pub mod settings;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use backend::BackendClient;
pub use handlers::{configure_services, health, FrontendClient};
pub use models::SessionPayload;
pub use session::{CookieFactory, SessionTokenService, TokenError};
pub use settings::GatewaySettings;
