use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Secret used when `AUTH_SECRET` is not configured. Local development only.
pub const DEV_AUTH_SECRET: &str = "dev-secret-change-me";

/// Errors raised while loading or validating settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: basic_toml::Error,
    },
    #[error("AUTH_SECRET is not set; refusing to sign sessions with the development secret")]
    InsecureSecret,
}

/// Where the session signing secret came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretSource {
    Configured,
    DevelopmentFallback,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GatewaySettings {
    pub application: ApplicationSettings,
    pub backend: BackendSettings,
    pub session: SessionSettings,
    pub cookies: CookieSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: String,
    /// Production mode: secure cookies and a mandatory `AUTH_SECRET`
    pub production: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    /// Base URL of the document request backend API
    pub url: String,
    /// Base URL of the page server that renders the public form and admin UI
    pub frontend_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// HMAC key for session tokens; empty means "not configured"
    pub auth_secret: String,
    /// Lifetime of a session, used for both cookie `Max-Age` and token `exp`
    pub session_duration_hours: u64,
    /// Refuse to start without a configured secret even outside production
    pub require_auth_secret: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CookieSettings {
    /// Force the `Secure` attribute; production mode always sets it
    pub secure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_origins: "http://localhost:3000".to_string(),
            production: false,
        }
    }
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080".to_string(),
            frontend_url: "http://localhost:3001".to_string(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            auth_secret: String::new(),
            session_duration_hours: 8,
            require_auth_secret: false,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl GatewaySettings {
    /// Load settings from configuration files and environment variables,
    /// then initialise logging at the configured level
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file exists but cannot be read or parsed
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_env_file();

        let mut settings = Self::load_base_settings()?;
        Self::apply_env_overrides(&mut settings);

        Self::initialize_logging(&settings.logging);
        Ok(settings)
    }

    /// Load base settings from TOML file(s) or use defaults
    /// Settings are loaded with the following priority (highest to lowest):
    /// 1. Environment variables (applied separately after loading base settings)
    /// 2. Settings.toml in `DOCREQ_SECRETS_DIR` (if specified and exists)
    /// 3. Settings.toml in current directory (if exists)
    /// 4. Default settings
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file cannot be read or parsed
    pub fn load_base_settings() -> Result<Self, SettingsError> {
        let mut settings = Self::default();

        let default_config_path = Path::new("Settings.toml");
        if default_config_path.exists() {
            settings = Self::from_file(default_config_path)?;
            println!("✓ Loaded base settings from {}", default_config_path.display());
        }

        if let Ok(secrets_dir) = std::env::var("DOCREQ_SECRETS_DIR") {
            let secrets_path = Path::new(&secrets_dir).join("Settings.toml");
            if secrets_path.exists() {
                settings = Self::from_file(&secrets_path)?;
                println!("✓ Overriding settings from {}", secrets_path.display());
            } else {
                println!(
                    "ℹ DOCREQ_SECRETS_DIR set but no Settings.toml found at: {}",
                    secrets_path.display()
                );
            }
        }

        Ok(settings)
    }

    /// Parse a single TOML settings file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let display = path.display().to_string();
        let contents = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: display.clone(),
            source,
        })?;
        basic_toml::from_str(&contents).map_err(|source| SettingsError::Parse {
            path: display,
            source,
        })
    }

    /// Apply environment variable overrides to settings
    pub fn apply_env_overrides(settings: &mut Self) {
        Self::apply_application_env_overrides(&mut settings.application);
        Self::apply_backend_env_overrides(&mut settings.backend);
        Self::apply_session_env_overrides(&mut settings.session);
        Self::apply_cookie_env_overrides(&mut settings.cookies);
        Self::apply_logging_env_overrides(&mut settings.logging);
    }

    fn apply_application_env_overrides(app_settings: &mut ApplicationSettings) {
        if let Ok(host) = std::env::var("HOST") {
            app_settings.host = host;
        }
        if let Ok(port_str) = std::env::var("PORT") {
            if let Ok(port) = port_str.parse::<u16>() {
                app_settings.port = port;
            }
        }
        if let Ok(cors_origins) = std::env::var("CORS_ORIGINS") {
            app_settings.cors_origins = cors_origins;
        }
        let environment = std::env::var("APP_ENV").or_else(|_| std::env::var("NODE_ENV"));
        if let Ok(environment) = environment {
            app_settings.production = environment.eq_ignore_ascii_case("production");
        }
    }

    fn apply_backend_env_overrides(backend_settings: &mut BackendSettings) {
        let backend_url = std::env::var("BACKEND_URL")
            .or_else(|_| std::env::var("NEXT_PUBLIC_BACKEND_URL"));
        if let Ok(url) = backend_url {
            backend_settings.url = url;
        }
        if let Ok(frontend_url) = std::env::var("FRONTEND_URL") {
            backend_settings.frontend_url = frontend_url;
        }
    }

    /// Apply environment overrides for session settings
    pub fn apply_session_env_overrides(session_settings: &mut SessionSettings) {
        if let Ok(secret) = std::env::var("AUTH_SECRET") {
            if !secret.is_empty() {
                session_settings.auth_secret = secret;
            }
        }
        if let Ok(hours) = std::env::var("SESSION_DURATION_HOURS") {
            if let Ok(hours) = hours.parse::<u64>() {
                session_settings.session_duration_hours = hours;
            }
        }
        if let Ok(required) = std::env::var("REQUIRE_AUTH_SECRET") {
            if let Ok(required) = required.parse::<bool>() {
                session_settings.require_auth_secret = required;
            }
        }
    }

    fn apply_cookie_env_overrides(cookie_settings: &mut CookieSettings) {
        if let Ok(cookie_secure_str) = std::env::var("COOKIE_SECURE") {
            if let Ok(cookie_secure) = cookie_secure_str.parse::<bool>() {
                cookie_settings.secure = cookie_secure;
            }
        }
    }

    fn apply_logging_env_overrides(logging_settings: &mut LoggingSettings) {
        if let Ok(log_level) = std::env::var("LOG_LEVEL") {
            logging_settings.level = log_level;
        }
    }

    /// Initialise `env_logger`; `RUST_LOG` wins over the configured level.
    /// A second initialisation (tests, embedding) is ignored.
    fn initialize_logging(logging: &LoggingSettings) {
        let env = env_logger::Env::default().default_filter_or(logging.level.as_str());
        if env_logger::Builder::from_env(env).try_init().is_err() {
            log::debug!("Logger already initialised");
        }
    }

    /// Load environment variables from .env file
    fn load_env_file() {
        if let Ok(contents) = fs::read_to_string(".env") {
            for line in contents.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    std::env::set_var(key.trim(), value.trim());
                }
            }
        }
    }

    /// Get the bind address for the server
    #[must_use]
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.application.host, self.application.port)
    }

    /// Get CORS origins as a vector of strings
    #[must_use]
    pub fn get_cors_origins(&self) -> Vec<String> {
        self.application
            .cors_origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Backend base URL without a trailing slash
    #[must_use]
    pub fn backend_base_url(&self) -> &str {
        self.backend.url.trim_end_matches('/')
    }

    /// Whether issued cookies carry the `Secure` attribute
    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.application.production || self.cookies.secure
    }

    /// Session lifetime in seconds
    #[must_use]
    pub fn session_lifetime_secs(&self) -> i64 {
        i64::try_from(self.session.session_duration_hours.saturating_mul(3600)).unwrap_or(i64::MAX)
    }

    /// The secret bytes used to sign sessions, falling back to
    /// [`DEV_AUTH_SECRET`] when none is configured
    #[must_use]
    pub fn auth_secret(&self) -> (&[u8], SecretSource) {
        if self.session.auth_secret.is_empty() {
            (DEV_AUTH_SECRET.as_bytes(), SecretSource::DevelopmentFallback)
        } else {
            (self.session.auth_secret.as_bytes(), SecretSource::Configured)
        }
    }

    /// Decide whether the process may run with the current secret.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InsecureSecret`] when the development
    /// fallback is in use and production mode or `require_auth_secret` is on
    pub fn check_secret(&self) -> Result<SecretSource, SettingsError> {
        let (_, source) = self.auth_secret();
        if source == SecretSource::DevelopmentFallback {
            if self.application.production || self.session.require_auth_secret {
                return Err(SettingsError::InsecureSecret);
            }
            log::warn!("⚠️  AUTH_SECRET is not set; signing sessions with the development secret");
            log::warn!("🔒 Set AUTH_SECRET before deploying; anyone can forge admin sessions otherwise");
        }
        Ok(source)
    }
}
