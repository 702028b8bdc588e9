// Integration tests for settings files and environment layering
use std::io::Write;

use docreq_gateway::settings::{GatewaySettings, SettingsError};
use docreq_gateway::SessionTokenService;
use serial_test::serial;
use tempfile::{NamedTempFile, TempDir};

const SETTINGS_TOML: &str = r#"
[application]
host = "127.0.0.1"
port = 4000
cors_origins = "https://admin.example.org, https://docs.example.org"

[backend]
url = "http://backend.internal:8080/"

[session]
auth_secret = "file-secret"
session_duration_hours = 2
"#;

fn clean_env_vars() {
    for var in [
        "DOCREQ_SECRETS_DIR",
        "AUTH_SECRET",
        "SESSION_DURATION_HOURS",
        "PORT",
        "BACKEND_URL",
        "NEXT_PUBLIC_BACKEND_URL",
    ] {
        std::env::remove_var(var);
    }
}

#[test]
fn test_partial_file_keeps_defaults() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(SETTINGS_TOML.as_bytes()).unwrap();

    let settings = GatewaySettings::from_file(file.path()).unwrap();

    assert_eq!(settings.get_bind_address(), "127.0.0.1:4000");
    assert_eq!(
        settings.get_cors_origins(),
        vec!["https://admin.example.org", "https://docs.example.org"]
    );
    assert_eq!(settings.backend_base_url(), "http://backend.internal:8080");
    assert_eq!(settings.session_lifetime_secs(), 7200);
    // Sections missing from the file fall back to defaults
    assert_eq!(settings.backend.frontend_url, "http://localhost:3001");
    assert_eq!(settings.logging.level, "info");
    assert!(!settings.cookie_secure());
}

#[test]
fn test_invalid_file_is_a_parse_error() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"[application\nport = ").unwrap();

    assert!(matches!(
        GatewaySettings::from_file(file.path()),
        Err(SettingsError::Parse { .. })
    ));
}

#[test]
fn test_missing_file_is_a_read_error() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        GatewaySettings::from_file(&dir.path().join("Settings.toml")),
        Err(SettingsError::Read { .. })
    ));
}

#[test]
#[serial]
fn test_secrets_dir_settings_then_env_overrides() {
    clean_env_vars();
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("Settings.toml"), SETTINGS_TOML).unwrap();
    std::env::set_var("DOCREQ_SECRETS_DIR", dir.path());

    let mut settings = GatewaySettings::load_base_settings().unwrap();
    assert_eq!(settings.session.auth_secret, "file-secret");
    assert_eq!(settings.application.port, 4000);

    std::env::set_var("AUTH_SECRET", "env-secret");
    std::env::set_var("PORT", "5000");
    std::env::set_var("SESSION_DURATION_HOURS", "12");
    GatewaySettings::apply_env_overrides(&mut settings);

    assert_eq!(settings.session.auth_secret, "env-secret");
    assert_eq!(settings.application.port, 5000);
    assert_eq!(settings.session_lifetime_secs(), 12 * 3600);

    clean_env_vars();
}

#[test]
#[serial]
fn test_missing_secrets_dir_file_uses_defaults() {
    clean_env_vars();
    let dir = TempDir::new().unwrap();
    std::env::set_var("DOCREQ_SECRETS_DIR", dir.path());

    let settings = GatewaySettings::load_base_settings().unwrap();
    assert_eq!(settings.application.port, 3000);
    assert!(settings.session.auth_secret.is_empty());

    clean_env_vars();
}

#[test]
fn test_configured_secret_drives_token_service() {
    let mut settings = GatewaySettings::default();
    settings.session.auth_secret = "file-secret".to_string();
    let (secret, _) = settings.auth_secret();

    let from_settings = SessionTokenService::new(secret).unwrap();
    let direct = SessionTokenService::new(b"file-secret").unwrap();
    let payload = docreq_gateway::SessionPayload::admin("registrar", 0, 60);

    let token = from_settings.create_session_token(&payload).unwrap();
    assert_eq!(direct.verify_at(&token, 30), Some(payload));
}
