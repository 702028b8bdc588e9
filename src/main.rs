#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![deny(warnings)]
#![allow(clippy::multiple_crate_versions)]

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use docreq_gateway::{
    configure_services, settings::SecretSource, BackendClient, CookieFactory, FrontendClient,
    GatewaySettings, SessionTokenService,
};
use log::error;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load configuration from Settings.toml and environment variables
    // This also loads .env file and initializes the logger
    let settings = GatewaySettings::load()
        .map_err(|e| std::io::Error::other(format!("Failed to load settings: {e}")))?;

    let secret_source = match settings.check_secret() {
        Ok(source) => source,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    let (secret, _) = settings.auth_secret();
    let tokens = SessionTokenService::new(secret)
        .map_err(|e| std::io::Error::other(format!("Failed to initialize session tokens: {e}")))?;

    if secret_source == SecretSource::Configured {
        println!("✓ Signing sessions with the configured AUTH_SECRET");
    }
    start_server(settings, tokens).await
}

/// Start the gateway
///
/// # Errors
///
/// Returns an error if:
/// - Server binding fails
/// - Server fails to start
async fn start_server(settings: GatewaySettings, tokens: SessionTokenService) -> std::io::Result<()> {
    let bind_address = settings.get_bind_address();
    print_startup_info(&bind_address, &settings);

    let cookies = CookieFactory::new(settings.cookie_secure(), settings.session_lifetime_secs());
    let backend = BackendClient::new(settings.backend_base_url());
    let frontend = FrontendClient::new(&settings.backend.frontend_url);

    // Configure CORS for the admin frontend
    let cors_origins = settings.get_cors_origins();

    HttpServer::new(move || {
        let cors_origins = cors_origins.clone();
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _| {
                cors_origins
                    .iter()
                    .any(|allowed| allowed == origin.to_str().unwrap_or(""))
            })
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec!["Authorization", "Content-Type", "Accept"])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(settings.clone()))
            .app_data(web::Data::new(tokens.clone()))
            .app_data(web::Data::new(cookies.clone()))
            .app_data(web::Data::new(backend.clone()))
            .app_data(web::Data::new(frontend.clone()))
            .wrap(cors)
            .wrap(Logger::default())
            .configure(configure_services)
    })
    .bind(&bind_address)?
    .run()
    .await
}

fn print_startup_info(bind_address: &str, settings: &GatewaySettings) {
    println!("Starting DocReq gateway on http://{bind_address}");
    println!("Backend:  {}", settings.backend_base_url());
    println!("Frontend: {}", settings.backend.frontend_url);
    println!(
        "Sessions: {}h, secure cookies {}",
        settings.session.session_duration_hours,
        if settings.cookie_secure() { "on" } else { "off" }
    );
    println!();
    println!("Session endpoints:");
    println!("  POST /api/login                  - Verify admin credentials, set session cookie");
    println!("  GET|POST /api/logout             - Clear session");
    println!("  GET  /api/me                     - Current session");
    println!("  POST /api/admin/change-password  - Change admin password");
    println!();
    println!("Backend relays:");
    println!("  POST /api/submit                 - Public request submission");
    println!("  GET|PUT|POST /api/requests       - Request list and updates");
    println!("  PUT  /api/requests/{{id}}/status   - Update request status");
    println!("  GET  /api/pdf/{{id}}               - Generated PDF");
    println!("  GET|POST|PUT /api/backend/officials - Officials");
    println!();
    println!("Pages:");
    println!("  ALL  /admin, /admin/*            - Frontend, session required");
    println!("  ALL  {{any other path}}            - Frontend, public");
    println!();
    println!("System endpoints:");
    println!("  GET  /ping                       - Health check");
}
