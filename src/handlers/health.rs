use actix_web::HttpResponse;

use crate::models::HealthResponse;

/// Health check endpoint
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        message: "DocReq gateway is running".to_string(),
    })
}
