use actix_web::{http::StatusCode, web, HttpResponse};
use serde::Serialize;

use crate::models::Channel;
use crate::services::NotificationService;

#[derive(Serialize)]
pub struct LivenessResponse {
    status: &'static str,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    status: &'static str,
    checks: ReadinessChecks,
}

#[derive(Serialize)]
pub struct ReadinessChecks {
    database: &'static str,
    /// Channels with a configured provider; informational only
    channels: Vec<Channel>,
}

/// Liveness check - is the process running?
pub async fn liveness() -> HttpResponse {
    HttpResponse::Ok().json(LivenessResponse { status: "ok" })
}

/// Readiness check - 200 when the delivery ledger's database answers, 503 otherwise
pub async fn readiness(service: web::Data<NotificationService>) -> HttpResponse {
    let db_healthy = service.ledger_healthy().await;

    let (status, db_status, http_status) = if db_healthy {
        ("ready", "ok", StatusCode::OK)
    } else {
        ("not_ready", "error", StatusCode::SERVICE_UNAVAILABLE)
    };

    let response = ReadinessResponse {
        status,
        checks: ReadinessChecks {
            database: db_status,
            channels: service.gateways().configured_channels(),
        },
    };

    HttpResponse::build(http_status).json(response)
}

/// Configure health routes (no auth)
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/health")
            .route("", web::get().to(liveness))
            .route("/ready", web::get().to(readiness)),
    );
}
