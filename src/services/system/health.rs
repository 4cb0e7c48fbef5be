use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use tracing::warn;

use super::{DynamicConfig, SystemService};
use crate::models::{
    ApiResponse, AppStartTime, ErrorCode,
    system::responses::{HealthResponse, ReadinessResponse},
};

pub async fn get_public_settings() -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        DynamicConfig::public_settings().await,
        "Settings retrieved successfully",
    )))
}

pub async fn health() -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        HealthResponse {
            status: "ok".to_string(),
            timestamp: chrono::Utc::now(),
        },
        "Service is healthy",
    )))
}

pub async fn readiness(service: &SystemService, request: &HttpRequest) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let uptime_seconds = request
        .app_data::<web::Data<AppStartTime>>()
        .map(|start| (chrono::Utc::now() - start.start_datetime).num_seconds())
        .unwrap_or_default();

    match storage.ping().await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            ReadinessResponse {
                status: "ready".to_string(),
                database: true,
                uptime_seconds,
            },
            "Service is ready",
        ))),
        Err(e) => {
            warn!("Readiness check failed: {}", e);
            Ok(HttpResponse::ServiceUnavailable().json(ApiResponse::error(
                ErrorCode::InternalServerError,
                ReadinessResponse {
                    status: "unavailable".to_string(),
                    database: false,
                    uptime_seconds,
                },
                "Database is unreachable",
            )))
        }
    }
}
