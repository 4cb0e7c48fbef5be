use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::services::SystemService;

// 懒加载的全局 SystemService 实例
static SYSTEM_SERVICE: Lazy<SystemService> = Lazy::new(SystemService::new_lazy);

pub async fn public_settings() -> ActixResult<HttpResponse> {
    SYSTEM_SERVICE.get_public_settings().await
}

pub async fn health() -> ActixResult<HttpResponse> {
    SYSTEM_SERVICE.health().await
}

pub async fn readiness(request: HttpRequest) -> ActixResult<HttpResponse> {
    SYSTEM_SERVICE.readiness(&request).await
}

// 公开端点：无需登录
pub fn configure_system_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/readiness", web::get().to(readiness))
        .service(web::scope("/api/v1/public").route("/settings", web::get().to(public_settings)));
}
