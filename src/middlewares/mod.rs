//! 认证、授权与流量控制中间件

pub mod maintenance;
pub mod rate_limit;
pub mod require_approval;
pub mod require_jwt;
pub mod require_role;

pub use maintenance::MaintenanceGuard;
pub use rate_limit::RateLimit;
pub use require_approval::RequireApproval;
pub use require_jwt::RequireJWT;
pub use require_role::RequireRole;

use actix_web::{
    HttpResponse,
    http::{StatusCode, header::CONTENT_TYPE},
};

use crate::models::{ApiResponse, ErrorCode};

/// 中间件统一的错误响应（204 无响应体）
pub(crate) fn create_error_response(
    status: StatusCode,
    code: ErrorCode,
    message: &str,
) -> HttpResponse {
    match status {
        StatusCode::NO_CONTENT => HttpResponse::build(status).finish(),
        _ => HttpResponse::build(status)
            .insert_header((CONTENT_TYPE, "application/json; charset=utf-8"))
            .json(ApiResponse::<()>::error_empty(code, message)),
    }
}
