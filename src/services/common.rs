//! 服务层公共部分：业务错误到 HTTP 响应的映射，以及取存储、取当前用户的辅助函数

use std::fmt;
use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, ResponseError, http::StatusCode};
use tracing::error;

use crate::cache::ObjectCache;
use crate::errors::StudyLinkError;
use crate::middlewares::{RequireJWT, require_jwt::evict_user_cache};
use crate::models::{ApiResponse, ErrorCode, users::entities::User};
use crate::storage::Storage;

/// 服务层错误：HTTP 状态码 + 业务错误码 + 提示信息
///
/// 实现了 `ResponseError`，处理函数中可以直接用 `?` 返回统一的错误响应。
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: ErrorCode,
    pub message: String,
}

pub type ServiceResult<T> = std::result::Result<T, ApiError>;

impl ApiError {
    pub fn new(status: StatusCode, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized, message)
    }

    pub fn unauthorized_with(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, code, message)
    }

    pub fn forbidden(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, code, message)
    }

    pub fn not_found(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, message)
    }

    pub fn conflict(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, code, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::InternalServerError,
            message,
        )
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?}): {}", self.status, self.code, self.message)
    }
}

impl From<StudyLinkError> for ApiError {
    fn from(err: StudyLinkError) -> Self {
        match &err {
            StudyLinkError::Validation(msg) => Self::bad_request(ErrorCode::BadRequest, msg.clone()),
            StudyLinkError::NotFound(msg) => Self::not_found(ErrorCode::NotFound, msg.clone()),
            StudyLinkError::Forbidden(msg) => Self::forbidden(ErrorCode::Forbidden, msg.clone()),
            // 数据库约束错误的原文不返回给调用方
            _ if err.is_conflict() => Self::conflict(
                ErrorCode::Conflict,
                if err.is_client_error() {
                    err.message()
                } else {
                    "Resource already exists."
                },
            ),
            _ => {
                // 基础设施错误只记录日志，不把细节暴露给调用方
                error!("{}", err);
                Self::internal("Internal server error.")
            }
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status)
            .json(ApiResponse::<()>::error_empty(self.code, self.message.clone()))
    }
}

/// 从 app data 中取存储
pub(crate) fn storage_from_request(request: &HttpRequest) -> ServiceResult<Arc<dyn Storage>> {
    request
        .app_data::<actix_web::web::Data<Arc<dyn Storage>>>()
        .map(|data| data.get_ref().clone())
        .ok_or_else(|| {
            error!("Storage not found in app data");
            ApiError::internal("Storage is not available.")
        })
}

/// 当前登录用户（由 RequireJWT 放入请求扩展）
pub(crate) fn current_user(request: &HttpRequest) -> ServiceResult<User> {
    RequireJWT::extract_user_claims(request)
        .ok_or_else(|| ApiError::unauthorized("Unauthorized access, please login."))
}

/// 清除用户缓存（未配置缓存时忽略）
pub(crate) async fn evict_cached_user(request: &HttpRequest, user_id: i64) {
    if let Some(cache) = request.app_data::<actix_web::web::Data<Arc<dyn ObjectCache>>>() {
        evict_user_cache(cache.get_ref(), user_id).await;
    }
}

/// 把字符串错误包装成 400
pub(crate) fn invalid(code: ErrorCode) -> impl Fn(&str) -> ApiError {
    move |msg| ApiError::bad_request(code, msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_storage_errors_map_to_status() {
        let cases = [
            (StudyLinkError::validation("bad"), StatusCode::BAD_REQUEST),
            (StudyLinkError::not_found("gone"), StatusCode::NOT_FOUND),
            (StudyLinkError::conflict("dup"), StatusCode::CONFLICT),
            (StudyLinkError::forbidden("not yours"), StatusCode::FORBIDDEN),
            (
                StudyLinkError::database_operation("UNIQUE constraint failed: users.username"),
                StatusCode::CONFLICT,
            ),
            (
                StudyLinkError::database_connection("refused"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[actix_web::test]
    async fn test_error_response_uses_envelope() {
        let err = ApiError::forbidden(ErrorCode::CoursePermissionDenied, "nope");
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], ErrorCode::CoursePermissionDenied as i32);
        assert_eq!(json["message"], "nope");
    }

    #[test]
    fn test_invalid_helper() {
        let err = invalid(ErrorCode::UserNameInvalid)("too short");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, ErrorCode::UserNameInvalid);
    }
}
