/*!
 * 维护模式中间件
 *
 * 挂在 App 上，早于各 scope 的 RequireJWT 执行，因此自行解析 Bearer token 判断角色。
 * 维护模式开启时只有管理员可以继续访问，登录、公开设置与健康检查始终放行。
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::{Method, StatusCode},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use tracing::debug;

use crate::models::{ErrorCode, users::entities::UserRole};
use crate::services::system::DynamicConfig;
use crate::utils::jwt::JwtUtils;

use super::{create_error_response, require_jwt::bearer_token};

const EXEMPT_PREFIXES: &[&str] = &[
    "/api/v1/auth/login",
    "/api/v1/public",
    "/health",
    "/readiness",
];

/// 路径是否不受维护模式影响
pub fn is_exempt_path(path: &str) -> bool {
    EXEMPT_PREFIXES.iter().any(|prefix| {
        path == *prefix
            || path
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('/'))
    })
}

/// token 是否属于管理员
fn is_admin_token(token: Option<&str>) -> bool {
    token
        .and_then(|t| JwtUtils::verify_access_token(t).ok())
        .is_some_and(|claims| claims.role == UserRole::ADMIN)
}

#[derive(Clone, Default)]
pub struct MaintenanceGuard;

impl<S, B> Transform<S, ServiceRequest> for MaintenanceGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = MaintenanceGuardMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MaintenanceGuardMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct MaintenanceGuardMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for MaintenanceGuardMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();

        Box::pin(async move {
            let blocked = req.method() != Method::OPTIONS
                && !is_exempt_path(req.path())
                && DynamicConfig::maintenance_mode().await
                && !is_admin_token(bearer_token(req.headers()));

            if blocked {
                debug!("Maintenance mode rejected {}", req.path());
                return Ok(req.into_response(
                    create_error_response(
                        StatusCode::SERVICE_UNAVAILABLE,
                        ErrorCode::MaintenanceMode,
                        "The system is under maintenance. Please try again later.",
                    )
                    .map_into_right_body(),
                ));
            }

            let res = srv.call(req).await?.map_into_left_body();
            Ok(res)
        })
    }
}
