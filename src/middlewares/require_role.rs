//! 角色校验中间件
//!
//! 必须套在 `RequireJWT` 内侧（即先注册 RequireRole 再注册 RequireJWT），
//! 从请求扩展中读取已登录用户的角色。每个用户只有一个角色，
//! 因此只需判断该角色是否在允许列表中。
//!
//! ```rust,ignore
//! web::scope("/api/v1/reports")
//!     .wrap(RequireRole::new_any(UserRole::teacher_roles()))
//!     .wrap(RequireJWT)
//! ```

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use tracing::{debug, info};

use crate::models::{
    ErrorCode,
    users::entities::{User, UserRole},
};

use super::create_error_response;

#[derive(Clone)]
pub struct RequireRole {
    allowed: Rc<[UserRole]>,
}

impl RequireRole {
    /// 仅允许单个角色
    pub fn new(role: &UserRole) -> Self {
        Self::new_any(&[role])
    }

    /// 允许列表中的任一角色
    pub fn new_any(roles: &[&UserRole]) -> Self {
        Self {
            allowed: roles.iter().map(|r| (*r).clone()).collect(),
        }
    }

    fn permits(allowed: &[UserRole], role: &UserRole) -> bool {
        allowed.contains(role)
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireRoleMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireRoleMiddleware {
            service: Rc::new(service),
            allowed: self.allowed.clone(),
        }))
    }
}

pub struct RequireRoleMiddleware<S> {
    service: Rc<S>,
    allowed: Rc<[UserRole]>,
}

impl<S, B> Service<ServiceRequest> for RequireRoleMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    actix_service::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let allowed = self.allowed.clone();

        Box::pin(async move {
            let caller = req
                .extensions()
                .get::<User>()
                .map(|user| (user.id, user.role.clone()));

            let rejection = match caller {
                Some((_, role)) if RequireRole::permits(&allowed, &role) => {
                    return Ok(srv.call(req).await?.map_into_left_body());
                }
                Some((user_id, role)) => {
                    info!(
                        "User {} with role {} denied, allowed roles: {:?}",
                        user_id, role, allowed
                    );
                    create_error_response(StatusCode::FORBIDDEN, ErrorCode::Forbidden, "Access denied.")
                }
                None => {
                    // RequireJWT 未生效或注册顺序错误
                    debug!("No authenticated user on request to {}", req.path());
                    create_error_response(
                        StatusCode::UNAUTHORIZED,
                        ErrorCode::Unauthorized,
                        "Authentication required",
                    )
                }
            };
            Ok(req.into_response(rejection.map_into_right_body()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::User;
    use actix_web::{App, HttpResponse, test, web};

    fn user_with_role(role: UserRole) -> User {
        let now = chrono::Utc::now();
        User {
            id: 42,
            username: "someone".to_string(),
            password_hash: String::new(),
            role,
            name: "누군가".to_string(),
            email: None,
            phone: None,
            is_approved: true,
            is_active: true,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    async fn call_as(role: Option<UserRole>) -> StatusCode {
        let app = test::init_service(
            App::new().service(
                web::resource("/staff")
                    .wrap(RequireRole::new_any(UserRole::teacher_roles()))
                    .route(web::get().to(HttpResponse::Ok)),
            ),
        )
        .await;

        let req = test::TestRequest::get().uri("/staff").to_request();
        if let Some(role) = role {
            req.extensions_mut().insert(user_with_role(role));
        }
        test::call_service(&app, req).await.status()
    }

    #[actix_web::test]
    async fn test_role_checks() {
        assert_eq!(call_as(Some(UserRole::Teacher)).await, StatusCode::OK);
        assert_eq!(call_as(Some(UserRole::Admin)).await, StatusCode::OK);
        assert_eq!(call_as(Some(UserRole::Student)).await, StatusCode::FORBIDDEN);
        assert_eq!(call_as(None).await, StatusCode::UNAUTHORIZED);
    }
}
