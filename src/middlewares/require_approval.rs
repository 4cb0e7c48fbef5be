/*!
 * 教师审批检查中间件
 *
 * 必须在 RequireJWT 之后使用。未审批的教师返回 403 `TeacherNotApproved`，
 * 其他角色直接放行。
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use tracing::info;

use crate::models::{ErrorCode, users::entities::User};

use super::create_error_response;

#[derive(Clone, Default)]
pub struct RequireApproval;

impl<S, B> Transform<S, ServiceRequest> for RequireApproval
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireApprovalMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireApprovalMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireApprovalMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireApprovalMiddleware<S>
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
            let pending = req
                .extensions()
                .get::<User>()
                .map(User::is_pending_teacher)
                .unwrap_or(false);

            if pending {
                info!("Rejected request from unapproved teacher");
                return Ok(req.into_response(
                    create_error_response(
                        StatusCode::FORBIDDEN,
                        ErrorCode::TeacherNotApproved,
                        "Teacher account is waiting for approval.",
                    )
                    .map_into_right_body(),
                ));
            }

            let res = srv.call(req).await?.map_into_left_body();
            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use actix_web::{App, HttpResponse, test, web};

    fn teacher(is_approved: bool) -> User {
        let now = chrono::Utc::now();
        User {
            id: 3,
            username: "teacher".to_string(),
            password_hash: String::new(),
            role: UserRole::Teacher,
            name: "선생님".to_string(),
            email: None,
            phone: None,
            is_approved,
            is_active: true,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[actix_web::test]
    async fn test_unapproved_teacher_is_blocked() {
        let app = test::init_service(
            App::new().service(
                web::resource("/courses")
                    .wrap(RequireApproval)
                    .route(web::get().to(HttpResponse::Ok)),
            ),
        )
        .await;

        let req = test::TestRequest::get().uri("/courses").to_request();
        req.extensions_mut().insert(teacher(false));
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], ErrorCode::TeacherNotApproved as i32);

        let req = test::TestRequest::get().uri("/courses").to_request();
        req.extensions_mut().insert(teacher(true));
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }
}
