use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::auth::requests::{
    LoginRequest, RegisterParentRequest, RegisterStudentRequest, RegisterTeacherRequest,
};
use crate::services::AuthService;

// 懒加载的全局 AuthService 实例
static AUTH_SERVICE: Lazy<AuthService> = Lazy::new(AuthService::new_lazy);

pub async fn login(
    req: HttpRequest,
    body: web::Json<LoginRequest>,
) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.login(body.into_inner(), &req).await
}

pub async fn register_student(
    req: HttpRequest,
    body: web::Json<RegisterStudentRequest>,
) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.register_student(body.into_inner(), &req).await
}

pub async fn register_parent(
    req: HttpRequest,
    body: web::Json<RegisterParentRequest>,
) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.register_parent(body.into_inner(), &req).await
}

pub async fn register_teacher(
    req: HttpRequest,
    body: web::Json<RegisterTeacherRequest>,
) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.register_teacher(body.into_inner(), &req).await
}

pub async fn check_student_number(
    req: HttpRequest,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.check_student_number(&path, &req).await
}

pub async fn refresh_token(request: HttpRequest) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.refresh_token(&request).await
}

pub async fn logout(request: HttpRequest) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.logout(&request).await
}

pub async fn get_user(request: HttpRequest) -> ActixResult<HttpResponse> {
    AUTH_SERVICE.get_user(&request).await
}

// 配置路由
pub fn configure_auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/auth")
            .service(
                web::resource("/login")
                    .wrap(middlewares::RateLimit::login())
                    .route(web::post().to(login)),
            )
            .service(
                web::scope("/register")
                    .wrap(middlewares::RateLimit::register())
                    .route("/student", web::post().to(register_student))
                    .route("/parent", web::post().to(register_parent))
                    .route("/teacher", web::post().to(register_teacher)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(middlewares::RateLimit::refresh_token())
                    .route(web::post().to(refresh_token)),
            )
            .route("/student/{student_number}", web::get().to(check_student_number))
            .route("/logout", web::post().to(logout))
            .service(
                web::resource("/me")
                    .wrap(middlewares::RequireJWT)
                    .route(web::get().to(get_user)),
            ),
    );
}
