use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::services::UserService;
use crate::utils::SafeIDI64;

// 懒加载的全局 UserService 实例
static USER_SERVICE: Lazy<UserService> = Lazy::new(UserService::new_lazy);

pub async fn get_me(request: HttpRequest) -> ActixResult<HttpResponse> {
    USER_SERVICE.get_me(&request).await
}

pub async fn get_user(request: HttpRequest, SafeIDI64(id): SafeIDI64) -> ActixResult<HttpResponse> {
    USER_SERVICE.get_user(id, &request).await
}

// 配置路由
pub fn configure_user_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/users")
            .wrap(middlewares::RateLimit::api())
            .wrap(middlewares::RequireJWT)
            .route("/me", web::get().to(get_me))
            .route("/{id}", web::get().to(get_user)),
    );
}
