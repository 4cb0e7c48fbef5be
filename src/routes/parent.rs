use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::reports::requests::DateRangeParams;
use crate::models::users::entities::UserRole;
use crate::services::ParentService;
use crate::utils::SafeStudentIdI64;

// 懒加载的全局 ParentService 实例
static PARENT_SERVICE: Lazy<ParentService> = Lazy::new(ParentService::new_lazy);

pub async fn list_children(request: HttpRequest) -> ActixResult<HttpResponse> {
    PARENT_SERVICE.list_children(&request).await
}

pub async fn child_report(
    request: HttpRequest,
    SafeStudentIdI64(student_id): SafeStudentIdI64,
    query: web::Query<DateRangeParams>,
) -> ActixResult<HttpResponse> {
    PARENT_SERVICE
        .child_report(&request, student_id, query.into_inner())
        .await
}

// 配置路由：仅家长
pub fn configure_parent_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/parent")
            .wrap(middlewares::RateLimit::api())
            .wrap(middlewares::RequireRole::new_any(UserRole::parent_roles()))
            .wrap(middlewares::RequireJWT)
            .route("/children", web::get().to(list_children))
            .route("/children/{student_id}/report", web::get().to(child_report)),
    );
}
