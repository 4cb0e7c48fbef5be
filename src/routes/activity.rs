use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use super::get_resource;
use crate::middlewares;
use crate::models::activity::requests::{ActivityListParams, MyActivityParams};
use crate::models::users::entities::UserRole;
use crate::services::ActivityService;

// 懒加载的全局 ActivityService 实例
static ACTIVITY_SERVICE: Lazy<ActivityService> = Lazy::new(ActivityService::new_lazy);

pub async fn list_my_activities(
    request: HttpRequest,
    query: web::Query<MyActivityParams>,
) -> ActixResult<HttpResponse> {
    ACTIVITY_SERVICE
        .list_my_activities(&request, query.into_inner())
        .await
}

pub async fn list_activities(
    request: HttpRequest,
    query: web::Query<ActivityListParams>,
) -> ActixResult<HttpResponse> {
    ACTIVITY_SERVICE
        .list_activities(&request, query.into_inner())
        .await
}

// 配置路由
pub fn configure_activity_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/activity")
            .wrap(middlewares::RateLimit::api())
            .wrap(middlewares::RequireJWT)
            .service(get_resource("/me").to(list_my_activities))
            .service(
                web::scope("")
                    .wrap(middlewares::RequireRole::new_any(UserRole::admin_roles()))
                    .route("", web::get().to(list_activities))
                    .route("/", web::get().to(list_activities)),
            ),
    );
}
