use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use super::get_resource;
use crate::middlewares;
use crate::models::calendar::requests::{CreateEventRequest, UpdateEventRequest};
use crate::models::reports::requests::DateRangeParams;
use crate::models::users::entities::UserRole;
use crate::services::CalendarService;
use crate::utils::SafeIDI64;

// 懒加载的全局 CalendarService 实例
static CALENDAR_SERVICE: Lazy<CalendarService> = Lazy::new(CalendarService::new_lazy);

pub async fn list_events(
    request: HttpRequest,
    query: web::Query<DateRangeParams>,
) -> ActixResult<HttpResponse> {
    CALENDAR_SERVICE.list_events(&request, query.into_inner()).await
}

pub async fn context(request: HttpRequest) -> ActixResult<HttpResponse> {
    CALENDAR_SERVICE.context(&request).await
}

pub async fn create_event(
    request: HttpRequest,
    body: web::Json<CreateEventRequest>,
) -> ActixResult<HttpResponse> {
    CALENDAR_SERVICE.create_event(&request, body.into_inner()).await
}

pub async fn update_event(
    request: HttpRequest,
    SafeIDI64(id): SafeIDI64,
    body: web::Json<UpdateEventRequest>,
) -> ActixResult<HttpResponse> {
    CALENDAR_SERVICE
        .update_event(&request, id, body.into_inner())
        .await
}

pub async fn delete_event(request: HttpRequest, SafeIDI64(id): SafeIDI64) -> ActixResult<HttpResponse> {
    CALENDAR_SERVICE.delete_event(&request, id).await
}

// 配置路由
pub fn configure_calendar_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/calendar")
            .wrap(middlewares::RateLimit::api())
            .wrap(middlewares::RequireApproval)
            .wrap(middlewares::RequireJWT)
            .service(get_resource("").to(list_events))
            .service(get_resource("/").to(list_events))
            .service(get_resource("/context").to(context))
            .service(
                web::scope("")
                    .wrap(middlewares::RequireRole::new_any(UserRole::teacher_roles()))
                    .route("", web::post().to(create_event))
                    .route("/", web::post().to(create_event))
                    .route("/{id}", web::put().to(update_event))
                    .route("/{id}", web::delete().to(delete_event)),
            ),
    );
}
