use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use super::get_resource;
use crate::middlewares;
use crate::models::reports::requests::DateRangeParams;
use crate::models::users::entities::UserRole;
use crate::services::ReportService;
use crate::utils::{SafeClassIdI64, SafeStudentIdI64};

// 懒加载的全局 ReportService 实例
static REPORT_SERVICE: Lazy<ReportService> = Lazy::new(ReportService::new_lazy);

pub async fn my_report(
    request: HttpRequest,
    query: web::Query<DateRangeParams>,
) -> ActixResult<HttpResponse> {
    REPORT_SERVICE.my_report(&request, query.into_inner()).await
}

pub async fn student_report(
    request: HttpRequest,
    SafeStudentIdI64(student_id): SafeStudentIdI64,
    query: web::Query<DateRangeParams>,
) -> ActixResult<HttpResponse> {
    REPORT_SERVICE
        .student_report(&request, student_id, query.into_inner())
        .await
}

pub async fn class_report(
    request: HttpRequest,
    SafeClassIdI64(class_id): SafeClassIdI64,
    query: web::Query<DateRangeParams>,
) -> ActixResult<HttpResponse> {
    REPORT_SERVICE
        .class_report(&request, class_id, query.into_inner())
        .await
}

pub async fn admin_activity(
    request: HttpRequest,
    query: web::Query<DateRangeParams>,
) -> ActixResult<HttpResponse> {
    REPORT_SERVICE
        .admin_activity(&request, query.into_inner())
        .await
}

// 配置路由
pub fn configure_report_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/reports")
            .wrap(middlewares::RateLimit::api())
            .wrap(middlewares::RequireApproval)
            .wrap(middlewares::RequireJWT)
            .service(
                get_resource("/student")
                    .wrap(middlewares::RequireRole::new(&UserRole::Student))
                    .to(my_report),
            )
            .service(
                get_resource("/admin/activity")
                    .wrap(middlewares::RequireRole::new(&UserRole::Admin))
                    .to(admin_activity),
            )
            .service(
                web::scope("")
                    .wrap(middlewares::RequireRole::new_any(UserRole::teacher_roles()))
                    .route("/student/{student_id}", web::get().to(student_report))
                    .route("/class/{class_id}", web::get().to(class_report)),
            ),
    );
}
