use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::{
    admin::requests::{AdminCreateUserRequest, AdminUpdateUserRequest},
    classes::requests::{ClassListParams, CreateClassRequest, UpdateClassRequest},
    reports::requests::DateRangeParams,
    subjects::requests::{CreateSubjectRequest, SubjectListParams, UpdateSubjectRequest},
    system::requests::{SettingAuditQuery, UpdateSystemSettingsRequest},
    users::{entities::UserRole, requests::UserListParams},
};
use crate::services::{AdminService, ReportService, SystemService};
use crate::utils::SafeIDI64;

// 懒加载的全局服务实例
static ADMIN_SERVICE: Lazy<AdminService> = Lazy::new(AdminService::new_lazy);
static REPORT_SERVICE: Lazy<ReportService> = Lazy::new(ReportService::new_lazy);
static SYSTEM_SERVICE: Lazy<SystemService> = Lazy::new(SystemService::new_lazy);

pub async fn get_overview(request: HttpRequest) -> ActixResult<HttpResponse> {
    ADMIN_SERVICE.get_overview(&request).await
}

pub async fn list_courses(request: HttpRequest) -> ActixResult<HttpResponse> {
    ADMIN_SERVICE.list_courses(&request).await
}

pub async fn list_users(
    request: HttpRequest,
    query: web::Query<UserListParams>,
) -> ActixResult<HttpResponse> {
    ADMIN_SERVICE.list_users(&request, query.into_inner()).await
}

pub async fn create_user(
    request: HttpRequest,
    body: web::Json<AdminCreateUserRequest>,
) -> ActixResult<HttpResponse> {
    ADMIN_SERVICE.create_user(&request, body.into_inner()).await
}

pub async fn approve_user(request: HttpRequest, SafeIDI64(id): SafeIDI64) -> ActixResult<HttpResponse> {
    ADMIN_SERVICE.approve_user(&request, id).await
}

pub async fn update_user(
    request: HttpRequest,
    SafeIDI64(id): SafeIDI64,
    body: web::Json<AdminUpdateUserRequest>,
) -> ActixResult<HttpResponse> {
    ADMIN_SERVICE
        .update_user(&request, id, body.into_inner())
        .await
}

pub async fn deactivate_user(
    request: HttpRequest,
    SafeIDI64(id): SafeIDI64,
) -> ActixResult<HttpResponse> {
    ADMIN_SERVICE.deactivate_user(&request, id).await
}

pub async fn delete_user(request: HttpRequest, SafeIDI64(id): SafeIDI64) -> ActixResult<HttpResponse> {
    ADMIN_SERVICE.delete_user(&request, id).await
}

pub async fn list_subjects(
    request: HttpRequest,
    query: web::Query<SubjectListParams>,
) -> ActixResult<HttpResponse> {
    ADMIN_SERVICE.list_subjects(&request, query.into_inner()).await
}

pub async fn create_subject(
    request: HttpRequest,
    body: web::Json<CreateSubjectRequest>,
) -> ActixResult<HttpResponse> {
    ADMIN_SERVICE.create_subject(&request, body.into_inner()).await
}

pub async fn update_subject(
    request: HttpRequest,
    SafeIDI64(id): SafeIDI64,
    body: web::Json<UpdateSubjectRequest>,
) -> ActixResult<HttpResponse> {
    ADMIN_SERVICE
        .update_subject(&request, id, body.into_inner())
        .await
}

pub async fn delete_subject(
    request: HttpRequest,
    SafeIDI64(id): SafeIDI64,
) -> ActixResult<HttpResponse> {
    ADMIN_SERVICE.delete_subject(&request, id).await
}

pub async fn list_classes(
    request: HttpRequest,
    query: web::Query<ClassListParams>,
) -> ActixResult<HttpResponse> {
    ADMIN_SERVICE.list_classes(&request, query.into_inner()).await
}

pub async fn create_class(
    request: HttpRequest,
    body: web::Json<CreateClassRequest>,
) -> ActixResult<HttpResponse> {
    ADMIN_SERVICE.create_class(&request, body.into_inner()).await
}

pub async fn update_class(
    request: HttpRequest,
    SafeIDI64(id): SafeIDI64,
    body: web::Json<UpdateClassRequest>,
) -> ActixResult<HttpResponse> {
    ADMIN_SERVICE
        .update_class(&request, id, body.into_inner())
        .await
}

pub async fn delete_class(request: HttpRequest, SafeIDI64(id): SafeIDI64) -> ActixResult<HttpResponse> {
    ADMIN_SERVICE.delete_class(&request, id).await
}

pub async fn list_class_students(
    request: HttpRequest,
    SafeIDI64(id): SafeIDI64,
) -> ActixResult<HttpResponse> {
    ADMIN_SERVICE
        .list_class_students(&request, id)
        .await
}

pub async fn activity_report(
    request: HttpRequest,
    query: web::Query<DateRangeParams>,
) -> ActixResult<HttpResponse> {
    REPORT_SERVICE
        .admin_activity(&request, query.into_inner())
        .await
}

pub async fn get_settings(request: HttpRequest) -> ActixResult<HttpResponse> {
    SYSTEM_SERVICE.get_settings(&request).await
}

pub async fn update_settings(
    request: HttpRequest,
    body: web::Json<UpdateSystemSettingsRequest>,
) -> ActixResult<HttpResponse> {
    SYSTEM_SERVICE
        .update_settings(&request, body.into_inner())
        .await
}

pub async fn list_setting_audits(
    request: HttpRequest,
    query: web::Query<SettingAuditQuery>,
) -> ActixResult<HttpResponse> {
    SYSTEM_SERVICE.list_audits(&request, query.into_inner()).await
}

// 配置路由：全部需要管理员
pub fn configure_admin_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/admin")
            .wrap(middlewares::RequireRole::new_any(UserRole::admin_roles()))
            .wrap(middlewares::RequireJWT)
            .route("/overview", web::get().to(get_overview))
            .route("/courses", web::get().to(list_courses))
            .route("/reports/activity", web::get().to(activity_report))
            .route("/settings", web::get().to(get_settings))
            .route("/settings", web::put().to(update_settings))
            .route("/settings/audits", web::get().to(list_setting_audits))
            .route("/users", web::get().to(list_users))
            .route("/users", web::post().to(create_user))
            .route("/users/{id}/approve", web::put().to(approve_user))
            .route("/users/{id}/deactivate", web::put().to(deactivate_user))
            .route("/users/{id}", web::put().to(update_user))
            .route("/users/{id}", web::delete().to(delete_user))
            .route("/subjects", web::get().to(list_subjects))
            .route("/subjects", web::post().to(create_subject))
            .route("/subjects/{id}", web::put().to(update_subject))
            .route("/subjects/{id}", web::delete().to(delete_subject))
            .route("/classes", web::get().to(list_classes))
            .route("/classes", web::post().to(create_class))
            .route("/classes/{id}/students", web::get().to(list_class_students))
            .route("/classes/{id}", web::put().to(update_class))
            .route("/classes/{id}", web::delete().to(delete_class)),
    );
}
