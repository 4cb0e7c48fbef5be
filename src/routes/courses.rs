use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use super::get_resource;
use crate::middlewares;
use crate::models::courses::requests::{
    AssignableStudentsParams, CreateBlockRequest, CreateCourseRequest, PublishCourseRequest,
    ReorderRequest, SetCourseStudentsRequest, UpdateBlockRequest, UpdateCourseRequest,
};
use crate::models::users::entities::UserRole;
use crate::services::CourseService;
use crate::utils::{SafeBlockIdI64, SafeClassIdI64, SafeIDI64};

// 懒加载的全局 CourseService 实例
static COURSE_SERVICE: Lazy<CourseService> = Lazy::new(CourseService::new_lazy);

pub async fn list_courses(request: HttpRequest) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.list_courses(&request).await
}

pub async fn list_user_courses(request: HttpRequest) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.list_user_courses(&request).await
}

pub async fn get_course(request: HttpRequest, SafeIDI64(id): SafeIDI64) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.get_course(&request, id).await
}

pub async fn list_assignable_students(
    request: HttpRequest,
    query: web::Query<AssignableStudentsParams>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE
        .list_assignable_students(&request, query.into_inner())
        .await
}

pub async fn list_class_students(
    request: HttpRequest,
    SafeClassIdI64(class_id): SafeClassIdI64,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE
        .list_class_students(&request, class_id)
        .await
}

pub async fn get_course_for_manage(
    request: HttpRequest,
    SafeIDI64(id): SafeIDI64,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE
        .get_course_for_manage(&request, id)
        .await
}

pub async fn create_course(
    request: HttpRequest,
    body: web::Json<CreateCourseRequest>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.create_course(&request, body.into_inner()).await
}

pub async fn update_course(
    request: HttpRequest,
    SafeIDI64(id): SafeIDI64,
    body: web::Json<UpdateCourseRequest>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE
        .update_course(&request, id, body.into_inner())
        .await
}

pub async fn delete_course(request: HttpRequest, SafeIDI64(id): SafeIDI64) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.delete_course(&request, id).await
}

pub async fn set_course_students(
    request: HttpRequest,
    SafeIDI64(id): SafeIDI64,
    body: web::Json<SetCourseStudentsRequest>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE
        .set_course_students(&request, id, body.into_inner())
        .await
}

pub async fn publish_course(
    request: HttpRequest,
    SafeIDI64(id): SafeIDI64,
    body: web::Json<PublishCourseRequest>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE
        .publish_course(&request, id, body.into_inner())
        .await
}

pub async fn create_block(
    request: HttpRequest,
    SafeIDI64(id): SafeIDI64,
    body: web::Json<CreateBlockRequest>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE
        .create_block(&request, id, body.into_inner())
        .await
}

pub async fn reorder_blocks(
    request: HttpRequest,
    SafeIDI64(id): SafeIDI64,
    body: web::Json<ReorderRequest>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE
        .reorder_blocks(&request, id, body.into_inner())
        .await
}

pub async fn update_block(
    request: HttpRequest,
    SafeIDI64(id): SafeIDI64,
    SafeBlockIdI64(block_id): SafeBlockIdI64,
    body: web::Json<UpdateBlockRequest>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE
        .update_block(&request, id, block_id, body.into_inner())
        .await
}

pub async fn delete_block(
    request: HttpRequest,
    SafeIDI64(id): SafeIDI64,
    SafeBlockIdI64(block_id): SafeBlockIdI64,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.delete_block(&request, id, block_id).await
}

// 配置路由
pub fn configure_course_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/courses")
            .wrap(middlewares::RateLimit::api())
            .wrap(middlewares::RequireApproval)
            .wrap(middlewares::RequireJWT)
            // 所有角色可读
            .service(get_resource("").to(list_courses))
            .service(get_resource("/").to(list_courses))
            .service(get_resource("/user/courses").to(list_user_courses))
            .service(get_resource("/{id:\\d+}").to(get_course))
            // 教师与管理员
            .service(
                web::scope("")
                    .wrap(middlewares::RequireRole::new_any(UserRole::teacher_roles()))
                    .route("/assignable-students", web::get().to(list_assignable_students))
                    .route("/classes/{class_id}/students", web::get().to(list_class_students))
                    .route("", web::post().to(create_course))
                    .route("/", web::post().to(create_course))
                    .route("/{id}/manage", web::get().to(get_course_for_manage))
                    .route("/{id}/students", web::put().to(set_course_students))
                    .route("/{id}/publish", web::patch().to(publish_course))
                    .route("/{id}/blocks", web::post().to(create_block))
                    .route("/{id}/blocks/reorder", web::put().to(reorder_blocks))
                    .route("/{id}/blocks/{block_id}", web::put().to(update_block))
                    .route("/{id}/blocks/{block_id}", web::delete().to(delete_block))
                    .route("/{id}", web::put().to(update_course))
                    .route("/{id}", web::delete().to(delete_course)),
            ),
    );
}
