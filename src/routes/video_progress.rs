use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use super::{get_resource, post_resource};
use crate::middlewares;
use crate::models::users::entities::UserRole;
use crate::models::video_progress::requests::{TeacherOverviewParams, UpdateVideoProgressRequest};
use crate::services::VideoProgressService;
use crate::utils::{SafeBlockIdI64, SafeCourseIdI64, SafeStudentIdI64};

// 懒加载的全局 VideoProgressService 实例
static VIDEO_PROGRESS_SERVICE: Lazy<VideoProgressService> =
    Lazy::new(VideoProgressService::new_lazy);

pub async fn update_progress(
    request: HttpRequest,
    body: web::Json<UpdateVideoProgressRequest>,
) -> ActixResult<HttpResponse> {
    VIDEO_PROGRESS_SERVICE
        .update_progress(&request, body.into_inner())
        .await
}

pub async fn list_my_progress(request: HttpRequest) -> ActixResult<HttpResponse> {
    VIDEO_PROGRESS_SERVICE.list_my_progress(&request).await
}

pub async fn get_block_progress(
    request: HttpRequest,
    SafeBlockIdI64(block_id): SafeBlockIdI64,
) -> ActixResult<HttpResponse> {
    VIDEO_PROGRESS_SERVICE
        .get_block_progress(&request, block_id)
        .await
}

pub async fn list_student_progress(
    request: HttpRequest,
    SafeStudentIdI64(student_id): SafeStudentIdI64,
) -> ActixResult<HttpResponse> {
    VIDEO_PROGRESS_SERVICE
        .list_student_progress(&request, student_id, None)
        .await
}

pub async fn list_student_course_progress(
    request: HttpRequest,
    SafeStudentIdI64(student_id): SafeStudentIdI64,
    SafeCourseIdI64(course_id): SafeCourseIdI64,
) -> ActixResult<HttpResponse> {
    VIDEO_PROGRESS_SERVICE
        .list_student_progress(&request, student_id, Some(course_id))
        .await
}

pub async fn course_summary(request: HttpRequest, SafeCourseIdI64(course_id): SafeCourseIdI64) -> ActixResult<HttpResponse> {
    VIDEO_PROGRESS_SERVICE
        .course_summary(&request, course_id)
        .await
}

pub async fn course_records(request: HttpRequest, SafeCourseIdI64(course_id): SafeCourseIdI64) -> ActixResult<HttpResponse> {
    VIDEO_PROGRESS_SERVICE
        .course_records(&request, course_id)
        .await
}

pub async fn teacher_overview(
    request: HttpRequest,
    query: web::Query<TeacherOverviewParams>,
) -> ActixResult<HttpResponse> {
    VIDEO_PROGRESS_SERVICE
        .teacher_overview(&request, query.into_inner())
        .await
}

// 配置路由
pub fn configure_video_progress_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/video-progress")
            .wrap(middlewares::RateLimit::api())
            .wrap(middlewares::RequireApproval)
            .wrap(middlewares::RequireJWT)
            .service(
                post_resource("")
                    .wrap(middlewares::RequireRole::new(&UserRole::Student))
                    .to(update_progress),
            )
            .service(
                post_resource("/")
                    .wrap(middlewares::RequireRole::new(&UserRole::Student))
                    .to(update_progress),
            )
            .service(get_resource("").to(list_my_progress))
            .service(get_resource("/").to(list_my_progress))
            .service(get_resource("/block/{block_id}").to(get_block_progress))
            .service(get_resource("/student/{student_id}").to(list_student_progress))
            .service(
                get_resource("/student/{student_id}/course/{course_id}")
                    .to(list_student_course_progress),
            )
            .service(
                web::scope("")
                    .wrap(middlewares::RequireRole::new_any(UserRole::teacher_roles()))
                    .route("/course/{course_id}/summary", web::get().to(course_summary))
                    .route("/course/{course_id}", web::get().to(course_records))
                    .route("/teacher/courses", web::get().to(teacher_overview)),
            ),
    );
}
