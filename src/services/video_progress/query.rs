use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use super::VideoProgressService;
use super::calc::course_overview;
use crate::models::{
    ApiResponse, ErrorCode,
    courses::requests::CourseScope,
    users::entities::{User, UserRole},
    video_progress::{
        requests::TeacherOverviewParams,
        responses::{BlockProgressResponse, VideoProgressDetail},
    },
};
use crate::services::common::{ApiError, ServiceResult, current_user};
use crate::services::courses::access::load_editable_course;
use crate::services::courses::detail::block_video_summary;
use crate::storage::Storage;

/// 学生本人、关联家长、教师与管理员可查看学生进度
async fn ensure_can_view_student(
    storage: &Arc<dyn Storage>,
    viewer: &User,
    student_id: i64,
) -> ServiceResult<()> {
    let allowed = match viewer.role {
        UserRole::Admin | UserRole::Teacher => true,
        UserRole::Student => viewer.id == student_id,
        UserRole::Parent => storage
            .is_parent_of(viewer.id, student_id)
            .await
            .map_err(ApiError::from)?,
    };
    if !allowed {
        return Err(ApiError::forbidden(
            ErrorCode::Forbidden,
            "You cannot view this student's progress.",
        ));
    }
    Ok(())
}

pub async fn list_my_progress(
    service: &VideoProgressService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;

    let records = storage
        .list_student_progress(user.id)
        .await
        .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(records, "Video progress retrieved successfully")))
}

pub async fn get_block_progress(
    service: &VideoProgressService,
    request: &HttpRequest,
    block_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;

    let progress = storage
        .get_video_progress(user.id, block_id)
        .await
        .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        BlockProgressResponse { progress },
        "Video progress retrieved successfully",
    )))
}

pub async fn list_student_progress(
    service: &VideoProgressService,
    request: &HttpRequest,
    student_id: i64,
    course_id: Option<i64>,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;
    ensure_can_view_student(&storage, &user, student_id).await?;

    let records: Vec<VideoProgressDetail> = storage
        .list_student_progress(student_id)
        .await
        .map_err(ApiError::from)?
        .into_iter()
        .filter(|r| course_id.is_none() || r.course_id == course_id)
        .collect();

    Ok(HttpResponse::Ok().json(ApiResponse::success(records, "Video progress retrieved successfully")))
}

pub async fn course_summary(
    service: &VideoProgressService,
    request: &HttpRequest,
    course_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;
    load_editable_course(&storage, &user, course_id).await?;

    let blocks = storage
        .list_course_blocks(course_id)
        .await
        .map_err(ApiError::from)?;
    let summary = block_video_summary(&storage, &blocks).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(summary, "Video summary retrieved successfully")))
}

pub async fn course_records(
    service: &VideoProgressService,
    request: &HttpRequest,
    course_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;
    load_editable_course(&storage, &user, course_id).await?;

    let records = storage
        .list_course_progress(course_id)
        .await
        .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(records, "Video progress retrieved successfully")))
}

/// 管理员不指定教师时查看全部课程
pub async fn teacher_overview(
    service: &VideoProgressService,
    request: &HttpRequest,
    params: TeacherOverviewParams,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;

    let scope = match (user.role, params.teacher_id) {
        (UserRole::Admin, Some(teacher_id)) => CourseScope::Teacher(teacher_id),
        (UserRole::Admin, None) => CourseScope::All,
        _ => CourseScope::Teacher(user.id),
    };
    let courses = storage
        .list_course_items(scope)
        .await
        .map_err(ApiError::from)?;
    let course_ids: Vec<i64> = courses.iter().map(|c| c.course.id).collect();
    let blocks = storage
        .list_blocks_for_courses(&course_ids)
        .await
        .map_err(ApiError::from)?;
    let video_ids: Vec<i64> = blocks
        .iter()
        .filter(|b| b.video_id().is_some())
        .map(|b| b.id)
        .collect();
    let records = storage
        .list_progress_for_blocks(&video_ids)
        .await
        .map_err(ApiError::from)?;

    let overview: Vec<_> = courses
        .into_iter()
        .map(|c| course_overview(c.course.id, c.course.title, &blocks, &records))
        .collect();

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        overview,
        "Teacher course video progress retrieved successfully",
    )))
}
