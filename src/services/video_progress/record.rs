use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use serde_json::json;

use super::VideoProgressService;
use super::calc::next_progress;
use crate::models::{
    ApiResponse, ErrorCode,
    activity::entities::ActivityType,
    courses::entities::BlockType,
    video_progress::requests::UpdateVideoProgressRequest,
};
use crate::services::activity;
use crate::services::common::{ApiError, current_user};

pub async fn update_progress(
    service: &VideoProgressService,
    request: &HttpRequest,
    body: UpdateVideoProgressRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;

    if !body.watched_duration.is_finite()
        || !body.total_duration.is_finite()
        || body.watched_duration < 0.0
        || body.total_duration < 1.0
    {
        return Err(ApiError::bad_request(
            ErrorCode::VideoProgressInvalid,
            "watched_duration must be >= 0 and total_duration >= 1.",
        )
        .into());
    }

    let block = storage
        .get_block_by_id(body.video_block_id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found(ErrorCode::BlockNotFound, "Content block not found."))?;
    if block.block_type != BlockType::Video {
        return Err(ApiError::bad_request(
            ErrorCode::VideoProgressInvalid,
            "Progress can only be recorded for video blocks.",
        )
        .into());
    }
    if !storage
        .can_student_access_course(user.id, block.course_id)
        .await
        .map_err(ApiError::from)?
    {
        return Err(ApiError::forbidden(
            ErrorCode::CoursePermissionDenied,
            "You do not have access to this course.",
        )
        .into());
    }

    let previous = storage
        .get_video_progress(user.id, block.id)
        .await
        .map_err(ApiError::from)?;
    let change = next_progress(
        previous.as_ref(),
        user.id,
        block.id,
        body.watched_duration,
        body.total_duration,
    );

    let saved = storage
        .upsert_video_progress(change.upsert)
        .await
        .map_err(ApiError::from)?;

    if change.should_log {
        activity::record(
            &storage,
            user.id,
            ActivityType::VideoWatch,
            Some(block.id),
            Some(json!({
                "course_id": block.course_id,
                "progress": saved.progress_percentage,
                "is_completed": saved.is_completed,
            })),
        )
        .await;
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(saved, "Video progress updated")))
}
