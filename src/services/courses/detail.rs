use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use super::CourseService;
use super::access::{can_edit_course, ensure_learner_access, load_course, load_editable_course, permission_denied};
use super::progress::{StudentRecords, course_progress, student_block_views, video_summary};
use crate::models::{
    ApiResponse,
    courses::{
        entities::{BlockType, ContentBlock},
        responses::{CourseBlockView, CourseDetailResponse, CourseWithNames},
    },
    tests::entities::TestSubmission,
    users::entities::UserRole,
    video_progress::{entities::VideoProgress, responses::VideoProgressSummary},
};
use crate::services::common::{ApiError, ServiceResult, current_user};
use crate::storage::Storage;

/// 学生在给定内容块上的进度与提交
pub(crate) async fn learner_records(
    storage: &Arc<dyn Storage>,
    student_id: i64,
    blocks: &[ContentBlock],
) -> ServiceResult<(Vec<VideoProgress>, Vec<TestSubmission>)> {
    let progress = storage
        .list_student_progress(student_id)
        .await
        .map_err(ApiError::from)?
        .into_iter()
        .map(|detail| detail.progress)
        .collect();

    let test_ids: Vec<i64> = blocks.iter().filter_map(ContentBlock::test_id).collect();
    let submissions = if test_ids.is_empty() {
        Vec::new()
    } else {
        storage
            .list_student_submissions(student_id, &test_ids)
            .await
            .map_err(ApiError::from)?
    };
    Ok((progress, submissions))
}

pub(crate) async fn block_video_summary(
    storage: &Arc<dyn Storage>,
    blocks: &[ContentBlock],
) -> ServiceResult<Vec<VideoProgressSummary>> {
    let video_ids: Vec<i64> = blocks
        .iter()
        .filter(|b| b.block_type == BlockType::Video)
        .map(|b| b.id)
        .collect();
    let records = storage
        .list_progress_for_blocks(&video_ids)
        .await
        .map_err(ApiError::from)?;
    Ok(video_summary(blocks, &records))
}

fn plain_views(mut blocks: Vec<ContentBlock>) -> Vec<CourseBlockView> {
    blocks.sort_by_key(|b| (b.order_index, b.id));
    blocks
        .into_iter()
        .map(|block| CourseBlockView {
            block,
            student_status: None,
        })
        .collect()
}

fn detail(course: CourseWithNames, blocks: Vec<CourseBlockView>) -> CourseDetailResponse {
    CourseDetailResponse {
        course: course.course,
        class_name: course.class_name,
        teacher_name: course.teacher_name,
        blocks,
        student_progress: None,
        next_content: None,
        video_summary: None,
        assigned_students: None,
    }
}

pub async fn get_course(
    service: &CourseService,
    request: &HttpRequest,
    course_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;
    let course = load_course(&storage, course_id).await?;
    let blocks = storage
        .list_course_blocks(course_id)
        .await
        .map_err(ApiError::from)?;

    let response = match user.role {
        UserRole::Student => {
            ensure_learner_access(&storage, &user, &course).await?;
            let (progress, submissions) = learner_records(&storage, user.id, &blocks).await?;
            let records = StudentRecords::new(&progress, &submissions);
            let (student_progress, next_content) = course_progress(&blocks, &records);
            CourseDetailResponse {
                student_progress: Some(student_progress),
                next_content,
                ..detail(course, student_block_views(blocks, &records))
            }
        }
        UserRole::Parent => {
            ensure_learner_access(&storage, &user, &course).await?;
            detail(course, plain_views(blocks))
        }
        UserRole::Teacher | UserRole::Admin => {
            if !can_edit_course(&user, &course) {
                return Err(permission_denied().into());
            }
            let summary = block_video_summary(&storage, &blocks).await?;
            CourseDetailResponse {
                video_summary: Some(summary),
                ..detail(course, plain_views(blocks))
            }
        }
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(response, "Course retrieved successfully")))
}

pub async fn get_course_for_manage(
    service: &CourseService,
    request: &HttpRequest,
    course_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;
    let course = load_editable_course(&storage, &user, course_id).await?;

    let blocks = storage
        .list_course_blocks(course_id)
        .await
        .map_err(ApiError::from)?;
    let students = storage
        .list_course_students(course_id)
        .await
        .map_err(ApiError::from)?;
    let summary = block_video_summary(&storage, &blocks).await?;

    let response = CourseDetailResponse {
        video_summary: Some(summary),
        assigned_students: Some(students),
        ..detail(course, plain_views(blocks))
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(response, "Course retrieved successfully")))
}
