use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::collections::HashMap;

use super::CourseService;
use super::access::course_scope;
use super::detail::learner_records;
use super::progress::{StudentRecords, course_progress};
use crate::models::{
    ApiResponse, ErrorCode,
    courses::{entities::ContentBlock, requests::AssignableStudentsParams, responses::CourseListItem},
    users::entities::UserRole,
};
use crate::services::common::{ApiError, current_user};

pub async fn list_courses(service: &CourseService, request: &HttpRequest) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;
    let scope = course_scope(&storage, &user).await?;

    let courses = storage
        .list_course_items(scope)
        .await
        .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(courses, "Courses retrieved successfully")))
}

/// 学生课程列表附带进度；其他角色同普通列表
pub async fn list_user_courses(
    service: &CourseService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;
    let scope = course_scope(&storage, &user).await?;

    let mut courses = storage
        .list_course_items(scope)
        .await
        .map_err(ApiError::from)?;

    if user.role == UserRole::Student && !courses.is_empty() {
        let ids: Vec<i64> = courses.iter().map(|c| c.course.id).collect();
        let blocks = storage
            .list_blocks_for_courses(&ids)
            .await
            .map_err(ApiError::from)?;
        let (progress, submissions) = learner_records(&storage, user.id, &blocks).await?;
        let records = StudentRecords::new(&progress, &submissions);
        attach_progress(&mut courses, blocks, &records);
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(courses, "Courses retrieved successfully")))
}

fn attach_progress(
    courses: &mut [CourseListItem],
    blocks: Vec<ContentBlock>,
    records: &StudentRecords<'_>,
) {
    let mut by_course: HashMap<i64, Vec<ContentBlock>> = HashMap::new();
    for block in blocks {
        by_course.entry(block.course_id).or_default().push(block);
    }
    for item in courses.iter_mut() {
        let blocks = by_course.remove(&item.course.id).unwrap_or_default();
        let (progress, next) = course_progress(&blocks, records);
        item.student_progress = Some(progress);
        item.next_content = next;
    }
}

pub async fn list_assignable_students(
    service: &CourseService,
    request: &HttpRequest,
    params: AssignableStudentsParams,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    let students = storage
        .list_active_students(params.class_id)
        .await
        .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(students, "Students retrieved successfully")))
}

/// 教师只能查看自己负责或未分配教师的班级
pub async fn list_class_students(
    service: &CourseService,
    request: &HttpRequest,
    class_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;

    let class = storage
        .get_class_by_id(class_id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found(ErrorCode::ClassNotFound, "Class not found."))?;
    if user.role == UserRole::Teacher && class.teacher_id.is_some_and(|t| t != user.id) {
        return Err(ApiError::forbidden(
            ErrorCode::ClassPermissionDenied,
            "You do not have permission to access this class.",
        )
        .into());
    }

    let students = storage
        .list_class_students(class_id)
        .await
        .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(students, "Students retrieved successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::courses::entities::{BlockType, Course};
    use crate::services::courses::progress::tests::{block, progress};

    fn item(id: i64) -> CourseListItem {
        let now = chrono::Utc::now();
        CourseListItem {
            course: Course {
                id,
                title: format!("course {id}"),
                description: None,
                class_id: 1,
                teacher_id: 1,
                is_published: true,
                created_at: now,
                updated_at: now,
            },
            class_name: None,
            subject_name: None,
            teacher_name: None,
            student_count: 0,
            block_count: 0,
            student_progress: None,
            next_content: None,
        }
    }

    #[test]
    fn test_progress_is_attached_per_course() {
        let mut courses = vec![item(1), item(2)];
        let mut other = block(3, BlockType::Video, 1, true);
        other.course_id = 2;
        let blocks = vec![block(1, BlockType::Video, 1, true), other];
        let rows = [progress(1, 100.0, true)];
        let records = StudentRecords::new(&rows, &[]);

        attach_progress(&mut courses, blocks, &records);

        let first = courses[0].student_progress.as_ref().unwrap();
        assert_eq!(first.progress_percentage, 100.0);
        let second = courses[1].student_progress.as_ref().unwrap();
        assert_eq!(second.progress_percentage, 0.0);
        assert_eq!(courses[1].next_content.as_ref().unwrap().block_id, 3);
    }
}
