use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use super::TestService;
use super::access::{
    can_manage_test, load_managed_test, load_test, student_can_access_test, sync_calendar,
    test_denied,
};
use super::grading::attempt_questions;
use crate::models::{
    ApiResponse, ErrorCode,
    courses::{
        entities::BlockType,
        requests::{CourseScope, NewContentBlock},
        responses::CourseWithNames,
    },
    tests::{
        entities::Test,
        requests::{CreateTestRequest, TestFields, UpdateTestRequest},
        responses::{TestAttemptResponse, TestDetailResponse},
    },
    users::entities::{User, UserRole},
};
use crate::services::common::{ApiError, ServiceResult, current_user};
use crate::services::courses::access::{can_edit_course, course_not_found};
use crate::storage::Storage;
use crate::utils::dates::{format_date, parse_date};
use crate::utils::validate::normalize_optional;

pub(crate) const DEFAULT_TOTAL_SCORE: i32 = 100;

fn test_invalid(message: impl Into<String>) -> ApiError {
    ApiError::bad_request(ErrorCode::TestInvalid, message)
}

fn check_title(title: &str) -> ServiceResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(test_invalid("Test title is required."));
    }
    Ok(title.to_string())
}

fn check_due_date(raw: &str) -> ServiceResult<String> {
    parse_date(raw)
        .map(format_date)
        .map_err(|e| test_invalid(e.to_string()))
}

/// 分数与时限的取值范围
pub(crate) fn check_numbers(total_score: i32, time_limit: Option<i32>) -> ServiceResult<()> {
    if total_score < 1 {
        return Err(test_invalid("total_score must be at least 1."));
    }
    if time_limit.is_some_and(|t| t < 1) {
        return Err(test_invalid("time_limit must be at least 1 minute."));
    }
    Ok(())
}

/// 未指定课程时，班级里唯一的（优先本人）课程自动关联
pub fn auto_link_course(class_courses: &[(i64, i64)], owner_id: i64) -> Option<i64> {
    let own: Vec<i64> = class_courses
        .iter()
        .filter(|(_, teacher)| *teacher == owner_id)
        .map(|(id, _)| *id)
        .collect();
    match (own.as_slice(), class_courses) {
        ([only], _) => Some(*only),
        (_, [(only, _)]) => Some(*only),
        _ => None,
    }
}

/// 课程中若还没有引用该测试的块，则追加一个必修测试块
async fn link_test_block(storage: &Arc<dyn Storage>, course_id: i64, test: &Test) -> ServiceResult<()> {
    let blocks = storage
        .list_course_blocks(course_id)
        .await
        .map_err(ApiError::from)?;
    if blocks.iter().any(|b| b.test_id() == Some(test.id)) {
        return Ok(());
    }
    storage
        .create_block(
            course_id,
            NewContentBlock {
                block_type: BlockType::Test,
                title: format!("테스트 · {}", test.title),
                content: json!({"test_id": test.id}),
                is_required: true,
            },
        )
        .await
        .map_err(ApiError::from)?;
    Ok(())
}

async fn link_to_courses(
    storage: &Arc<dyn Storage>,
    test: &Test,
) -> ServiceResult<()> {
    if let Some(course_id) = test.course_id {
        return link_test_block(storage, course_id, test).await;
    }
    let Some(class_id) = test.class_id else {
        return Ok(());
    };
    let class_courses: Vec<(i64, i64)> = storage
        .list_course_items(CourseScope::All)
        .await
        .map_err(ApiError::from)?
        .into_iter()
        .filter(|c| c.course.class_id == class_id)
        .map(|c| (c.course.id, c.course.teacher_id))
        .collect();
    if let Some(course_id) = auto_link_course(&class_courses, test.teacher_id) {
        link_test_block(storage, course_id, test).await?;
    }
    Ok(())
}

async fn check_course(
    storage: &Arc<dyn Storage>,
    user: &User,
    course_id: i64,
    class_id: Option<i64>,
) -> ServiceResult<CourseWithNames> {
    let course = storage
        .get_course_with_names(course_id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(course_not_found)?;
    if !can_edit_course(user, &course) {
        return Err(ApiError::forbidden(
            ErrorCode::CoursePermissionDenied,
            "You do not have permission to use this course.",
        ));
    }
    if class_id.is_some_and(|c| c != course.course.class_id) {
        return Err(test_invalid("Course does not belong to the selected class."));
    }
    Ok(course)
}

/// 班级存在；教师只能用自己负责或无教师的班级。返回班级教师
async fn check_class(
    storage: &Arc<dyn Storage>,
    user: &User,
    class_id: i64,
) -> ServiceResult<Option<i64>> {
    let class = storage
        .get_class_by_id(class_id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found(ErrorCode::ClassNotFound, "Class not found."))?;
    if user.role == UserRole::Teacher && class.teacher_id.is_some_and(|t| t != user.id) {
        return Err(ApiError::forbidden(
            ErrorCode::ClassPermissionDenied,
            "You can only use classes you teach.",
        ));
    }
    Ok(class.teacher_id)
}

pub async fn create_test(
    service: &TestService,
    request: &HttpRequest,
    body: CreateTestRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;

    let title = check_title(&body.title)?;
    let due_date = match body.due_date.as_deref() {
        Some(raw) if !raw.trim().is_empty() => check_due_date(raw)?,
        _ => return Err(test_invalid("due_date is required.").into()),
    };
    let total_score = body.total_score.unwrap_or(DEFAULT_TOTAL_SCORE);
    check_numbers(total_score, body.time_limit)?;

    let course = match body.course_id {
        Some(course_id) => Some(check_course(&storage, &user, course_id, body.class_id).await?),
        None => None,
    };
    let class_id = body.class_id.or(course.as_ref().map(|c| c.course.class_id));
    let class_teacher = match class_id {
        Some(class_id) => check_class(&storage, &user, class_id).await?,
        None => None,
    };

    // 管理员代建时归属课程或班级教师
    let teacher_id = match user.role {
        UserRole::Admin => course
            .as_ref()
            .map(|c| c.course.teacher_id)
            .or(class_teacher)
            .unwrap_or(user.id),
        _ => user.id,
    };

    let test = storage
        .create_test(TestFields {
            title,
            description: normalize_optional(body.description),
            teacher_id,
            course_id: body.course_id,
            class_id,
            time_limit: body.time_limit,
            total_score,
            is_published: body.is_published.unwrap_or(false),
            publish_at: body.publish_at,
            due_date: Some(due_date),
        })
        .await
        .map_err(ApiError::from)?;

    link_to_courses(&storage, &test).await?;
    sync_calendar(&storage, &test).await;
    info!("Test {} created by user {}", test.id, user.id);

    Ok(HttpResponse::Created().json(ApiResponse::success(test, "Test created successfully")))
}

pub async fn update_test(
    service: &TestService,
    request: &HttpRequest,
    test_id: i64,
    body: UpdateTestRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;
    let existing = load_managed_test(&storage, &user, test_id).await?;

    let title = match &body.title {
        Some(title) => check_title(title)?,
        None => existing.title.clone(),
    };
    let due_date = match body.due_date.as_deref() {
        Some(raw) if raw.trim().is_empty() => None,
        Some(raw) => Some(check_due_date(raw)?),
        None => existing.due_date.clone(),
    };
    let total_score = body.total_score.unwrap_or(existing.total_score);
    let time_limit = body.time_limit.unwrap_or(existing.time_limit);
    check_numbers(total_score, time_limit)?;

    let course_id = body.course_id.unwrap_or(existing.course_id);
    let requested_class = body.class_id.unwrap_or(existing.class_id);
    let course = match course_id {
        Some(id) if body.course_id.is_some() || body.class_id.is_some() => {
            Some(check_course(&storage, &user, id, requested_class).await?)
        }
        _ => None,
    };
    let class_id = requested_class.or(course.as_ref().map(|c| c.course.class_id));
    if let Some(id) = class_id.filter(|c| Some(*c) != existing.class_id) {
        check_class(&storage, &user, id).await?;
    }

    let test = storage
        .update_test(
            test_id,
            TestFields {
                title,
                description: match body.description {
                    Some(description) => normalize_optional(description),
                    None => existing.description.clone(),
                },
                teacher_id: existing.teacher_id,
                course_id,
                class_id,
                time_limit,
                total_score,
                is_published: body.is_published.unwrap_or(existing.is_published),
                publish_at: body.publish_at.unwrap_or(existing.publish_at),
                due_date,
            },
        )
        .await
        .map_err(ApiError::from)?
        .ok_or_else(super::access::test_not_found)?;

    link_to_courses(&storage, &test).await?;
    sync_calendar(&storage, &test).await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(test, "Test updated successfully")))
}

pub async fn delete_test(
    service: &TestService,
    request: &HttpRequest,
    test_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;
    load_managed_test(&storage, &user, test_id).await?;

    if !storage.delete_test(test_id).await.map_err(ApiError::from)? {
        return Err(super::access::test_not_found().into());
    }
    info!("Test {} deleted by user {}", test_id, user.id);

    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_empty("Test deleted successfully")))
}

pub async fn get_test(
    service: &TestService,
    request: &HttpRequest,
    test_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;
    let test = load_test(&storage, test_id).await?;

    let response = if can_manage_test(&user, &test) {
        let questions = storage
            .list_questions(test_id)
            .await
            .map_err(ApiError::from)?;
        TestDetailResponse {
            test,
            questions: Some(questions),
        }
    } else if user.role == UserRole::Student
        && student_can_access_test(&storage, user.id, test_id).await?
    {
        TestDetailResponse {
            test,
            questions: None,
        }
    } else {
        return Err(test_denied().into());
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(response, "Test retrieved successfully")))
}

pub async fn get_attempt(
    service: &TestService,
    request: &HttpRequest,
    test_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;
    let test = load_test(&storage, test_id).await?;

    if !student_can_access_test(&storage, user.id, test_id).await? {
        return Err(test_denied().into());
    }
    if !test.is_published {
        return Err(ApiError::forbidden(ErrorCode::TestNotPublished, "Test is not published yet.").into());
    }

    let questions = storage
        .list_questions(test_id)
        .await
        .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        TestAttemptResponse {
            test,
            questions: attempt_questions(questions),
        },
        "Test attempt prepared",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_link_prefers_own_course() {
        assert_eq!(auto_link_course(&[(1, 5), (2, 6)], 5), Some(1));
        assert_eq!(auto_link_course(&[(1, 6)], 5), Some(1));
        assert_eq!(auto_link_course(&[(1, 6), (2, 7)], 5), None);
        assert_eq!(auto_link_course(&[(1, 5), (2, 5)], 5), None);
        assert_eq!(auto_link_course(&[], 5), None);
    }

    #[test]
    fn test_field_checks() {
        assert!(check_numbers(100, None).is_ok());
        assert!(check_numbers(0, None).is_err());
        assert!(check_numbers(10, Some(0)).is_err());
        assert_eq!(check_due_date(" 2025-03-01 ").unwrap(), "2025-03-01");
        assert_eq!(check_due_date("2025-13-01").unwrap_err().code, ErrorCode::TestInvalid);
        assert!(check_title("   ").is_err());
    }
}
