//! 课程的创建、修改、删除、学生分配与发布

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

use super::CourseService;
use super::access::load_editable_course;
use crate::models::{
    ApiResponse, ErrorCode,
    classes::entities::Class,
    courses::{
        entities::{BlockType, Course},
        requests::{
            CourseUpdate, CreateCourseRequest, NewContentBlock, NewCourse, PublishCourseRequest,
            SetCourseStudentsRequest, UpdateCourseRequest,
        },
        responses::CourseStudentsResponse,
    },
    notifications::requests::NewNotification,
    users::entities::{User, UserRole},
};
use crate::services::admin::classes::check_teacher;
use crate::services::common::{ApiError, ServiceResult, current_user};
use crate::services::notifications;
use crate::storage::Storage;
use crate::utils::validate::normalize_optional;
use crate::utils::youtube::validate_youtube_url;

pub(crate) const DEFAULT_FIRST_VIDEO_TITLE: &str = "첫 학습 영상";

fn course_invalid(message: &str) -> ApiError {
    ApiError::bad_request(ErrorCode::CourseInvalid, message)
}

fn check_title(title: &str) -> ServiceResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(course_invalid("Course title is required."));
    }
    Ok(title.to_string())
}

async fn load_class(storage: &Arc<dyn Storage>, class_id: i64) -> ServiceResult<Class> {
    storage
        .get_class_by_id(class_id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found(ErrorCode::ClassNotFound, "Class not found."))
}

/// 教师只能使用自己负责或无教师的班级
fn check_class_owner(user: &User, class: &Class) -> ServiceResult<()> {
    if user.role == UserRole::Teacher && class.teacher_id.is_some_and(|t| t != user.id) {
        return Err(ApiError::forbidden(
            ErrorCode::ClassPermissionDenied,
            "You can only use classes you teach.",
        ));
    }
    Ok(())
}

/// 决定课程负责教师
async fn resolve_teacher(
    storage: &Arc<dyn Storage>,
    user: &User,
    requested: Option<i64>,
    class: &Class,
) -> ServiceResult<i64> {
    if user.role == UserRole::Teacher {
        return Ok(user.id);
    }
    match requested.or(class.teacher_id) {
        Some(teacher_id) => {
            check_teacher(storage, teacher_id).await?;
            Ok(teacher_id)
        }
        None => Err(ApiError::bad_request(
            ErrorCode::CourseTeacherRequired,
            "A teacher must be chosen for this course.",
        )),
    }
}

/// 管理员修改课程时给教师的通知
pub(crate) fn update_notifications(before: &Course, after: &Course) -> Vec<NewNotification> {
    let mut list = Vec::new();
    if before.teacher_id != after.teacher_id {
        list.push(NewNotification::course_unassigned(
            before.teacher_id,
            &before.title,
            after.id,
        ));
        list.push(NewNotification::course_assigned(
            after.teacher_id,
            &after.title,
            after.id,
        ));
    } else {
        list.push(NewNotification::course_updated(
            after.teacher_id,
            &after.title,
            after.id,
        ));
    }
    if before.is_published != after.is_published {
        list.push(NewNotification::course_publish_changed(
            after.teacher_id,
            &after.title,
            after.id,
            after.is_published,
        ));
    }
    list
}

pub async fn create_course(
    service: &CourseService,
    request: &HttpRequest,
    body: CreateCourseRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;

    let title = check_title(&body.title)?;
    let class = load_class(&storage, body.class_id).await?;
    check_class_owner(&user, &class)?;
    let teacher_id = resolve_teacher(&storage, &user, body.teacher_id, &class).await?;

    let link = validate_youtube_url(&body.initial_video_url).map_err(|_| {
        ApiError::bad_request(ErrorCode::InvalidYoutubeUrl, "Invalid YouTube URL.")
    })?;
    let block_title = body
        .initial_video_title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_FIRST_VIDEO_TITLE)
        .to_string();

    let (course, first_block) = storage
        .create_course_with_first_block(
            NewCourse {
                title,
                description: normalize_optional(body.description),
                class_id: class.id,
                teacher_id,
                is_published: body.is_published.unwrap_or(false),
            },
            NewContentBlock {
                block_type: BlockType::Video,
                title: block_title,
                content: json!({"url": link.url, "video_id": link.video_id}),
                is_required: true,
            },
        )
        .await
        .map_err(ApiError::from)?;

    info!("Course {} created by user {}", course.id, user.id);
    if user.role == UserRole::Admin {
        notifications::dispatch(
            &storage,
            vec![NewNotification::course_assigned(
                course.teacher_id,
                &course.title,
                course.id,
            )],
        )
        .await;
    }

    Ok(HttpResponse::Created().json(ApiResponse::success(
        json!({"course": course, "first_block": first_block}),
        "Course created successfully",
    )))
}

pub async fn update_course(
    service: &CourseService,
    request: &HttpRequest,
    course_id: i64,
    body: UpdateCourseRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;
    let existing = load_editable_course(&storage, &user, course_id).await?;

    if body.teacher_id.is_some_and(|t| t != existing.course.teacher_id)
        && user.role != UserRole::Admin
    {
        return Err(ApiError::forbidden(
            ErrorCode::CoursePermissionDenied,
            "Only administrators can change the course teacher.",
        )
        .into());
    }

    if let Some(class_id) = body.class_id.filter(|c| *c != existing.course.class_id) {
        let class = load_class(&storage, class_id).await?;
        check_class_owner(&user, &class)?;
    }
    if let Some(teacher_id) = body.teacher_id.filter(|t| *t != existing.course.teacher_id) {
        check_teacher(&storage, teacher_id).await?;
    }

    let update = CourseUpdate {
        title: body.title.as_deref().map(check_title).transpose()?,
        description: body.description.map(normalize_optional),
        class_id: body.class_id,
        teacher_id: body.teacher_id,
        is_published: body.is_published,
    };
    let updated = storage
        .update_course(course_id, update)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(super::access::course_not_found)?;

    if user.role == UserRole::Admin {
        notifications::dispatch(&storage, update_notifications(&existing.course, &updated)).await;
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(updated, "Course updated successfully")))
}

pub async fn delete_course(
    service: &CourseService,
    request: &HttpRequest,
    course_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;
    let existing = load_editable_course(&storage, &user, course_id).await?;

    if !storage.delete_course(course_id).await.map_err(ApiError::from)? {
        return Err(super::access::course_not_found().into());
    }

    info!("Course {} deleted by user {}", course_id, user.id);
    if existing.course.teacher_id != user.id {
        notifications::dispatch(
            &storage,
            vec![NewNotification::course_deleted(
                existing.course.teacher_id,
                &existing.course.title,
            )],
        )
        .await;
    }

    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_empty("Course deleted successfully")))
}

/// 去重后的学生 ID，保持原顺序
pub(crate) fn dedup_ids(ids: &[i64]) -> Vec<i64> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

pub async fn set_course_students(
    service: &CourseService,
    request: &HttpRequest,
    course_id: i64,
    body: SetCourseStudentsRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;
    load_editable_course(&storage, &user, course_id).await?;

    let ids = dedup_ids(&body.student_ids);
    if !ids.is_empty() {
        let valid = storage
            .get_users_by_ids(&ids)
            .await
            .map_err(ApiError::from)?
            .iter()
            .filter(|u| u.role == UserRole::Student && u.is_active)
            .count();
        if valid != ids.len() {
            return Err(course_invalid("student_ids must all be active students.").into());
        }
    }

    storage
        .replace_course_students(course_id, &ids)
        .await
        .map_err(ApiError::from)?;
    let students = storage
        .list_course_students(course_id)
        .await
        .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        CourseStudentsResponse {
            course_id,
            students,
        },
        "Course students updated successfully",
    )))
}

pub async fn publish_course(
    service: &CourseService,
    request: &HttpRequest,
    course_id: i64,
    body: PublishCourseRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;
    load_editable_course(&storage, &user, course_id).await?;

    let updated = storage
        .update_course(
            course_id,
            CourseUpdate {
                is_published: Some(body.is_published),
                ..Default::default()
            },
        )
        .await
        .map_err(ApiError::from)?
        .ok_or_else(super::access::course_not_found)?;

    if updated.teacher_id != user.id {
        notifications::dispatch(
            &storage,
            vec![NewNotification::course_publish_changed(
                updated.teacher_id,
                &updated.title,
                updated.id,
                updated.is_published,
            )],
        )
        .await;
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(updated, "Course publish state updated")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::notifications::entities::NotificationType;

    fn course(teacher_id: i64, is_published: bool) -> Course {
        let now = chrono::Utc::now();
        Course {
            id: 5,
            title: "수학".to_string(),
            description: None,
            class_id: 1,
            teacher_id,
            is_published,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_teacher_change_notifies_both() {
        let list = update_notifications(&course(1, false), &course(2, false));
        let users: Vec<i64> = list.iter().map(|n| n.user_id).collect();
        assert_eq!(users, vec![1, 2]);
        assert!(list.iter().all(|n| n.notification_type == NotificationType::CourseChange));
    }

    #[test]
    fn test_publish_change_adds_notice() {
        let list = update_notifications(&course(1, false), &course(1, true));
        assert_eq!(list.len(), 2);
        assert!(list[1].message.contains("공개"));
    }

    #[test]
    fn test_title_and_dedup() {
        assert_eq!(check_title("  기하  ").unwrap(), "기하");
        assert_eq!(check_title(" ").unwrap_err().code, ErrorCode::CourseInvalid);
        assert_eq!(dedup_ids(&[3, 1, 3, 2, 1]), vec![3, 1, 2]);
    }

    #[test]
    fn test_class_owner_check() {
        let now = chrono::Utc::now();
        let class = Class {
            id: 1,
            name: "1반".to_string(),
            subject_id: 1,
            teacher_id: Some(7),
            grade_level: None,
            max_students: 30,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let teacher = |id| User {
            id,
            username: format!("t{id}"),
            password_hash: String::new(),
            role: UserRole::Teacher,
            name: "교사".to_string(),
            email: None,
            phone: None,
            is_approved: true,
            is_active: true,
            last_login: None,
            created_at: now,
            updated_at: now,
        };
        assert!(check_class_owner(&teacher(7), &class).is_ok());
        assert_eq!(
            check_class_owner(&teacher(8), &class).unwrap_err().code,
            ErrorCode::ClassPermissionDenied
        );
    }
}
