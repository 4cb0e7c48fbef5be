//! 课程访问与编辑权限

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::models::{
    ErrorCode,
    courses::{requests::CourseScope, responses::CourseWithNames},
    users::entities::{User, UserRole},
};
use crate::services::common::{ApiError, ServiceResult};
use crate::storage::Storage;

pub(crate) fn course_not_found() -> ApiError {
    ApiError::not_found(ErrorCode::CourseNotFound, "Course not found.")
}

pub(crate) fn permission_denied() -> ApiError {
    ApiError::forbidden(
        ErrorCode::CoursePermissionDenied,
        "You do not have permission to access this course.",
    )
}

/// 管理员、课程教师或班级教师可编辑
pub fn can_edit_course(user: &User, course: &CourseWithNames) -> bool {
    match user.role {
        UserRole::Admin => true,
        UserRole::Teacher => {
            course.course.teacher_id == user.id || course.class_teacher_id == Some(user.id)
        }
        UserRole::Student | UserRole::Parent => false,
    }
}

pub(crate) async fn load_course(
    storage: &Arc<dyn Storage>,
    course_id: i64,
) -> ServiceResult<CourseWithNames> {
    storage
        .get_course_with_names(course_id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(course_not_found)
}

/// 读取课程并要求编辑权限
pub(crate) async fn load_editable_course(
    storage: &Arc<dyn Storage>,
    user: &User,
    course_id: i64,
) -> ServiceResult<CourseWithNames> {
    let course = load_course(storage, course_id).await?;
    if !can_edit_course(user, &course) {
        return Err(permission_denied());
    }
    Ok(course)
}

/// 家长的子女可访问课程的并集
pub(crate) async fn children_course_ids(
    storage: &Arc<dyn Storage>,
    parent_id: i64,
) -> ServiceResult<Vec<i64>> {
    let children = storage
        .list_children(parent_id)
        .await
        .map_err(ApiError::from)?;
    let mut ids = BTreeSet::new();
    for child in children {
        ids.extend(
            storage
                .accessible_course_ids(child.student_id)
                .await
                .map_err(ApiError::from)?,
        );
    }
    Ok(ids.into_iter().collect())
}

/// 按角色决定课程列表范围
pub(crate) async fn course_scope(storage: &Arc<dyn Storage>, user: &User) -> ServiceResult<CourseScope> {
    Ok(match user.role {
        UserRole::Admin => CourseScope::All,
        UserRole::Teacher => CourseScope::Teacher(user.id),
        UserRole::Student => CourseScope::Ids {
            ids: storage
                .accessible_course_ids(user.id)
                .await
                .map_err(ApiError::from)?,
            published_only: true,
        },
        UserRole::Parent => CourseScope::Ids {
            ids: children_course_ids(storage, user.id).await?,
            published_only: true,
        },
    })
}

/// 学生或家长查看课程：需可访问且已发布
pub(crate) async fn ensure_learner_access(
    storage: &Arc<dyn Storage>,
    user: &User,
    course: &CourseWithNames,
) -> ServiceResult<()> {
    let accessible = match user.role {
        UserRole::Student => storage
            .can_student_access_course(user.id, course.course.id)
            .await
            .map_err(ApiError::from)?,
        UserRole::Parent => children_course_ids(storage, user.id)
            .await?
            .contains(&course.course.id),
        UserRole::Admin | UserRole::Teacher => true,
    };
    if !accessible {
        return Err(permission_denied());
    }
    if !course.course.is_published {
        return Err(ApiError::forbidden(
            ErrorCode::CourseNotPublished,
            "Course is not published.",
        ));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::courses::entities::Course;

    pub(crate) fn user(id: i64, role: UserRole) -> User {
        let now = chrono::Utc::now();
        User {
            id,
            username: format!("u{id}"),
            password_hash: String::new(),
            role,
            name: "이름".to_string(),
            email: None,
            phone: None,
            is_approved: true,
            is_active: true,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn course(teacher_id: i64, class_teacher_id: Option<i64>) -> CourseWithNames {
        let now = chrono::Utc::now();
        CourseWithNames {
            course: Course {
                id: 1,
                title: "국어".to_string(),
                description: None,
                class_id: 1,
                teacher_id,
                is_published: true,
                created_at: now,
                updated_at: now,
            },
            class_name: None,
            class_teacher_id,
            subject_name: None,
            teacher_name: None,
        }
    }

    #[test]
    fn test_edit_rights() {
        let c = course(2, Some(3));
        assert!(can_edit_course(&user(1, UserRole::Admin), &c));
        assert!(can_edit_course(&user(2, UserRole::Teacher), &c));
        assert!(can_edit_course(&user(3, UserRole::Teacher), &c));
        assert!(!can_edit_course(&user(4, UserRole::Teacher), &c));
        assert!(!can_edit_course(&user(2, UserRole::Student), &c));
    }
}
