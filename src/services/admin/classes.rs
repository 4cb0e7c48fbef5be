use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::collections::HashSet;
use std::sync::Arc;

use super::AdminService;
use super::subjects::GRADE_LEVELS;
use crate::models::{
    ApiResponse, ErrorCode,
    classes::{
        entities::Class,
        requests::{ClassFields, ClassListParams, CreateClassRequest, UpdateClassRequest},
    },
    notifications::requests::NewNotification,
    users::entities::UserRole,
};
use crate::services::common::{ApiError, ServiceResult};
use crate::services::notifications;
use crate::storage::Storage;

pub(crate) const DEFAULT_MAX_STUDENTS: i32 = 30;
const MAX_STUDENTS_RANGE: std::ops::RangeInclusive<i32> = 1..=200;
const MAX_NAME_CHARS: usize = 100;

fn class_invalid(message: &str) -> ApiError {
    ApiError::bad_request(ErrorCode::ClassInvalid, message)
}

fn class_not_found() -> ApiError {
    ApiError::not_found(ErrorCode::ClassNotFound, "Class not found.")
}

/// 与存储无关的字段校验
pub(crate) fn check_fields(fields: &mut ClassFields) -> ServiceResult<()> {
    fields.name = fields.name.trim().to_string();
    if fields.name.is_empty() || fields.name.chars().count() > MAX_NAME_CHARS {
        return Err(class_invalid("Class name must be 1 to 100 characters."));
    }
    if fields.grade_level.is_some_and(|g| !GRADE_LEVELS.contains(&g)) {
        return Err(class_invalid("Grade level must be between 1 and 12."));
    }
    if !MAX_STUDENTS_RANGE.contains(&fields.max_students) {
        return Err(class_invalid("max_students must be between 1 and 200."));
    }
    Ok(())
}

/// 去重并检查人数上限
pub(crate) fn check_roster(student_ids: &[i64], max_students: i32) -> ServiceResult<Vec<i64>> {
    let mut seen = HashSet::new();
    let ids: Vec<i64> = student_ids
        .iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .collect();
    if ids.len() > max_students as usize {
        return Err(ApiError::bad_request(
            ErrorCode::ClassFull,
            format!("A class can hold at most {max_students} students."),
        ));
    }
    Ok(ids)
}

/// 科目需存在且启用，教师需存在、已审批且启用
async fn check_references(storage: &Arc<dyn Storage>, fields: &ClassFields) -> ServiceResult<()> {
    let subject = storage
        .get_subject_by_id(fields.subject_id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found(ErrorCode::SubjectNotFound, "Subject not found."))?;
    if !subject.is_active {
        return Err(ApiError::bad_request(
            ErrorCode::SubjectInactive,
            "Subject is not active.",
        ));
    }

    if let Some(teacher_id) = fields.teacher_id {
        check_teacher(storage, teacher_id).await?;
    }
    Ok(())
}

/// 必须是已审批且在用的教师
pub(crate) async fn check_teacher(storage: &Arc<dyn Storage>, teacher_id: i64) -> ServiceResult<()> {
    let valid = storage
        .get_user_by_id(teacher_id)
        .await
        .map_err(ApiError::from)?
        .is_some_and(|t| t.role == UserRole::Teacher && t.is_approved && t.is_active);
    if !valid {
        return Err(ApiError::bad_request(
            ErrorCode::TeacherInvalid,
            "Teacher must be an approved, active teacher.",
        ));
    }
    Ok(())
}

async fn check_students(storage: &Arc<dyn Storage>, ids: &[i64]) -> ServiceResult<()> {
    if ids.is_empty() {
        return Ok(());
    }
    let users = storage.get_users_by_ids(ids).await.map_err(ApiError::from)?;
    let valid = users
        .iter()
        .filter(|u| u.role == UserRole::Student && u.is_active)
        .count();
    if valid != ids.len() {
        return Err(class_invalid("student_ids must all be active students."));
    }
    Ok(())
}

/// 教师变更对应的通知
pub(crate) fn teacher_change_notifications(
    before: Option<i64>,
    after: &Class,
) -> Vec<NewNotification> {
    match (before, after.teacher_id) {
        (Some(old), Some(new)) if old == new => {
            vec![NewNotification::class_updated(new, &after.name, after.id)]
        }
        (old, new) => old
            .map(|old| NewNotification::class_unassigned(old, &after.name, after.id))
            .into_iter()
            .chain(new.map(|new| NewNotification::class_assigned(new, &after.name, after.id)))
            .collect(),
    }
}

pub async fn list_classes(
    service: &AdminService,
    request: &HttpRequest,
    params: ClassListParams,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let classes = storage
        .list_class_summaries(params.include_inactive, None)
        .await
        .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(classes, "Classes retrieved successfully")))
}

pub async fn create_class(
    service: &AdminService,
    request: &HttpRequest,
    body: CreateClassRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    let mut fields = ClassFields {
        name: body.name,
        subject_id: body.subject_id,
        teacher_id: body.teacher_id,
        grade_level: body.grade_level,
        max_students: body.max_students.unwrap_or(DEFAULT_MAX_STUDENTS),
        is_active: body.is_active.unwrap_or(true),
    };
    check_fields(&mut fields)?;
    let roster = body
        .student_ids
        .as_deref()
        .map(|ids| check_roster(ids, fields.max_students))
        .transpose()?;
    check_references(&storage, &fields).await?;
    if let Some(ids) = &roster {
        check_students(&storage, ids).await?;
    }

    let class = storage.create_class(fields).await.map_err(ApiError::from)?;
    if let Some(ids) = &roster {
        storage
            .replace_class_students(class.id, ids)
            .await
            .map_err(ApiError::from)?;
    }

    notifications::dispatch(&storage, teacher_change_notifications(None, &class)).await;

    Ok(HttpResponse::Created().json(ApiResponse::success(class, "Class created successfully")))
}

pub async fn update_class(
    service: &AdminService,
    request: &HttpRequest,
    id: i64,
    body: UpdateClassRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let existing = storage
        .get_class_by_id(id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(class_not_found)?;

    let mut fields = ClassFields {
        name: body.name.unwrap_or_else(|| existing.name.clone()),
        subject_id: body.subject_id.unwrap_or(existing.subject_id),
        teacher_id: body.teacher_id.unwrap_or(existing.teacher_id),
        grade_level: body.grade_level.unwrap_or(existing.grade_level),
        max_students: body.max_students.unwrap_or(existing.max_students),
        is_active: body.is_active.unwrap_or(existing.is_active),
    };
    check_fields(&mut fields)?;

    let roster = match body.student_ids.as_deref() {
        Some(ids) => Some(check_roster(ids, fields.max_students)?),
        None => {
            // 只改上限时也不能低于现有人数
            let current = storage
                .list_class_students(id)
                .await
                .map_err(ApiError::from)?;
            if current.len() > fields.max_students as usize {
                return Err(ApiError::bad_request(
                    ErrorCode::ClassFull,
                    "max_students is below the current number of students.",
                )
                .into());
            }
            None
        }
    };

    // 未改动的科目和教师不再要求启用状态
    if fields.subject_id != existing.subject_id || fields.teacher_id != existing.teacher_id {
        check_references(&storage, &fields).await?;
    }
    if let Some(ids) = &roster {
        check_students(&storage, ids).await?;
    }

    let class = storage
        .update_class(id, fields)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(class_not_found)?;
    if let Some(ids) = &roster {
        storage
            .replace_class_students(id, ids)
            .await
            .map_err(ApiError::from)?;
    }

    notifications::dispatch(
        &storage,
        teacher_change_notifications(existing.teacher_id, &class),
    )
    .await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(class, "Class updated successfully")))
}

pub async fn delete_class(
    service: &AdminService,
    request: &HttpRequest,
    id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let existing = storage
        .get_class_by_id(id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(class_not_found)?;

    storage.delete_class(id).await.map_err(ApiError::from)?;

    if let Some(teacher_id) = existing.teacher_id {
        notifications::dispatch(
            &storage,
            vec![NewNotification::class_archived(teacher_id, &existing.name)],
        )
        .await;
    }

    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_empty("Class deleted successfully")))
}

pub async fn list_class_students(
    service: &AdminService,
    request: &HttpRequest,
    id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    storage
        .get_class_by_id(id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(class_not_found)?;

    let students = storage
        .list_class_students(id)
        .await
        .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(students, "Students retrieved successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::notifications::entities::NotificationType;

    fn fields(max_students: i32) -> ClassFields {
        ClassFields {
            name: " 3학년 1반 ".to_string(),
            subject_id: 1,
            teacher_id: None,
            grade_level: Some(3),
            max_students,
            is_active: true,
        }
    }

    fn class(teacher_id: Option<i64>) -> Class {
        let now = chrono::Utc::now();
        Class {
            id: 7,
            name: "3학년 1반".to_string(),
            subject_id: 1,
            teacher_id,
            grade_level: None,
            max_students: 30,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_field_checks() {
        let mut ok = fields(30);
        check_fields(&mut ok).unwrap();
        assert_eq!(ok.name, "3학년 1반");

        assert!(check_fields(&mut fields(0)).is_err());
        assert!(check_fields(&mut fields(201)).is_err());
        let mut bad_grade = fields(30);
        bad_grade.grade_level = Some(0);
        assert!(check_fields(&mut bad_grade).is_err());
    }

    #[test]
    fn test_roster_dedup_and_capacity() {
        assert_eq!(check_roster(&[3, 1, 3], 2).unwrap(), vec![3, 1]);
        let err = check_roster(&[1, 2, 3], 2).unwrap_err();
        assert_eq!(err.code, ErrorCode::ClassFull);
    }

    #[test]
    fn test_teacher_change_notifications() {
        assert!(teacher_change_notifications(None, &class(None)).is_empty());

        let same = teacher_change_notifications(Some(5), &class(Some(5)));
        assert_eq!(same.len(), 1);
        assert_eq!(same[0].user_id, 5);
        assert_eq!(same[0].notification_type, NotificationType::ClassChange);

        let swapped = teacher_change_notifications(Some(5), &class(Some(6)));
        assert_eq!(swapped.len(), 2);
        assert_eq!(swapped[0], NewNotification::class_unassigned(5, "3학년 1반", 7));
        assert_eq!(swapped[1], NewNotification::class_assigned(6, "3학년 1반", 7));

        let removed = teacher_change_notifications(Some(5), &class(None));
        assert_eq!(removed, vec![NewNotification::class_unassigned(5, "3학년 1반", 7)]);
    }
}
