//! 学习日历：测试截止日与教师日程

pub mod fields;
pub mod view;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use super::admin::classes::check_teacher;
use super::common::{ApiError, ServiceResult, current_user, storage_from_request};
use crate::models::{
    ApiResponse, ErrorCode,
    calendar::{
        entities::{CalendarEvent, EventType},
        requests::{
            CalendarEventQuery, CalendarScope, CreateEventRequest, EventFields, UpdateEventRequest,
        },
        responses::{CalendarChildRef, CalendarClassRef, CalendarContext, CalendarTestRef},
    },
    reports::requests::DateRangeParams,
    users::entities::{User, UserRole},
};
use crate::storage::Storage;
use fields::{calendar_range, fields_from_create, fields_from_update, normalize_fields};

fn event_not_found() -> ApiError {
    ApiError::not_found(ErrorCode::CalendarEventNotFound, "Calendar event not found.")
}

fn event_denied() -> ApiError {
    ApiError::forbidden(
        ErrorCode::Forbidden,
        "You do not have permission to modify this event.",
    )
}

/// 管理员，或事件所属/创建的教师
pub fn can_modify_event(user: &User, event: &CalendarEvent) -> bool {
    match user.role {
        UserRole::Admin => true,
        UserRole::Teacher => event.teacher_id == Some(user.id) || event.created_by == user.id,
        _ => false,
    }
}

/// 按角色补全并校验归属；返回最终写入的字段
async fn authorize_fields(
    storage: &Arc<dyn Storage>,
    user: &User,
    fields: EventFields,
) -> ServiceResult<EventFields> {
    let mut fields = normalize_fields(fields)?;

    match fields.event_type {
        EventType::TeacherSchedule => {
            if user.role == UserRole::Teacher {
                fields.teacher_id = Some(user.id);
            } else if let Some(teacher_id) = fields.teacher_id {
                check_teacher(storage, teacher_id).await?;
            }
        }
        EventType::TestDeadline => {
            let class_id = fields.class_id.unwrap_or_default();
            let class = storage
                .get_class_by_id(class_id)
                .await
                .map_err(ApiError::from)?
                .ok_or_else(|| ApiError::not_found(ErrorCode::ClassNotFound, "Class not found."))?;
            if user.role == UserRole::Teacher && class.teacher_id != Some(user.id) {
                return Err(ApiError::forbidden(
                    ErrorCode::ClassPermissionDenied,
                    "You can only add deadlines to your own classes.",
                ));
            }

            fields.teacher_id = class.teacher_id;
            if let Some(test_id) = fields.test_id {
                let test = storage
                    .get_test_by_id(test_id)
                    .await
                    .map_err(ApiError::from)?
                    .ok_or_else(|| ApiError::not_found(ErrorCode::TestNotFound, "Test not found."))?;
                if user.role == UserRole::Teacher && test.teacher_id != user.id {
                    return Err(ApiError::forbidden(
                        ErrorCode::TestPermissionDenied,
                        "You can only link your own tests.",
                    ));
                }
                fields.teacher_id = Some(test.teacher_id);
            }
        }
    }

    Ok(fields)
}

async fn load_event(storage: &Arc<dyn Storage>, user: &User, id: i64) -> ServiceResult<CalendarEvent> {
    let event = storage
        .get_calendar_event(id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(event_not_found)?;
    if !can_modify_event(user, &event) {
        return Err(event_denied());
    }
    Ok(event)
}

async fn student_class(storage: &Arc<dyn Storage>, student_id: i64) -> ServiceResult<Option<i64>> {
    Ok(storage
        .get_student_profile(student_id)
        .await
        .map_err(ApiError::from)?
        .and_then(|p| p.class_id))
}

pub struct CalendarService {
    storage: Option<Arc<dyn Storage>>,
}

impl CalendarService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ServiceResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => storage_from_request(request),
        }
    }

    pub async fn list_events(
        &self,
        request: &HttpRequest,
        params: DateRangeParams,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let user = current_user(request)?;
        let (start_date, end_date) = calendar_range(&params, chrono::Utc::now().date_naive())?;

        let mut children = None;
        let scope = match user.role {
            UserRole::Admin => CalendarScope::All,
            UserRole::Teacher => {
                let class_ids = storage
                    .list_classes_by_teacher(user.id)
                    .await
                    .map_err(ApiError::from)?
                    .into_iter()
                    .map(|c| c.id)
                    .collect();
                CalendarScope::Teacher {
                    teacher_id: user.id,
                    class_ids,
                }
            }
            UserRole::Student => {
                CalendarScope::Classes(student_class(&storage, user.id).await?.into_iter().collect())
            }
            UserRole::Parent => {
                let list = storage.list_children(user.id).await.map_err(ApiError::from)?;
                let mut class_ids: Vec<i64> = list.iter().filter_map(|c| c.class_id).collect();
                class_ids.sort_unstable();
                class_ids.dedup();
                children = Some(list);
                CalendarScope::Classes(class_ids)
            }
        };

        let events = storage
            .list_calendar_events(CalendarEventQuery {
                start_date,
                end_date,
                scope,
            })
            .await
            .map_err(ApiError::from)?;
        let views = view::annotate(&storage, events, children.as_deref()).await?;

        Ok(HttpResponse::Ok().json(ApiResponse::success(views, "Calendar events retrieved successfully")))
    }

    // 日历页面所需的选择项
    pub async fn context(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let user = current_user(request)?;

        let mut context = CalendarContext::default();
        match user.role {
            UserRole::Admin | UserRole::Teacher => {
                let teacher_id = (user.role == UserRole::Teacher).then_some(user.id);
                let classes = storage
                    .list_class_summaries(false, teacher_id)
                    .await
                    .map_err(ApiError::from)?;
                let tests = storage.list_tests(teacher_id).await.map_err(ApiError::from)?;
                context.classes = Some(
                    classes
                        .into_iter()
                        .map(|c| CalendarClassRef {
                            id: c.class.id,
                            name: c.class.name,
                            subject_name: c.subject_name,
                        })
                        .collect(),
                );
                context.tests = Some(
                    tests
                        .into_iter()
                        .map(|t| CalendarTestRef {
                            id: t.id,
                            title: t.title,
                        })
                        .collect(),
                );
            }
            UserRole::Student => {
                if let Some(class_id) = student_class(&storage, user.id).await? {
                    let summary = storage
                        .list_class_summaries(true, None)
                        .await
                        .map_err(ApiError::from)?
                        .into_iter()
                        .find(|c| c.class.id == class_id);
                    context.class = summary.map(|c| CalendarClassRef {
                        id: c.class.id,
                        name: c.class.name,
                        subject_name: c.subject_name,
                    });
                }
            }
            UserRole::Parent => {
                let children = storage.list_children(user.id).await.map_err(ApiError::from)?;
                context.children = Some(
                    children
                        .into_iter()
                        .map(|c| CalendarChildRef {
                            id: c.student_id,
                            name: c.student_name,
                            class_id: c.class_id,
                            class_name: c.class_name,
                        })
                        .collect(),
                );
            }
        }

        Ok(HttpResponse::Ok().json(ApiResponse::success(context, "Calendar context retrieved successfully")))
    }

    pub async fn create_event(
        &self,
        request: &HttpRequest,
        body: CreateEventRequest,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let user = current_user(request)?;

        let fields = authorize_fields(&storage, &user, fields_from_create(body)).await?;
        let event = storage
            .create_calendar_event(fields, user.id)
            .await
            .map_err(ApiError::from)?;

        Ok(HttpResponse::Created().json(ApiResponse::success(event, "Calendar event created successfully")))
    }

    pub async fn update_event(
        &self,
        request: &HttpRequest,
        id: i64,
        body: UpdateEventRequest,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let user = current_user(request)?;

        let event = load_event(&storage, &user, id).await?;
        let fields = authorize_fields(&storage, &user, fields_from_update(&event, body)).await?;
        let updated = storage
            .update_calendar_event(id, fields)
            .await
            .map_err(ApiError::from)?
            .ok_or_else(event_not_found)?;

        Ok(HttpResponse::Ok().json(ApiResponse::success(updated, "Calendar event updated successfully")))
    }

    pub async fn delete_event(&self, request: &HttpRequest, id: i64) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let user = current_user(request)?;

        load_event(&storage, &user, id).await?;
        if !storage.delete_calendar_event(id).await.map_err(ApiError::from)? {
            return Err(event_not_found().into());
        }

        Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_empty("Calendar event deleted successfully")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::calendar::entities::Visibility;
    use crate::services::courses::access::tests::user;
    use crate::storage::sea_orm_storage::SeaOrmStorage;
    use crate::storage::sea_orm_storage::courses::tests::fixture;

    fn schedule(created_by: i64, teacher_id: Option<i64>) -> CalendarEvent {
        let now = chrono::Utc::now();
        CalendarEvent {
            id: 1,
            event_type: EventType::TeacherSchedule,
            title: "상담".to_string(),
            description: None,
            start_date: "2025-04-01".to_string(),
            end_date: "2025-04-01".to_string(),
            class_id: None,
            test_id: None,
            teacher_id,
            visibility: Visibility::TeacherOnly,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_modify_rights() {
        let event = schedule(9, Some(5));
        assert!(can_modify_event(&user(1, UserRole::Admin), &event));
        assert!(can_modify_event(&user(5, UserRole::Teacher), &event));
        assert!(can_modify_event(&user(9, UserRole::Teacher), &event));
        assert!(!can_modify_event(&user(6, UserRole::Teacher), &event));
        assert!(!can_modify_event(&user(5, UserRole::Student), &event));
    }

    fn deadline(class_id: i64) -> EventFields {
        EventFields {
            event_type: EventType::TestDeadline,
            title: "단원평가".to_string(),
            description: None,
            start_date: "2025-04-01".to_string(),
            end_date: "2025-04-01".to_string(),
            class_id: Some(class_id),
            test_id: None,
            teacher_id: None,
        }
    }

    #[tokio::test]
    async fn test_deadline_requires_class_ownership() {
        let sea = SeaOrmStorage::in_memory().await;
        let fx = fixture(&sea).await;
        let storage: Arc<dyn Storage> = Arc::new(sea);

        let owner = user(fx.teacher_id, UserRole::Teacher);
        let fields = authorize_fields(&storage, &owner, deadline(fx.class_id)).await.unwrap();
        assert_eq!(fields.teacher_id, Some(fx.teacher_id));

        let stranger = user(fx.teacher_id + 100, UserRole::Teacher);
        let err = authorize_fields(&storage, &stranger, deadline(fx.class_id))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ClassPermissionDenied);

        let missing = authorize_fields(&storage, &owner, deadline(9999)).await.unwrap_err();
        assert_eq!(missing.code, ErrorCode::ClassNotFound);
    }
}
