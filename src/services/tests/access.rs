//! 测试的归属判断、学生可见范围与截止日历同步

use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

use crate::models::{
    ErrorCode,
    calendar::{entities::EventType, requests::EventFields},
    courses::requests::CourseScope,
    tests::{entities::Test, responses::TestListItem},
    users::entities::{User, UserRole},
};
use crate::services::common::{ApiError, ServiceResult};
use crate::storage::Storage;

const DEADLINE_DESCRIPTION: &str = "테스트 마감일을 확인하세요.";

pub(crate) fn test_not_found() -> ApiError {
    ApiError::not_found(ErrorCode::TestNotFound, "Test not found.")
}

pub(crate) fn test_denied() -> ApiError {
    ApiError::forbidden(
        ErrorCode::TestPermissionDenied,
        "You do not have permission to access this test.",
    )
}

/// 出题教师或管理员
pub fn can_manage_test(user: &User, test: &Test) -> bool {
    user.role == UserRole::Admin || (user.role == UserRole::Teacher && test.teacher_id == user.id)
}

pub(crate) async fn load_test(storage: &Arc<dyn Storage>, test_id: i64) -> ServiceResult<Test> {
    storage
        .get_test_by_id(test_id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(test_not_found)
}

pub(crate) async fn load_managed_test(
    storage: &Arc<dyn Storage>,
    user: &User,
    test_id: i64,
) -> ServiceResult<Test> {
    let test = load_test(storage, test_id).await?;
    if !can_manage_test(user, &test) {
        return Err(test_denied());
    }
    Ok(test)
}

/// 已发布、有截止日期且关联班级的测试才有截止事件
pub fn deadline_event(test: &Test) -> Option<EventFields> {
    let due_date = test.due_date.clone()?;
    let class_id = test.class_id?;
    if !test.is_published {
        return None;
    }
    Some(EventFields {
        event_type: EventType::TestDeadline,
        title: test.title.clone(),
        description: Some(
            test.description
                .clone()
                .unwrap_or_else(|| DEADLINE_DESCRIPTION.to_string()),
        ),
        start_date: due_date.clone(),
        end_date: due_date,
        class_id: Some(class_id),
        test_id: Some(test.id),
        teacher_id: Some(test.teacher_id),
    })
}

/// 同步失败只记录日志，不影响测试本身的写入
pub(crate) async fn sync_calendar(storage: &Arc<dyn Storage>, test: &Test) {
    if let Err(e) = storage
        .sync_test_deadline_event(test.id, deadline_event(test), test.teacher_id)
        .await
    {
        warn!("Failed to sync calendar event for test {}: {}", test.id, e);
    }
}

/// 按 ID 合并；优先保留带内容块或课程信息的条目
pub fn merge_test_items(items: Vec<TestListItem>) -> Vec<TestListItem> {
    let mut merged: Vec<TestListItem> = Vec::new();
    let mut index: HashMap<i64, usize> = HashMap::new();

    for item in items {
        let Some(&pos) = index.get(&item.test.id) else {
            index.insert(item.test.id, merged.len());
            merged.push(item);
            continue;
        };
        let existing = &mut merged[pos];
        if existing.block_id.is_none() && item.block_id.is_some() {
            existing.block_id = item.block_id;
            existing.block_title = item.block_title;
            existing.course_title = item.course_title;
        } else if existing.course_title.is_none() && item.course_title.is_some() {
            existing.course_title = item.course_title;
        }
    }
    merged
}

/// 学生可见的测试：所在班级与可访问课程关联的测试，只含已发布的
pub(crate) async fn student_tests(
    storage: &Arc<dyn Storage>,
    student_id: i64,
) -> ServiceResult<Vec<TestListItem>> {
    let mut items = Vec::new();

    let class_id = storage
        .get_student_profile(student_id)
        .await
        .map_err(ApiError::from)?
        .and_then(|p| p.class_id);
    if let Some(class_id) = class_id {
        let tests = storage
            .list_tests_for_class(class_id)
            .await
            .map_err(ApiError::from)?;
        items.extend(tests.into_iter().map(TestListItem::new));
    }

    let course_ids = storage
        .accessible_course_ids(student_id)
        .await
        .map_err(ApiError::from)?;
    if course_ids.is_empty() {
        return Ok(merge_test_items(items));
    }

    let courses = storage
        .list_course_items(CourseScope::Ids {
            ids: course_ids.clone(),
            published_only: false,
        })
        .await
        .map_err(ApiError::from)?;
    let titles: HashMap<i64, String> = courses
        .iter()
        .map(|c| (c.course.id, c.course.title.clone()))
        .collect();

    for test in storage
        .list_tests_for_courses(&course_ids)
        .await
        .map_err(ApiError::from)?
    {
        let mut item = TestListItem::new(test);
        item.course_title = item.test.course_id.and_then(|id| titles.get(&id).cloned());
        items.push(item);
    }

    // 已发布课程中的测试块
    let published: Vec<i64> = courses
        .iter()
        .filter(|c| c.course.is_published)
        .map(|c| c.course.id)
        .collect();
    let test_blocks: Vec<_> = storage
        .list_blocks_for_courses(&published)
        .await
        .map_err(ApiError::from)?
        .into_iter()
        .filter_map(|b| b.test_id().map(|test_id| (test_id, b)))
        .collect();
    if !test_blocks.is_empty() {
        let ids: Vec<i64> = test_blocks.iter().map(|(id, _)| *id).collect();
        let tests: HashMap<i64, Test> = storage
            .get_tests_by_ids(&ids)
            .await
            .map_err(ApiError::from)?
            .into_iter()
            .filter(|t| t.is_published)
            .map(|t| (t.id, t))
            .collect();
        for (test_id, block) in test_blocks {
            if let Some(test) = tests.get(&test_id) {
                let mut item = TestListItem::new(test.clone());
                item.block_id = Some(block.id);
                item.block_title = Some(block.title);
                item.course_title = titles.get(&block.course_id).cloned();
                items.push(item);
            }
        }
    }

    Ok(merge_test_items(items))
}

pub(crate) async fn student_can_access_test(
    storage: &Arc<dyn Storage>,
    student_id: i64,
    test_id: i64,
) -> ServiceResult<bool> {
    Ok(student_tests(storage, student_id)
        .await?
        .iter()
        .any(|item| item.test.id == test_id))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_test(id: i64) -> Test {
        let now = chrono::Utc::now();
        Test {
            id,
            title: "단원평가".to_string(),
            description: None,
            teacher_id: 2,
            course_id: None,
            class_id: Some(3),
            time_limit: None,
            total_score: 100,
            is_published: true,
            publish_at: None,
            due_date: Some("2025-06-01".to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_deadline_event_conditions() {
        let event = deadline_event(&sample_test(1)).unwrap();
        assert_eq!(event.start_date, "2025-06-01");
        assert_eq!(event.end_date, "2025-06-01");
        assert_eq!(event.teacher_id, Some(2));
        assert_eq!(event.description.as_deref(), Some(DEADLINE_DESCRIPTION));

        let mut draft = sample_test(1);
        draft.is_published = false;
        assert!(deadline_event(&draft).is_none());
        let mut no_class = sample_test(1);
        no_class.class_id = None;
        assert!(deadline_event(&no_class).is_none());
    }

    #[test]
    fn test_merge_prefers_block_info() {
        let plain = TestListItem::new(sample_test(1));
        let mut from_course = TestListItem::new(sample_test(1));
        from_course.course_title = Some("국어".to_string());
        let mut from_block = TestListItem::new(sample_test(1));
        from_block.block_id = Some(9);
        from_block.block_title = Some("테스트 · 단원평가".to_string());
        from_block.course_title = Some("읽기".to_string());

        let merged = merge_test_items(vec![plain, from_course, from_block, TestListItem::new(sample_test(2))]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].block_id, Some(9));
        assert_eq!(merged[0].course_title.as_deref(), Some("읽기"));
        assert_eq!(merged[1].test.id, 2);
    }

    #[tokio::test]
    async fn test_student_tests_cover_class_and_course_links() {
        use crate::models::courses::{entities::BlockType, requests::NewContentBlock};
        use crate::storage::sea_orm_storage::SeaOrmStorage;
        use crate::storage::sea_orm_storage::courses::tests::{fixture, student};
        use crate::storage::sea_orm_storage::exams::tests::test_fields;
        use serde_json::json;

        let sea = SeaOrmStorage::in_memory().await;
        let fx = fixture(&sea).await;
        let member = student(&sea, "member", "KID00001", Some(fx.class_id)).await;
        let outsider = student(&sea, "outsider", "KID00002", None).await;

        let mut class_only = test_fields(&fx);
        class_only.course_id = None;
        let class_test = sea.create_test_impl(class_only).await.unwrap();

        let mut block_only = test_fields(&fx);
        block_only.course_id = None;
        block_only.class_id = None;
        let block_test = sea.create_test_impl(block_only).await.unwrap();
        let block = sea
            .create_block_impl(
                fx.course_id,
                NewContentBlock {
                    block_type: BlockType::Test,
                    title: "테스트 · 단원평가".to_string(),
                    content: json!({"test_id": block_test.id}),
                    is_required: true,
                },
            )
            .await
            .unwrap();

        let storage: Arc<dyn Storage> = Arc::new(sea);
        let items = student_tests(&storage, member).await.unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().any(|i| i.test.id == class_test.id));
        let linked = items.iter().find(|i| i.test.id == block_test.id).unwrap();
        assert_eq!(linked.block_id, Some(block.id));
        assert_eq!(linked.course_title.as_deref(), Some("읽기"));

        assert!(student_can_access_test(&storage, member, block_test.id).await.unwrap());
        assert!(!student_can_access_test(&storage, outsider, class_test.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_student_tests_hide_drafts() {
        use crate::models::courses::{entities::BlockType, requests::NewContentBlock};
        use crate::storage::sea_orm_storage::SeaOrmStorage;
        use crate::storage::sea_orm_storage::courses::tests::{fixture, student};
        use crate::storage::sea_orm_storage::exams::tests::test_fields;
        use serde_json::json;

        let sea = SeaOrmStorage::in_memory().await;
        let fx = fixture(&sea).await;
        let member = student(&sea, "member", "KID00001", Some(fx.class_id)).await;

        // 班级+课程关联的草稿
        let mut linked = test_fields(&fx);
        linked.is_published = false;
        let linked_draft = sea.create_test_impl(linked).await.unwrap();

        // 仅通过测试块关联的草稿
        let mut block_only = test_fields(&fx);
        block_only.course_id = None;
        block_only.class_id = None;
        block_only.is_published = false;
        let block_draft = sea.create_test_impl(block_only).await.unwrap();
        sea.create_block_impl(
            fx.course_id,
            NewContentBlock {
                block_type: BlockType::Test,
                title: "테스트 · 준비 중".to_string(),
                content: json!({"test_id": block_draft.id}),
                is_required: false,
            },
        )
        .await
        .unwrap();

        let published = sea.create_test_impl(test_fields(&fx)).await.unwrap();

        let storage: Arc<dyn Storage> = Arc::new(sea);
        let items = student_tests(&storage, member).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].test.id, published.id);

        assert!(!student_can_access_test(&storage, member, linked_draft.id).await.unwrap());
        assert!(!student_can_access_test(&storage, member, block_draft.id).await.unwrap());
        assert!(student_can_access_test(&storage, member, published.id).await.unwrap());
    }
}
