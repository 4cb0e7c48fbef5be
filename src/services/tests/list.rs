use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use super::TestService;
use super::access::{student_tests, test_denied};
use crate::models::{
    ApiResponse,
    courses::requests::CourseScope,
    tests::responses::{SubmissionStats, TestListItem},
    users::entities::UserRole,
};
use crate::services::common::{ApiError, ServiceResult, current_user};
use crate::services::courses::progress::submission_status;
use crate::storage::Storage;

/// 补充班级、科目与课程名称
async fn annotate(storage: &Arc<dyn Storage>, items: &mut [TestListItem]) -> ServiceResult<()> {
    let class_ids: Vec<i64> = items
        .iter()
        .filter_map(|i| i.test.class_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let classes: HashMap<i64, (String, i64)> = storage
        .get_classes_by_ids(&class_ids)
        .await
        .map_err(ApiError::from)?
        .into_iter()
        .map(|c| (c.id, (c.name, c.subject_id)))
        .collect();
    let subjects: HashMap<i64, String> = if classes.is_empty() {
        HashMap::new()
    } else {
        storage
            .list_subjects(true)
            .await
            .map_err(ApiError::from)?
            .into_iter()
            .map(|s| (s.id, s.name))
            .collect()
    };

    let course_ids: Vec<i64> = items
        .iter()
        .filter(|i| i.course_title.is_none())
        .filter_map(|i| i.test.course_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let course_titles: HashMap<i64, String> = if course_ids.is_empty() {
        HashMap::new()
    } else {
        storage
            .list_course_items(CourseScope::Ids {
                ids: course_ids,
                published_only: false,
            })
            .await
            .map_err(ApiError::from)?
            .into_iter()
            .map(|c| (c.course.id, c.course.title))
            .collect()
    };

    for item in items.iter_mut() {
        if let Some((name, subject_id)) = item.test.class_id.and_then(|id| classes.get(&id)) {
            item.class_name = Some(name.clone());
            item.subject_name = subjects.get(subject_id).cloned();
        }
        if item.course_title.is_none() {
            item.course_title = item.test.course_id.and_then(|id| course_titles.get(&id).cloned());
        }
    }
    Ok(())
}

pub async fn list_user_tests(service: &TestService, request: &HttpRequest) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;

    let mut items = match user.role {
        UserRole::Student => {
            let mut items = student_tests(&storage, user.id).await?;
            let ids: Vec<i64> = items.iter().map(|i| i.test.id).collect();
            let submissions: HashMap<i64, _> = storage
                .list_student_submissions(user.id, &ids)
                .await
                .map_err(ApiError::from)?
                .into_iter()
                .map(|s| (s.test_id, s))
                .collect();
            for item in &mut items {
                let submission = submissions.get(&item.test.id);
                item.has_submitted = Some(submission.is_some());
                item.submission_status = submission.map(submission_status);
            }
            items
        }
        UserRole::Teacher | UserRole::Admin => {
            let owner = (user.role == UserRole::Teacher).then_some(user.id);
            let tests = storage.list_tests(owner).await.map_err(ApiError::from)?;
            let ids: Vec<i64> = tests.iter().map(|t| t.id).collect();
            let stats = storage
                .submission_stats(&ids)
                .await
                .map_err(ApiError::from)?;
            tests
                .into_iter()
                .map(|test| {
                    let mut item = TestListItem::new(test);
                    item.submission_stats =
                        Some(stats.get(&item.test.id).cloned().unwrap_or_else(SubmissionStats::default));
                    item
                })
                .collect()
        }
        UserRole::Parent => return Err(test_denied().into()),
    };

    annotate(&storage, &mut items).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(items, "Tests retrieved successfully")))
}
