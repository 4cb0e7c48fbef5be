//! 提交、评分与成绩公开

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

use super::TestService;
use super::access::{load_managed_test, load_test, student_can_access_test, test_denied};
use super::grading::{grade_answers, stored_answers};
use crate::models::{
    ApiResponse, ErrorCode,
    activity::entities::ActivityType,
    notifications::requests::NewNotification,
    tests::{
        entities::TestSubmission,
        requests::{GradeSubmissionRequest, NewSubmission, SubmissionGrade, SubmissionQuery, SubmitTestRequest},
        responses::SubmitTestResponse,
    },
    users::entities::UserRole,
};
use crate::services::common::{ApiError, ServiceResult, current_user};
use crate::services::{activity, notifications};
use crate::storage::Storage;
use crate::utils::dates::is_before_deadline;

fn submission_not_found() -> ApiError {
    ApiError::not_found(ErrorCode::SubmissionNotFound, "Submission not found.")
}

/// 成绩公开前隐藏分数与评语
pub fn student_view(mut submission: TestSubmission) -> TestSubmission {
    if !submission.is_published {
        submission.score = None;
        if let Value::Object(map) = &mut submission.answers {
            map.remove("feedback");
        }
    }
    submission
}

/// 把教师评分结果与评语合并进 answers
pub fn merge_grading(
    answers: &Value,
    graded_results: Option<Vec<Value>>,
    feedback: Option<String>,
    graded_at: chrono::DateTime<chrono::Utc>,
) -> Value {
    let mut merged = match answers {
        Value::Object(map) => map.clone(),
        _ => serde_json::Map::new(),
    };
    if let Some(results) = graded_results {
        merged.insert("results".to_string(), Value::Array(results));
    }
    if let Some(feedback) = feedback {
        merged.insert("feedback".to_string(), Value::String(feedback));
    }
    merged.insert("graded_at".to_string(), json!(graded_at));
    Value::Object(merged)
}

async fn load_submission(storage: &Arc<dyn Storage>, id: i64) -> ServiceResult<TestSubmission> {
    storage
        .get_submission_by_id(id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(submission_not_found)
}

pub async fn submit_test(
    service: &TestService,
    request: &HttpRequest,
    body: SubmitTestRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;

    let test = load_test(&storage, body.test_id).await?;
    if !test.is_published {
        return Err(ApiError::forbidden(ErrorCode::TestNotPublished, "Test is not published yet.").into());
    }
    if !student_can_access_test(&storage, user.id, test.id).await? {
        return Err(test_denied().into());
    }
    let now = chrono::Utc::now();
    if !is_before_deadline(test.due_date.as_deref(), now) {
        return Err(ApiError::forbidden(ErrorCode::TestDeadlinePassed, "Test deadline has passed.").into());
    }
    if storage
        .get_submission(test.id, user.id)
        .await
        .map_err(ApiError::from)?
        .is_some()
    {
        return Err(ApiError::conflict(ErrorCode::TestAlreadySubmitted, "Test already submitted.").into());
    }

    let questions = storage
        .list_questions(test.id)
        .await
        .map_err(ApiError::from)?;
    let graded = grade_answers(&questions, &body.answers);

    let submission = storage
        .create_submission(NewSubmission {
            test_id: test.id,
            student_id: user.id,
            answers: stored_answers(&graded.results, now),
            score: graded.score,
            is_graded: !graded.requires_manual_grading,
        })
        .await
        .map_err(ApiError::from)?;

    activity::record(
        &storage,
        user.id,
        ActivityType::TestComplete,
        Some(test.id),
        Some(json!({
            "submission_id": submission.id,
            "score": graded.score,
            "requires_manual_grading": graded.requires_manual_grading,
            "total_questions": questions.len(),
        })),
    )
    .await;
    info!("Student {} submitted test {}", user.id, test.id);

    Ok(HttpResponse::Created().json(ApiResponse::success(
        SubmitTestResponse {
            submission_id: submission.id,
            score: graded.score,
            requires_manual_grading: graded.requires_manual_grading,
            auto_results: graded.results,
        },
        "Test submitted successfully",
    )))
}

pub async fn get_submission(
    service: &TestService,
    request: &HttpRequest,
    test_id: i64,
    query: SubmissionQuery,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;

    let submission = match user.role {
        UserRole::Student => {
            load_test(&storage, test_id).await?;
            storage
                .get_submission(test_id, user.id)
                .await
                .map_err(ApiError::from)?
                .map(student_view)
        }
        UserRole::Teacher | UserRole::Admin => {
            load_managed_test(&storage, &user, test_id).await?;
            let student_id = query.student_id.ok_or_else(|| {
                ApiError::bad_request(ErrorCode::SubmissionInvalid, "student_id is required.")
            })?;
            storage
                .get_submission(test_id, student_id)
                .await
                .map_err(ApiError::from)?
        }
        UserRole::Parent => return Err(test_denied().into()),
    };

    let submission = submission.ok_or_else(submission_not_found)?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(submission, "Submission retrieved successfully")))
}

pub async fn grade_submission(
    service: &TestService,
    request: &HttpRequest,
    submission_id: i64,
    body: GradeSubmissionRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;
    let existing = load_submission(&storage, submission_id).await?;
    let test = load_managed_test(&storage, &user, existing.test_id).await?;

    if !body.score.is_finite() || body.score < 0.0 {
        return Err(ApiError::bad_request(ErrorCode::SubmissionInvalid, "score must be 0 or greater.").into());
    }

    let answers = merge_grading(&existing.answers, body.graded_results, body.feedback, chrono::Utc::now());
    let graded = storage
        .grade_submission(
            submission_id,
            SubmissionGrade {
                answers,
                score: body.score,
                publish: body.publish,
            },
        )
        .await
        .map_err(ApiError::from)?
        .ok_or_else(submission_not_found)?;

    if body.publish == Some(true) {
        notifications::dispatch(
            &storage,
            vec![NewNotification::test_graded(
                graded.student_id,
                &test.title,
                graded.score,
                test.id,
            )],
        )
        .await;
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(graded, "Submission graded successfully")))
}

pub async fn set_published(
    service: &TestService,
    request: &HttpRequest,
    submission_id: i64,
    published: bool,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;
    let existing = load_submission(&storage, submission_id).await?;
    let test = load_managed_test(&storage, &user, existing.test_id).await?;

    let updated = storage
        .set_submission_published(submission_id, published)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(submission_not_found)?;

    if published {
        notifications::dispatch(
            &storage,
            vec![NewNotification::test_result_published(
                updated.student_id,
                &test.title,
                test.id,
            )],
        )
        .await;
    }

    let message = if published {
        "Submission result published"
    } else {
        "Submission result unpublished"
    };
    Ok(HttpResponse::Ok().json(ApiResponse::success(updated, message)))
}

pub async fn list_submissions(
    service: &TestService,
    request: &HttpRequest,
    test_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;
    load_managed_test(&storage, &user, test_id).await?;

    let submissions = storage
        .list_test_submissions(test_id)
        .await
        .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(submissions, "Submissions retrieved successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::User;
    use crate::storage::sea_orm_storage::SeaOrmStorage;
    use crate::storage::sea_orm_storage::courses::tests::{Fixture, fixture, student};
    use crate::storage::sea_orm_storage::exams::tests::{ox_question, test_fields};
    use actix_web::{HttpMessage, body::to_bytes, http::StatusCode, test::TestRequest, web};
    use std::collections::HashMap;

    fn submission(is_published: bool) -> TestSubmission {
        TestSubmission {
            id: 1,
            test_id: 2,
            student_id: 3,
            answers: json!({"results": [], "feedback": "잘했어요"}),
            score: Some(90.0),
            is_graded: true,
            is_published,
            submitted_at: chrono::Utc::now(),
            graded_at: None,
        }
    }

    #[test]
    fn test_student_view_hides_until_published() {
        let hidden = student_view(submission(false));
        assert_eq!(hidden.score, None);
        assert!(hidden.answers.get("feedback").is_none());

        let shown = student_view(submission(true));
        assert_eq!(shown.score, Some(90.0));
        assert_eq!(shown.answers["feedback"], "잘했어요");
    }

    #[test]
    fn test_merge_grading_keeps_existing_fields() {
        let now = chrono::Utc::now();
        let answers = json!({"results": [{"question_id": 1}], "submitted_at": "2025-01-01T00:00:00Z"});

        let merged = merge_grading(&answers, None, Some("좋아요".to_string()), now);
        assert_eq!(merged["results"][0]["question_id"], 1);
        assert_eq!(merged["feedback"], "좋아요");
        assert!(merged.get("graded_at").is_some());
        assert_eq!(merged["submitted_at"], "2025-01-01T00:00:00Z");

        let replaced = merge_grading(&answers, Some(vec![json!({"question_id": 9})]), None, now);
        assert_eq!(replaced["results"][0]["question_id"], 9);
        assert!(replaced.get("feedback").is_none());
    }

    struct Setup {
        storage: Arc<dyn Storage>,
        fx: Fixture,
        member: User,
        outsider: User,
    }

    impl Setup {
        async fn new() -> Self {
            let sea = SeaOrmStorage::in_memory().await;
            let fx = fixture(&sea).await;
            let member = student(&sea, "member", "KID00001", Some(fx.class_id)).await;
            let outsider = student(&sea, "outsider", "KID00002", None).await;
            let member = sea.get_user_by_id_impl(member).await.unwrap().unwrap();
            let outsider = sea.get_user_by_id_impl(outsider).await.unwrap().unwrap();
            Self {
                storage: Arc::new(sea),
                fx,
                member,
                outsider,
            }
        }

        async fn create_test(&self, is_published: bool, due_date: &str) -> i64 {
            let mut fields = test_fields(&self.fx);
            fields.is_published = is_published;
            fields.due_date = Some(due_date.to_string());
            self.storage.create_test(fields).await.unwrap().id
        }

        async fn submit(
            &self,
            user: &User,
            test_id: i64,
            answers: HashMap<String, Value>,
        ) -> (StatusCode, Value) {
            let service = TestService::new_lazy();
            let request = TestRequest::default()
                .app_data(web::Data::new(self.storage.clone()))
                .to_http_request();
            request.extensions_mut().insert(user.clone());

            let response = match submit_test(&service, &request, SubmitTestRequest { test_id, answers }).await {
                Ok(response) => response,
                Err(err) => err.error_response(),
            };
            let status = response.status();
            let body = to_bytes(response.into_body()).await.unwrap();
            (status, serde_json::from_slice(&body).unwrap())
        }
    }

    const PAST: &str = "2020-01-01";
    const FUTURE: &str = "2099-12-31";

    fn no_answers() -> HashMap<String, Value> {
        HashMap::new()
    }

    #[actix_web::test]
    async fn test_missing_test_is_not_found() {
        let setup = Setup::new().await;
        let (status, body) = setup.submit(&setup.member, 9999, no_answers()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], ErrorCode::TestNotFound as i32);
    }

    #[actix_web::test]
    async fn test_gates_apply_in_order() {
        let setup = Setup::new().await;

        // 草稿：即便无权访问且已截止，也先报未发布
        let draft = setup.create_test(false, PAST).await;
        let (status, body) = setup.submit(&setup.outsider, draft, no_answers()).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], ErrorCode::TestNotPublished as i32);

        // 已发布但无权访问：先于截止检查
        let closed = setup.create_test(true, PAST).await;
        let (status, body) = setup.submit(&setup.outsider, closed, no_answers()).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], ErrorCode::TestPermissionDenied as i32);

        // 已截止：即便已有提交也先报截止
        setup
            .storage
            .create_submission(NewSubmission {
                test_id: closed,
                student_id: setup.member.id,
                answers: json!({"results": []}),
                score: Some(0.0),
                is_graded: true,
            })
            .await
            .unwrap();
        let (status, body) = setup.submit(&setup.member, closed, no_answers()).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], ErrorCode::TestDeadlinePassed as i32);

        // 未截止的重复提交
        let open = setup.create_test(true, FUTURE).await;
        let (status, _) = setup.submit(&setup.member, open, no_answers()).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, body) = setup.submit(&setup.member, open, no_answers()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], ErrorCode::TestAlreadySubmitted as i32);
    }

    #[actix_web::test]
    async fn test_auto_graded_submission_is_stored() {
        let setup = Setup::new().await;
        let test_id = setup.create_test(true, FUTURE).await;
        let question = setup.storage.create_question(ox_question(test_id)).await.unwrap();

        let answers = HashMap::from([(question.id.to_string(), json!("o"))]);
        let (status, body) = setup.submit(&setup.member, test_id, answers).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["score"], 10.0);
        assert_eq!(body["data"]["requires_manual_grading"], false);

        let stored = setup
            .storage
            .get_submission(test_id, setup.member.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.id, body["data"]["submission_id"].as_i64().unwrap());
        assert_eq!(stored.score, Some(10.0));
        assert!(stored.is_graded);
        assert!(stored.graded_at.is_some());
        assert!(!stored.is_published);
        assert_eq!(stored.answers["results"][0]["question_id"], question.id);
        assert_eq!(stored.answers["results"][0]["is_correct"], true);
        assert!(stored.answers.get("submitted_at").is_some());
    }
}
