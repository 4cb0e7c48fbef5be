use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use serde_json::Value;
use std::sync::Arc;

use super::TestService;
use super::access::load_managed_test;
use crate::models::{
    ApiResponse, ErrorCode,
    courses::requests::ReorderRequest,
    tests::{
        entities::TestQuestion,
        requests::{CreateQuestionRequest, NewQuestion, UpdateQuestionRequest},
        responses::QuestionListResponse,
    },
    users::entities::User,
};
use crate::services::common::{ApiError, ServiceResult, current_user};
use crate::services::courses::blocks::is_permutation;
use crate::storage::Storage;

pub(crate) const DEFAULT_POINTS: i32 = 10;

fn question_invalid(message: &str) -> ApiError {
    ApiError::bad_request(ErrorCode::QuestionInvalid, message)
}

fn check_text(text: &str) -> ServiceResult<String> {
    let text = text.trim();
    if text.is_empty() {
        return Err(question_invalid("question_text is required."));
    }
    Ok(text.to_string())
}

fn check_data(data: &Value) -> ServiceResult<()> {
    if !data.is_object() {
        return Err(question_invalid("question_data must be an object."));
    }
    Ok(())
}

fn check_points(points: i32) -> ServiceResult<()> {
    if points < 1 {
        return Err(question_invalid("points must be at least 1."));
    }
    Ok(())
}

/// 读取题目并确认对其所属测试有管理权限
async fn load_managed_question(
    storage: &Arc<dyn Storage>,
    user: &User,
    question_id: i64,
) -> ServiceResult<TestQuestion> {
    let question = storage
        .get_question_by_id(question_id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found(ErrorCode::QuestionNotFound, "Question not found."))?;
    load_managed_test(storage, user, question.test_id).await?;
    Ok(question)
}

pub async fn create_question(
    service: &TestService,
    request: &HttpRequest,
    body: CreateQuestionRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;
    load_managed_test(&storage, &user, body.test_id).await?;

    let question_text = check_text(&body.question_text)?;
    check_data(&body.question_data)?;
    let points = body.points.unwrap_or(DEFAULT_POINTS);
    check_points(points)?;

    let question = storage
        .create_question(NewQuestion {
            test_id: body.test_id,
            question_type: body.question_type,
            question_text,
            question_data: body.question_data,
            points,
            order_index: body.order_index,
        })
        .await
        .map_err(ApiError::from)?;

    Ok(HttpResponse::Created().json(ApiResponse::success(question, "Question created successfully")))
}

pub async fn update_question(
    service: &TestService,
    request: &HttpRequest,
    question_id: i64,
    mut body: UpdateQuestionRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;
    load_managed_question(&storage, &user, question_id).await?;

    if let Some(text) = &body.question_text {
        body.question_text = Some(check_text(text)?);
    }
    if let Some(data) = &body.question_data {
        check_data(data)?;
    }
    if let Some(points) = body.points {
        check_points(points)?;
    }

    let question = storage
        .update_question(question_id, body)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found(ErrorCode::QuestionNotFound, "Question not found."))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(question, "Question updated successfully")))
}

pub async fn delete_question(
    service: &TestService,
    request: &HttpRequest,
    question_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;
    load_managed_question(&storage, &user, question_id).await?;

    storage
        .delete_question(question_id)
        .await
        .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_empty("Question deleted successfully")))
}

pub async fn reorder_questions(
    service: &TestService,
    request: &HttpRequest,
    test_id: i64,
    body: ReorderRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;
    load_managed_test(&storage, &user, test_id).await?;

    let current: Vec<i64> = storage
        .list_questions(test_id)
        .await
        .map_err(ApiError::from)?
        .iter()
        .map(|q| q.id)
        .collect();
    if !is_permutation(&current, &body.ordered_ids) {
        return Err(ApiError::bad_request(
            ErrorCode::ReorderInvalid,
            "ordered_ids must list every question of the test exactly once.",
        )
        .into());
    }

    let questions = storage
        .reorder_questions(test_id, &body.ordered_ids)
        .await
        .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        QuestionListResponse { questions },
        "Questions reordered successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_question_field_checks() {
        assert_eq!(check_text("  O/X  ").unwrap(), "O/X");
        assert!(check_text("").is_err());
        assert!(check_data(&json!({"correctAnswer": "O"})).is_ok());
        assert_eq!(check_data(&json!([1])).unwrap_err().code, ErrorCode::QuestionInvalid);
        assert!(check_points(DEFAULT_POINTS).is_ok());
        assert!(check_points(0).is_err());
    }
}
