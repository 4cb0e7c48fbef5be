//! 课程问答：学生提问、教师回答

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use serde_json::json;
use std::sync::Arc;

use super::common::{ApiError, ServiceResult, current_user, storage_from_request};
use super::courses::access::{can_edit_course, ensure_learner_access, load_course};
use super::{activity, notifications};
use crate::models::{
    ApiResponse, ErrorCode,
    activity::entities::ActivityType,
    courses::responses::CourseWithNames,
    notifications::requests::NewNotification,
    qna::requests::{AnswerQnaRequest, CreateQnaRequest, QnaVisibility},
    users::entities::{User, UserRole},
};
use crate::storage::Storage;

pub const MIN_QUESTION_CHARS: usize = 3;

fn qna_not_found() -> ApiError {
    ApiError::not_found(ErrorCode::QnaNotFound, "Question not found.")
}

/// 课程问答的可见范围
pub fn visibility_for(user: &User, course: &CourseWithNames) -> QnaVisibility {
    if can_edit_course(user, course) {
        QnaVisibility::All
    } else if user.role == UserRole::Student {
        QnaVisibility::PublicOrOwn(user.id)
    } else {
        QnaVisibility::PublicOnly
    }
}

/// 去除首尾空白后校验长度
pub fn normalize_text(text: &str, field: &str) -> ServiceResult<String> {
    let trimmed = text.trim();
    if trimmed.chars().count() < MIN_QUESTION_CHARS {
        return Err(ApiError::bad_request(
            ErrorCode::QnaInvalid,
            format!("{field} must be at least {MIN_QUESTION_CHARS} characters."),
        ));
    }
    Ok(trimmed.to_string())
}

pub struct QnaService {
    storage: Option<Arc<dyn Storage>>,
}

impl QnaService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ServiceResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => storage_from_request(request),
        }
    }

    // 学生提问
    pub async fn create_question(
        &self,
        request: &HttpRequest,
        body: CreateQnaRequest,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let user = current_user(request)?;

        let question = normalize_text(&body.question, "question")?;
        let course = load_course(&storage, body.course_id).await?;
        ensure_learner_access(&storage, &user, &course).await?;

        let qna = storage
            .create_qna(course.course.id, user.id, question, body.is_public.unwrap_or(true))
            .await
            .map_err(ApiError::from)?;

        activity::record(
            &storage,
            user.id,
            ActivityType::QuestionAsk,
            Some(qna.id),
            Some(json!({ "course_id": qna.course_id })),
        )
        .await;

        Ok(HttpResponse::Created().json(ApiResponse::success(qna, "Question created successfully")))
    }

    pub async fn list_course_questions(
        &self,
        request: &HttpRequest,
        course_id: i64,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let user = current_user(request)?;

        let course = load_course(&storage, course_id).await?;
        let items = storage
            .list_course_qna(course_id, visibility_for(&user, &course))
            .await
            .map_err(ApiError::from)?;

        Ok(HttpResponse::Ok().json(ApiResponse::success(items, "Questions retrieved successfully")))
    }

    pub async fn list_my_questions(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let user = current_user(request)?;

        let items = storage
            .list_student_qna(user.id)
            .await
            .map_err(ApiError::from)?;

        Ok(HttpResponse::Ok().json(ApiResponse::success(items, "Questions retrieved successfully")))
    }

    // 管理员查看全部
    pub async fn list_teacher_questions(
        &self,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let user = current_user(request)?;

        let teacher_id = (user.role != UserRole::Admin).then_some(user.id);
        let items = storage
            .list_teacher_qna(teacher_id)
            .await
            .map_err(ApiError::from)?;

        Ok(HttpResponse::Ok().json(ApiResponse::success(items, "Questions retrieved successfully")))
    }

    pub async fn answer_question(
        &self,
        request: &HttpRequest,
        id: i64,
        body: AnswerQnaRequest,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let user = current_user(request)?;

        let answer = body.answer.trim().to_string();
        if answer.is_empty() {
            return Err(ApiError::bad_request(ErrorCode::QnaInvalid, "answer is required.").into());
        }

        let qna = storage
            .get_qna_by_id(id)
            .await
            .map_err(ApiError::from)?
            .ok_or_else(qna_not_found)?;
        let course = load_course(&storage, qna.course_id).await?;
        if !can_edit_course(&user, &course) {
            return Err(ApiError::forbidden(
                ErrorCode::CoursePermissionDenied,
                "You can only answer questions on your own courses.",
            )
            .into());
        }

        let answered = storage
            .answer_qna(id, user.id, answer)
            .await
            .map_err(ApiError::from)?
            .ok_or_else(qna_not_found)?;

        notifications::dispatch(
            &storage,
            vec![NewNotification::question_answered(
                answered.student_id,
                &answered.question,
                answered.course_id,
            )],
        )
        .await;

        Ok(HttpResponse::Ok().json(ApiResponse::success(answered, "Answer saved successfully")))
    }

    pub async fn delete_question(&self, request: &HttpRequest, id: i64) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;

        if !storage.delete_qna(id).await.map_err(ApiError::from)? {
            return Err(qna_not_found().into());
        }

        Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_empty("Question deleted successfully")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::courses::access::tests::{course, user};

    #[test]
    fn test_visibility_by_role() {
        let c = course(10, Some(11));
        assert_eq!(visibility_for(&user(1, UserRole::Admin), &c), QnaVisibility::All);
        assert_eq!(visibility_for(&user(10, UserRole::Teacher), &c), QnaVisibility::All);
        assert_eq!(visibility_for(&user(11, UserRole::Teacher), &c), QnaVisibility::All);
        assert_eq!(visibility_for(&user(12, UserRole::Teacher), &c), QnaVisibility::PublicOnly);
        assert_eq!(visibility_for(&user(5, UserRole::Student), &c), QnaVisibility::PublicOrOwn(5));
        assert_eq!(visibility_for(&user(6, UserRole::Parent), &c), QnaVisibility::PublicOnly);
    }

    #[test]
    fn test_question_text_is_trimmed_and_checked() {
        assert_eq!(normalize_text("  왜요?  ", "question").unwrap(), "왜요?");
        assert!(normalize_text("  네 ", "question").is_err());
    }
}
