//! 测试、题目、提交与评分

pub mod access;
pub mod crud;
pub mod list;
pub mod questions;
pub mod submissions;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::info;

use super::common::{ServiceResult, storage_from_request};
use crate::errors::Result;
use crate::models::{
    courses::requests::ReorderRequest,
    tests::requests::{
        CreateQuestionRequest, CreateTestRequest, GradeSubmissionRequest, SubmissionQuery,
        SubmitTestRequest, UpdateQuestionRequest, UpdateTestRequest,
    },
};
use crate::storage::Storage;

/// 发布已到发布时间的测试并同步截止事件，返回发布数量
pub async fn publish_due_tests(storage: &Arc<dyn Storage>) -> Result<usize> {
    let published = storage
        .publish_due_tests(chrono::Utc::now().timestamp())
        .await?;
    for test in &published {
        access::sync_calendar(storage, test).await;
    }
    if !published.is_empty() {
        info!("Published {} scheduled tests", published.len());
    }
    Ok(published.len())
}

pub struct TestService {
    storage: Option<Arc<dyn Storage>>,
}

impl TestService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ServiceResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => storage_from_request(request),
        }
    }

    pub async fn create_test(
        &self,
        request: &HttpRequest,
        body: CreateTestRequest,
    ) -> ActixResult<HttpResponse> {
        crud::create_test(self, request, body).await
    }

    pub async fn update_test(
        &self,
        request: &HttpRequest,
        id: i64,
        body: UpdateTestRequest,
    ) -> ActixResult<HttpResponse> {
        crud::update_test(self, request, id, body).await
    }

    pub async fn delete_test(&self, request: &HttpRequest, id: i64) -> ActixResult<HttpResponse> {
        crud::delete_test(self, request, id).await
    }

    pub async fn get_test(&self, request: &HttpRequest, id: i64) -> ActixResult<HttpResponse> {
        crud::get_test(self, request, id).await
    }

    // 学生作答视图
    pub async fn get_attempt(&self, request: &HttpRequest, id: i64) -> ActixResult<HttpResponse> {
        crud::get_attempt(self, request, id).await
    }

    pub async fn list_user_tests(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        list::list_user_tests(self, request).await
    }

    pub async fn create_question(
        &self,
        request: &HttpRequest,
        body: CreateQuestionRequest,
    ) -> ActixResult<HttpResponse> {
        questions::create_question(self, request, body).await
    }

    pub async fn update_question(
        &self,
        request: &HttpRequest,
        question_id: i64,
        body: UpdateQuestionRequest,
    ) -> ActixResult<HttpResponse> {
        questions::update_question(self, request, question_id, body).await
    }

    pub async fn delete_question(
        &self,
        request: &HttpRequest,
        question_id: i64,
    ) -> ActixResult<HttpResponse> {
        questions::delete_question(self, request, question_id).await
    }

    pub async fn reorder_questions(
        &self,
        request: &HttpRequest,
        id: i64,
        body: ReorderRequest,
    ) -> ActixResult<HttpResponse> {
        questions::reorder_questions(self, request, id, body).await
    }

    pub async fn submit_test(
        &self,
        request: &HttpRequest,
        body: SubmitTestRequest,
    ) -> ActixResult<HttpResponse> {
        submissions::submit_test(self, request, body).await
    }

    pub async fn get_submission(
        &self,
        request: &HttpRequest,
        test_id: i64,
        query: SubmissionQuery,
    ) -> ActixResult<HttpResponse> {
        submissions::get_submission(self, request, test_id, query).await
    }

    pub async fn grade_submission(
        &self,
        request: &HttpRequest,
        submission_id: i64,
        body: GradeSubmissionRequest,
    ) -> ActixResult<HttpResponse> {
        submissions::grade_submission(self, request, submission_id, body).await
    }

    pub async fn publish_submission(
        &self,
        request: &HttpRequest,
        submission_id: i64,
    ) -> ActixResult<HttpResponse> {
        submissions::set_published(self, request, submission_id, true).await
    }

    pub async fn unpublish_submission(
        &self,
        request: &HttpRequest,
        submission_id: i64,
    ) -> ActixResult<HttpResponse> {
        submissions::set_published(self, request, submission_id, false).await
    }

    pub async fn list_submissions(
        &self,
        request: &HttpRequest,
        test_id: i64,
    ) -> ActixResult<HttpResponse> {
        submissions::list_submissions(self, request, test_id).await
    }
}
