//! 课程、内容块与学生进度

pub mod access;
pub mod blocks;
pub mod detail;
pub mod list;
pub mod manage;
pub mod progress;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use super::common::{ServiceResult, storage_from_request};
use crate::models::courses::requests::{
    AssignableStudentsParams, CreateBlockRequest, CreateCourseRequest, PublishCourseRequest,
    ReorderRequest, SetCourseStudentsRequest, UpdateBlockRequest, UpdateCourseRequest,
};
use crate::storage::Storage;

pub struct CourseService {
    storage: Option<Arc<dyn Storage>>,
}

impl CourseService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ServiceResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => storage_from_request(request),
        }
    }

    pub async fn list_courses(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        list::list_courses(self, request).await
    }

    // 带学习进度的课程列表
    pub async fn list_user_courses(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        list::list_user_courses(self, request).await
    }

    pub async fn list_assignable_students(
        &self,
        request: &HttpRequest,
        params: AssignableStudentsParams,
    ) -> ActixResult<HttpResponse> {
        list::list_assignable_students(self, request, params).await
    }

    pub async fn list_class_students(
        &self,
        request: &HttpRequest,
        class_id: i64,
    ) -> ActixResult<HttpResponse> {
        list::list_class_students(self, request, class_id).await
    }

    pub async fn get_course(&self, request: &HttpRequest, id: i64) -> ActixResult<HttpResponse> {
        detail::get_course(self, request, id).await
    }

    // 编辑视图
    pub async fn get_course_for_manage(
        &self,
        request: &HttpRequest,
        id: i64,
    ) -> ActixResult<HttpResponse> {
        detail::get_course_for_manage(self, request, id).await
    }

    pub async fn create_course(
        &self,
        request: &HttpRequest,
        body: CreateCourseRequest,
    ) -> ActixResult<HttpResponse> {
        manage::create_course(self, request, body).await
    }

    pub async fn update_course(
        &self,
        request: &HttpRequest,
        id: i64,
        body: UpdateCourseRequest,
    ) -> ActixResult<HttpResponse> {
        manage::update_course(self, request, id, body).await
    }

    pub async fn delete_course(&self, request: &HttpRequest, id: i64) -> ActixResult<HttpResponse> {
        manage::delete_course(self, request, id).await
    }

    pub async fn set_course_students(
        &self,
        request: &HttpRequest,
        id: i64,
        body: SetCourseStudentsRequest,
    ) -> ActixResult<HttpResponse> {
        manage::set_course_students(self, request, id, body).await
    }

    pub async fn publish_course(
        &self,
        request: &HttpRequest,
        id: i64,
        body: PublishCourseRequest,
    ) -> ActixResult<HttpResponse> {
        manage::publish_course(self, request, id, body).await
    }

    pub async fn create_block(
        &self,
        request: &HttpRequest,
        id: i64,
        body: CreateBlockRequest,
    ) -> ActixResult<HttpResponse> {
        blocks::create_block(self, request, id, body).await
    }

    pub async fn update_block(
        &self,
        request: &HttpRequest,
        id: i64,
        block_id: i64,
        body: UpdateBlockRequest,
    ) -> ActixResult<HttpResponse> {
        blocks::update_block(self, request, id, block_id, body).await
    }

    pub async fn delete_block(
        &self,
        request: &HttpRequest,
        id: i64,
        block_id: i64,
    ) -> ActixResult<HttpResponse> {
        blocks::delete_block(self, request, id, block_id).await
    }

    pub async fn reorder_blocks(
        &self,
        request: &HttpRequest,
        id: i64,
        body: ReorderRequest,
    ) -> ActixResult<HttpResponse> {
        blocks::reorder_blocks(self, request, id, body).await
    }
}
