//! 视频观看进度：记录、查询与教师端汇总

pub mod calc;
mod query;
mod record;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use super::common::{ServiceResult, storage_from_request};
use crate::models::video_progress::requests::{TeacherOverviewParams, UpdateVideoProgressRequest};
use crate::storage::Storage;

pub struct VideoProgressService {
    storage: Option<Arc<dyn Storage>>,
}

impl VideoProgressService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ServiceResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => storage_from_request(request),
        }
    }

    pub async fn update_progress(
        &self,
        request: &HttpRequest,
        body: UpdateVideoProgressRequest,
    ) -> ActixResult<HttpResponse> {
        record::update_progress(self, request, body).await
    }

    pub async fn list_my_progress(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        query::list_my_progress(self, request).await
    }

    pub async fn get_block_progress(
        &self,
        request: &HttpRequest,
        block_id: i64,
    ) -> ActixResult<HttpResponse> {
        query::get_block_progress(self, request, block_id).await
    }

    // course_id 为 Some 时只看该课程
    pub async fn list_student_progress(
        &self,
        request: &HttpRequest,
        student_id: i64,
        course_id: Option<i64>,
    ) -> ActixResult<HttpResponse> {
        query::list_student_progress(self, request, student_id, course_id).await
    }

    pub async fn course_summary(
        &self,
        request: &HttpRequest,
        course_id: i64,
    ) -> ActixResult<HttpResponse> {
        query::course_summary(self, request, course_id).await
    }

    pub async fn course_records(
        &self,
        request: &HttpRequest,
        course_id: i64,
    ) -> ActixResult<HttpResponse> {
        query::course_records(self, request, course_id).await
    }

    pub async fn teacher_overview(
        &self,
        request: &HttpRequest,
        params: TeacherOverviewParams,
    ) -> ActixResult<HttpResponse> {
        query::teacher_overview(self, request, params).await
    }
}
