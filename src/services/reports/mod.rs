//! 学习报告：学生、班级与管理员活动统计

pub mod range;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use super::common::{ApiError, ServiceResult, current_user, storage_from_request};
use crate::models::{
    ApiResponse, ErrorCode, reports::requests::DateRangeParams, users::entities::UserRole,
};
use crate::storage::Storage;
pub use range::report_range;

fn today() -> chrono::NaiveDate {
    chrono::Utc::now().date_naive()
}

pub struct ReportService {
    storage: Option<Arc<dyn Storage>>,
}

impl ReportService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ServiceResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => storage_from_request(request),
        }
    }

    // 学生本人报告
    pub async fn my_report(
        &self,
        request: &HttpRequest,
        params: DateRangeParams,
    ) -> ActixResult<HttpResponse> {
        let user = current_user(request)?;
        self.student_report(request, user.id, params).await
    }

    pub async fn student_report(
        &self,
        request: &HttpRequest,
        student_id: i64,
        params: DateRangeParams,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let (start, end) = report_range(&params, today())?;

        let report = storage
            .student_report(student_id, start, end)
            .await
            .map_err(ApiError::from)?;

        Ok(HttpResponse::Ok().json(ApiResponse::success(report, "Student report retrieved successfully")))
    }

    // 班级教师或管理员
    pub async fn class_report(
        &self,
        request: &HttpRequest,
        class_id: i64,
        params: DateRangeParams,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let user = current_user(request)?;
        let (start, end) = report_range(&params, today())?;

        let class = storage
            .get_class_by_id(class_id)
            .await
            .map_err(ApiError::from)?
            .ok_or_else(|| ApiError::not_found(ErrorCode::ClassNotFound, "Class not found."))?;
        if user.role != UserRole::Admin && class.teacher_id != Some(user.id) {
            return Err(ApiError::forbidden(
                ErrorCode::ClassPermissionDenied,
                "You can only view reports of your own classes.",
            )
            .into());
        }

        let report = storage
            .class_report(class_id, start, end)
            .await
            .map_err(ApiError::from)?;

        Ok(HttpResponse::Ok().json(ApiResponse::success(report, "Class report retrieved successfully")))
    }

    pub async fn admin_activity(
        &self,
        request: &HttpRequest,
        params: DateRangeParams,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let (start, end) = report_range(&params, today())?;

        let report = storage
            .admin_activity_report(start, end)
            .await
            .map_err(ApiError::from)?;

        Ok(HttpResponse::Ok().json(ApiResponse::success(report, "Activity report retrieved successfully")))
    }
}
