//! 家长端：子女列表与子女学习报告

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use super::common::{ApiError, ServiceResult, current_user, storage_from_request};
use super::reports::report_range;
use crate::models::{ApiResponse, ErrorCode, reports::requests::DateRangeParams};
use crate::storage::Storage;

pub struct ParentService {
    storage: Option<Arc<dyn Storage>>,
}

impl ParentService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ServiceResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => storage_from_request(request),
        }
    }

    pub async fn list_children(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let user = current_user(request)?;

        let children = storage
            .list_children(user.id)
            .await
            .map_err(ApiError::from)?;

        Ok(HttpResponse::Ok().json(ApiResponse::success(children, "Children retrieved successfully")))
    }

    // 仅限已关联的子女
    pub async fn child_report(
        &self,
        request: &HttpRequest,
        student_id: i64,
        params: DateRangeParams,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let user = current_user(request)?;

        if !storage
            .is_parent_of(user.id, student_id)
            .await
            .map_err(ApiError::from)?
        {
            return Err(ApiError::forbidden(
                ErrorCode::Forbidden,
                "You can only view reports of your linked children.",
            )
            .into());
        }
        let (start, end) = report_range(&params, chrono::Utc::now().date_naive())?;

        let report = storage
            .student_report(student_id, start, end)
            .await
            .map_err(ApiError::from)?;

        Ok(HttpResponse::Ok().json(ApiResponse::success(report, "Child report retrieved successfully")))
    }
}
