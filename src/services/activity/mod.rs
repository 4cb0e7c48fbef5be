//! 学习活动日志：记录登录、观看、提交、提问，供报告与管理端查看

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::warn;

use super::common::{ApiError, ServiceResult, current_user, storage_from_request};
use crate::models::ApiResponse;
use crate::models::activity::{
    entities::ActivityType,
    requests::{ActivityListParams, MyActivityParams, NewActivity},
};
use crate::storage::Storage;

const MY_DEFAULT_LIMIT: u64 = 20;
const ADMIN_DEFAULT_LIMIT: u64 = 50;
const MAX_LIMIT: u64 = 200;

/// 记录一条活动；失败只告警
pub(crate) async fn record(
    storage: &Arc<dyn Storage>,
    user_id: i64,
    activity_type: ActivityType,
    related_id: Option<i64>,
    metadata: Option<serde_json::Value>,
) {
    let activity = NewActivity {
        user_id,
        activity_type,
        related_id,
        metadata,
    };
    if let Err(e) = storage.log_activity(activity).await {
        warn!("Failed to log {} activity for user {}: {}", activity_type, user_id, e);
    }
}

pub struct ActivityService {
    storage: Option<Arc<dyn Storage>>,
}

impl ActivityService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ServiceResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => storage_from_request(request),
        }
    }

    // 我的活动
    pub async fn list_my_activities(
        &self,
        request: &HttpRequest,
        params: MyActivityParams,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let user = current_user(request)?;
        let limit = params.limit.unwrap_or(MY_DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

        let activities = storage
            .list_activities(Some(user.id), None, limit)
            .await
            .map_err(ApiError::from)?;

        Ok(HttpResponse::Ok().json(ApiResponse::success(
            activities,
            "Activities retrieved successfully",
        )))
    }

    // 管理员查询全部活动
    pub async fn list_activities(
        &self,
        request: &HttpRequest,
        params: ActivityListParams,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let limit = params.limit.unwrap_or(ADMIN_DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

        let activities = storage
            .list_activities(params.user_id, params.activity_type, limit)
            .await
            .map_err(ApiError::from)?;

        Ok(HttpResponse::Ok().json(ApiResponse::success(
            activities,
            "Activities retrieved successfully",
        )))
    }
}
