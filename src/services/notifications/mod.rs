pub mod list;
pub mod read;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::warn;

use super::common::{ServiceResult, storage_from_request};
use crate::models::notifications::requests::{NewNotification, NotificationListParams};
use crate::storage::Storage;

/// 发送通知；失败只记录日志，不影响主流程
pub(crate) async fn dispatch(storage: &Arc<dyn Storage>, notifications: Vec<NewNotification>) {
    if notifications.is_empty() {
        return;
    }
    if let Err(e) = storage.create_notifications(notifications).await {
        warn!("Failed to create notifications: {}", e);
    }
}

pub struct NotificationService {
    storage: Option<Arc<dyn Storage>>,
}

impl NotificationService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ServiceResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => storage_from_request(request),
        }
    }

    // 我的通知
    pub async fn list_notifications(
        &self,
        request: &HttpRequest,
        params: NotificationListParams,
    ) -> ActixResult<HttpResponse> {
        list::list_notifications(self, request, params).await
    }

    // 未读数量
    pub async fn unread_count(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        list::unread_count(self, request).await
    }

    // 标记已读
    pub async fn mark_read(&self, request: &HttpRequest, id: i64) -> ActixResult<HttpResponse> {
        read::mark_read(self, request, id).await
    }

    // 全部已读
    pub async fn mark_all_read(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        read::mark_all_read(self, request).await
    }
}
