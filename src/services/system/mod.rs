pub mod health;
pub mod settings;
pub mod settings_cache;

pub use settings_cache::DynamicConfig;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use super::common::{ServiceResult, storage_from_request};
use crate::models::system::requests::{SettingAuditQuery, UpdateSystemSettingsRequest};
use crate::storage::Storage;

pub struct SystemService {
    storage: Option<Arc<dyn Storage>>,
}

impl SystemService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ServiceResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => storage_from_request(request),
        }
    }

    // 公开设置
    pub async fn get_public_settings(&self) -> ActixResult<HttpResponse> {
        health::get_public_settings().await
    }

    // 存活检查
    pub async fn health(&self) -> ActixResult<HttpResponse> {
        health::health().await
    }

    // 就绪检查（数据库连通性）
    pub async fn readiness(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        health::readiness(self, request).await
    }

    // 管理员读取系统设置
    pub async fn get_settings(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        settings::get_settings(self, request).await
    }

    // 管理员更新系统设置
    pub async fn update_settings(
        &self,
        request: &HttpRequest,
        body: UpdateSystemSettingsRequest,
    ) -> ActixResult<HttpResponse> {
        settings::update_settings(self, request, body).await
    }

    // 设置变更审计日志
    pub async fn list_audits(
        &self,
        request: &HttpRequest,
        query: SettingAuditQuery,
    ) -> ActixResult<HttpResponse> {
        settings::list_audits(self, request, query).await
    }
}
