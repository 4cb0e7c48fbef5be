use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::{DynamicConfig, SystemService};
use crate::models::{
    ApiResponse, ErrorCode,
    system::{
        entities::KnownSettingKey,
        requests::{SettingAuditQuery, UpdateSystemSettingsRequest},
    },
};
use crate::services::common::{ApiError, ServiceResult, current_user};
use crate::utils::validate::validate_email;

/// 校验请求并转换为待写入的键值对
pub(crate) fn collect_changes(
    body: UpdateSystemSettingsRequest,
) -> ServiceResult<Vec<(KnownSettingKey, String)>> {
    let mut changes = Vec::new();

    if let Some(allow) = body.allow_registrations {
        changes.push((KnownSettingKey::AllowRegistrations, allow.to_string()));
    }
    if let Some(maintenance) = body.maintenance_mode {
        changes.push((KnownSettingKey::MaintenanceMode, maintenance.to_string()));
    }
    if let Some(email) = body.support_email {
        let email = email.trim().to_string();
        if !email.is_empty() {
            validate_email(&email)
                .map_err(|msg| ApiError::bad_request(ErrorCode::SettingInvalid, msg))?;
        }
        changes.push((KnownSettingKey::SupportEmail, email));
    }
    if let Some(limit) = body.api_rate_limit {
        if !KnownSettingKey::API_RATE_LIMIT_RANGE.contains(&limit) {
            return Err(ApiError::bad_request(
                ErrorCode::SettingInvalid,
                "apiRateLimit must be between 10 and 10000.",
            ));
        }
        changes.push((KnownSettingKey::ApiRateLimit, limit.to_string()));
    }

    Ok(changes)
}

pub async fn get_settings(service: &SystemService, request: &HttpRequest) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    // 读取前回源，避免多实例部署时看到旧值
    if DynamicConfig::is_stale().await {
        DynamicConfig::refresh(&storage).await.map_err(ApiError::from)?;
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        DynamicConfig::snapshot().await,
        "Settings retrieved successfully",
    )))
}

pub async fn update_settings(
    service: &SystemService,
    request: &HttpRequest,
    body: UpdateSystemSettingsRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let admin = current_user(request)?;
    let changes = collect_changes(body)?;

    let ip_address = request
        .connection_info()
        .realip_remote_addr()
        .map(|s| s.to_string());

    for (key, value) in &changes {
        storage
            .update_setting(key.as_str(), value, admin.id, ip_address.clone())
            .await
            .map_err(ApiError::from)?;
        DynamicConfig::update(key.as_str(), value).await;
        info!("Setting {} changed to {} by {}", key.api_name(), value, admin.username);
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        DynamicConfig::snapshot().await,
        "Settings updated successfully",
    )))
}

pub async fn list_audits(
    service: &SystemService,
    request: &HttpRequest,
    query: SettingAuditQuery,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let audits = storage
        .list_setting_audits(query)
        .await
        .map_err(ApiError::from)?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        audits,
        "Setting audits retrieved successfully",
    )))
}
