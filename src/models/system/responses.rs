use serde::Serialize;
use ts_rs::TS;

use super::entities::SettingAudit;
use crate::models::common::PaginationInfo;

/// 系统设置（管理端）
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "../frontend/src/types/generated/system.ts")]
pub struct SystemSettingsResponse {
    pub allow_registrations: bool,
    pub maintenance_mode: bool,
    pub support_email: String,
    pub api_rate_limit: i64,
}

/// 公开设置（未登录可读）
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "../frontend/src/types/generated/system.ts")]
pub struct PublicSettingsResponse {
    pub allow_registrations: bool,
    pub maintenance_mode: bool,
}

/// 审计日志列表响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/system.ts")]
pub struct SettingAuditListResponse {
    pub audits: Vec<SettingAudit>,
    pub pagination: PaginationInfo,
}

/// 健康检查
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/system.ts")]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// 就绪检查
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/system.ts")]
pub struct ReadinessResponse {
    pub status: String,
    pub database: bool,
    pub uptime_seconds: i64,
}
