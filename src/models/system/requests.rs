use serde::Deserialize;
use ts_rs::TS;

/// 管理员更新系统设置（字段均可选）
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "../frontend/src/types/generated/system.ts")]
pub struct UpdateSystemSettingsRequest {
    pub allow_registrations: Option<bool>,
    pub maintenance_mode: Option<bool>,
    pub support_email: Option<String>,
    pub api_rate_limit: Option<i64>,
}

/// 审计日志查询参数
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SettingAuditQuery {
    pub key: Option<String>,
    pub page: Option<i64>,
    pub size: Option<i64>,
}
