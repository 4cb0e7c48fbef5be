use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 配置值类型
#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/system.ts")]
pub enum SettingValueType {
    String,
    Integer,
    Boolean,
}

impl<'de> Deserialize<'de> for SettingValueType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<SettingValueType>().map_err(|_| {
            serde::de::Error::custom(format!(
                "无效的配置值类型: '{s}'. 支持的类型: string, integer, boolean"
            ))
        })
    }
}

impl std::fmt::Display for SettingValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingValueType::String => write!(f, "string"),
            SettingValueType::Integer => write!(f, "integer"),
            SettingValueType::Boolean => write!(f, "boolean"),
        }
    }
}

impl std::str::FromStr for SettingValueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(SettingValueType::String),
            "integer" => Ok(SettingValueType::Integer),
            "boolean" => Ok(SettingValueType::Boolean),
            _ => Err(format!("Invalid setting value type: {s}")),
        }
    }
}

/// 已知配置键
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KnownSettingKey {
    AllowRegistrations,
    MaintenanceMode,
    SupportEmail,
    ApiRateLimit,
}

impl KnownSettingKey {
    pub const DEFAULT_API_RATE_LIMIT: i64 = 100;
    pub const API_RATE_LIMIT_RANGE: std::ops::RangeInclusive<i64> = 10..=10000;

    /// 数据库中的键名
    pub fn as_str(&self) -> &'static str {
        match self {
            KnownSettingKey::AllowRegistrations => "registration.allow",
            KnownSettingKey::MaintenanceMode => "system.maintenance_mode",
            KnownSettingKey::SupportEmail => "system.support_email",
            KnownSettingKey::ApiRateLimit => "system.api_rate_limit",
        }
    }

    /// API 中的字段名
    pub fn api_name(&self) -> &'static str {
        match self {
            KnownSettingKey::AllowRegistrations => "allowRegistrations",
            KnownSettingKey::MaintenanceMode => "maintenanceMode",
            KnownSettingKey::SupportEmail => "supportEmail",
            KnownSettingKey::ApiRateLimit => "apiRateLimit",
        }
    }

    pub fn value_type(&self) -> SettingValueType {
        match self {
            KnownSettingKey::AllowRegistrations | KnownSettingKey::MaintenanceMode => {
                SettingValueType::Boolean
            }
            KnownSettingKey::SupportEmail => SettingValueType::String,
            KnownSettingKey::ApiRateLimit => SettingValueType::Integer,
        }
    }

    pub fn all() -> [Self; 4] {
        [
            KnownSettingKey::AllowRegistrations,
            KnownSettingKey::MaintenanceMode,
            KnownSettingKey::SupportEmail,
            KnownSettingKey::ApiRateLimit,
        ]
    }
}

impl std::str::FromStr for KnownSettingKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KnownSettingKey::all()
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("Unknown setting key: {s}"))
    }
}

/// 系统设置实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/system.ts")]
pub struct SystemSetting {
    pub key: String,
    pub value: String,
    pub value_type: SettingValueType,
    pub description: Option<String>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub updated_by: Option<i64>,
}

/// 设置审计日志实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/system.ts")]
pub struct SettingAudit {
    pub id: i64,
    pub setting_key: String,
    pub old_value: Option<String>,
    pub new_value: String,
    pub changed_by: i64,
    pub changed_at: chrono::DateTime<chrono::Utc>,
    pub ip_address: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_keys_parse_back() {
        for key in KnownSettingKey::all() {
            assert_eq!(key.as_str().parse::<KnownSettingKey>().unwrap(), key);
        }
        assert!("upload.max_size".parse::<KnownSettingKey>().is_err());
    }

    #[test]
    fn test_value_types() {
        assert_eq!(
            KnownSettingKey::MaintenanceMode.value_type(),
            SettingValueType::Boolean
        );
        assert_eq!(
            KnownSettingKey::ApiRateLimit.value_type(),
            SettingValueType::Integer
        );
        assert_eq!(KnownSettingKey::SupportEmail.api_name(), "supportEmail");
    }
}
