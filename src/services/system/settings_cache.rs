//! 动态配置缓存
//!
//! 系统设置保存在数据库中，这里维护一份解析后的快照。
//! 写入设置时立即更新，后台任务按 `scheduler.settings_refresh_secs` 周期回源刷新。

use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::config::AppConfig;
use crate::errors::Result;
use crate::models::system::{
    entities::KnownSettingKey,
    responses::{PublicSettingsResponse, SystemSettingsResponse},
};
use crate::storage::Storage;

/// 动态配置缓存
static DYNAMIC_CONFIG: OnceLock<RwLock<DynamicConfigCache>> = OnceLock::new();

#[derive(Debug)]
struct DynamicConfigCache {
    settings: SystemSettingsResponse,
    loaded_at: Option<Instant>,
}

impl Default for SystemSettingsResponse {
    fn default() -> Self {
        Self {
            allow_registrations: true,
            maintenance_mode: false,
            support_email: String::new(),
            api_rate_limit: KnownSettingKey::DEFAULT_API_RATE_LIMIT,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// 把一个键值应用到快照上，未知键与无法解析的值被忽略
fn apply_setting(settings: &mut SystemSettingsResponse, key: &str, value: &str) -> bool {
    let Ok(known) = key.parse::<KnownSettingKey>() else {
        return false;
    };
    match known {
        KnownSettingKey::AllowRegistrations => match parse_bool(value) {
            Some(v) => settings.allow_registrations = v,
            None => return false,
        },
        KnownSettingKey::MaintenanceMode => match parse_bool(value) {
            Some(v) => settings.maintenance_mode = v,
            None => return false,
        },
        KnownSettingKey::SupportEmail => settings.support_email = value.trim().to_string(),
        KnownSettingKey::ApiRateLimit => match value.trim().parse::<i64>() {
            Ok(v) if KnownSettingKey::API_RATE_LIMIT_RANGE.contains(&v) => {
                settings.api_rate_limit = v
            }
            _ => return false,
        },
    }
    true
}

/// 由数据库键值对构建快照
pub fn settings_from_pairs<'a>(
    pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> SystemSettingsResponse {
    let mut settings = SystemSettingsResponse::default();
    for (key, value) in pairs {
        if !apply_setting(&mut settings, key, value) {
            tracing::warn!("忽略无效的系统设置: {} = {}", key, value);
        }
    }
    settings
}

/// 动态配置访问接口
pub struct DynamicConfig;

impl DynamicConfig {
    fn cell() -> &'static RwLock<DynamicConfigCache> {
        DYNAMIC_CONFIG.get_or_init(|| {
            RwLock::new(DynamicConfigCache {
                settings: SystemSettingsResponse::default(),
                loaded_at: None,
            })
        })
    }

    /// 用数据库中的键值对整体替换缓存
    pub async fn init(settings: Vec<(String, String)>) {
        let snapshot = settings_from_pairs(settings.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        let mut guard = Self::cell().write().await;
        guard.settings = snapshot;
        guard.loaded_at = Some(Instant::now());

        tracing::info!("动态配置已加载，共 {} 项", settings.len());
    }

    /// 更新单个配置项
    pub async fn update(key: &str, value: &str) {
        let mut guard = Self::cell().write().await;
        if apply_setting(&mut guard.settings, key, value) {
            tracing::debug!("动态配置更新: {} = {}", key, value);
        }
    }

    /// 从存储重新加载
    pub async fn refresh(storage: &Arc<dyn Storage>) -> Result<()> {
        let settings = storage
            .list_all_settings()
            .await?
            .into_iter()
            .map(|s| (s.key, s.value))
            .collect();
        Self::init(settings).await;
        Ok(())
    }

    /// 缓存是否超过刷新窗口
    pub async fn is_stale() -> bool {
        let window = Duration::from_secs(AppConfig::get().scheduler.settings_refresh_secs);
        match Self::cell().read().await.loaded_at {
            Some(at) => at.elapsed() >= window,
            None => true,
        }
    }

    /// 当前快照
    pub async fn snapshot() -> SystemSettingsResponse {
        Self::cell().read().await.settings.clone()
    }

    pub async fn public_settings() -> PublicSettingsResponse {
        let settings = Self::snapshot().await;
        PublicSettingsResponse {
            allow_registrations: settings.allow_registrations,
            maintenance_mode: settings.maintenance_mode,
        }
    }

    pub async fn allow_registrations() -> bool {
        Self::cell().read().await.settings.allow_registrations
    }

    pub async fn maintenance_mode() -> bool {
        Self::cell().read().await.settings.maintenance_mode
    }

    pub async fn support_email() -> String {
        Self::cell().read().await.settings.support_email.clone()
    }

    pub async fn api_rate_limit() -> u32 {
        let limit = Self::cell().read().await.settings.api_rate_limit;
        u32::try_from(limit).unwrap_or(KnownSettingKey::DEFAULT_API_RATE_LIMIT as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_empty() {
        let settings = settings_from_pairs(Vec::new());
        assert_eq!(settings, SystemSettingsResponse::default());
        assert!(settings.allow_registrations);
        assert!(!settings.maintenance_mode);
        assert_eq!(settings.api_rate_limit, 100);
    }

    #[test]
    fn test_pairs_are_parsed() {
        let settings = settings_from_pairs([
            ("registration.allow", "false"),
            ("system.maintenance_mode", "1"),
            ("system.support_email", " help@academy.kr "),
            ("system.api_rate_limit", "250"),
        ]);
        assert!(!settings.allow_registrations);
        assert!(settings.maintenance_mode);
        assert_eq!(settings.support_email, "help@academy.kr");
        assert_eq!(settings.api_rate_limit, 250);
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let settings = settings_from_pairs([
            ("system.maintenance_mode", "maybe"),
            ("system.api_rate_limit", "5"),
            ("upload.max_size", "1024"),
        ]);
        assert!(!settings.maintenance_mode);
        assert_eq!(settings.api_rate_limit, 100);
    }
}
