//! 系统设置存储实现

use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

use crate::entity::prelude::{SystemSettings, SystemSettingsAudits};
use crate::entity::{system_settings, system_settings_audit};
use crate::errors::{Result, StudyLinkError};
use crate::models::{
    common::PaginationInfo,
    system::{
        entities::SystemSetting, requests::SettingAuditQuery, responses::SettingAuditListResponse,
    },
};

use super::SeaOrmStorage;

impl SeaOrmStorage {
    /// 获取所有设置
    pub(crate) async fn list_all_settings_impl(&self) -> Result<Vec<SystemSetting>> {
        let settings = SystemSettings::find()
            .order_by(system_settings::Column::Key, Order::Asc)
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("获取设置列表失败: {e}")))?;

        Ok(settings.into_iter().map(|s| s.into_setting()).collect())
    }

    /// 更新设置，同一事务内写审计日志
    pub(crate) async fn update_setting_impl(
        &self,
        key: &str,
        value: &str,
        user_id: i64,
        ip_address: Option<String>,
    ) -> Result<SystemSetting> {
        let now = chrono::Utc::now().timestamp();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("开启事务失败: {e}")))?;

        let existing = SystemSettings::find_by_id(key.to_string())
            .one(&txn)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("获取设置失败: {e}")))?
            .ok_or_else(|| StudyLinkError::not_found(format!("配置项不存在: {key}")))?;

        let old_value = existing.value.clone();

        let mut active_model: system_settings::ActiveModel = existing.into();
        active_model.value = Set(value.to_string());
        active_model.updated_at = Set(now);
        active_model.updated_by = Set(Some(user_id));

        let updated = active_model
            .update(&txn)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("更新设置失败: {e}")))?;

        system_settings_audit::ActiveModel {
            setting_key: Set(key.to_string()),
            old_value: Set(Some(old_value)),
            new_value: Set(value.to_string()),
            changed_by: Set(user_id),
            changed_at: Set(now),
            ip_address: Set(ip_address),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| StudyLinkError::database_operation(format!("创建审计日志失败: {e}")))?;

        txn.commit()
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(updated.into_setting())
    }

    /// 获取审计日志
    pub(crate) async fn list_setting_audits_impl(
        &self,
        query: SettingAuditQuery,
    ) -> Result<SettingAuditListResponse> {
        let page = query.page.unwrap_or(1).max(1) as u64;
        let size = query.size.unwrap_or(20).clamp(1, 100) as u64;

        let mut find = SystemSettingsAudits::find();

        if let Some(key) = &query.key {
            find = find.filter(system_settings_audit::Column::SettingKey.eq(key));
        }

        let total = find
            .clone()
            .count(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("统计审计日志失败: {e}")))?;

        let audits = find
            .order_by(system_settings_audit::Column::ChangedAt, Order::Desc)
            .order_by(system_settings_audit::Column::Id, Order::Desc)
            .offset((page - 1) * size)
            .limit(size)
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("获取审计日志失败: {e}")))?;

        Ok(SettingAuditListResponse {
            audits: audits.into_iter().map(|a| a.into_audit()).collect(),
            pagination: PaginationInfo::new(page, size, total),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::system::entities::KnownSettingKey;

    #[tokio::test]
    async fn test_defaults_are_seeded() {
        let storage = SeaOrmStorage::in_memory().await;
        let settings = storage.list_all_settings_impl().await.unwrap();
        for key in KnownSettingKey::all() {
            assert!(settings.iter().any(|s| s.key == key.as_str()));
        }
    }

    #[tokio::test]
    async fn test_update_writes_audit() {
        let storage = SeaOrmStorage::in_memory().await;
        let key = KnownSettingKey::MaintenanceMode.as_str();

        let updated = storage
            .update_setting_impl(key, "true", 1, Some("127.0.0.1".to_string()))
            .await
            .unwrap();
        assert_eq!(updated.value, "true");
        assert_eq!(updated.updated_by, Some(1));

        let audits = storage
            .list_setting_audits_impl(SettingAuditQuery {
                key: Some(key.to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(audits.pagination.total, 1);
        assert_eq!(audits.audits[0].old_value.as_deref(), Some("false"));
        assert_eq!(audits.audits[0].new_value, "true");
    }

    #[tokio::test]
    async fn test_unknown_key_is_not_found() {
        let storage = SeaOrmStorage::in_memory().await;
        let err = storage
            .update_setting_impl("upload.max_size", "1", 1, None)
            .await
            .unwrap_err();
        assert!(matches!(err, StudyLinkError::NotFound(_)));
    }
}
