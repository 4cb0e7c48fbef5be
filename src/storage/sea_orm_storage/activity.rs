//! 活动日志存储操作

use std::collections::HashMap;

use super::SeaOrmStorage;
use crate::entity::activity_logs::{ActiveModel, Column, Entity as ActivityLogs};
use crate::entity::prelude::Users;
use crate::entity::users;
use crate::errors::{Result, StudyLinkError};
use crate::models::activity::{
    entities::{ActivityLog, ActivityLogWithUser, ActivityType},
    requests::NewActivity,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

impl SeaOrmStorage {
    /// 记录活动
    pub async fn log_activity_impl(&self, activity: NewActivity) -> Result<ActivityLog> {
        let result = ActiveModel {
            user_id: Set(activity.user_id),
            activity_type: Set(activity.activity_type.to_string()),
            related_id: Set(activity.related_id),
            metadata: Set(activity.metadata.map(|m| m.to_string())),
            created_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|e| StudyLinkError::database_operation(format!("记录活动失败: {e}")))?;

        Ok(result.into_activity())
    }

    /// 查询活动（新到旧）
    pub async fn list_activities_impl(
        &self,
        user_id: Option<i64>,
        activity_type: Option<ActivityType>,
        limit: u64,
    ) -> Result<Vec<ActivityLogWithUser>> {
        let mut select = ActivityLogs::find();
        if let Some(user_id) = user_id {
            select = select.filter(Column::UserId.eq(user_id));
        }
        if let Some(activity_type) = activity_type {
            select = select.filter(Column::ActivityType.eq(activity_type.to_string()));
        }

        let rows = select
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询活动日志失败: {e}")))?;

        let user_ids: Vec<i64> = rows.iter().map(|r| r.user_id).collect();
        let names: HashMap<i64, String> = Users::find()
            .filter(users::Column::Id.is_in(user_ids))
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询用户失败: {e}")))?
            .into_iter()
            .map(|u| (u.id, u.name))
            .collect();

        Ok(rows
            .into_iter()
            .map(|row| ActivityLogWithUser {
                user_name: names.get(&row.user_id).cloned(),
                log: row.into_activity(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::{entities::UserRole, requests::CreateUserRequest};
    use serde_json::json;

    #[tokio::test]
    async fn test_log_and_filter() {
        let storage = SeaOrmStorage::in_memory().await;
        let user = storage
            .create_user_impl(CreateUserRequest {
                username: "kid".to_string(),
                password: "hash".to_string(),
                role: UserRole::Student,
                name: "학생".to_string(),
                email: None,
                phone: None,
                is_approved: true,
            })
            .await
            .unwrap();

        storage
            .log_activity_impl(NewActivity {
                user_id: user.id,
                activity_type: ActivityType::Login,
                related_id: None,
                metadata: None,
            })
            .await
            .unwrap();
        let logged = storage
            .log_activity_impl(NewActivity {
                user_id: user.id,
                activity_type: ActivityType::VideoWatch,
                related_id: Some(7),
                metadata: Some(json!({"progress": 42.5})),
            })
            .await
            .unwrap();
        assert_eq!(logged.metadata.unwrap()["progress"], 42.5);

        let videos = storage
            .list_activities_impl(Some(user.id), Some(ActivityType::VideoWatch), 50)
            .await
            .unwrap();
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].user_name.as_deref(), Some("학생"));

        let limited = storage.list_activities_impl(None, None, 1).await.unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].log.activity_type, ActivityType::VideoWatch);
    }
}
