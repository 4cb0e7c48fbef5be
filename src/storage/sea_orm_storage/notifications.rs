//! 通知存储操作

use super::SeaOrmStorage;
use crate::entity::notifications::{ActiveModel, Column, Entity as Notifications};
use crate::errors::{Result, StudyLinkError};
use crate::models::notifications::{entities::Notification, requests::NewNotification};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

impl SeaOrmStorage {
    /// 批量创建通知
    pub async fn create_notifications_impl(&self, reqs: Vec<NewNotification>) -> Result<u64> {
        if reqs.is_empty() {
            return Ok(0);
        }
        let now = chrono::Utc::now().timestamp();
        let count = reqs.len() as u64;

        let models = reqs.into_iter().map(|req| ActiveModel {
            user_id: Set(req.user_id),
            notification_type: Set(req.notification_type.to_string()),
            title: Set(req.title),
            message: Set(req.message),
            related_id: Set(req.related_id),
            is_read: Set(false),
            created_at: Set(now),
            ..Default::default()
        });

        Notifications::insert_many(models)
            .exec(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("批量创建通知失败: {e}")))?;

        Ok(count)
    }

    /// 列出用户通知（新到旧）
    pub async fn list_notifications_impl(
        &self,
        user_id: i64,
        limit: u64,
    ) -> Result<Vec<Notification>> {
        let result = Notifications::find()
            .filter(Column::UserId.eq(user_id))
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询通知列表失败: {e}")))?;

        Ok(result.into_iter().map(|m| m.into_notification()).collect())
    }

    /// 标记通知为已读（仅限本人通知）
    pub async fn mark_notification_read_impl(&self, id: i64, user_id: i64) -> Result<bool> {
        let owned = Notifications::find()
            .filter(Column::Id.eq(id))
            .filter(Column::UserId.eq(user_id))
            .count(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询通知失败: {e}")))?;
        if owned == 0 {
            return Ok(false);
        }

        Notifications::update_many()
            .col_expr(Column::IsRead, Expr::value(true))
            .filter(Column::Id.eq(id))
            .filter(Column::UserId.eq(user_id))
            .exec(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("标记通知已读失败: {e}")))?;

        Ok(true)
    }

    /// 获取用户未读通知数量
    pub async fn count_unread_notifications_impl(&self, user_id: i64) -> Result<u64> {
        Notifications::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::IsRead.eq(false))
            .count(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询未读通知数量失败: {e}")))
    }

    /// 标记用户所有通知为已读
    pub async fn mark_all_notifications_read_impl(&self, user_id: i64) -> Result<u64> {
        let result = Notifications::update_many()
            .col_expr(Column::IsRead, Expr::value(true))
            .filter(Column::UserId.eq(user_id))
            .filter(Column::IsRead.eq(false))
            .exec(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("标记全部通知已读失败: {e}")))?;

        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::notifications::entities::NotificationType;
    use crate::models::users::{entities::UserRole, requests::CreateUserRequest};

    async fn user(storage: &SeaOrmStorage, username: &str) -> i64 {
        storage
            .create_user_impl(CreateUserRequest {
                username: username.to_string(),
                password: "hash".to_string(),
                role: UserRole::Teacher,
                name: username.to_string(),
                email: None,
                phone: None,
                is_approved: true,
            })
            .await
            .unwrap()
            .id
    }

    fn notice(user_id: i64, title: &str) -> NewNotification {
        NewNotification {
            user_id,
            notification_type: NotificationType::Announcement,
            title: title.to_string(),
            message: "내용".to_string(),
            related_id: None,
        }
    }

    #[tokio::test]
    async fn test_read_flow() {
        let storage = SeaOrmStorage::in_memory().await;
        let me = user(&storage, "me").await;
        let other = user(&storage, "other").await;

        let created = storage
            .create_notifications_impl(vec![notice(me, "첫째"), notice(me, "둘째"), notice(other, "남")])
            .await
            .unwrap();
        assert_eq!(created, 3);
        assert_eq!(storage.count_unread_notifications_impl(me).await.unwrap(), 2);

        let list = storage.list_notifications_impl(me, 20).await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].title, "둘째");

        let other_list = storage.list_notifications_impl(other, 20).await.unwrap();
        assert!(!storage.mark_notification_read_impl(other_list[0].id, me).await.unwrap());
        assert!(storage.mark_notification_read_impl(list[0].id, me).await.unwrap());
        // 已读的再次标记仍视为成功
        assert!(storage.mark_notification_read_impl(list[0].id, me).await.unwrap());

        assert_eq!(storage.mark_all_notifications_read_impl(me).await.unwrap(), 1);
        assert_eq!(storage.count_unread_notifications_impl(me).await.unwrap(), 0);
        assert_eq!(storage.count_unread_notifications_impl(other).await.unwrap(), 1);
    }
}
