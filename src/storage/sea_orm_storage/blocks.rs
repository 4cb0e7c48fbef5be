//! 内容块存储操作

use super::SeaOrmStorage;
use crate::entity::content_blocks::{ActiveModel, Column, Entity as ContentBlocks};
use crate::entity::prelude::VideoProgresses;
use crate::entity::video_progress;
use crate::errors::{Result, StudyLinkError};
use crate::models::courses::{
    entities::ContentBlock,
    requests::{BlockUpdate, NewContentBlock},
};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

/// 在课程末尾追加内容块
pub(super) async fn insert_block<C: ConnectionTrait>(
    conn: &C,
    course_id: i64,
    block: NewContentBlock,
) -> Result<ContentBlock> {
    let now = chrono::Utc::now().timestamp();

    let last = ContentBlocks::find()
        .filter(Column::CourseId.eq(course_id))
        .order_by_desc(Column::OrderIndex)
        .one(conn)
        .await
        .map_err(|e| StudyLinkError::database_operation(format!("查询内容块顺序失败: {e}")))?;
    let order_index = last.map(|b| b.order_index + 1).unwrap_or(1);

    let result = ActiveModel {
        course_id: Set(course_id),
        block_type: Set(block.block_type.to_string()),
        title: Set(block.title),
        content: Set(block.content.to_string()),
        order_index: Set(order_index),
        is_required: Set(block.is_required),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await
    .map_err(|e| StudyLinkError::database_operation(format!("创建内容块失败: {e}")))?;

    Ok(result.into_block())
}

impl SeaOrmStorage {
    /// 课程内容块（按顺序）
    pub async fn list_course_blocks_impl(&self, course_id: i64) -> Result<Vec<ContentBlock>> {
        self.list_blocks_for_courses_impl(&[course_id]).await
    }

    /// 多个课程的内容块
    pub async fn list_blocks_for_courses_impl(
        &self,
        course_ids: &[i64],
    ) -> Result<Vec<ContentBlock>> {
        if course_ids.is_empty() {
            return Ok(Vec::new());
        }
        let result = ContentBlocks::find()
            .filter(Column::CourseId.is_in(course_ids.to_vec()))
            .order_by_asc(Column::CourseId)
            .order_by_asc(Column::OrderIndex)
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询内容块失败: {e}")))?;

        Ok(result.into_iter().map(|m| m.into_block()).collect())
    }

    /// 通过 ID 获取内容块
    pub async fn get_block_by_id_impl(&self, id: i64) -> Result<Option<ContentBlock>> {
        let result = ContentBlocks::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询内容块失败: {e}")))?;

        Ok(result.map(|m| m.into_block()))
    }

    /// 追加内容块
    pub async fn create_block_impl(
        &self,
        course_id: i64,
        block: NewContentBlock,
    ) -> Result<ContentBlock> {
        insert_block(&self.db, course_id, block).await
    }

    /// 更新内容块
    pub async fn update_block_impl(
        &self,
        id: i64,
        update: BlockUpdate,
    ) -> Result<Option<ContentBlock>> {
        if self.get_block_by_id_impl(id).await?.is_none() {
            return Ok(None);
        }

        let mut model = ActiveModel {
            id: Set(id),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };
        if let Some(title) = update.title {
            model.title = Set(title);
        }
        if let Some(content) = update.content {
            model.content = Set(content.to_string());
        }
        if let Some(is_required) = update.is_required {
            model.is_required = Set(is_required);
        }

        let result = model
            .update(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("更新内容块失败: {e}")))?;

        Ok(Some(result.into_block()))
    }

    /// 删除内容块（连同该块的观看进度）
    pub async fn delete_block_impl(&self, id: i64) -> Result<bool> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("开启事务失败: {e}")))?;

        VideoProgresses::delete_many()
            .filter(video_progress::Column::VideoBlockId.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("删除视频进度失败: {e}")))?;

        let result = ContentBlocks::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("删除内容块失败: {e}")))?;

        txn.commit()
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 按给定顺序重排内容块（order_index 从 1 开始）
    pub async fn reorder_blocks_impl(
        &self,
        course_id: i64,
        ordered_ids: &[i64],
    ) -> Result<Vec<ContentBlock>> {
        let now = chrono::Utc::now().timestamp();
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("开启事务失败: {e}")))?;

        for (index, block_id) in ordered_ids.iter().enumerate() {
            ContentBlocks::update_many()
                .col_expr(Column::OrderIndex, Expr::value(index as i32 + 1))
                .col_expr(Column::UpdatedAt, Expr::value(now))
                .filter(Column::Id.eq(*block_id))
                .filter(Column::CourseId.eq(course_id))
                .exec(&txn)
                .await
                .map_err(|e| {
                    StudyLinkError::database_operation(format!("更新内容块顺序失败: {e}"))
                })?;
        }

        txn.commit()
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("提交事务失败: {e}")))?;

        self.list_course_blocks_impl(course_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::courses::entities::BlockType;
    use crate::storage::sea_orm_storage::courses::tests::fixture;
    use serde_json::json;

    fn text_block(title: &str) -> NewContentBlock {
        NewContentBlock {
            block_type: BlockType::Text,
            title: title.to_string(),
            content: json!({"body": "본문"}),
            is_required: false,
        }
    }

    #[tokio::test]
    async fn test_blocks_append_in_order() {
        let storage = SeaOrmStorage::in_memory().await;
        let fx = fixture(&storage).await;

        let second = storage
            .create_block_impl(fx.course_id, text_block("둘째"))
            .await
            .unwrap();
        let third = storage
            .create_block_impl(fx.course_id, text_block("셋째"))
            .await
            .unwrap();
        assert_eq!(second.order_index, 2);
        assert_eq!(third.order_index, 3);
        assert_eq!(third.content["body"], "본문");
    }

    #[tokio::test]
    async fn test_reorder_assigns_sequential_indexes() {
        let storage = SeaOrmStorage::in_memory().await;
        let fx = fixture(&storage).await;
        let second = storage
            .create_block_impl(fx.course_id, text_block("둘째"))
            .await
            .unwrap();

        let blocks = storage
            .reorder_blocks_impl(fx.course_id, &[second.id, fx.video_block_id])
            .await
            .unwrap();
        let order: Vec<(i64, i32)> = blocks.iter().map(|b| (b.id, b.order_index)).collect();
        assert_eq!(order, vec![(second.id, 1), (fx.video_block_id, 2)]);
    }

    #[tokio::test]
    async fn test_update_and_delete_block() {
        let storage = SeaOrmStorage::in_memory().await;
        let fx = fixture(&storage).await;

        let updated = storage
            .update_block_impl(
                fx.video_block_id,
                BlockUpdate {
                    title: Some("새 제목".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "새 제목");
        assert!(updated.is_required);

        assert!(storage.delete_block_impl(fx.video_block_id).await.unwrap());
        assert!(storage.list_course_blocks_impl(fx.course_id).await.unwrap().is_empty());
    }
}
