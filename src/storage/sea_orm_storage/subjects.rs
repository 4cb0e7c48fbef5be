//! 科目存储操作

use super::SeaOrmStorage;
use crate::entity::prelude::Subjects;
use crate::entity::subjects::{ActiveModel, Column};
use crate::errors::{Result, StudyLinkError};
use crate::models::subjects::{
    entities::Subject,
    requests::{CreateSubjectRequest, UpdateSubjectRequest},
};
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

impl SeaOrmStorage {
    /// 列出科目
    pub async fn list_subjects_impl(&self, include_inactive: bool) -> Result<Vec<Subject>> {
        let mut select = Subjects::find();
        if !include_inactive {
            select = select.filter(Column::IsActive.eq(true));
        }

        let result = select
            .order_by_asc(Column::Name)
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询科目列表失败: {e}")))?;

        Ok(result.into_iter().map(|m| m.into_subject()).collect())
    }

    /// 通过 ID 获取科目
    pub async fn get_subject_by_id_impl(&self, id: i64) -> Result<Option<Subject>> {
        let result = Subjects::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询科目失败: {e}")))?;

        Ok(result.map(|m| m.into_subject()))
    }

    /// 创建科目
    pub async fn create_subject_impl(&self, req: CreateSubjectRequest) -> Result<Subject> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            name: Set(req.name),
            description: Set(req.description),
            grade_level: Set(req.grade_level),
            is_active: Set(req.is_active.unwrap_or(true)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("创建科目失败: {e}")))?;

        Ok(result.into_subject())
    }

    /// 更新科目
    pub async fn update_subject_impl(
        &self,
        id: i64,
        update: UpdateSubjectRequest,
    ) -> Result<Option<Subject>> {
        if self.get_subject_by_id_impl(id).await?.is_none() {
            return Ok(None);
        }

        let mut model = ActiveModel {
            id: Set(id),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        if let Some(name) = update.name {
            model.name = Set(name);
        }
        if let Some(description) = update.description {
            model.description = Set(description);
        }
        if let Some(grade_level) = update.grade_level {
            model.grade_level = Set(grade_level);
        }
        if let Some(is_active) = update.is_active {
            model.is_active = Set(is_active);
        }

        model
            .update(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("更新科目失败: {e}")))?;

        self.get_subject_by_id_impl(id).await
    }

    /// 删除科目（归档，保留班级引用）
    pub async fn delete_subject_impl(&self, id: i64) -> Result<bool> {
        let result = Subjects::update_many()
            .col_expr(Column::IsActive, Expr::value(false))
            .col_expr(Column::UpdatedAt, Expr::value(chrono::Utc::now().timestamp()))
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("删除科目失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject(name: &str) -> CreateSubjectRequest {
        CreateSubjectRequest {
            name: name.to_string(),
            description: Some("desc".to_string()),
            grade_level: Some(3),
            is_active: None,
        }
    }

    #[tokio::test]
    async fn test_delete_archives_subject() {
        let storage = SeaOrmStorage::in_memory().await;
        let math = storage.create_subject_impl(subject("수학")).await.unwrap();
        storage.create_subject_impl(subject("영어")).await.unwrap();

        assert!(storage.delete_subject_impl(math.id).await.unwrap());

        let active = storage.list_subjects_impl(false).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "영어");
        let all = storage.list_subjects_impl(true).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(!storage.delete_subject_impl(9999).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_clears_nullable_fields() {
        let storage = SeaOrmStorage::in_memory().await;
        let math = storage.create_subject_impl(subject("수학")).await.unwrap();

        let updated = storage
            .update_subject_impl(
                math.id,
                UpdateSubjectRequest {
                    description: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.description, None);
        assert_eq!(updated.grade_level, Some(3));
        assert!(
            storage
                .update_subject_impl(9999, UpdateSubjectRequest::default())
                .await
                .unwrap()
                .is_none()
        );
    }
}
