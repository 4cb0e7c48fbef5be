//! 班级存储操作

use std::collections::HashMap;

use super::SeaOrmStorage;
use crate::entity::classes::{ActiveModel, Column, Entity as Classes};
use crate::entity::prelude::{Students, Subjects, Users};
use crate::entity::{students, subjects, users};
use crate::errors::{Result, StudyLinkError};
use crate::models::classes::{
    entities::{Class, ClassSummary},
    requests::ClassFields,
};
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

impl SeaOrmStorage {
    /// 列出班级（带科目、教师名称与人数）
    pub async fn list_class_summaries_impl(
        &self,
        include_inactive: bool,
        teacher_id: Option<i64>,
    ) -> Result<Vec<ClassSummary>> {
        let mut select = Classes::find();
        if !include_inactive {
            select = select.filter(Column::IsActive.eq(true));
        }
        if let Some(teacher_id) = teacher_id {
            select = select.filter(Column::TeacherId.eq(teacher_id));
        }

        let class_list = select
            .order_by_asc(Column::Name)
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询班级列表失败: {e}")))?;

        let subject_ids: Vec<i64> = class_list.iter().map(|c| c.subject_id).collect();
        let teacher_ids: Vec<i64> = class_list.iter().filter_map(|c| c.teacher_id).collect();
        let class_ids: Vec<i64> = class_list.iter().map(|c| c.id).collect();

        let subject_names: HashMap<i64, String> = Subjects::find()
            .filter(subjects::Column::Id.is_in(subject_ids))
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询科目失败: {e}")))?
            .into_iter()
            .map(|s| (s.id, s.name))
            .collect();

        let teacher_names: HashMap<i64, String> = Users::find()
            .filter(users::Column::Id.is_in(teacher_ids))
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询教师失败: {e}")))?
            .into_iter()
            .map(|u| (u.id, u.name))
            .collect();

        let mut student_counts: HashMap<i64, i64> = HashMap::new();
        let members = Students::find()
            .filter(students::Column::ClassId.is_in(class_ids))
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询班级学生失败: {e}")))?;
        for member in members {
            if let Some(class_id) = member.class_id {
                *student_counts.entry(class_id).or_default() += 1;
            }
        }

        Ok(class_list
            .into_iter()
            .map(|c| ClassSummary {
                subject_name: subject_names.get(&c.subject_id).cloned(),
                teacher_name: c.teacher_id.and_then(|id| teacher_names.get(&id).cloned()),
                student_count: student_counts.get(&c.id).copied().unwrap_or(0),
                class: c.into_class(),
            })
            .collect())
    }

    /// 通过 ID 获取班级
    pub async fn get_class_by_id_impl(&self, class_id: i64) -> Result<Option<Class>> {
        let result = Classes::find_by_id(class_id)
            .one(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询班级失败: {e}")))?;

        Ok(result.map(|m| m.into_class()))
    }

    /// 批量获取班级
    pub async fn get_classes_by_ids_impl(&self, ids: &[i64]) -> Result<Vec<Class>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let result = Classes::find()
            .filter(Column::Id.is_in(ids.to_vec()))
            .order_by_asc(Column::Name)
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("批量查询班级失败: {e}")))?;

        Ok(result.into_iter().map(|m| m.into_class()).collect())
    }

    /// 教师负责的班级
    pub async fn list_classes_by_teacher_impl(&self, teacher_id: i64) -> Result<Vec<Class>> {
        let result = Classes::find()
            .filter(Column::TeacherId.eq(teacher_id))
            .order_by_asc(Column::Name)
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询教师班级失败: {e}")))?;

        Ok(result.into_iter().map(|m| m.into_class()).collect())
    }

    /// 创建班级
    pub async fn create_class_impl(&self, fields: ClassFields) -> Result<Class> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            name: Set(fields.name),
            subject_id: Set(fields.subject_id),
            teacher_id: Set(fields.teacher_id),
            grade_level: Set(fields.grade_level),
            max_students: Set(fields.max_students),
            is_active: Set(fields.is_active),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("创建班级失败: {e}")))?;

        Ok(result.into_class())
    }

    /// 更新班级（字段已由服务层合并）
    pub async fn update_class_impl(&self, id: i64, fields: ClassFields) -> Result<Option<Class>> {
        if self.get_class_by_id_impl(id).await?.is_none() {
            return Ok(None);
        }

        let model = ActiveModel {
            id: Set(id),
            name: Set(fields.name),
            subject_id: Set(fields.subject_id),
            teacher_id: Set(fields.teacher_id),
            grade_level: Set(fields.grade_level),
            max_students: Set(fields.max_students),
            is_active: Set(fields.is_active),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        let result = model
            .update(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("更新班级失败: {e}")))?;

        Ok(Some(result.into_class()))
    }

    /// 删除班级（归档）
    pub async fn delete_class_impl(&self, id: i64) -> Result<bool> {
        let result = Classes::update_many()
            .col_expr(Column::IsActive, Expr::value(false))
            .col_expr(Column::UpdatedAt, Expr::value(chrono::Utc::now().timestamp()))
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("删除班级失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::subjects::requests::CreateSubjectRequest;
    use crate::models::users::{entities::UserRole, requests::CreateUserRequest};

    async fn fields(storage: &SeaOrmStorage, teacher_id: Option<i64>) -> ClassFields {
        let subject = storage
            .create_subject_impl(CreateSubjectRequest {
                name: "과학".to_string(),
                description: None,
                grade_level: None,
                is_active: None,
            })
            .await
            .unwrap();
        ClassFields {
            name: "1반".to_string(),
            subject_id: subject.id,
            teacher_id,
            grade_level: Some(2),
            max_students: 30,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_summaries_carry_names_and_counts() {
        let storage = SeaOrmStorage::in_memory().await;
        let teacher = storage
            .create_user_impl(CreateUserRequest {
                username: "teacher".to_string(),
                password: "hash".to_string(),
                role: UserRole::Teacher,
                name: "김선생".to_string(),
                email: None,
                phone: None,
                is_approved: true,
            })
            .await
            .unwrap();
        let class = storage
            .create_class_impl(fields(&storage, Some(teacher.id)).await)
            .await
            .unwrap();

        let summaries = storage
            .list_class_summaries_impl(false, Some(teacher.id))
            .await
            .unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].class.id, class.id);
        assert_eq!(summaries[0].subject_name.as_deref(), Some("과학"));
        assert_eq!(summaries[0].teacher_name.as_deref(), Some("김선생"));
        assert_eq!(summaries[0].student_count, 0);
    }

    #[tokio::test]
    async fn test_update_and_archive() {
        let storage = SeaOrmStorage::in_memory().await;
        let base = fields(&storage, None).await;
        let class = storage.create_class_impl(base.clone()).await.unwrap();

        let updated = storage
            .update_class_impl(
                class.id,
                ClassFields {
                    name: "2반".to_string(),
                    max_students: 10,
                    ..base
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "2반");
        assert_eq!(updated.max_students, 10);

        assert!(storage.delete_class_impl(class.id).await.unwrap());
        assert!(storage.list_class_summaries_impl(false, None).await.unwrap().is_empty());
        assert_eq!(storage.list_class_summaries_impl(true, None).await.unwrap().len(), 1);
    }
}
