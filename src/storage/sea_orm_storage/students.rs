//! 学生档案与家长关联存储操作

use std::collections::HashMap;

use super::SeaOrmStorage;
use crate::entity::prelude::{Classes, ParentStudentRelations, Students, Subjects, Users};
use crate::entity::{classes, parent_student_relations, students, subjects, users};
use crate::errors::{Result, StudyLinkError};
use crate::models::{
    classes::entities::ClassStudent,
    parent::responses::ParentChildSummary,
    users::{
        entities::{StudentProfile, User},
        requests::NewStudentProfile,
    },
};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

/// 将学生档案补全为带用户与班级信息的列表项
async fn into_class_students<C: ConnectionTrait>(
    conn: &C,
    profiles: Vec<students::Model>,
    active_only: bool,
) -> Result<Vec<ClassStudent>> {
    let user_ids: Vec<i64> = profiles.iter().map(|p| p.user_id).collect();
    let class_ids: Vec<i64> = profiles.iter().filter_map(|p| p.class_id).collect();

    let users: HashMap<i64, users::Model> = Users::find()
        .filter(users::Column::Id.is_in(user_ids))
        .all(conn)
        .await
        .map_err(|e| StudyLinkError::database_operation(format!("查询学生用户失败: {e}")))?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let class_names: HashMap<i64, String> = Classes::find()
        .filter(classes::Column::Id.is_in(class_ids))
        .all(conn)
        .await
        .map_err(|e| StudyLinkError::database_operation(format!("查询班级失败: {e}")))?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();

    let mut result: Vec<ClassStudent> = profiles
        .into_iter()
        .filter_map(|p| {
            let user = users.get(&p.user_id)?;
            if active_only && !user.is_active {
                return None;
            }
            Some(ClassStudent {
                student_id: p.user_id,
                username: user.username.clone(),
                name: user.name.clone(),
                email: user.email.clone(),
                student_number: p.student_number,
                grade: p.grade,
                class_name: p.class_id.and_then(|id| class_names.get(&id).cloned()),
                class_id: p.class_id,
            })
        })
        .collect();

    result.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(result)
}

impl SeaOrmStorage {
    /// 学号是否已存在
    pub async fn student_number_exists_impl(&self, student_number: &str) -> Result<bool> {
        let count = Students::find()
            .filter(students::Column::StudentNumber.eq(student_number))
            .count(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询学号失败: {e}")))?;

        Ok(count > 0)
    }

    /// 为已有用户创建学生档案
    pub async fn create_student_profile_impl(
        &self,
        user_id: i64,
        profile: NewStudentProfile,
    ) -> Result<StudentProfile> {
        let result = students::ActiveModel {
            user_id: Set(user_id),
            student_number: Set(profile.student_number),
            grade: Set(profile.grade),
            class_id: Set(profile.class_id),
            created_at: Set(chrono::Utc::now().timestamp()),
        }
        .insert(&self.db)
        .await
        .map_err(|e| StudyLinkError::database_operation(format!("创建学生档案失败: {e}")))?;

        Ok(result.into_profile())
    }

    /// 获取学生档案
    pub async fn get_student_profile_impl(&self, user_id: i64) -> Result<Option<StudentProfile>> {
        let result = Students::find_by_id(user_id)
            .one(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询学生档案失败: {e}")))?;

        Ok(result.map(|m| m.into_profile()))
    }

    /// 通过学号获取学生
    pub async fn get_student_by_number_impl(
        &self,
        student_number: &str,
    ) -> Result<Option<(User, StudentProfile)>> {
        let result = Students::find()
            .filter(students::Column::StudentNumber.eq(student_number))
            .find_also_related(Users)
            .one(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("通过学号查询学生失败: {e}")))?;

        Ok(result.and_then(|(profile, user)| {
            user.map(|u| (u.into_user(), profile.into_profile()))
        }))
    }

    /// 设置学生所在班级
    pub async fn set_student_class_impl(
        &self,
        student_id: i64,
        class_id: Option<i64>,
    ) -> Result<bool> {
        let result = Students::update_many()
            .col_expr(students::Column::ClassId, Expr::value(class_id))
            .filter(students::Column::UserId.eq(student_id))
            .exec(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("更新学生班级失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 学生已关联的家长数量
    pub async fn count_parent_links_impl(&self, student_id: i64) -> Result<u64> {
        ParentStudentRelations::find()
            .filter(parent_student_relations::Column::StudentId.eq(student_id))
            .count(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("统计家长关联失败: {e}")))
    }

    /// 是否为该学生的家长
    pub async fn is_parent_of_impl(&self, parent_id: i64, student_id: i64) -> Result<bool> {
        let count = ParentStudentRelations::find()
            .filter(parent_student_relations::Column::ParentId.eq(parent_id))
            .filter(parent_student_relations::Column::StudentId.eq(student_id))
            .count(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询家长关联失败: {e}")))?;

        Ok(count > 0)
    }

    /// 家长的子女列表
    pub async fn list_children_impl(&self, parent_id: i64) -> Result<Vec<ParentChildSummary>> {
        let links = ParentStudentRelations::find()
            .filter(parent_student_relations::Column::ParentId.eq(parent_id))
            .order_by_asc(parent_student_relations::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询家长关联失败: {e}")))?;

        let student_ids: Vec<i64> = links.iter().map(|l| l.student_id).collect();
        let profiles: HashMap<i64, students::Model> = Students::find()
            .filter(students::Column::UserId.is_in(student_ids.clone()))
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询学生档案失败: {e}")))?
            .into_iter()
            .map(|s| (s.user_id, s))
            .collect();
        let names: HashMap<i64, String> = Users::find()
            .filter(users::Column::Id.is_in(student_ids))
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询学生用户失败: {e}")))?
            .into_iter()
            .map(|u| (u.id, u.name))
            .collect();

        let class_ids: Vec<i64> = profiles.values().filter_map(|p| p.class_id).collect();
        let class_list = Classes::find()
            .filter(classes::Column::Id.is_in(class_ids))
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询班级失败: {e}")))?;
        let subject_ids: Vec<i64> = class_list.iter().map(|c| c.subject_id).collect();
        let subject_names: HashMap<i64, String> = Subjects::find()
            .filter(subjects::Column::Id.is_in(subject_ids))
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询科目失败: {e}")))?
            .into_iter()
            .map(|s| (s.id, s.name))
            .collect();
        let class_map: HashMap<i64, classes::Model> =
            class_list.into_iter().map(|c| (c.id, c)).collect();

        let children = links
            .into_iter()
            .filter_map(|link| {
                let profile = profiles.get(&link.student_id)?;
                let class = profile.class_id.and_then(|id| class_map.get(&id));
                let link = link.into_link();
                Some(ParentChildSummary {
                    student_id: link.student_id,
                    student_name: names.get(&link.student_id).cloned().unwrap_or_default(),
                    student_number: profile.student_number.clone(),
                    grade: profile.grade,
                    class_id: profile.class_id,
                    class_name: class.map(|c| c.name.clone()),
                    subject_name: class.and_then(|c| subject_names.get(&c.subject_id).cloned()),
                    relationship: link.relationship,
                    linked_at: link.created_at,
                })
            })
            .collect();

        Ok(children)
    }

    /// 班级学生
    pub async fn list_class_students_impl(&self, class_id: i64) -> Result<Vec<ClassStudent>> {
        let profiles = Students::find()
            .filter(students::Column::ClassId.eq(class_id))
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询班级学生失败: {e}")))?;

        into_class_students(&self.db, profiles, false).await
    }

    /// 可分配的在读学生
    pub async fn list_active_students_impl(
        &self,
        class_id: Option<i64>,
    ) -> Result<Vec<ClassStudent>> {
        let mut select = Students::find();
        if let Some(class_id) = class_id {
            select = select.filter(students::Column::ClassId.eq(class_id));
        }
        let profiles = select
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询学生失败: {e}")))?;

        into_class_students(&self.db, profiles, true).await
    }

    /// 替换班级学生：移出不在列表中的学生，再把列表中的学生编入
    pub async fn replace_class_students_impl(
        &self,
        class_id: i64,
        student_ids: &[i64],
    ) -> Result<()> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("开启事务失败: {e}")))?;

        Students::update_many()
            .col_expr(students::Column::ClassId, Expr::value(Option::<i64>::None))
            .filter(students::Column::ClassId.eq(class_id))
            .filter(students::Column::UserId.is_not_in(student_ids.to_vec()))
            .exec(&txn)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("移出班级学生失败: {e}")))?;

        if !student_ids.is_empty() {
            Students::update_many()
                .col_expr(students::Column::ClassId, Expr::value(Some(class_id)))
                .filter(students::Column::UserId.is_in(student_ids.to_vec()))
                .exec(&txn)
                .await
                .map_err(|e| {
                    StudyLinkError::database_operation(format!("编入班级学生失败: {e}"))
                })?;
        }

        txn.commit()
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(())
    }
}
