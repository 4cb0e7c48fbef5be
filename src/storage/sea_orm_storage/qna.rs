//! 课程问答存储操作

use std::collections::HashMap;

use super::SeaOrmStorage;
use crate::entity::prelude::{Classes, Courses, Users};
use crate::entity::qna::{ActiveModel, Column, Entity as Qnas, Model};
use crate::entity::{classes, courses, users};
use crate::errors::{Result, StudyLinkError};
use crate::models::qna::{
    entities::{Qna, QnaDetail},
    requests::QnaVisibility,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    Set,
};

impl SeaOrmStorage {
    /// 创建问题
    pub async fn create_qna_impl(
        &self,
        course_id: i64,
        student_id: i64,
        question: String,
        is_public: bool,
    ) -> Result<Qna> {
        let result = ActiveModel {
            course_id: Set(course_id),
            student_id: Set(student_id),
            question: Set(question),
            is_public: Set(is_public),
            created_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|e| StudyLinkError::database_operation(format!("创建问题失败: {e}")))?;

        Ok(result.into_qna())
    }

    /// 通过 ID 获取问答
    pub async fn get_qna_by_id_impl(&self, id: i64) -> Result<Option<Qna>> {
        let result = Qnas::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询问答失败: {e}")))?;

        Ok(result.map(|m| m.into_qna()))
    }

    /// 课程问答
    pub async fn list_course_qna_impl(
        &self,
        course_id: i64,
        visibility: QnaVisibility,
    ) -> Result<Vec<QnaDetail>> {
        let mut select = Qnas::find().filter(Column::CourseId.eq(course_id));
        match visibility {
            QnaVisibility::All => {}
            QnaVisibility::PublicOrOwn(student_id) => {
                select = select.filter(
                    Condition::any()
                        .add(Column::IsPublic.eq(true))
                        .add(Column::StudentId.eq(student_id)),
                );
            }
            QnaVisibility::PublicOnly => {
                select = select.filter(Column::IsPublic.eq(true));
            }
        }

        let rows = select
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询课程问答失败: {e}")))?;

        self.attach_qna_details(rows).await
    }

    /// 学生本人的问答
    pub async fn list_student_qna_impl(&self, student_id: i64) -> Result<Vec<QnaDetail>> {
        let rows = Qnas::find()
            .filter(Column::StudentId.eq(student_id))
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询问答失败: {e}")))?;

        self.attach_qna_details(rows).await
    }

    /// 教师课程（本人课程或负责班级的课程）上的问答
    pub async fn list_teacher_qna_impl(&self, teacher_id: Option<i64>) -> Result<Vec<QnaDetail>> {
        let mut select = Qnas::find();

        if let Some(teacher_id) = teacher_id {
            let owned_classes: Vec<i64> = Classes::find()
                .select_only()
                .column(classes::Column::Id)
                .filter(classes::Column::TeacherId.eq(teacher_id))
                .into_tuple::<i64>()
                .all(&self.db)
                .await
                .map_err(|e| StudyLinkError::database_operation(format!("查询教师班级失败: {e}")))?;
            let course_ids: Vec<i64> = Courses::find()
                .select_only()
                .column(courses::Column::Id)
                .filter(
                    Condition::any()
                        .add(courses::Column::TeacherId.eq(teacher_id))
                        .add(courses::Column::ClassId.is_in(owned_classes)),
                )
                .into_tuple::<i64>()
                .all(&self.db)
                .await
                .map_err(|e| StudyLinkError::database_operation(format!("查询教师课程失败: {e}")))?;
            if course_ids.is_empty() {
                return Ok(Vec::new());
            }
            select = select.filter(Column::CourseId.is_in(course_ids));
        }

        let rows = select
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询问答失败: {e}")))?;

        self.attach_qna_details(rows).await
    }

    /// 回答问题
    pub async fn answer_qna_impl(
        &self,
        id: i64,
        teacher_id: i64,
        answer: String,
    ) -> Result<Option<Qna>> {
        if self.get_qna_by_id_impl(id).await?.is_none() {
            return Ok(None);
        }

        let result = ActiveModel {
            id: Set(id),
            answer: Set(Some(answer)),
            teacher_id: Set(Some(teacher_id)),
            answered_at: Set(Some(chrono::Utc::now().timestamp())),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .map_err(|e| StudyLinkError::database_operation(format!("回答问题失败: {e}")))?;

        Ok(Some(result.into_qna()))
    }

    /// 删除问答
    pub async fn delete_qna_impl(&self, id: i64) -> Result<bool> {
        let result = Qnas::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("删除问答失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    async fn attach_qna_details(&self, rows: Vec<Model>) -> Result<Vec<QnaDetail>> {
        let mut user_ids: Vec<i64> = rows.iter().map(|r| r.student_id).collect();
        user_ids.extend(rows.iter().filter_map(|r| r.teacher_id));
        let course_ids: Vec<i64> = rows.iter().map(|r| r.course_id).collect();

        let names: HashMap<i64, String> = Users::find()
            .filter(users::Column::Id.is_in(user_ids))
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询用户失败: {e}")))?
            .into_iter()
            .map(|u| (u.id, u.name))
            .collect();
        let titles: HashMap<i64, String> = Courses::find()
            .filter(courses::Column::Id.is_in(course_ids))
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询课程失败: {e}")))?
            .into_iter()
            .map(|c| (c.id, c.title))
            .collect();

        Ok(rows
            .into_iter()
            .map(|row| QnaDetail {
                student_name: names.get(&row.student_id).cloned(),
                teacher_name: row.teacher_id.and_then(|id| names.get(&id).cloned()),
                course_title: titles.get(&row.course_id).cloned(),
                qna: row.into_qna(),
            })
            .collect())
    }
}
