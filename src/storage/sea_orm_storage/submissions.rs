//! 测试提交存储操作

use std::collections::HashMap;

use super::SeaOrmStorage;
use crate::entity::prelude::{Students, Users};
use crate::entity::test_submissions::{ActiveModel, Column, Entity as TestSubmissions};
use crate::entity::{students, users};
use crate::errors::{Result, StudyLinkError};
use crate::models::tests::{
    entities::TestSubmission,
    requests::{NewSubmission, SubmissionGrade},
    responses::SubmissionWithStudent,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, SqlErr,
};

impl SeaOrmStorage {
    /// 学生对某测试的提交
    pub async fn get_submission_impl(
        &self,
        test_id: i64,
        student_id: i64,
    ) -> Result<Option<TestSubmission>> {
        let result = TestSubmissions::find()
            .filter(Column::TestId.eq(test_id))
            .filter(Column::StudentId.eq(student_id))
            .one(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询提交失败: {e}")))?;

        Ok(result.map(|m| m.into_submission()))
    }

    /// 通过 ID 获取提交
    pub async fn get_submission_by_id_impl(&self, id: i64) -> Result<Option<TestSubmission>> {
        let result = TestSubmissions::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询提交失败: {e}")))?;

        Ok(result.map(|m| m.into_submission()))
    }

    /// 创建提交（测试+学生唯一，重复提交返回冲突）
    pub async fn create_submission_impl(
        &self,
        submission: NewSubmission,
    ) -> Result<TestSubmission> {
        let now = chrono::Utc::now().timestamp();

        let result = ActiveModel {
            test_id: Set(submission.test_id),
            student_id: Set(submission.student_id),
            answers: Set(submission.answers.to_string()),
            score: Set(submission.score),
            is_graded: Set(submission.is_graded),
            is_published: Set(false),
            submitted_at: Set(now),
            graded_at: Set(submission.is_graded.then_some(now)),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                StudyLinkError::conflict("Test has already been submitted.")
            }
            _ => StudyLinkError::database_operation(format!("创建提交失败: {e}")),
        })?;

        Ok(result.into_submission())
    }

    /// 评分
    pub async fn grade_submission_impl(
        &self,
        id: i64,
        grade: SubmissionGrade,
    ) -> Result<Option<TestSubmission>> {
        if self.get_submission_by_id_impl(id).await?.is_none() {
            return Ok(None);
        }

        let mut model = ActiveModel {
            id: Set(id),
            answers: Set(grade.answers.to_string()),
            score: Set(Some(grade.score)),
            is_graded: Set(true),
            graded_at: Set(Some(chrono::Utc::now().timestamp())),
            ..Default::default()
        };
        if let Some(publish) = grade.publish {
            model.is_published = Set(publish);
        }

        let result = model
            .update(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("评分失败: {e}")))?;

        Ok(Some(result.into_submission()))
    }

    /// 设置成绩公开状态
    pub async fn set_submission_published_impl(
        &self,
        id: i64,
        published: bool,
    ) -> Result<Option<TestSubmission>> {
        if self.get_submission_by_id_impl(id).await?.is_none() {
            return Ok(None);
        }

        let result = ActiveModel {
            id: Set(id),
            is_published: Set(published),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .map_err(|e| StudyLinkError::database_operation(format!("更新成绩公开状态失败: {e}")))?;

        Ok(Some(result.into_submission()))
    }

    /// 测试的全部提交（带学生姓名与学号）
    pub async fn list_test_submissions_impl(
        &self,
        test_id: i64,
    ) -> Result<Vec<SubmissionWithStudent>> {
        let rows = TestSubmissions::find()
            .filter(Column::TestId.eq(test_id))
            .order_by_desc(Column::SubmittedAt)
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询测试提交失败: {e}")))?;

        let student_ids: Vec<i64> = rows.iter().map(|r| r.student_id).collect();
        let names: HashMap<i64, String> = Users::find()
            .filter(users::Column::Id.is_in(student_ids.clone()))
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询学生失败: {e}")))?
            .into_iter()
            .map(|u| (u.id, u.name))
            .collect();
        let numbers: HashMap<i64, String> = Students::find()
            .filter(students::Column::UserId.is_in(student_ids))
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询学生档案失败: {e}")))?
            .into_iter()
            .map(|s| (s.user_id, s.student_number))
            .collect();

        Ok(rows
            .into_iter()
            .map(|row| SubmissionWithStudent {
                student_name: names.get(&row.student_id).cloned().unwrap_or_default(),
                student_number: numbers.get(&row.student_id).cloned(),
                submission: row.into_submission(),
            })
            .collect())
    }

    /// 学生在若干测试上的提交
    pub async fn list_student_submissions_impl(
        &self,
        student_id: i64,
        test_ids: &[i64],
    ) -> Result<Vec<TestSubmission>> {
        if test_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = TestSubmissions::find()
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::TestId.is_in(test_ids.to_vec()))
            .all(&self.db)
            .await
            .map_err(|e| StudyLinkError::database_operation(format!("查询学生提交失败: {e}")))?;

        Ok(rows.into_iter().map(|m| m.into_submission()).collect())
    }
}
